//! Two-party flow: party A files a case, party B answers through the link,
//! JudgeBot rules.
//!
//! ```text
//! CollectA ──submit_case──> LinkIssued
//!
//! link ──open_response──> CollectB ──submit_response──> VerdictShown
//!    └──────────────────> CorruptedLink
//! ```
//!
//! `LinkIssued`, `VerdictShown` and `CorruptedLink` are terminal. Validation
//! failures never change state and never touch the store.

use crate::links::{self, DeepLink};
use fairfight_judge::{extract_percentages, Judge, JudgeRequest, Judgement};
use fairfight_protocol::{
    codec, non_blank, unix_ms_now, CaseDraft, CaseToken, LinkParams, Outcome, Participant,
    Theme, VerdictRecord, WinSplit,
};
use fairfight_store::CaseStore;
use serde::Deserialize;
use std::sync::Arc;
use thiserror::Error;

pub const DEFAULT_MIN_STATEMENT_CHARS: usize = 10;

const UNKNOWN_PARTY_A: &str = "User 1";
const UNKNOWN_PARTY_B: &str = "User 2";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowSettings {
    /// Public origin the share links point at
    pub base_url: String,

    /// Minimum trimmed length of party A's statement
    pub min_statement_chars: usize,
}

impl Default for FlowSettings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080".to_string(),
            min_statement_chars: DEFAULT_MIN_STATEMENT_CHARS,
        }
    }
}

/// Step-one form as posted by the browser. Field names match the link format.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StepOneForm {
    pub theme: Option<String>,
    pub user1_name: String,
    pub user1_email: String,
    pub user1_phone: String,
    pub user2_name: String,
    pub user2_email: String,
    pub user2_phone: String,
    pub user1_input: String,
}

impl StepOneForm {
    pub fn theme(&self) -> Theme {
        non_blank(&self.theme)
            .and_then(|raw| raw.parse().ok())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please fill all required fields (missing: {}).", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    #[error("Please describe your version in at least {min} characters.")]
    StatementTooShort { min: usize },

    #[error("Please enter your version before requesting the verdict.")]
    MissingResponse,
}

/// The case as seen from step 2, whether loaded by token or rebuilt from
/// the inline link payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCase {
    pub theme: Theme,
    pub party_a: Participant,
    pub party_b: Participant,
    pub statement_a: String,
    /// Set only when the case came from the store.
    pub token: Option<CaseToken>,
    /// Link parameters to carry into the verdict submission.
    pub link: LinkParams,
}

#[derive(Debug, Clone)]
pub struct LinkIssued {
    pub draft: CaseDraft,
    /// `None` when the store was unavailable and the fallback link is primary.
    pub token: Option<CaseToken>,
    pub share_link: String,
    pub fallback_link: String,
    pub notify: Vec<DeepLink>,
}

#[derive(Debug, Clone)]
pub struct VerdictShown {
    pub case: ResolvedCase,
    pub statement_b: String,
    pub judgement: Judgement,
    pub win_split: Option<WinSplit>,
    pub notify: Vec<DeepLink>,
}

impl VerdictShown {
    pub fn outcome(&self) -> Option<Outcome> {
        self.win_split.map(|split| split.outcome())
    }

    /// "Alice wins" / "It's a tie", when a split was found.
    pub fn outcome_label(&self) -> Option<String> {
        self.outcome().map(|outcome| match outcome {
            Outcome::PartyA => format!("{} wins", self.case.party_a.name),
            Outcome::PartyB => format!("{} wins", self.case.party_b.name),
            Outcome::Tie => "It's a tie".to_string(),
        })
    }
}

#[derive(Debug, Clone)]
pub enum FlowState {
    CollectA { theme: Theme },
    LinkIssued(LinkIssued),
    CollectB(ResolvedCase),
    VerdictShown(Box<VerdictShown>),
    CorruptedLink,
}

impl FlowState {
    pub fn name(&self) -> &'static str {
        match self {
            FlowState::CollectA { .. } => "collect_a",
            FlowState::LinkIssued(_) => "link_issued",
            FlowState::CollectB(_) => "collect_b",
            FlowState::VerdictShown(_) => "verdict_shown",
            FlowState::CorruptedLink => "corrupted_link",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            FlowState::LinkIssued(_) | FlowState::VerdictShown(_) | FlowState::CorruptedLink
        )
    }
}

pub struct FlowController {
    store: Arc<dyn CaseStore>,
    judge: Arc<Judge>,
    settings: FlowSettings,
}

impl FlowController {
    pub fn new(store: Arc<dyn CaseStore>, judge: Arc<Judge>, settings: FlowSettings) -> Self {
        Self {
            store,
            judge,
            settings,
        }
    }

    pub fn store(&self) -> &Arc<dyn CaseStore> {
        &self.store
    }

    pub fn collect_a(&self, theme: Theme) -> FlowState {
        FlowState::CollectA { theme }
    }

    pub async fn submit_case(&self, form: StepOneForm) -> Result<FlowState, ValidationError> {
        let draft = self.validate_case(form)?;
        let fallback_link = links::fallback_link(&self.settings.base_url, &draft);

        let (token, share_link) = match self.store.create_case(draft.clone()).await {
            Ok(token) => {
                log::info!(
                    "Case {token} filed: {} vs {} ({})",
                    draft.party_a.name,
                    draft.party_b.name,
                    draft.theme
                );
                let link = links::share_link(&self.settings.base_url, &token);
                (Some(token), link)
            }
            Err(err) => {
                log::warn!(
                    "Could not store case in {} store, issuing inline link: {err}",
                    self.store.backend_name()
                );
                (None, fallback_link.clone())
            }
        };

        let notify = links::invitation_links(&draft, &share_link);
        Ok(FlowState::LinkIssued(LinkIssued {
            draft,
            token,
            share_link,
            fallback_link,
            notify,
        }))
    }

    pub async fn open_response(&self, params: &LinkParams) -> FlowState {
        match self.resolve_case(params).await {
            Some(case) => FlowState::CollectB(case),
            None => FlowState::CorruptedLink,
        }
    }

    pub async fn submit_response(
        &self,
        params: &LinkParams,
        statement_b: &str,
    ) -> Result<FlowState, ValidationError> {
        let Some(case) = self.resolve_case(params).await else {
            return Ok(FlowState::CorruptedLink);
        };
        if statement_b.trim().is_empty() {
            return Err(ValidationError::MissingResponse);
        }

        let judgement = self
            .judge
            .judge(&JudgeRequest {
                theme: case.theme,
                name_a: case.party_a.name.clone(),
                statement_a: case.statement_a.clone(),
                name_b: case.party_b.name.clone(),
                statement_b: statement_b.to_string(),
            })
            .await;
        let win_split = if judgement.failed {
            None
        } else {
            extract_percentages(&judgement.text, &case.party_a.name, &case.party_b.name)
        };
        if win_split.is_none() && !judgement.failed {
            log::debug!("No win split found in verdict");
        }

        let record = VerdictRecord {
            theme: case.theme,
            party_a: case.party_a.clone(),
            party_b: case.party_b.clone(),
            statement_a: case.statement_a.clone(),
            statement_b: statement_b.to_string(),
            verdict_text: judgement.text.clone(),
            language: judgement.language.clone(),
            win_split,
            case_token: case.token.clone(),
            created_at_ms: unix_ms_now(),
        };
        if let Err(err) = self.store.append_verdict(&record).await {
            log::warn!("Could not record verdict: {err}");
        }

        let mut notify = links::verdict_links(&case.party_a, &case.party_b.name, &judgement.text);
        notify.extend(links::verdict_links(
            &case.party_b,
            &case.party_a.name,
            &judgement.text,
        ));
        Ok(FlowState::VerdictShown(Box::new(VerdictShown {
            case,
            statement_b: statement_b.to_string(),
            judgement,
            win_split,
            notify,
        })))
    }

    fn validate_case(&self, form: StepOneForm) -> Result<CaseDraft, ValidationError> {
        let theme = form.theme();
        let required = [
            ("User 1 name", &form.user1_name),
            ("User 1 email", &form.user1_email),
            ("User 2 name", &form.user2_name),
            ("User 2 email", &form.user2_email),
            ("your version", &form.user1_input),
        ];
        let missing: Vec<&'static str> = required
            .iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(label, _)| *label)
            .collect();
        if !missing.is_empty() {
            return Err(ValidationError::MissingFields(missing));
        }

        let min = self.settings.min_statement_chars;
        if form.user1_input.trim().chars().count() < min {
            return Err(ValidationError::StatementTooShort { min });
        }

        Ok(CaseDraft {
            theme,
            party_a: participant(&form.user1_name, &form.user1_email, &form.user1_phone),
            party_b: participant(&form.user2_name, &form.user2_email, &form.user2_phone),
            statement_a: form.user1_input,
        })
    }

    /// Token first; then the inline payload. `None` means the link is unusable.
    async fn resolve_case(&self, params: &LinkParams) -> Option<ResolvedCase> {
        if let Some(token) = params.token() {
            match self.store.find_case(&token).await {
                Ok(Some(case)) => {
                    return Some(ResolvedCase {
                        theme: case.theme,
                        party_a: case.party_a,
                        party_b: case.party_b,
                        statement_a: case.statement_a,
                        token: Some(case.token),
                        link: LinkParams {
                            step: Some("2".to_string()),
                            token: Some(token.to_string()),
                            ..LinkParams::default()
                        },
                    });
                }
                Ok(None) => log::info!("Unknown case token {token}, trying inline payload"),
                Err(err) => log::warn!("Case lookup for {token} failed: {err}"),
            }
        }

        let encoded = non_blank(&params.user1_input)?;
        let statement_a = match codec::decode(encoded) {
            Ok(statement) => statement,
            Err(err) => {
                log::warn!("Corrupted inline link payload: {err}");
                return None;
            }
        };

        let field = |value: &Option<String>| non_blank(value).unwrap_or_default().to_string();
        let phone = |value: &Option<String>| non_blank(value).map(str::to_string);
        Some(ResolvedCase {
            theme: params.theme().unwrap_or_default(),
            party_a: Participant {
                name: non_blank(&params.user1_name)
                    .unwrap_or(UNKNOWN_PARTY_A)
                    .to_string(),
                email: field(&params.user1_email),
                phone: phone(&params.user1_phone),
            },
            party_b: Participant {
                name: non_blank(&params.user2_name)
                    .unwrap_or(UNKNOWN_PARTY_B)
                    .to_string(),
                email: field(&params.user2_email),
                phone: phone(&params.user2_phone),
            },
            statement_a,
            token: None,
            link: LinkParams {
                token: None,
                ..params.clone()
            },
        })
    }
}

fn participant(name: &str, email: &str, phone: &str) -> Participant {
    let phone = phone.trim();
    Participant {
        name: name.trim().to_string(),
        email: email.trim().to_string(),
        phone: (!phone.is_empty()).then(|| phone.to_string()),
    }
}
