//! # FairFight Protocol
//!
//! Types shared by every FairFight crate: the conflict theme, participants,
//! stored cases and verdicts, the win split derived from a verdict, and the
//! query parameters carried by a share link.
//!
//! ## Flow
//!
//! ```text
//! Party A form ──> CaseDraft ──> Case (token) ──> share link
//!                                                    │
//! Party B form <── LinkParams (token | inline payload)
//!      │
//!      └──> VerdictRecord { verdict_text, win_split }
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

pub mod codec;
mod error;

pub use error::{DecodeError, UnknownTheme};

/// Kind of conflict being arbitrated; selects the judge persona.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Theme {
    #[default]
    Couple,
    Friends,
    Pro,
}

impl Theme {
    pub const ALL: [Theme; 3] = [Theme::Couple, Theme::Friends, Theme::Pro];

    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Couple => "Couple",
            Theme::Friends => "Friends",
            Theme::Pro => "Pro",
        }
    }

    pub fn emoji(self) -> &'static str {
        match self {
            Theme::Couple => "💔",
            Theme::Friends => "🎭",
            Theme::Pro => "👨‍💼",
        }
    }

    /// Phrase used inside the judge instruction ("an impartial judge for ... conflicts").
    pub fn conflict_kind(self) -> &'static str {
        match self {
            Theme::Couple => "couple",
            Theme::Friends => "friendship",
            Theme::Pro => "workplace",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = UnknownTheme;

    /// Accepts the bare name in any case, or a select label such as `"Couple 💔"`.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let word = raw.split_whitespace().next().unwrap_or_default();
        Theme::ALL
            .into_iter()
            .find(|theme| theme.as_str().eq_ignore_ascii_case(word))
            .ok_or_else(|| UnknownTheme(raw.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Participant {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
}

/// Validated party-A submission, not yet stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseDraft {
    pub theme: Theme,
    pub party_a: Participant,
    pub party_b: Participant,
    pub statement_a: String,
}

/// Opaque handle that resumes a case in step 2.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CaseToken(String);

impl CaseToken {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Render random bytes as lowercase hex.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        use fmt::Write as _;

        let mut hex = String::with_capacity(bytes.len() * 2);
        for byte in bytes {
            let _ = write!(hex, "{byte:02x}");
        }
        Self(hex)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CaseToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Case {
    pub token: CaseToken,
    pub theme: Theme,
    pub party_a: Participant,
    pub party_b: Participant,
    pub statement_a: String,
    pub created_at_ms: u64,
}

impl Case {
    pub fn from_draft(draft: CaseDraft, token: CaseToken, created_at_ms: u64) -> Self {
        Self {
            token,
            theme: draft.theme,
            party_a: draft.party_a,
            party_b: draft.party_b,
            statement_a: draft.statement_a,
            created_at_ms,
        }
    }
}

/// Win percentages recovered from a verdict. The two values are not
/// required to sum to 100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WinSplit {
    pub party_a: u32,
    pub party_b: u32,
}

impl WinSplit {
    pub fn outcome(&self) -> Outcome {
        match self.party_a.cmp(&self.party_b) {
            std::cmp::Ordering::Greater => Outcome::PartyA,
            std::cmp::Ordering::Less => Outcome::PartyB,
            std::cmp::Ordering::Equal => Outcome::Tie,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    PartyA,
    PartyB,
    Tie,
}

/// One delivered judgment. Append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerdictRecord {
    pub theme: Theme,
    pub party_a: Participant,
    pub party_b: Participant,
    pub statement_a: String,
    pub statement_b: String,
    pub verdict_text: String,
    pub language: String,
    #[serde(default)]
    pub win_split: Option<WinSplit>,
    #[serde(default)]
    pub case_token: Option<CaseToken>,
    pub created_at_ms: u64,
}

/// Which page of the two-step flow a link points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Collect,
    Respond,
}

/// Query parameters of a share link. Field names are part of the public
/// link format and must not change.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkParams {
    #[serde(default)]
    pub step: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub theme: Option<String>,
    #[serde(default)]
    pub user1_name: Option<String>,
    #[serde(default)]
    pub user2_name: Option<String>,
    /// Party A's statement, [`codec::encode`]d.
    #[serde(default)]
    pub user1_input: Option<String>,
    #[serde(default)]
    pub user1_email: Option<String>,
    #[serde(default)]
    pub user2_email: Option<String>,
    #[serde(default)]
    pub user1_phone: Option<String>,
    #[serde(default)]
    pub user2_phone: Option<String>,
}

impl LinkParams {
    pub fn step(&self) -> Step {
        match non_blank(&self.step) {
            Some("2") => Step::Respond,
            _ => Step::Collect,
        }
    }

    pub fn token(&self) -> Option<CaseToken> {
        non_blank(&self.token).map(CaseToken::new)
    }

    pub fn theme(&self) -> Option<Theme> {
        non_blank(&self.theme).and_then(|raw| raw.parse().ok())
    }
}

/// Trimmed value of an optional form/query field, `None` when blank.
pub fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

pub fn unix_ms_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn theme_parses_names_and_select_labels() {
        assert_eq!("Couple".parse::<Theme>().unwrap(), Theme::Couple);
        assert_eq!("friends".parse::<Theme>().unwrap(), Theme::Friends);
        assert_eq!("Pro 👨‍💼".parse::<Theme>().unwrap(), Theme::Pro);
        assert!("Enemies".parse::<Theme>().is_err());
        assert!("".parse::<Theme>().is_err());
    }

    #[test]
    fn win_split_outcome_exposes_tie() {
        let split = |a, b| WinSplit {
            party_a: a,
            party_b: b,
        };
        assert_eq!(split(70, 30).outcome(), Outcome::PartyA);
        assert_eq!(split(40, 60).outcome(), Outcome::PartyB);
        assert_eq!(split(50, 50).outcome(), Outcome::Tie);
    }

    #[test]
    fn link_params_step_defaults_to_collect() {
        let mut params = LinkParams::default();
        assert_eq!(params.step(), Step::Collect);
        params.step = Some("1".to_string());
        assert_eq!(params.step(), Step::Collect);
        params.step = Some(" 2 ".to_string());
        assert_eq!(params.step(), Step::Respond);
    }

    #[test]
    fn blank_token_is_absent() {
        let params = LinkParams {
            token: Some("   ".to_string()),
            ..Default::default()
        };
        assert_eq!(params.token(), None);
    }

    #[test]
    fn token_from_bytes_is_lower_hex() {
        let token = CaseToken::from_bytes(&[0x00, 0xab, 0x10, 0xff]);
        assert_eq!(token.as_str(), "00ab10ff");
    }

    #[test]
    fn verdict_record_serializes_outcome_fields() {
        let record = VerdictRecord {
            theme: Theme::Friends,
            party_a: Participant {
                name: "Alice".into(),
                email: "a@x.com".into(),
                phone: None,
            },
            party_b: Participant {
                name: "Bob".into(),
                email: "b@x.com".into(),
                phone: Some("+1 234".into()),
            },
            statement_a: "You never listen".into(),
            statement_b: "I do".into(),
            verdict_text: "Alice: 60%, Bob: 40%".into(),
            language: "eng".into(),
            win_split: Some(WinSplit {
                party_a: 60,
                party_b: 40,
            }),
            case_token: Some(CaseToken::new("abc")),
            created_at_ms: 1,
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["theme"], "Friends");
        assert_eq!(value["case_token"], "abc");
        assert_eq!(value["win_split"]["party_a"], 60);
        let back: VerdictRecord = serde_json::from_value(value).unwrap();
        assert_eq!(back, record);
    }
}
