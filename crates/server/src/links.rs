//! Share links and notification deep-links.
//!
//! Everything here is string formatting. Links are rendered for the user to
//! click; nothing is sent from the server.

use fairfight_protocol::{codec, CaseDraft, CaseToken, Participant};
use url::form_urlencoded;

pub const INVITATION_SUBJECT: &str = "FairFight Conflict";
pub const VERDICT_SUBJECT: &str = "FairFight AI Verdict";

/// A rendered notification link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeepLink {
    pub label: String,
    pub href: String,
}

pub fn mailto(address: &str, subject: &str, body: &str) -> String {
    format!(
        "mailto:{address}?subject={}&body={}",
        urlencoding::encode(subject),
        urlencoding::encode(body)
    )
}

/// `https://wa.me` link; `+`, `-` and spaces are stripped from the number.
pub fn whatsapp(phone: &str, message: &str) -> String {
    let digits: String = phone
        .chars()
        .filter(|c| !matches!(c, '+' | '-' | ' '))
        .collect();
    format!(
        "https://wa.me/{digits}?text={}",
        urlencoding::encode(message)
    )
}

/// Primary step-2 link: only the case token travels in the URL.
pub fn share_link(base_url: &str, token: &CaseToken) -> String {
    let query = form_urlencoded::Serializer::new(String::new())
        .append_pair("step", "2")
        .append_pair("token", token.as_str())
        .finish();
    format!("{}/?{query}", base(base_url))
}

/// Step-2 link that carries the whole case, statement base64url-encoded.
/// Works without the store but is long and easy to mangle.
pub fn fallback_link(base_url: &str, draft: &CaseDraft) -> String {
    let encoded = codec::encode(&draft.statement_a);
    let query = form_urlencoded::Serializer::new(String::new())
        .append_pair("step", "2")
        .append_pair("theme", draft.theme.as_str())
        .append_pair("user1_name", &draft.party_a.name)
        .append_pair("user2_name", &draft.party_b.name)
        .append_pair("user1_input", &encoded)
        .append_pair("user1_email", &draft.party_a.email)
        .append_pair("user2_email", &draft.party_b.email)
        .append_pair("user1_phone", draft.party_a.phone.as_deref().unwrap_or_default())
        .append_pair("user2_phone", draft.party_b.phone.as_deref().unwrap_or_default())
        .finish();
    format!("{}/?{query}", base(base_url))
}

pub fn invitation_message(draft: &CaseDraft, link: &str) -> String {
    format!(
        "Hello {b},\n\n{a} has submitted a conflict on FairFight AI.\n\n\
         Click to share your version and get JudgeBot's verdict:\n\n{link}\n\n🤖 FairFight AI",
        a = draft.party_a.name,
        b = draft.party_b.name,
    )
}

pub fn verdict_message(party_a: &str, party_b_name: &str, verdict: &str) -> String {
    format!(
        "Hello {party_a},\n\n🎯 The conflict between you and {party_b_name} has been analyzed by JudgeBot.\n\n\
         Here is the verdict:\n{verdict}\n\n🤖 FairFight AI – Objective Conflict Resolution"
    )
}

/// Deep-links that invite party B to respond.
pub fn invitation_links(draft: &CaseDraft, link: &str) -> Vec<DeepLink> {
    let message = invitation_message(draft, link);
    let to = &draft.party_b;
    contact_links(
        to,
        INVITATION_SUBJECT,
        &message,
        format!("📧 Email to {}", to.name),
        format!("📲 WhatsApp to {}", to.name),
    )
}

/// Deep-links that tell party A the verdict is in.
pub fn verdict_links(party_a: &Participant, party_b_name: &str, verdict: &str) -> Vec<DeepLink> {
    let message = verdict_message(&party_a.name, party_b_name, verdict);
    contact_links(
        party_a,
        VERDICT_SUBJECT,
        &message,
        format!("📧 Notify {} by Email", party_a.name),
        format!("📲 Notify {} on WhatsApp", party_a.name),
    )
}

fn contact_links(
    to: &Participant,
    subject: &str,
    message: &str,
    email_label: String,
    whatsapp_label: String,
) -> Vec<DeepLink> {
    let mut links = Vec::new();
    let email = to.email.trim();
    if !email.is_empty() {
        links.push(DeepLink {
            label: email_label,
            href: mailto(email, subject, message),
        });
    }
    if let Some(phone) = to.phone.as_deref().map(str::trim).filter(|p| !p.is_empty()) {
        links.push(DeepLink {
            label: whatsapp_label,
            href: whatsapp(phone, message),
        });
    }
    links
}

fn base(base_url: &str) -> &str {
    base_url.trim_end_matches('/')
}
