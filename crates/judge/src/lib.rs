//! # FairFight Judge
//!
//! JudgeBot: turns two statements into a verdict with one chat-completion
//! call, and recovers the win split the model was asked to state.
//!
//! ## Architecture
//!
//! ```text
//! JudgeRequest (theme, names, statements)
//!     │
//!     ├──> Language detection (whatlang)
//!     │      └─> optional instruction translation via the chat model
//!     │
//!     ├──> ChatClient (OpenAI-compatible HTTP, or scripted stub)
//!     │      └─> verdict text, or a fail-soft diagnostic
//!     │
//!     └──> extract_percentages(verdict, name_a, name_b)
//!            └─> Option<WinSplit>
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use fairfight_judge::{Judge, JudgeConfig, JudgeRequest, StubChatClient};
//! use fairfight_protocol::Theme;
//! use std::sync::Arc;
//!
//! # async fn run() {
//! let judge = Judge::new(
//!     Arc::new(StubChatClient::replying("Alice: 60%, Bob: 40%")),
//!     JudgeConfig::default(),
//! );
//! let verdict = judge
//!     .judge(&JudgeRequest {
//!         theme: Theme::Couple,
//!         name_a: "Alice".into(),
//!         statement_a: "You never listen to me".into(),
//!         name_b: "Bob".into(),
//!         statement_b: "I do listen, you interrupt".into(),
//!     })
//!     .await;
//! let split = fairfight_judge::extract_percentages(&verdict.text, "Alice", "Bob");
//! # }
//! ```

mod chat;
mod engine;
mod error;
mod extract;
mod language;
mod prompt;

pub use chat::{
    ChatClient, ChatMessage, ChatRequest, ChatRole, OpenAiChatClient, OpenAiConfig,
    StubChatClient, DEFAULT_API_BASE,
};
pub use engine::{Judge, JudgeConfig, JudgeRequest, Judgement};
pub use error::{JudgeError, Result};
pub use extract::extract_percentages;
pub use language::{
    detect_language, speech_tag, ChatTranslator, DetectedLanguage, Translator,
};
