//! # FairFight Store
//!
//! Append-only persistence for step-1 cases and delivered verdicts.
//!
//! Every backend implements [`CaseStore`], so the flow never knows which one
//! it is talking to:
//!
//! ```text
//! CaseStore
//!     ├──> JsonlStore   pending_cases.jsonl + verdicts.jsonl, one locked append per record
//!     ├──> SqliteStore  `cases` + `verdicts` tables, one INSERT per record
//!     └──> MemoryStore  process-local, for tests and throwaway servers
//! ```
//!
//! Records are never updated or deleted.

use async_trait::async_trait;
use fairfight_protocol::{Case, CaseDraft, CaseToken, VerdictRecord};

mod error;
mod jsonl;
mod memory;
mod sqlite;

pub use error::{Result, StoreError};
pub use jsonl::JsonlStore;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Random bytes behind every case token (128 bits).
pub const TOKEN_BYTES: usize = 16;

#[async_trait]
pub trait CaseStore: Send + Sync {
    /// Store a new case under a fresh token and return that token.
    async fn create_case(&self, draft: CaseDraft) -> Result<CaseToken>;

    /// Look up a case; the most recently appended match wins.
    async fn find_case(&self, token: &CaseToken) -> Result<Option<Case>>;

    async fn append_verdict(&self, record: &VerdictRecord) -> Result<()>;

    /// Newest first, at most `limit` records.
    async fn recent_verdicts(&self, limit: usize) -> Result<Vec<VerdictRecord>>;

    /// Short backend name for logs and health output.
    fn backend_name(&self) -> &'static str;
}

pub fn fresh_token() -> Result<CaseToken> {
    let mut bytes = [0u8; TOKEN_BYTES];
    getrandom::getrandom(&mut bytes).map_err(|err| StoreError::TokenError(err.to_string()))?;
    Ok(CaseToken::from_bytes(&bytes))
}
