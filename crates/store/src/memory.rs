use crate::error::{Result, StoreError};
use crate::{fresh_token, CaseStore};
use async_trait::async_trait;
use fairfight_protocol::{unix_ms_now, Case, CaseDraft, CaseToken, VerdictRecord};
use std::sync::{Mutex, MutexGuard};

/// Process-local store. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    cases: Mutex<Vec<Case>>,
    verdicts: Mutex<Vec<VerdictRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every verdict appended so far, oldest first.
    pub fn verdicts(&self) -> Result<Vec<VerdictRecord>> {
        Ok(lock(&self.verdicts)?.clone())
    }

    pub fn case_count(&self) -> Result<usize> {
        Ok(lock(&self.cases)?.len())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>> {
    mutex
        .lock()
        .map_err(|_| StoreError::Other("memory store lock poisoned".to_string()))
}

#[async_trait]
impl CaseStore for MemoryStore {
    async fn create_case(&self, draft: CaseDraft) -> Result<CaseToken> {
        let token = fresh_token()?;
        let case = Case::from_draft(draft, token.clone(), unix_ms_now());
        lock(&self.cases)?.push(case);
        Ok(token)
    }

    async fn find_case(&self, token: &CaseToken) -> Result<Option<Case>> {
        Ok(lock(&self.cases)?
            .iter()
            .rev()
            .find(|case| &case.token == token)
            .cloned())
    }

    async fn append_verdict(&self, record: &VerdictRecord) -> Result<()> {
        lock(&self.verdicts)?.push(record.clone());
        Ok(())
    }

    async fn recent_verdicts(&self, limit: usize) -> Result<Vec<VerdictRecord>> {
        Ok(lock(&self.verdicts)?
            .iter()
            .rev()
            .take(limit)
            .cloned()
            .collect())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
