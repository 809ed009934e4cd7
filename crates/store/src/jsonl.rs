use crate::error::Result;
use crate::{fresh_token, CaseStore};
use async_trait::async_trait;
use fairfight_protocol::{unix_ms_now, Case, CaseDraft, CaseToken, VerdictRecord};
use fs2::FileExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

pub const CASES_FILE_NAME: &str = "pending_cases.jsonl";
pub const VERDICTS_FILE_NAME: &str = "verdicts.jsonl";

/// Line-delimited JSON log: one file for cases, one for verdicts.
#[derive(Debug, Clone)]
pub struct JsonlStore {
    cases_path: PathBuf,
    verdicts_path: PathBuf,
}

impl JsonlStore {
    pub async fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        tokio::fs::create_dir_all(dir).await?;
        log::info!("Opening JSONL store at {}", dir.display());
        Ok(Self {
            cases_path: dir.join(CASES_FILE_NAME),
            verdicts_path: dir.join(VERDICTS_FILE_NAME),
        })
    }

    pub fn cases_path(&self) -> &Path {
        &self.cases_path
    }

    pub fn verdicts_path(&self) -> &Path {
        &self.verdicts_path
    }
}

#[async_trait]
impl CaseStore for JsonlStore {
    async fn create_case(&self, draft: CaseDraft) -> Result<CaseToken> {
        let token = fresh_token()?;
        let case = Case::from_draft(draft, token.clone(), unix_ms_now());
        append_record(self.cases_path.clone(), &case).await?;
        log::debug!("Stored case {token} in {}", self.cases_path.display());
        Ok(token)
    }

    async fn find_case(&self, token: &CaseToken) -> Result<Option<Case>> {
        let cases: Vec<Case> = read_records(self.cases_path.clone()).await?;
        Ok(cases.into_iter().rev().find(|case| &case.token == token))
    }

    async fn append_verdict(&self, record: &VerdictRecord) -> Result<()> {
        append_record(self.verdicts_path.clone(), record).await
    }

    async fn recent_verdicts(&self, limit: usize) -> Result<Vec<VerdictRecord>> {
        let mut verdicts: Vec<VerdictRecord> = read_records(self.verdicts_path.clone()).await?;
        verdicts.reverse();
        verdicts.truncate(limit);
        Ok(verdicts)
    }

    fn backend_name(&self) -> &'static str {
        "jsonl"
    }
}

async fn append_record<T: Serialize>(path: PathBuf, record: &T) -> Result<()> {
    let mut line = serde_json::to_string(record)?;
    line.push('\n');
    tokio::task::spawn_blocking(move || append_line(&path, line.as_bytes())).await?
}

/// Whole line in one `write_all` under an exclusive lock, so concurrent
/// writers never interleave inside a record.
fn append_line(path: &Path, line: &[u8]) -> Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.lock_exclusive()?;
    let written = file.write_all(line).and_then(|_| file.flush());
    let _ = file.unlock();
    written?;
    Ok(())
}

async fn read_records<T: DeserializeOwned + Send + 'static>(path: PathBuf) -> Result<Vec<T>> {
    tokio::task::spawn_blocking(move || read_lines(&path)).await?
}

fn read_lines<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let mut file = match File::open(path) {
        Ok(file) => file,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(err.into()),
    };
    file.lock_shared()?;
    let mut raw = Vec::new();
    let read = file.read_to_end(&mut raw);
    let _ = file.unlock();
    read?;

    // Bytes, not text: one bad byte only costs its own line.
    let mut records = Vec::new();
    for (idx, line) in raw.split(|byte| *byte == b'\n').enumerate() {
        if line.iter().all(u8::is_ascii_whitespace) {
            continue;
        }
        match serde_json::from_slice(line) {
            Ok(record) => records.push(record),
            Err(err) => log::warn!(
                "Skipping corrupt record at {}:{}: {err}",
                path.display(),
                idx + 1
            ),
        }
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fairfight_protocol::{Participant, Theme};
    use tempfile::TempDir;

    fn draft(statement: &str) -> CaseDraft {
        CaseDraft {
            theme: Theme::Pro,
            party_a: Participant {
                name: "Alice".into(),
                email: "a@x.com".into(),
                phone: None,
            },
            party_b: Participant {
                name: "Bob".into(),
                email: "b@x.com".into(),
                phone: None,
            },
            statement_a: statement.into(),
        }
    }

    #[tokio::test]
    async fn corrupt_lines_are_skipped() {
        let temp = TempDir::new().unwrap();
        let store = JsonlStore::open(temp.path()).await.unwrap();
        let token = store
            .create_case(draft("You took credit for my slides"))
            .await
            .unwrap();

        let mut file = OpenOptions::new()
            .append(true)
            .open(store.cases_path())
            .unwrap();
        file.write_all(b"{not json\n\n").unwrap();

        let found = store.find_case(&token).await.unwrap().unwrap();
        assert_eq!(found.statement_a, "You took credit for my slides");
    }

    #[tokio::test]
    async fn invalid_utf8_line_is_skipped() {
        let temp = TempDir::new().unwrap();
        let store = JsonlStore::open(temp.path()).await.unwrap();
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(store.cases_path())
            .unwrap();
        file.write_all(b"{\"token\":\"\xff\xfe\"}\n").unwrap();
        let token = store
            .create_case(draft("You took credit for my slides"))
            .await
            .unwrap();

        let found = store.find_case(&token).await.unwrap().unwrap();
        assert_eq!(found.statement_a, "You took credit for my slides");
    }

    #[tokio::test]
    async fn missing_files_read_as_empty() {
        let temp = TempDir::new().unwrap();
        let store = JsonlStore::open(temp.path().join("nested")).await.unwrap();
        assert!(store
            .find_case(&CaseToken::new("nope"))
            .await
            .unwrap()
            .is_none());
        assert!(store.recent_verdicts(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn later_record_wins_for_duplicate_token() {
        let temp = TempDir::new().unwrap();
        let store = JsonlStore::open(temp.path()).await.unwrap();
        let token = CaseToken::new("dup");
        let first = Case::from_draft(draft("first version"), token.clone(), 1);
        let second = Case::from_draft(draft("second version"), token.clone(), 2);
        append_record(store.cases_path().to_path_buf(), &first)
            .await
            .unwrap();
        append_record(store.cases_path().to_path_buf(), &second)
            .await
            .unwrap();

        let found = store.find_case(&token).await.unwrap().unwrap();
        assert_eq!(found.statement_a, "second version");
    }
}
