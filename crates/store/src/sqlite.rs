use crate::error::{Result, StoreError};
use crate::{fresh_token, CaseStore};
use async_trait::async_trait;
use fairfight_protocol::{
    unix_ms_now, Case, CaseDraft, CaseToken, Participant, Theme, VerdictRecord, WinSplit,
};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Arc, Mutex};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS cases (
    token         TEXT PRIMARY KEY,
    theme         TEXT NOT NULL,
    user1_name    TEXT NOT NULL,
    user1_email   TEXT NOT NULL,
    user1_phone   TEXT,
    user2_name    TEXT NOT NULL,
    user2_email   TEXT NOT NULL,
    user2_phone   TEXT,
    user1_input   TEXT NOT NULL,
    created_at_ms INTEGER NOT NULL
);
CREATE TABLE IF NOT EXISTS verdicts (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    theme         TEXT NOT NULL,
    user1_name    TEXT NOT NULL,
    user1_email   TEXT NOT NULL,
    user1_phone   TEXT,
    user2_name    TEXT NOT NULL,
    user2_email   TEXT NOT NULL,
    user2_phone   TEXT,
    user1_input   TEXT NOT NULL,
    user2_input   TEXT NOT NULL,
    verdict       TEXT NOT NULL,
    language      TEXT NOT NULL,
    win_pct_a     INTEGER,
    win_pct_b     INTEGER,
    case_token    TEXT,
    created_at_ms INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS verdicts_created_at ON verdicts(created_at_ms);
";

/// Relational backend. One connection, serialized behind a mutex; each write
/// is a single INSERT.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        log::info!("Opening SQLite store at {}", path.display());
        Self::from_connection(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    async fn with_conn<T, F>(&self, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let guard = conn
                .lock()
                .map_err(|_| StoreError::Other("sqlite connection lock poisoned".to_string()))?;
            op(&guard)
        })
        .await?
    }
}

#[async_trait]
impl CaseStore for SqliteStore {
    async fn create_case(&self, draft: CaseDraft) -> Result<CaseToken> {
        let token = fresh_token()?;
        let case = Case::from_draft(draft, token.clone(), unix_ms_now());
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO cases (token, theme, user1_name, user1_email, user1_phone,
                                    user2_name, user2_email, user2_phone, user1_input, created_at_ms)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    case.token.as_str(),
                    case.theme.as_str(),
                    case.party_a.name,
                    case.party_a.email,
                    case.party_a.phone,
                    case.party_b.name,
                    case.party_b.email,
                    case.party_b.phone,
                    case.statement_a,
                    ms_to_sql(case.created_at_ms),
                ],
            )?;
            Ok(())
        })
        .await?;
        Ok(token)
    }

    async fn find_case(&self, token: &CaseToken) -> Result<Option<Case>> {
        let token = token.clone();
        self.with_conn(move |conn| {
            let case = conn
                .query_row(
                    "SELECT token, theme, user1_name, user1_email, user1_phone,
                            user2_name, user2_email, user2_phone, user1_input, created_at_ms
                     FROM cases WHERE token = ?1",
                    params![token.as_str()],
                    case_from_row,
                )
                .optional()?;
            Ok(case)
        })
        .await
    }

    async fn append_verdict(&self, record: &VerdictRecord) -> Result<()> {
        let record = record.clone();
        self.with_conn(move |conn| {
            let (pct_a, pct_b) = match record.win_split {
                Some(split) => (Some(split.party_a), Some(split.party_b)),
                None => (None, None),
            };
            conn.execute(
                "INSERT INTO verdicts (theme, user1_name, user1_email, user1_phone,
                                       user2_name, user2_email, user2_phone,
                                       user1_input, user2_input, verdict, language,
                                       win_pct_a, win_pct_b, case_token, created_at_ms)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
                params![
                    record.theme.as_str(),
                    record.party_a.name,
                    record.party_a.email,
                    record.party_a.phone,
                    record.party_b.name,
                    record.party_b.email,
                    record.party_b.phone,
                    record.statement_a,
                    record.statement_b,
                    record.verdict_text,
                    record.language,
                    pct_a,
                    pct_b,
                    record.case_token.as_ref().map(CaseToken::as_str),
                    ms_to_sql(record.created_at_ms),
                ],
            )?;
            Ok(())
        })
        .await
    }

    async fn recent_verdicts(&self, limit: usize) -> Result<Vec<VerdictRecord>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        self.with_conn(move |conn| {
            let mut statement = conn.prepare(
                "SELECT theme, user1_name, user1_email, user1_phone,
                        user2_name, user2_email, user2_phone,
                        user1_input, user2_input, verdict, language,
                        win_pct_a, win_pct_b, case_token, created_at_ms
                 FROM verdicts ORDER BY created_at_ms DESC, id DESC LIMIT ?1",
            )?;
            let rows = statement.query_map(params![limit], verdict_from_row)?;
            let mut verdicts = Vec::new();
            for row in rows {
                verdicts.push(row?);
            }
            Ok(verdicts)
        })
        .await
    }

    fn backend_name(&self) -> &'static str {
        "sqlite"
    }
}

fn ms_to_sql(ms: u64) -> i64 {
    i64::try_from(ms).unwrap_or(i64::MAX)
}

fn ms_from_sql(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}

fn theme_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Theme> {
    let raw: String = row.get(idx)?;
    raw.parse()
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err)))
}

fn case_from_row(row: &Row<'_>) -> rusqlite::Result<Case> {
    Ok(Case {
        token: CaseToken::new(row.get::<_, String>(0)?),
        theme: theme_column(row, 1)?,
        party_a: Participant {
            name: row.get(2)?,
            email: row.get(3)?,
            phone: row.get(4)?,
        },
        party_b: Participant {
            name: row.get(5)?,
            email: row.get(6)?,
            phone: row.get(7)?,
        },
        statement_a: row.get(8)?,
        created_at_ms: ms_from_sql(row.get(9)?),
    })
}

fn verdict_from_row(row: &Row<'_>) -> rusqlite::Result<VerdictRecord> {
    let pct_a: Option<u32> = row.get(11)?;
    let pct_b: Option<u32> = row.get(12)?;
    Ok(VerdictRecord {
        theme: theme_column(row, 0)?,
        party_a: Participant {
            name: row.get(1)?,
            email: row.get(2)?,
            phone: row.get(3)?,
        },
        party_b: Participant {
            name: row.get(4)?,
            email: row.get(5)?,
            phone: row.get(6)?,
        },
        statement_a: row.get(7)?,
        statement_b: row.get(8)?,
        verdict_text: row.get(9)?,
        language: row.get(10)?,
        win_split: pct_a.zip(pct_b).map(|(party_a, party_b)| WinSplit { party_a, party_b }),
        case_token: row.get::<_, Option<String>>(13)?.map(CaseToken::new),
        created_at_ms: ms_from_sql(row.get(14)?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unknown_theme_in_table_is_a_conversion_error() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .with_conn(|conn| {
                conn.execute(
                    "INSERT INTO cases (token, theme, user1_name, user1_email, user2_name,
                                        user2_email, user1_input, created_at_ms)
                     VALUES ('t1', 'Enemies', 'A', 'a@x', 'B', 'b@x', 'text', 1)",
                    [],
                )?;
                Ok(())
            })
            .await
            .unwrap();

        let err = store.find_case(&CaseToken::new("t1")).await.unwrap_err();
        assert!(matches!(err, StoreError::SqliteError(_)), "{err}");
    }

    #[tokio::test]
    async fn verdict_without_split_reads_back_as_none() {
        let store = SqliteStore::open_in_memory().unwrap();
        let record = VerdictRecord {
            theme: Theme::Couple,
            party_a: Participant {
                name: "Alice".into(),
                email: "a@x.com".into(),
                phone: Some("+1 555".into()),
            },
            party_b: Participant {
                name: "Bob".into(),
                email: "b@x.com".into(),
                phone: None,
            },
            statement_a: "You never listen to me".into(),
            statement_b: "I do listen, you interrupt".into(),
            verdict_text: "Both of you have a point.".into(),
            language: "eng".into(),
            win_split: None,
            case_token: None,
            created_at_ms: 42,
        };
        store.append_verdict(&record).await.unwrap();

        let recent = store.recent_verdicts(5).await.unwrap();
        assert_eq!(recent, vec![record]);
    }
}
