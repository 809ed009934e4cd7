//! Process configuration, resolved once from CLI flags with environment
//! fallbacks (`FAIRFIGHT_*`, `OPENAI_API_KEY`).

use crate::flow::{FlowSettings, DEFAULT_MIN_STATEMENT_CHARS};
use anyhow::{Context as AnyhowContext, Result};
use clap::{Args, ValueEnum};
use fairfight_judge::{
    ChatClient, Judge, JudgeConfig, OpenAiChatClient, OpenAiConfig, StubChatClient,
    DEFAULT_API_BASE,
};
use fairfight_store::{CaseStore, JsonlStore, MemoryStore, SqliteStore};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_BIND: &str = "127.0.0.1:8080";
pub const DEFAULT_DATA_DIR: &str = ".fairfight";
pub const SQLITE_FILE_NAME: &str = "fairfight.sqlite3";

const STUB_VERDICT: &str = "JudgeBot is running in stub mode, so no model was consulted. \
                            Both of you deserve to be heard.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum StoreBackend {
    /// Append-only JSON lines files
    #[default]
    Jsonl,
    /// Single SQLite database file
    Sqlite,
    /// Process memory; lost on restart
    Memory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LlmMode {
    /// OpenAI-compatible chat-completion API
    #[default]
    Openai,
    /// Canned reply, no network
    Stub,
}

impl LlmMode {
    pub fn as_str(self) -> &'static str {
        match self {
            LlmMode::Openai => "openai",
            LlmMode::Stub => "stub",
        }
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct StoreArgs {
    /// Storage backend (env: FAIRFIGHT_STORE)
    #[arg(long, value_enum)]
    pub store: Option<StoreBackend>,

    /// Directory for store files (env: FAIRFIGHT_DATA_DIR, default: .fairfight)
    #[arg(long)]
    pub data_dir: Option<PathBuf>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct ServeArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    /// Bind address (env: FAIRFIGHT_BIND, default: 127.0.0.1:8080)
    #[arg(long)]
    pub bind: Option<String>,

    /// Public origin used in share links (env: FAIRFIGHT_BASE_URL)
    #[arg(long)]
    pub base_url: Option<String>,

    /// Verdict backend (env: FAIRFIGHT_LLM)
    #[arg(long, value_enum)]
    pub llm: Option<LlmMode>,

    /// Chat-completion API base URL (env: FAIRFIGHT_API_BASE)
    #[arg(long)]
    pub api_base: Option<String>,

    /// Chat model id (env: FAIRFIGHT_MODEL, default: gpt-4o)
    #[arg(long)]
    pub model: Option<String>,

    /// Sampling temperature (env: FAIRFIGHT_TEMPERATURE, default: 0.7)
    #[arg(long)]
    pub temperature: Option<f32>,

    /// LLM request timeout in seconds (env: FAIRFIGHT_LLM_TIMEOUT_SECS, default: 60)
    #[arg(long)]
    pub llm_timeout_secs: Option<u64>,

    /// Do not translate the judge instruction (env: FAIRFIGHT_TRANSLATE=0)
    #[arg(long)]
    pub no_translate: bool,

    /// Minimum length of the first statement (env: FAIRFIGHT_MIN_STATEMENT_CHARS, default: 10)
    #[arg(long)]
    pub min_statement_chars: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub data_dir: PathBuf,
}

impl StoreConfig {
    pub fn from_env(args: &StoreArgs) -> Result<Self> {
        Self::resolve(args, env_var)
    }

    pub fn resolve(args: &StoreArgs, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let backend = match args.store {
            Some(backend) => backend,
            None => match env("FAIRFIGHT_STORE") {
                Some(raw) => parse_store_backend(&raw)?,
                None => StoreBackend::default(),
            },
        };
        let data_dir = args
            .data_dir
            .clone()
            .or_else(|| env("FAIRFIGHT_DATA_DIR").map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));
        Ok(Self { backend, data_dir })
    }

    pub async fn open(&self) -> Result<Arc<dyn CaseStore>> {
        let store: Arc<dyn CaseStore> = match self.backend {
            StoreBackend::Jsonl => Arc::new(
                JsonlStore::open(&self.data_dir)
                    .await
                    .with_context(|| format!("Failed to open {}", self.data_dir.display()))?,
            ),
            StoreBackend::Sqlite => {
                let path = self.data_dir.join(SQLITE_FILE_NAME);
                Arc::new(
                    SqliteStore::open(&path)
                        .with_context(|| format!("Failed to open {}", path.display()))?,
                )
            }
            StoreBackend::Memory => Arc::new(MemoryStore::new()),
        };
        Ok(store)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LlmConfig {
    pub mode: LlmMode,
    pub api_base: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
    pub judge: JudgeConfig,
}

impl LlmConfig {
    pub fn chat_client(&self) -> Result<Arc<dyn ChatClient>> {
        let client: Arc<dyn ChatClient> = match self.mode {
            LlmMode::Stub => Arc::new(StubChatClient::replying(STUB_VERDICT)),
            LlmMode::Openai => {
                let api_key = self
                    .api_key
                    .clone()
                    .context("OPENAI_API_KEY is not set (use --llm stub to run without a model)")?;
                Arc::new(OpenAiChatClient::new(OpenAiConfig {
                    api_base: self.api_base.clone(),
                    api_key,
                    timeout: self.timeout,
                })?)
            }
        };
        Ok(client)
    }

    pub fn build_judge(&self) -> Result<Judge> {
        let mut judge_config = self.judge.clone();
        if self.mode == LlmMode::Stub {
            judge_config.translate_instructions = false;
        }
        Ok(Judge::new(self.chat_client()?, judge_config))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub bind: String,
    pub flow: FlowSettings,
    pub store: StoreConfig,
    pub llm: LlmConfig,
}

impl AppConfig {
    pub fn from_env(args: &ServeArgs) -> Result<Self> {
        Self::resolve(args, env_var)
    }

    pub fn resolve(args: &ServeArgs, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let store = StoreConfig::resolve(&args.store, &env)?;

        let bind = args
            .bind
            .clone()
            .or_else(|| env("FAIRFIGHT_BIND"))
            .unwrap_or_else(|| DEFAULT_BIND.to_string());
        let base_url = args
            .base_url
            .clone()
            .or_else(|| env("FAIRFIGHT_BASE_URL"))
            .unwrap_or_else(|| format!("http://{bind}"));
        let min_statement_chars = match args.min_statement_chars {
            Some(value) => value,
            None => parse_env(&env, "FAIRFIGHT_MIN_STATEMENT_CHARS")?
                .unwrap_or(DEFAULT_MIN_STATEMENT_CHARS),
        };

        let mode = match args.llm {
            Some(mode) => mode,
            None => match env("FAIRFIGHT_LLM") {
                Some(raw) => parse_llm_mode(&raw)?,
                None => LlmMode::default(),
            },
        };
        let defaults = JudgeConfig::default();
        let judge = JudgeConfig {
            model: args
                .model
                .clone()
                .or_else(|| env("FAIRFIGHT_MODEL"))
                .unwrap_or(defaults.model),
            temperature: match args.temperature {
                Some(value) => value,
                None => parse_env(&env, "FAIRFIGHT_TEMPERATURE")?.unwrap_or(defaults.temperature),
            },
            translate_instructions: !args.no_translate
                && env("FAIRFIGHT_TRANSLATE").map_or(defaults.translate_instructions, |v| {
                    truthy(&v)
                }),
        };
        judge.validate().map_err(anyhow::Error::msg)?;

        let timeout_secs = match args.llm_timeout_secs {
            Some(value) => value,
            None => parse_env(&env, "FAIRFIGHT_LLM_TIMEOUT_SECS")?.unwrap_or(60),
        };
        let llm = LlmConfig {
            mode,
            api_base: args
                .api_base
                .clone()
                .or_else(|| env("FAIRFIGHT_API_BASE"))
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            api_key: env("OPENAI_API_KEY").filter(|key| !key.trim().is_empty()),
            timeout: Duration::from_secs(timeout_secs),
            judge,
        };

        Ok(Self {
            bind,
            flow: FlowSettings {
                base_url,
                min_statement_chars,
            },
            store,
            llm,
        })
    }
}

fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

fn parse_env<T>(env: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    env(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .with_context(|| format!("Invalid {key}: {raw:?}"))
        })
        .transpose()
}

fn parse_store_backend(value: &str) -> Result<StoreBackend> {
    match value.trim().to_lowercase().as_str() {
        "jsonl" => Ok(StoreBackend::Jsonl),
        "sqlite" => Ok(StoreBackend::Sqlite),
        "memory" => Ok(StoreBackend::Memory),
        other => anyhow::bail!("Unsupported store backend: {other}"),
    }
}

fn parse_llm_mode(value: &str) -> Result<LlmMode> {
    match value.trim().to_lowercase().as_str() {
        "openai" => Ok(LlmMode::Openai),
        "stub" => Ok(LlmMode::Stub),
        other => anyhow::bail!("Unsupported LLM mode: {other}"),
    }
}

fn truthy(value: &str) -> bool {
    let value = value.trim();
    value == "1" || value.eq_ignore_ascii_case("true") || value.eq_ignore_ascii_case("yes")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_without_flags_or_env() {
        let config = AppConfig::resolve(&ServeArgs::default(), env_from(&[])).unwrap();
        assert_eq!(config.bind, DEFAULT_BIND);
        assert_eq!(config.flow.base_url, "http://127.0.0.1:8080");
        assert_eq!(config.flow.min_statement_chars, 10);
        assert_eq!(config.store.backend, StoreBackend::Jsonl);
        assert_eq!(config.store.data_dir, PathBuf::from(".fairfight"));
        assert_eq!(config.llm.mode, LlmMode::Openai);
        assert_eq!(config.llm.api_key, None);
        assert_eq!(config.llm.timeout, Duration::from_secs(60));
        assert_eq!(config.llm.judge.model, "gpt-4o");
        assert!(config.llm.judge.translate_instructions);
    }

    #[test]
    fn env_fills_what_flags_leave_open() {
        let env = env_from(&[
            ("FAIRFIGHT_STORE", "SQLite"),
            ("FAIRFIGHT_BASE_URL", "https://fairfight.example"),
            ("FAIRFIGHT_TEMPERATURE", "0.2"),
            ("FAIRFIGHT_TRANSLATE", "0"),
            ("FAIRFIGHT_MODEL", "gpt-4o-mini"),
            ("OPENAI_API_KEY", "sk-test"),
        ]);
        let args = ServeArgs {
            model: Some("gpt-4.1".into()),
            ..ServeArgs::default()
        };
        let config = AppConfig::resolve(&args, env).unwrap();
        assert_eq!(config.store.backend, StoreBackend::Sqlite);
        assert_eq!(config.flow.base_url, "https://fairfight.example");
        assert_eq!(config.llm.judge.model, "gpt-4.1");
        assert!((config.llm.judge.temperature - 0.2).abs() < f32::EPSILON);
        assert!(!config.llm.judge.translate_instructions);
        assert_eq!(config.llm.api_key.as_deref(), Some("sk-test"));
    }

    #[test]
    fn malformed_env_values_are_errors() {
        assert!(AppConfig::resolve(
            &ServeArgs::default(),
            env_from(&[("FAIRFIGHT_MIN_STATEMENT_CHARS", "ten")])
        )
        .is_err());
        assert!(AppConfig::resolve(
            &ServeArgs::default(),
            env_from(&[("FAIRFIGHT_STORE", "postgres")])
        )
        .is_err());
        assert!(AppConfig::resolve(
            &ServeArgs::default(),
            env_from(&[("FAIRFIGHT_TEMPERATURE", "9")])
        )
        .is_err());
    }

    #[test]
    fn openai_mode_requires_a_key() {
        let config = AppConfig::resolve(&ServeArgs::default(), env_from(&[])).unwrap();
        assert!(config.llm.build_judge().is_err());

        let args = ServeArgs {
            llm: Some(LlmMode::Stub),
            ..ServeArgs::default()
        };
        let config = AppConfig::resolve(&args, env_from(&[])).unwrap();
        let judge = config.llm.build_judge().unwrap();
        assert!(!judge.config().translate_instructions);
    }

    #[tokio::test]
    async fn memory_store_opens_without_touching_disk() {
        let config = StoreConfig::resolve(
            &StoreArgs {
                store: Some(StoreBackend::Memory),
                data_dir: Some(PathBuf::from("/nonexistent/never-created")),
            },
            env_from(&[]),
        )
        .unwrap();
        let store = config.open().await.unwrap();
        assert_eq!(store.backend_name(), "memory");
    }
}
