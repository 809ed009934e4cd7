use crate::error::{JudgeError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";

/// Longest slice of an error body kept in [`JudgeError::ApiError`].
const MAX_ERROR_BODY_CHARS: usize = 400;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }
}

/// OpenAI-compatible chat-completion request body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
}

#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Returns the text of the first completion choice.
    async fn complete(&self, request: &ChatRequest) -> Result<String>;
}

#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// Base URL up to and including the version segment, e.g. `https://api.groq.com/openai/v1`.
    pub api_base: String,
    pub api_key: String,
    pub timeout: Duration,
}

/// Client for any endpoint speaking the OpenAI `/chat/completions` dialect.
pub struct OpenAiChatClient {
    http: Client,
    endpoint: String,
    api_key: String,
}

impl OpenAiChatClient {
    pub fn new(config: OpenAiConfig) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            return Err(JudgeError::invalid_config("chat API key must be non-empty"));
        }
        let http = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            http,
            endpoint: format!("{}/chat/completions", config.api_base.trim_end_matches('/')),
            api_key: config.api_key.trim().to_string(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    #[serde(default)]
    content: Option<String>,
}

#[async_trait]
impl ChatClient for OpenAiChatClient {
    async fn complete(&self, request: &ChatRequest) -> Result<String> {
        log::debug!(
            "POST {} (model={}, messages={})",
            self.endpoint,
            request.model,
            request.messages.len()
        );
        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(JudgeError::ApiError {
                status: status.as_u16(),
                body: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
            });
        }

        let bytes = response.bytes().await?;
        completion_text(serde_json::from_slice(&bytes)?)
    }
}

fn completion_text(response: CompletionResponse) -> Result<String> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .filter(|text| !text.trim().is_empty())
        .ok_or(JudgeError::EmptyCompletion)
}

#[derive(Debug, Clone)]
enum StubReply {
    Text(String),
    Failure(String),
}

/// Scripted chat backend for tests and offline runs. Replies are consumed in
/// order; once the script is exhausted the fallback reply repeats.
/// Every request is recorded.
#[derive(Debug)]
pub struct StubChatClient {
    script: Mutex<VecDeque<StubReply>>,
    fallback: StubReply,
    requests: Mutex<Vec<ChatRequest>>,
}

impl StubChatClient {
    pub fn replying(text: impl Into<String>) -> Self {
        Self::with_fallback(StubReply::Text(text.into()))
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self::with_fallback(StubReply::Failure(message.into()))
    }

    fn with_fallback(fallback: StubReply) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue a reply ahead of the fallback.
    pub fn then_reply(self, text: impl Into<String>) -> Self {
        self.push(StubReply::Text(text.into()))
    }

    /// Queue a failure ahead of the fallback.
    pub fn then_fail(self, message: impl Into<String>) -> Self {
        self.push(StubReply::Failure(message.into()))
    }

    fn push(self, reply: StubReply) -> Self {
        if let Ok(mut script) = self.script.lock() {
            script.push_back(reply);
        }
        self
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl ChatClient for StubChatClient {
    async fn complete(&self, request: &ChatRequest) -> Result<String> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }
        let reply = self
            .script
            .lock()
            .ok()
            .and_then(|mut script| script.pop_front())
            .unwrap_or_else(|| self.fallback.clone());
        match reply {
            StubReply::Text(text) => Ok(text),
            StubReply::Failure(message) => Err(JudgeError::Other(message)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> ChatRequest {
        ChatRequest {
            model: "gpt-4o".to_string(),
            messages: vec![ChatMessage::system("be fair"), ChatMessage::user("hi")],
            temperature: 0.7,
        }
    }

    #[test]
    fn request_serializes_in_openai_shape() {
        let value = serde_json::to_value(request()).unwrap();
        assert_eq!(value["model"], "gpt-4o");
        assert_eq!(value["messages"][0]["role"], "system");
        assert_eq!(value["messages"][1]["role"], "user");
        assert_eq!(value["messages"][1]["content"], "hi");
        assert!((value["temperature"].as_f64().unwrap() - 0.7).abs() < 1e-6);
    }

    #[test]
    fn completion_text_reads_first_choice() {
        let raw = r#"{"id":"x","choices":[{"index":0,"message":{"role":"assistant","content":"Alice: 60%"}}]}"#;
        let parsed: CompletionResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(completion_text(parsed).unwrap(), "Alice: 60%");
    }

    #[test]
    fn missing_or_blank_completion_is_an_error() {
        for raw in [
            r#"{"choices":[]}"#,
            r#"{}"#,
            r#"{"choices":[{"message":{"role":"assistant","content":"  "}}]}"#,
            r#"{"choices":[{"message":{"role":"assistant","content":null}}]}"#,
        ] {
            let parsed: CompletionResponse = serde_json::from_str(raw).unwrap();
            assert!(matches!(
                completion_text(parsed),
                Err(JudgeError::EmptyCompletion)
            ));
        }
    }

    #[test]
    fn endpoint_joins_base_without_double_slash() {
        let client = OpenAiChatClient::new(OpenAiConfig {
            api_base: "https://api.groq.com/openai/v1/".to_string(),
            api_key: "k".to_string(),
            timeout: Duration::from_secs(5),
        })
        .unwrap();
        assert_eq!(
            client.endpoint(),
            "https://api.groq.com/openai/v1/chat/completions"
        );
    }

    #[test]
    fn blank_api_key_is_rejected() {
        let err = OpenAiChatClient::new(OpenAiConfig {
            api_base: DEFAULT_API_BASE.to_string(),
            api_key: "  ".to_string(),
            timeout: Duration::from_secs(5),
        })
        .err()
        .unwrap();
        assert!(matches!(err, JudgeError::InvalidConfig(_)));
    }

    #[tokio::test]
    async fn stub_plays_script_then_fallback() {
        let stub = StubChatClient::replying("fallback")
            .then_reply("first")
            .then_fail("boom");
        assert_eq!(stub.complete(&request()).await.unwrap(), "first");
        assert!(stub.complete(&request()).await.is_err());
        assert_eq!(stub.complete(&request()).await.unwrap(), "fallback");
        assert_eq!(stub.requests().len(), 3);
    }
}
