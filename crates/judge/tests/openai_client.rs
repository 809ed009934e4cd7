use axum::{
    http::{HeaderMap, StatusCode},
    routing::post,
    Json, Router,
};
use fairfight_judge::{
    ChatClient, ChatMessage, ChatRequest, Judge, JudgeConfig, JudgeError, JudgeRequest,
    OpenAiChatClient, OpenAiConfig,
};
use fairfight_protocol::Theme;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Clone, Default)]
struct Seen {
    bodies: Arc<Mutex<Vec<Value>>>,
    auth: Arc<Mutex<Vec<String>>>,
}

/// Serve `app` on an ephemeral port and return its `/v1` base URL.
async fn spawn(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{addr}/v1")
}

fn completions(seen: Seen, status: StatusCode, reply: Value) -> Router {
    Router::new().route(
        "/v1/chat/completions",
        post(move |headers: HeaderMap, Json(body): Json<Value>| {
            let seen = seen.clone();
            let reply = reply.clone();
            async move {
                seen.bodies.lock().unwrap().push(body);
                if let Some(auth) = headers.get("authorization") {
                    seen.auth
                        .lock()
                        .unwrap()
                        .push(auth.to_str().unwrap_or_default().to_string());
                }
                (status, Json(reply))
            }
        }),
    )
}

fn client(api_base: String) -> OpenAiChatClient {
    OpenAiChatClient::new(OpenAiConfig {
        api_base,
        api_key: "sk-test".to_string(),
        timeout: Duration::from_secs(5),
    })
    .expect("client")
}

fn request() -> ChatRequest {
    ChatRequest {
        model: "gpt-4o".to_string(),
        messages: vec![
            ChatMessage::system("You are JudgeBot."),
            ChatMessage::user("Alice says:\nhi"),
        ],
        temperature: 0.7,
    }
}

#[tokio::test]
async fn posts_openai_shaped_request_and_reads_first_choice() {
    let seen = Seen::default();
    let base = spawn(completions(
        seen.clone(),
        StatusCode::OK,
        json!({
            "choices": [
                { "message": { "role": "assistant", "content": "Alice: 60%, Bob: 40%" } },
                { "message": { "role": "assistant", "content": "ignored" } }
            ]
        }),
    ))
    .await;

    let text = client(base).complete(&request()).await.expect("completion");
    assert_eq!(text, "Alice: 60%, Bob: 40%");

    let bodies = seen.bodies.lock().unwrap().clone();
    assert_eq!(bodies.len(), 1);
    assert_eq!(bodies[0]["model"], "gpt-4o");
    assert_eq!(bodies[0]["messages"][0]["role"], "system");
    assert_eq!(bodies[0]["messages"][1]["role"], "user");
    assert!((bodies[0]["temperature"].as_f64().unwrap() - 0.7).abs() < 1e-6);
    assert_eq!(seen.auth.lock().unwrap().as_slice(), ["Bearer sk-test"]);
}

#[tokio::test]
async fn error_status_becomes_api_error() {
    let base = spawn(completions(
        Seen::default(),
        StatusCode::TOO_MANY_REQUESTS,
        json!({ "error": { "message": "Rate limit reached" } }),
    ))
    .await;

    match client(base).complete(&request()).await {
        Err(JudgeError::ApiError { status, body }) => {
            assert_eq!(status, 429);
            assert!(body.contains("Rate limit reached"));
        }
        other => panic!("expected ApiError, got {other:?}"),
    }
}

#[tokio::test]
async fn empty_choices_are_an_empty_completion() {
    let base = spawn(completions(
        Seen::default(),
        StatusCode::OK,
        json!({ "choices": [] }),
    ))
    .await;

    assert!(matches!(
        client(base).complete(&request()).await,
        Err(JudgeError::EmptyCompletion)
    ));
}

#[tokio::test]
async fn judge_fails_soft_on_server_error() {
    let base = spawn(completions(
        Seen::default(),
        StatusCode::INTERNAL_SERVER_ERROR,
        json!({ "error": "upstream exploded" }),
    ))
    .await;
    let judge = Judge::new(Arc::new(client(base)), JudgeConfig::default());

    let judgement = judge
        .judge(&JudgeRequest {
            theme: Theme::Friends,
            name_a: "Alice".into(),
            statement_a: "You borrowed my bike and returned it broken.".into(),
            name_b: "Bob".into(),
            statement_b: "It was already broken when I took it.".into(),
        })
        .await;
    assert!(judgement.failed);
    assert!(judgement
        .text
        .starts_with("Error: JudgeBot could not deliver a verdict:"));
    assert!(judgement.text.contains("500"));
}

#[test]
fn blank_key_is_rejected() {
    let result = OpenAiChatClient::new(OpenAiConfig {
        api_base: "http://localhost/v1".into(),
        api_key: "  ".into(),
        timeout: Duration::from_secs(1),
    });
    assert!(matches!(result, Err(JudgeError::InvalidConfig(_))));
}
