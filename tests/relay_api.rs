use async_trait::async_trait;
use axum::body::{ Body, to_bytes };
use axum::http::{ Request, StatusCode };
use axum::Router;
use mail_draft_relay::llm::LlmError;
use mail_draft_relay::llm::chat::{ ChatClient, CompletionRequest, CompletionResponse };
use mail_draft_relay::models::email::{ EmailContext, GenerateEmailRequest, Usage };
use mail_draft_relay::panel::relay::{ HttpRelayClient, RelayClient, RelayError, FALLBACK_MESSAGE };
use mail_draft_relay::server::api::{ router, AppState };
use serde_json::{ json, Value };
use std::sync::{ Arc, Mutex };
use tower::ServiceExt;

const PUBLIC_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/public");

/// Records what the endpoint asked for and answers with a canned completion.
struct RecordingChat {
    seen: Mutex<Vec<CompletionRequest>>,
    fail_with: Option<String>,
    usage: Option<Usage>,
}

impl RecordingChat {
    fn ok() -> Arc<Self> {
        Self::with_usage(Some(Usage::new(42, 12, 54)))
    }

    fn with_usage(usage: Option<Usage>) -> Arc<Self> {
        Arc::new(Self { seen: Mutex::new(Vec::new()), fail_with: None, usage })
    }

    fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            seen: Mutex::new(Vec::new()),
            fail_with: Some(message.to_string()),
            usage: None,
        })
    }

    fn last(&self) -> CompletionRequest {
        self.seen.lock().unwrap().last().cloned().expect("no completion requested")
    }
}

#[async_trait]
impl ChatClient for RecordingChat {
    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        self.seen.lock().unwrap().push(request.clone());
        if let Some(message) = &self.fail_with {
            return Err(LlmError::Provider { status: 429, message: message.clone() });
        }
        Ok(CompletionResponse {
            response: "Hi Sam,\n\nThanks for the update.".to_string(),
            model: "gpt-4-0613".to_string(),
            usage: self.usage.clone(),
        })
    }

    fn get_model(&self) -> String {
        "gpt-4".to_string()
    }

    fn get_base_url(&self) -> Option<String> {
        None
    }
}

fn app_with(chat: Option<Arc<RecordingChat>>) -> Router {
    let state = AppState {
        chat_client: chat.map(|c| c as Arc<dyn ChatClient>),
        max_context_chars: 8000,
    };
    router(state, PUBLIC_DIR)
}

async fn post_json(app: Router, body: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri("/api/generate-email")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn health_reports_ok() {
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let response = app_with(None).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(serde_json::from_slice::<Value>(&bytes).unwrap(), json!({ "status": "ok" }));
}

#[tokio::test]
async fn missing_prompt_is_a_bad_request() {
    let chat = RecordingChat::ok();
    for body in ["{}", r#"{"prompt": ""}"#, r#"{"prompt": null}"#] {
        let (status, json) = post_json(app_with(Some(chat.clone())), body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json, json!({ "error": "Prompt is required" }));
    }
    assert!(chat.seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn empty_json_body_reads_as_missing_prompt() {
    let chat = RecordingChat::ok();
    for body in ["", "  \n"] {
        let (status, json) = post_json(app_with(Some(chat.clone())), body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json, json!({ "error": "Prompt is required" }));
    }
    assert!(chat.seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn body_without_json_content_type_reads_as_missing_prompt() {
    let request = Request::builder()
        .method("POST")
        .uri("/api/generate-email")
        .header("content-type", "text/plain")
        .body(Body::from(r#"{"prompt": "Write a reply"}"#))
        .unwrap();
    let response = app_with(Some(RecordingChat::ok())).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(
        serde_json::from_slice::<Value>(&bytes).unwrap(),
        json!({ "error": "Prompt is required" })
    );
}

#[tokio::test]
async fn prompt_is_checked_before_the_api_key() {
    let (status, json) = post_json(app_with(None), "{}").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Prompt is required");
}

#[tokio::test]
async fn missing_api_key_is_a_server_error() {
    let (status, json) = post_json(app_with(None), r#"{"prompt": "Write a reply"}"#).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json, json!({ "error": "OpenAI API key not configured" }));
}

#[tokio::test]
async fn malformed_body_is_rejected() {
    let (status, json) = post_json(app_with(Some(RecordingChat::ok())), "{not json").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Invalid request body");
    assert!(json["message"].is_string());
}

#[tokio::test]
async fn success_returns_email_model_and_usage() {
    let chat = RecordingChat::ok();
    let (status, json) = post_json(
        app_with(Some(chat.clone())),
        r#"{"prompt": "Thank Sam for the update"}"#
    ).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        json,
        json!({
            "email": "Hi Sam,\n\nThanks for the update.",
            "model": "gpt-4-0613",
            "usage": { "prompt_tokens": 42, "completion_tokens": 12, "total_tokens": 54 }
        })
    );

    let sent = chat.last();
    assert_eq!(sent.user, "Thank Sam for the update");
    assert_eq!(sent.temperature, 0.7);
    assert_eq!(sent.max_tokens, 1000);
    assert!(!sent.system.contains("Here's the context"));
}

#[tokio::test]
async fn provider_usage_is_relayed_unchanged() {
    let detailed: Usage = serde_json
        ::from_value(
            json!({
                "prompt_tokens": 42,
                "completion_tokens": 12,
                "total_tokens": 54,
                "prompt_tokens_details": { "cached_tokens": 8 }
            })
        )
        .unwrap();
    let (status, json) = post_json(
        app_with(Some(RecordingChat::with_usage(Some(detailed)))),
        r#"{"prompt": "Hi"}"#
    ).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["usage"]["prompt_tokens_details"], json!({ "cached_tokens": 8 }));

    let (status, json) = post_json(
        app_with(Some(RecordingChat::with_usage(None))),
        r#"{"prompt": "Hi"}"#
    ).await;
    assert_eq!(status, StatusCode::OK);
    assert!(json.get("usage").is_none());
}

#[tokio::test]
async fn context_fields_reach_the_system_message() {
    let chat = RecordingChat::ok();
    let body = json!({
        "prompt": "Decline politely",
        "emailContext": { "subject": "Party", "from": "sam@example.com", "body": null }
    });
    let (status, _) = post_json(app_with(Some(chat.clone())), &body.to_string()).await;
    assert_eq!(status, StatusCode::OK);

    let system = chat.last().system;
    assert!(system.contains("\nSubject: Party\n"));
    assert!(system.contains("\nFrom: sam@example.com\n"));
    assert!(!system.contains("Original Email Body:"));
}

#[tokio::test]
async fn provider_failure_is_wrapped() {
    let chat = RecordingChat::failing("Rate limit reached");
    let (status, json) = post_json(app_with(Some(chat)), r#"{"prompt": "Hi"}"#).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        json,
        json!({ "error": "Failed to generate email", "message": "429 Rate limit reached" })
    );
}

#[tokio::test]
async fn root_serves_the_panel_document() {
    let request = Request::builder().uri("/").body(Body::empty()).unwrap();
    let response = app_with(None).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert!(String::from_utf8_lossy(&bytes).contains("generate-btn"));
}

#[tokio::test]
async fn unknown_static_path_is_not_found() {
    let request = Request::builder().uri("/missing.js").body(Body::empty()).unwrap();
    let response = app_with(None).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

async fn spawn_relay(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}/api/generate-email", addr)
}

#[tokio::test]
async fn relay_client_round_trip() {
    let endpoint = spawn_relay(app_with(Some(RecordingChat::ok()))).await;
    let client = HttpRelayClient::new(endpoint);

    let request = GenerateEmailRequest::new(
        "Reply",
        Some(EmailContext::new("Update", "sam@example.com", "Status attached"))
    );
    let response = client.generate(&request).await.unwrap();
    assert_eq!(response.model, "gpt-4-0613");
    assert_eq!(response.usage.unwrap().total_tokens, 54);
}

#[tokio::test]
async fn relay_client_surfaces_error_message() {
    let endpoint = spawn_relay(app_with(Some(RecordingChat::failing("Rate limit reached")))).await;
    let client = HttpRelayClient::new(endpoint);

    let err = client.generate(&GenerateEmailRequest::new("Reply", None)).await.unwrap_err();
    match err {
        RelayError::Rejected { status, message } => {
            assert_eq!(status, 500);
            assert_eq!(message, "429 Rate limit reached");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn relay_client_falls_back_when_no_message() {
    let endpoint = spawn_relay(app_with(None)).await;
    let client = HttpRelayClient::new(endpoint);

    let err = client.generate(&GenerateEmailRequest::new("Reply", None)).await.unwrap_err();
    assert_eq!(err.to_string(), FALLBACK_MESSAGE);
}
