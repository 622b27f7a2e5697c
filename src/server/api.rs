use crate::cli::Args;
use crate::config::prompt::compose;
use crate::llm::{ LlmConfig, LlmError };
use crate::llm::chat::{ ChatClient, CompletionRequest, new_client };
use crate::models::email::{ ErrorResponse, GenerateEmailRequest, GenerateEmailResponse };
use std::path::Path;
use std::sync::Arc;
use axum::{
    routing::{ get, post },
    Router,
    Json,
    body::Bytes,
    extract::State,
    response::{ IntoResponse, Response },
    http::{ HeaderMap, StatusCode, header::CONTENT_TYPE },
};
use serde_json::json;
use thiserror::Error;
use tower_http::cors::{ Any, CorsLayer };
use tower_http::services::{ ServeDir, ServeFile };
use log::{ info, warn, error };

/// Document served for `/`.
pub const PANEL_DOCUMENT: &str = "taskpane.html";

#[derive(Clone)]
pub struct AppState {
    /// `None` when no API key is configured.
    pub chat_client: Option<Arc<dyn ChatClient>>,
    pub max_context_chars: usize,
}

impl AppState {
    pub fn from_args(args: &Args) -> Result<Self, LlmError> {
        let chat_client = match args.api_key() {
            Some(api_key) => {
                let config = LlmConfig {
                    api_key: Some(api_key),
                    completion_model: Some(args.openai_model.clone()),
                    base_url: args.openai_base_url.clone(),
                };
                let client = new_client(&config)?;
                info!(
                    "Chat client configured: Model={}, BaseURL={}",
                    client.get_model(),
                    client.get_base_url().as_deref().unwrap_or("default")
                );
                Some(client)
            }
            None => {
                warn!("OPENAI_API_KEY is not set. Generation requests will fail until it is configured.");
                None
            }
        };

        Ok(Self { chat_client, max_context_chars: args.max_context_chars })
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Prompt is required")]
    PromptRequired,

    #[error("OpenAI API key not configured")]
    ApiKeyMissing,

    #[error("Invalid request body")]
    InvalidBody(String),

    #[error("Failed to generate email")]
    Generation(#[source] LlmError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            ApiError::PromptRequired => (StatusCode::BAD_REQUEST, ErrorResponse::new(self.to_string())),
            ApiError::ApiKeyMissing =>
                (StatusCode::INTERNAL_SERVER_ERROR, ErrorResponse::new(self.to_string())),
            ApiError::InvalidBody(detail) =>
                (StatusCode::BAD_REQUEST, ErrorResponse::with_message(self.to_string(), detail)),
            ApiError::Generation(source) =>
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::with_message(self.to_string(), source.to_string()),
                ),
        };
        (status, Json(body)).into_response()
    }
}

pub fn router(state: AppState, public_dir: impl AsRef<Path>) -> Router {
    let public_dir = public_dir.as_ref();

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/api/generate-email", post(generate_email_handler))
        .route_service("/", ServeFile::new(public_dir.join(PANEL_DOCUMENT)))
        .fallback_service(ServeDir::new(public_dir))
        .layer(cors)
        .with_state(state)
}

async fn health_handler() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

/// Reads the request the way a JSON body parser middleware would: a body that
/// is not declared as JSON, or is empty, reads as `{}`.
fn parse_generate_request(headers: &HeaderMap, body: &[u8]) -> Result<GenerateEmailRequest, ApiError> {
    let is_json = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(|mime| {
            let mime = mime.trim().to_ascii_lowercase();
            mime == "application/json" || mime.ends_with("+json")
        })
        .unwrap_or(false);

    if !is_json || body.iter().all(u8::is_ascii_whitespace) {
        return Ok(GenerateEmailRequest::default());
    }

    serde_json::from_slice(body).map_err(|e| {
        warn!("Rejected generate-email body: {}", e);
        ApiError::InvalidBody(format!("Failed to parse the request body as JSON: {}", e))
    })
}

async fn generate_email_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes
) -> Result<Json<GenerateEmailResponse>, ApiError> {
    let req = parse_generate_request(&headers, &body)?;

    let prompt = req.prompt.filter(|p| !p.is_empty()).ok_or(ApiError::PromptRequired)?;
    let client = state.chat_client.as_ref().ok_or(ApiError::ApiKeyMissing)?;

    let composed = compose(&prompt, req.email_context.as_ref(), state.max_context_chars);
    let request = CompletionRequest::new(composed.system, composed.user);

    let completion = client.complete(&request).await.map_err(|e| {
        error!("Error generating email: {}", e);
        ApiError::Generation(e)
    })?;

    info!(
        "Generated email with {} ({} total tokens)",
        completion.model,
        completion.usage.as_ref().map_or(0, |u| u.total_tokens)
    );

    Ok(
        Json(GenerateEmailResponse {
            email: completion.response,
            model: completion.model,
            usage: completion.usage,
        })
    )
}
