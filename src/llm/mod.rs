pub mod chat;

use thiserror::Error;

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_COMPLETION_MODEL: &str = "gpt-4";

#[derive(Debug, Clone, Default)]
pub struct LlmConfig {
    pub api_key: Option<String>,
    pub completion_model: Option<String>,
    pub base_url: Option<String>,
}

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("OpenAI API key is required")]
    MissingApiKey,

    #[error("Invalid API key format: {0}")]
    InvalidApiKey(String),

    #[error("{0}")]
    Http(#[from] reqwest::Error),

    /// Non-success status from the provider, with the provider's own message.
    #[error("{status} {message}")]
    Provider {
        status: u16,
        message: String,
    },

    #[error("No response from OpenAI API")]
    EmptyResponse,
}
