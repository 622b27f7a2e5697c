use crate::models::email::{ ErrorResponse, GenerateEmailRequest, GenerateEmailResponse };
use async_trait::async_trait;
use log::debug;
use reqwest::Client as HttpClient;
use thiserror::Error;

pub const DEFAULT_ENDPOINT: &str = "https://localhost:3000/api/generate-email";

/// Shown when the relay rejects a request without a message of its own.
pub const FALLBACK_MESSAGE: &str = "Failed to generate email";

#[derive(Debug, Error)]
pub enum RelayError {
    /// Non-success status; carries the relay's `message` or the fallback.
    #[error("{message}")]
    Rejected {
        status: u16,
        message: String,
    },

    #[error("{0}")]
    Transport(#[from] reqwest::Error),
}

#[async_trait]
pub trait RelayClient: Send + Sync {
    async fn generate(
        &self,
        request: &GenerateEmailRequest
    ) -> Result<GenerateEmailResponse, RelayError>;
}

pub struct HttpRelayClient {
    http: HttpClient,
    endpoint: String,
}

impl HttpRelayClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self::with_client(HttpClient::new(), endpoint)
    }

    /// Uses a preconfigured client, e.g. one trusting a self-signed development certificate.
    pub fn with_client(http: HttpClient, endpoint: impl Into<String>) -> Self {
        Self { http, endpoint: endpoint.into() }
    }
}

impl Default for HttpRelayClient {
    fn default() -> Self {
        Self::new(DEFAULT_ENDPOINT)
    }
}

#[async_trait]
impl RelayClient for HttpRelayClient {
    async fn generate(
        &self,
        request: &GenerateEmailRequest
    ) -> Result<GenerateEmailResponse, RelayError> {
        debug!("POST {}", self.endpoint);
        let resp = self.http.post(&self.endpoint).json(request).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp
                .json::<ErrorResponse>().await
                .ok()
                .and_then(|body| body.message)
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| FALLBACK_MESSAGE.to_string());
            return Err(RelayError::Rejected { status: status.as_u16(), message });
        }

        Ok(resp.json::<GenerateEmailResponse>().await?)
    }
}
