//! Seam between the panel and the mail application hosting it.
//!
//! Hosts report completion through callbacks carrying a status-tagged
//! [`AsyncResult`]. [`bridge`] turns one such call into an ordinary future so
//! [`MailHost`] implementations expose plain `Result`s.

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::oneshot;

/// Format the host should convert item content to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coercion {
    Text,
    Html,
}

/// Header fields of the item the panel is attached to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemHeaders {
    pub subject: Option<String>,
    /// Sender address.
    pub from: Option<String>,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HostError {
    #[error("{code}: {message}")]
    Failed {
        code: String,
        message: String,
    },

    #[error("Host dropped the request without completing it")]
    Abandoned,
}

#[async_trait]
pub trait MailHost: Send + Sync {
    /// Headers of the open item, `None` when nothing is selected.
    fn active_item(&self) -> Option<ItemHeaders>;

    async fn body(&self, coercion: Coercion) -> Result<String, HostError>;

    /// Replaces the current selection (or inserts at the cursor) in the item body.
    async fn set_selected_data(&self, data: &str, coercion: Coercion) -> Result<(), HostError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AsyncResultStatus {
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostErrorInfo {
    pub code: String,
    pub message: String,
}

/// Completion record handed to a host callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AsyncResult<T> {
    pub status: AsyncResultStatus,
    pub value: Option<T>,
    pub error: Option<HostErrorInfo>,
}

impl<T> AsyncResult<T> {
    pub fn succeeded(value: T) -> Self {
        Self { status: AsyncResultStatus::Succeeded, value: Some(value), error: None }
    }

    pub fn failed(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status: AsyncResultStatus::Failed,
            value: None,
            error: Some(HostErrorInfo { code: code.into(), message: message.into() }),
        }
    }

    pub fn into_result(self) -> Result<T, HostError> {
        match (self.status, self.value) {
            (AsyncResultStatus::Succeeded, Some(value)) => Ok(value),
            (AsyncResultStatus::Succeeded, None) =>
                Err(HostError::Failed {
                    code: "NoValue".to_string(),
                    message: "Host reported success without a value".to_string(),
                }),
            (AsyncResultStatus::Failed, _) => {
                let info = self.error.unwrap_or_else(|| HostErrorInfo {
                    code: "Unknown".to_string(),
                    message: "Host reported failure without details".to_string(),
                });
                Err(HostError::Failed { code: info.code, message: info.message })
            }
        }
    }
}

pub type Callback<T> = Box<dyn FnOnce(AsyncResult<T>) + Send>;

/// Issues a callback-style host call and waits for its completion.
///
/// `issue` receives the callback to hand to the host. If the host drops it
/// without calling it, the future resolves to [`HostError::Abandoned`].
pub async fn bridge<T, F>(issue: F) -> Result<T, HostError>
    where T: Send + 'static, F: FnOnce(Callback<T>)
{
    let (tx, rx) = oneshot::channel();
    issue(
        Box::new(move |result| {
            let _ = tx.send(result);
        })
    );
    rx.await.map_err(|_| HostError::Abandoned)?.into_result()
}
