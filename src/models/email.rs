use serde::{ Deserialize, Serialize };
use serde_json::{ Map, Value };

/// Metadata and body of the message the panel was opened on.
///
/// Every field may be absent or empty; `null` on the wire reads as absent.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailContext {
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
}

impl EmailContext {
    pub fn new(
        subject: impl Into<String>,
        from: impl Into<String>,
        body: impl Into<String>
    ) -> Self {
        Self {
            subject: Some(subject.into()),
            from: Some(from.into()),
            body: Some(body.into()),
        }
    }

    pub fn subject(&self) -> Option<&str> {
        non_empty(&self.subject)
    }

    pub fn sender(&self) -> Option<&str> {
        non_empty(&self.from)
    }

    pub fn body(&self) -> Option<&str> {
        non_empty(&self.body)
    }
}

fn non_empty(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|v| !v.is_empty())
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct GenerateEmailRequest {
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default, rename = "emailContext")]
    pub email_context: Option<EmailContext>,
}

impl GenerateEmailRequest {
    pub fn new(prompt: impl Into<String>, email_context: Option<EmailContext>) -> Self {
        Self { prompt: Some(prompt.into()), email_context }
    }
}

/// Token accounting reported by the completion provider.
///
/// Fields beyond the three counters (`prompt_tokens_details` and the like) are
/// kept in `extra` so the record is relayed in the shape the provider sent.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub prompt_tokens: u32,
    #[serde(default)]
    pub completion_tokens: u32,
    #[serde(default)]
    pub total_tokens: u32,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Usage {
    pub fn new(prompt_tokens: u32, completion_tokens: u32, total_tokens: u32) -> Self {
        Self { prompt_tokens, completion_tokens, total_tokens, extra: Map::new() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateEmailResponse {
    pub email: String,
    pub model: String,
    /// Absent when the provider reported no usage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self { error: error.into(), message: None }
    }

    pub fn with_message(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self { error: error.into(), message: Some(message.into()) }
    }
}
