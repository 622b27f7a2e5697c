use crate::models::email::EmailContext;

pub const PREVIEW_CHARS: usize = 200;
const ELLIPSIS: &str = "...";

/// What the panel shows about the loaded message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextSummary {
    pub subject: String,
    pub from: String,
    pub preview: String,
}

impl ContextSummary {
    pub fn from_context(context: &EmailContext) -> Self {
        Self {
            subject: context.subject().unwrap_or("No subject").to_string(),
            from: context.sender().unwrap_or("Unknown").to_string(),
            preview: body_preview(context.body().unwrap_or_default()),
        }
    }
}

/// First [`PREVIEW_CHARS`] characters of `body`, with an ellipsis only if something was cut.
pub fn body_preview(body: &str) -> String {
    match body.char_indices().nth(PREVIEW_CHARS) {
        Some((idx, _)) => format!("{}{}", &body[..idx], ELLIPSIS),
        None => body.to_string(),
    }
}
