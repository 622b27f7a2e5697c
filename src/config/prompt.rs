use crate::models::email::EmailContext;
use log::info;

pub const SYSTEM_INSTRUCTION: &str =
    "You are a professional email assistant. Generate well-written, professional emails based on the user's prompt.";

const CONTEXT_HEADER: &str =
    "You are responding to or composing an email. Here's the context:";

const CONTEXT_FOOTER: &str =
    "Generate an appropriate email response or draft based on the user's prompt.";

pub const TRUNCATION_MARKER: &str = "[Original email truncated]";

/// The system/user pair sent to the completion API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedPrompt {
    pub system: String,
    pub user: String,
}

/// Builds the message pair for one generation.
///
/// `max_body_chars` bounds the context body; `0` leaves it untouched.
pub fn compose(
    prompt: &str,
    context: Option<&EmailContext>,
    max_body_chars: usize
) -> ComposedPrompt {
    let mut system = String::from(SYSTEM_INSTRUCTION);

    if let Some(ctx) = context {
        system.push_str("\n\n");
        system.push_str(CONTEXT_HEADER);
        system.push('\n');
        if let Some(subject) = ctx.subject() {
            system.push_str(&format!("Subject: {}\n", subject));
        }
        if let Some(from) = ctx.sender() {
            system.push_str(&format!("From: {}\n", from));
        }
        if let Some(body) = ctx.body() {
            system.push_str("Original Email Body:\n");
            match truncate_chars(body, max_body_chars) {
                Some(head) => {
                    info!(
                        "Context body truncated from {} to {} characters",
                        body.chars().count(),
                        max_body_chars
                    );
                    system.push_str(head);
                    system.push('\n');
                    system.push_str(TRUNCATION_MARKER);
                }
                None => system.push_str(body),
            }
            system.push('\n');
        }
        system.push('\n');
        system.push_str(CONTEXT_FOOTER);
    }

    ComposedPrompt { system, user: prompt.to_string() }
}

/// Returns the first `limit` characters when `text` is longer than that.
fn truncate_chars(text: &str, limit: usize) -> Option<&str> {
    if limit == 0 {
        return None;
    }
    text.char_indices()
        .nth(limit)
        .map(|(idx, _)| &text[..idx])
}
