use async_trait::async_trait;
use log::warn;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ClipboardError {
    #[error("No clipboard mechanism available")]
    Unavailable,

    #[error("Clipboard write failed: {0}")]
    Write(String),
}

/// Asynchronous clipboard API of the embedding environment.
#[async_trait]
pub trait NativeClipboard: Send + Sync {
    async fn write_text(&self, text: &str) -> Result<(), ClipboardError>;
}

/// Synchronous copy that selects the text in a hidden field and copies the selection.
pub trait SelectionCopy: Send + Sync {
    fn copy_selection(&self, text: &str) -> Result<(), ClipboardError>;
}

/// Which mechanism ended up placing the text on the clipboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyMethod {
    Native,
    Selection,
}

#[derive(Clone, Default)]
pub struct Clipboard {
    native: Option<Arc<dyn NativeClipboard>>,
    selection: Option<Arc<dyn SelectionCopy>>,
}

impl Clipboard {
    pub fn new(
        native: Option<Arc<dyn NativeClipboard>>,
        selection: Option<Arc<dyn SelectionCopy>>
    ) -> Self {
        Self { native, selection }
    }

    /// Tries the native clipboard first, then the selection copy.
    pub async fn copy(&self, text: &str) -> Result<CopyMethod, ClipboardError> {
        let native_err = match &self.native {
            Some(native) =>
                match native.write_text(text).await {
                    Ok(()) => {
                        return Ok(CopyMethod::Native);
                    }
                    Err(e) => {
                        warn!("Native clipboard write failed, trying selection copy: {}", e);
                        e
                    }
                }
            None => ClipboardError::Unavailable,
        };

        match &self.selection {
            Some(selection) => selection.copy_selection(text).map(|_| CopyMethod::Selection),
            None => Err(native_err),
        }
    }
}
