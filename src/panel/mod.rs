//! Controller behind the add-in panel.
//!
//! A [`PanelSession`] owns everything one panel instance knows: the last
//! loaded email context, the current draft and the state of its controls.
//! The rendered state is published as a [`PanelView`] on a watch channel.

pub mod clipboard;
pub mod host;
pub mod relay;
pub mod summary;

use crate::models::email::{ EmailContext, GenerateEmailRequest, GenerateEmailResponse };
use self::clipboard::{ Clipboard, ClipboardError, CopyMethod };
use self::host::{ Coercion, HostError, MailHost };
use self::relay::{ RelayClient, RelayError };
use self::summary::ContextSummary;
use log::{ info, warn, error };
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;

/// How long a notice stays up unless replaced.
pub const NOTICE_TTL: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum PanelError {
    #[error("Please enter a prompt")]
    EmptyPrompt,

    #[error("No email to insert")]
    NothingToInsert,

    #[error("No email to copy")]
    NothingToCopy,

    #[error("No email item selected")]
    NoActiveItem,

    #[error("Error: {0}. Make sure the server is running and OPENAI_API_KEY is configured.")]
    Generation(#[source] RelayError),

    #[error("Failed to insert email")]
    Insert(#[source] HostError),

    #[error("Failed to copy to clipboard")]
    Copy(#[source] ClipboardError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Error,
    Success,
}

/// The single error or success banner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
    id: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PanelView {
    pub summary: Option<ContextSummary>,
    pub draft: String,
    /// True while a generation request is in flight.
    pub generating: bool,
    pub insert_enabled: bool,
    pub copy_enabled: bool,
    pub notice: Option<Notice>,
}

pub struct PanelSession {
    host: Arc<dyn MailHost>,
    relay: Arc<dyn RelayClient>,
    clipboard: Clipboard,
    context: Option<EmailContext>,
    view: Arc<watch::Sender<PanelView>>,
    notice_seq: u64,
}

impl PanelSession {
    pub fn new(host: Arc<dyn MailHost>, relay: Arc<dyn RelayClient>, clipboard: Clipboard) -> Self {
        let (view, _) = watch::channel(PanelView::default());
        Self {
            host,
            relay,
            clipboard,
            context: None,
            view: Arc::new(view),
            notice_seq: 0,
        }
    }

    /// Creates a session and loads the open item's context, like a freshly shown panel.
    pub async fn open(
        host: Arc<dyn MailHost>,
        relay: Arc<dyn RelayClient>,
        clipboard: Clipboard
    ) -> Self {
        let mut session = Self::new(host, relay, clipboard);
        if let Err(e) = session.load_context().await {
            warn!("Panel opened without email context: {}", e);
        }
        session
    }

    pub fn subscribe(&self) -> watch::Receiver<PanelView> {
        self.view.subscribe()
    }

    pub fn view(&self) -> PanelView {
        self.view.borrow().clone()
    }

    pub fn context(&self) -> Option<&EmailContext> {
        self.context.as_ref()
    }

    /// Reads subject, sender and plain-text body of the open item.
    ///
    /// A body that cannot be read leaves an empty body instead of failing.
    pub async fn load_context(&mut self) -> Result<EmailContext, PanelError> {
        let headers = match self.host.active_item() {
            Some(headers) => headers,
            None => {
                return Err(self.fail(PanelError::NoActiveItem));
            }
        };

        let subject = headers.subject.unwrap_or_default();
        let from = headers.from.unwrap_or_else(|| "Unknown".to_string());

        let (body, body_loaded) = match self.host.body(Coercion::Text).await {
            Ok(body) => (body, true),
            Err(e) => {
                error!("Error loading email body: {}", e);
                (String::new(), false)
            }
        };

        let context = EmailContext::new(subject, from, body);
        let summary = ContextSummary::from_context(&context);
        self.context = Some(context.clone());
        self.view.send_modify(|v| {
            v.summary = Some(summary);
        });

        if body_loaded {
            self.notify(NoticeKind::Success, "Email context loaded successfully");
        }
        Ok(context)
    }

    /// Sends `prompt` with the last loaded context to the relay.
    pub async fn generate(&mut self, prompt: &str) -> Result<GenerateEmailResponse, PanelError> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(self.fail(PanelError::EmptyPrompt));
        }

        self.view.send_modify(|v| {
            v.generating = true;
            v.notice = None;
        });

        let request = GenerateEmailRequest::new(prompt, self.context.clone());
        let result = self.relay.generate(&request).await;

        self.view.send_modify(|v| {
            v.generating = false;
        });

        match result {
            Ok(response) => {
                info!("Draft generated by {}", response.model);
                let draft = response.email.clone();
                self.view.send_modify(|v| {
                    v.draft = draft;
                    v.insert_enabled = true;
                    v.copy_enabled = true;
                });
                self.notify(NoticeKind::Success, "Email generated successfully!");
                Ok(response)
            }
            Err(e) => {
                error!("Error generating email: {}", e);
                self.view.send_modify(|v| {
                    v.draft.clear();
                    v.insert_enabled = false;
                    v.copy_enabled = false;
                });
                Err(self.fail(PanelError::Generation(e)))
            }
        }
    }

    /// Puts the draft into the open item's body as HTML.
    pub async fn insert(&mut self) -> Result<(), PanelError> {
        let draft = self.current_draft();
        if draft.is_empty() {
            return Err(self.fail(PanelError::NothingToInsert));
        }
        if self.host.active_item().is_none() {
            return Err(self.fail(PanelError::NoActiveItem));
        }

        match self.host.set_selected_data(&draft, Coercion::Html).await {
            Ok(()) => {
                self.notify(NoticeKind::Success, "Email inserted successfully!");
                Ok(())
            }
            Err(e) => {
                error!("Error inserting email: {}", e);
                Err(self.fail(PanelError::Insert(e)))
            }
        }
    }

    pub async fn copy(&mut self) -> Result<CopyMethod, PanelError> {
        let draft = self.current_draft();
        if draft.is_empty() {
            return Err(self.fail(PanelError::NothingToCopy));
        }

        match self.clipboard.copy(&draft).await {
            Ok(method) => {
                self.notify(NoticeKind::Success, "Copied to clipboard!");
                Ok(method)
            }
            Err(e) => {
                error!("Error copying to clipboard: {}", e);
                Err(self.fail(PanelError::Copy(e)))
            }
        }
    }

    fn current_draft(&self) -> String {
        self.view.borrow().draft.trim().to_string()
    }

    fn fail(&mut self, err: PanelError) -> PanelError {
        self.notify(NoticeKind::Error, err.to_string());
        err
    }

    /// Replaces the current notice and schedules its removal.
    fn notify(&mut self, kind: NoticeKind, text: impl Into<String>) {
        self.notice_seq += 1;
        let id = self.notice_seq;
        let notice = Notice { kind, text: text.into(), id };
        self.view.send_modify(|v| {
            v.notice = Some(notice);
        });

        let view = Arc::clone(&self.view);
        tokio::spawn(async move {
            tokio::time::sleep(NOTICE_TTL).await;
            view.send_if_modified(|v| {
                match &v.notice {
                    Some(n) if n.id == id => {
                        v.notice = None;
                        true
                    }
                    _ => false,
                }
            });
        });
    }
}
