//! Outbound notification channels.

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use thiserror::Error;
use tracing::info;

/// Errors from a [`Notifier`].
#[derive(Debug, Error)]
pub enum NotifyError {
    /// Writing the message failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Delivers a rendered report.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Sends one message with an HTML body.
    async fn send(&self, subject: &str, html_body: &str) -> Result<(), NotifyError>;
}

/// Supported notification channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum NotifyKind {
    /// [`LogNotifier`].
    #[default]
    Log,
    /// [`OutboxNotifier`].
    Outbox,
}

/// Emits the subject and body size as a tracing event.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, subject: &str, html_body: &str) -> Result<(), NotifyError> {
        info!(subject, bytes = html_body.len(), "notification");
        Ok(())
    }
}

/// Writes each message as `<timestamp>.html` under a directory.
#[derive(Debug, Clone)]
pub struct OutboxNotifier {
    dir: PathBuf,
}

impl OutboxNotifier {
    /// Outbox rooted at `dir`, created on first send.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl Notifier for OutboxNotifier {
    async fn send(&self, subject: &str, html_body: &str) -> Result<(), NotifyError> {
        std::fs::create_dir_all(&self.dir)?;
        let name = format!("{}.html", Utc::now().format("%Y%m%dT%H%M%S%.3fZ"));
        let path = self.dir.join(name);
        let doc = format!(
            "<html><head><title>{}</title></head><body>{html_body}</body></html>",
            crate::digest::escape_html(subject)
        );
        std::fs::write(&path, doc)?;
        info!(path = %path.display(), "wrote notification");
        Ok(())
    }
}

/// Builds the notifier named by `kind`.
pub fn open_notifier(kind: NotifyKind, outbox_dir: &std::path::Path) -> Box<dyn Notifier> {
    match kind {
        NotifyKind::Log => Box::new(LogNotifier),
        NotifyKind::Outbox => Box::new(OutboxNotifier::new(outbox_dir)),
    }
}
