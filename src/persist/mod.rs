/// JSON-file directory.
pub mod json;
/// In-memory directory with failure injection.
pub mod memory;
/// SQLite-backed directory.
pub mod sqlite;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use crate::{
    config::DirectoryConfig,
    contact::{Contact, ContactDraft, ContactPayload},
    types::ContactId,
};

/// Errors raised by a [`Directory`].
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// SQLite failure.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// Payload (de)serialization failure.
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    /// Filesystem failure.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// The directory refused the mutation.
    #[error("rejected: {0}")]
    Rejected(String),
    /// No contact with this id exists.
    #[error("contact not found: {0}")]
    NotFound(ContactId),
    /// A previous holder panicked while holding the connection lock.
    #[error("directory lock poisoned")]
    Poisoned,
}

/// Result type for directory operations.
pub type DirectoryResult<T> = Result<T, DirectoryError>;

/// One contact source.
///
/// Mutations return `Ok(Some(_))` when the directory accepted the change and
/// `Ok(None)` when it was a no-op. `Err` means rejection.
#[async_trait]
pub trait Directory: Send + Sync {
    /// Operator-facing name, e.g. `"Airtable"`.
    fn label(&self) -> &str;

    /// Fetches every contact.
    async fn list(&self) -> DirectoryResult<Vec<Contact>>;

    /// Fetches contacts whose first and last names match exactly.
    async fn get_by_name(&self, first: &str, last: &str) -> DirectoryResult<Vec<Contact>> {
        Ok(self
            .list()
            .await?
            .into_iter()
            .filter(|c| {
                c.first_name.as_deref() == Some(first) && c.last_name.as_deref() == Some(last)
            })
            .collect())
    }

    /// Creates a contact from a payload built by [`Directory::contact_to_payload`].
    async fn create(&self, payload: ContactPayload) -> DirectoryResult<Option<Contact>>;

    /// Overwrites the stored contact with the same id.
    async fn update(&self, contact: &Contact) -> DirectoryResult<Option<Contact>>;

    /// Removes the contact.
    async fn delete(&self, contact: &Contact) -> DirectoryResult<Option<Contact>>;

    /// Serializes a contact (usually from the other source) into a creation payload.
    fn contact_to_payload(&self, contact: &Contact) -> DirectoryResult<ContactPayload> {
        Ok(ContactDraft::from_contact(contact).into_payload()?)
    }
}

/// Supported directory backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DirectoryKind {
    /// [`sqlite::SqliteDirectory`].
    Sqlite,
    /// [`json::JsonFileDirectory`].
    Json,
}

/// Constructor for one [`DirectoryKind`].
pub type DirectoryOpener = fn(&DirectoryConfig) -> DirectoryResult<Box<dyn Directory>>;

impl DirectoryKind {
    /// Constructor for this kind.
    pub fn opener(self) -> DirectoryOpener {
        match self {
            Self::Sqlite => open_sqlite,
            Self::Json => open_json,
        }
    }
}

fn open_sqlite(cfg: &DirectoryConfig) -> DirectoryResult<Box<dyn Directory>> {
    let dir = sqlite::SqliteDirectory::open(cfg.label.clone(), &cfg.path)?;
    Ok(Box::new(dir))
}

fn open_json(cfg: &DirectoryConfig) -> DirectoryResult<Box<dyn Directory>> {
    let dir = json::JsonFileDirectory::open(cfg.label.clone(), &cfg.path)?;
    Ok(Box::new(dir))
}

/// Opens the directory described by `cfg`.
pub fn open_directory(cfg: &DirectoryConfig) -> DirectoryResult<Box<dyn Directory>> {
    (cfg.kind.opener())(cfg)
}
