//! Directory stored as one JSON array file, rewritten on every mutation.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::contact::{Contact, ContactDraft, ContactPayload};

use super::{Directory, DirectoryError, DirectoryResult};

/// JSON-file implementation of [`crate::persist::Directory`].
pub struct JsonFileDirectory {
    label: String,
    path: PathBuf,
    contacts: Mutex<Vec<Contact>>,
}

impl JsonFileDirectory {
    /// Loads `path`, treating a missing file as an empty directory.
    pub fn open(label: impl Into<String>, path: impl AsRef<Path>) -> DirectoryResult<Self> {
        let path = path.as_ref().to_path_buf();
        let contacts = match std::fs::read(&path) {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Vec::new(),
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self {
            label: label.into(),
            path,
            contacts: Mutex::new(contacts),
        })
    }

    fn lock(&self) -> DirectoryResult<MutexGuard<'_, Vec<Contact>>> {
        self.contacts.lock().map_err(|_| DirectoryError::Poisoned)
    }

    /// Writes `contacts` to disk. Callers swap them into memory only on success.
    fn persist(&self, contacts: &[Contact]) -> DirectoryResult<()> {
        let bytes = serde_json::to_vec_pretty(contacts)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, bytes)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

#[async_trait]
impl Directory for JsonFileDirectory {
    fn label(&self) -> &str {
        &self.label
    }

    async fn list(&self) -> DirectoryResult<Vec<Contact>> {
        Ok(self.lock()?.clone())
    }

    async fn create(&self, payload: ContactPayload) -> DirectoryResult<Option<Contact>> {
        let draft = ContactDraft::from_payload(payload)?;
        let contact = draft.into_contact(Uuid::now_v7().to_string(), Utc::now());
        let mut contacts = self.lock()?;
        let mut next = contacts.clone();
        next.push(contact.clone());
        self.persist(&next)?;
        *contacts = next;
        Ok(Some(contact))
    }

    async fn update(&self, contact: &Contact) -> DirectoryResult<Option<Contact>> {
        let mut contacts = self.lock()?;
        let pos = position(&contacts, contact)?;
        let updated = Contact {
            created: contacts[pos].created,
            ..contact.clone()
        };
        let mut next = contacts.clone();
        next[pos] = updated.clone();
        self.persist(&next)?;
        *contacts = next;
        Ok(Some(updated))
    }

    async fn delete(&self, contact: &Contact) -> DirectoryResult<Option<Contact>> {
        let mut contacts = self.lock()?;
        let pos = position(&contacts, contact)?;
        let mut next = contacts.clone();
        let removed = next.remove(pos);
        self.persist(&next)?;
        *contacts = next;
        Ok(Some(removed))
    }
}

fn position(contacts: &[Contact], contact: &Contact) -> DirectoryResult<usize> {
    contacts
        .iter()
        .position(|c| c.id == contact.id)
        .ok_or_else(|| DirectoryError::NotFound(contact.id.clone()))
}
