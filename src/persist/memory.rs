//! In-memory directory, mainly for tests and embedding.

use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use hashbrown::HashSet;

use crate::{
    contact::{Contact, ContactDraft, ContactPayload},
    types::ContactId,
};

use super::{Directory, DirectoryError, DirectoryResult};

#[derive(Debug, Default)]
struct State {
    contacts: Vec<Contact>,
    next_id: u64,
    reject_ids: HashSet<ContactId>,
    reject_names: HashSet<String>,
    calls: Vec<Call>,
}

/// Mutation recorded by [`MemoryDirectory`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    /// A create attempt, with the payload's display name.
    Create(String),
    /// An update attempt for this id.
    Update(ContactId),
    /// A delete attempt for this id.
    Delete(ContactId),
}

/// [`Directory`] over a `Vec`, with per-id and per-name rejection.
#[derive(Debug)]
pub struct MemoryDirectory {
    label: String,
    id_prefix: String,
    state: Mutex<State>,
}

impl MemoryDirectory {
    /// Empty directory. Created contacts get ids `"<prefix>-<n>"`.
    pub fn new(label: impl Into<String>, id_prefix: impl Into<String>) -> Self {
        Self::with_contacts(label, id_prefix, Vec::new())
    }

    /// Directory seeded with `contacts`.
    pub fn with_contacts(
        label: impl Into<String>,
        id_prefix: impl Into<String>,
        contacts: Vec<Contact>,
    ) -> Self {
        Self {
            label: label.into(),
            id_prefix: id_prefix.into(),
            state: Mutex::new(State {
                contacts,
                next_id: 1,
                ..State::default()
            }),
        }
    }

    fn lock(&self) -> DirectoryResult<MutexGuard<'_, State>> {
        self.state.lock().map_err(|_| DirectoryError::Poisoned)
    }

    /// Makes every update/delete of `id` fail.
    pub fn reject_id(&self, id: impl Into<ContactId>) {
        if let Ok(mut state) = self.state.lock() {
            state.reject_ids.insert(id.into());
        }
    }

    /// Makes every create whose display name is `name` fail.
    pub fn reject_name(&self, name: impl Into<String>) {
        if let Ok(mut state) = self.state.lock() {
            state.reject_names.insert(name.into());
        }
    }

    /// Current contents.
    pub fn snapshot(&self) -> Vec<Contact> {
        self.state
            .lock()
            .map(|s| s.contacts.clone())
            .unwrap_or_default()
    }

    /// Mutations attempted so far, in order.
    pub fn calls(&self) -> Vec<Call> {
        self.state
            .lock()
            .map(|s| s.calls.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Directory for MemoryDirectory {
    fn label(&self) -> &str {
        &self.label
    }

    async fn list(&self) -> DirectoryResult<Vec<Contact>> {
        Ok(self.lock()?.contacts.clone())
    }

    async fn create(&self, payload: ContactPayload) -> DirectoryResult<Option<Contact>> {
        let draft = ContactDraft::from_payload(payload)?;
        let mut state = self.lock()?;
        let id = format!("{}-{}", self.id_prefix, state.next_id);
        let contact = draft.into_contact(id, Utc::now());
        let name = contact.display_name();
        state.calls.push(Call::Create(name.clone()));
        if state.reject_names.contains(&name) {
            return Err(DirectoryError::Rejected(format!("create refused for {name}")));
        }
        state.next_id += 1;
        state.contacts.push(contact.clone());
        Ok(Some(contact))
    }

    async fn update(&self, contact: &Contact) -> DirectoryResult<Option<Contact>> {
        let mut state = self.lock()?;
        state.calls.push(Call::Update(contact.id.clone()));
        if state.reject_ids.contains(&contact.id) {
            return Err(DirectoryError::Rejected(format!("update refused for {}", contact.id)));
        }
        let slot = state
            .contacts
            .iter_mut()
            .find(|c| c.id == contact.id)
            .ok_or_else(|| DirectoryError::NotFound(contact.id.clone()))?;
        *slot = contact.clone();
        Ok(Some(contact.clone()))
    }

    async fn delete(&self, contact: &Contact) -> DirectoryResult<Option<Contact>> {
        let mut state = self.lock()?;
        state.calls.push(Call::Delete(contact.id.clone()));
        if state.reject_ids.contains(&contact.id) {
            return Err(DirectoryError::Rejected(format!("delete refused for {}", contact.id)));
        }
        let pos = state
            .contacts
            .iter()
            .position(|c| c.id == contact.id)
            .ok_or_else(|| DirectoryError::NotFound(contact.id.clone()))?;
        Ok(Some(state.contacts.remove(pos)))
    }
}
