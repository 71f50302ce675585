use hashbrown::HashMap;

use crate::contact::Contact;

use super::identity::IdentityKey;

/// Key to positions in a contact slice.
pub type VecIndex<K> = HashMap<K, Vec<usize>>;

/// Searchable view over one source's fetched contacts.
pub trait ContactSearch {
    /// Every fetched contact, in source order.
    fn contacts(&self) -> &[Contact];
    /// Candidates in this source that may be the same person as `contact`.
    fn find(&self, contact: &Contact) -> Vec<Contact>;
}

/// [`ContactSearch`] keyed by [`IdentityKey`].
#[derive(Debug, Default, Clone)]
pub struct NameIndex {
    contacts: Vec<Contact>,
    by_key: VecIndex<IdentityKey>,
}

impl NameIndex {
    /// Indexes `contacts`.
    pub fn new(contacts: Vec<Contact>) -> Self {
        let mut by_key: VecIndex<IdentityKey> = HashMap::with_capacity(contacts.len());
        for (pos, c) in contacts.iter().enumerate() {
            by_key.entry(IdentityKey::of(c)).or_default().push(pos);
        }
        Self { contacts, by_key }
    }

    /// Number of indexed contacts.
    pub fn len(&self) -> usize {
        self.contacts.len()
    }

    /// True when nothing was fetched.
    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }

    /// Contacts sharing `key`, oldest first.
    pub fn by_key(&self, key: &IdentityKey) -> Vec<&Contact> {
        let mut out: Vec<&Contact> = self
            .by_key
            .get(key)
            .into_iter()
            .flat_map(|positions| positions.iter())
            .filter_map(|pos| self.contacts.get(*pos))
            .collect();
        out.sort_by(|a, b| a.created.cmp(&b.created).then_with(|| a.id.cmp(&b.id)));
        out
    }
}

impl ContactSearch for NameIndex {
    fn contacts(&self) -> &[Contact] {
        &self.contacts
    }

    fn find(&self, contact: &Contact) -> Vec<Contact> {
        self.by_key(&IdentityKey::of(contact))
            .into_iter()
            .cloned()
            .collect()
    }
}
