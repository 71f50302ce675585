use hashbrown::HashMap;

use crate::contact::Contact;

use super::identity::{IdentityKey, sort_by_identity};

/// Contacts in one source sharing an identity key.
///
/// Members are ordered by creation time, so the first is the survivor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateGroup {
    key: IdentityKey,
    members: Vec<Contact>,
}

impl DuplicateGroup {
    fn new(key: IdentityKey, mut members: Vec<Contact>) -> Self {
        members.sort_by(|a, b| a.created.cmp(&b.created).then_with(|| a.id.cmp(&b.id)));
        Self { key, members }
    }

    /// Shared identity key.
    pub fn key(&self) -> &IdentityKey {
        &self.key
    }

    /// All members, oldest first.
    pub fn members(&self) -> &[Contact] {
        &self.members
    }

    /// The earliest-created member, which is kept.
    pub fn survivor(&self) -> &Contact {
        &self.members[0]
    }

    /// Every member except the survivor.
    pub fn redundant(&self) -> &[Contact] {
        &self.members[1..]
    }

    /// Group size (always at least 2).
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Always false; groups hold at least two members.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Ordered key to group mapping produced by [`find_duplicates`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DuplicateGroups {
    groups: Vec<DuplicateGroup>,
    pos: HashMap<IdentityKey, usize>,
}

impl DuplicateGroups {
    /// Group for `key`, if any.
    pub fn get(&self, key: &IdentityKey) -> Option<&DuplicateGroup> {
        self.pos.get(key).and_then(|p| self.groups.get(*p))
    }

    /// Groups in first-seen key order.
    pub fn iter(&self) -> impl Iterator<Item = &DuplicateGroup> {
        self.groups.iter()
    }

    /// Number of groups.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// True when no duplicates were found.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// All deletion candidates across groups.
    pub fn redundant(&self) -> impl Iterator<Item = &Contact> {
        self.groups.iter().flat_map(|g| g.redundant().iter())
    }
}

/// Groups one source's contacts by identity key, keeping groups of two or more.
pub fn find_duplicates(contacts: &[Contact]) -> DuplicateGroups {
    let mut sorted = contacts.to_vec();
    sort_by_identity(&mut sorted);

    let mut out = DuplicateGroups::default();
    let mut run: Vec<Contact> = Vec::new();
    let mut run_key: Option<IdentityKey> = None;

    for contact in sorted {
        let key = IdentityKey::of(&contact);
        if run_key.as_ref() != Some(&key) {
            if let Some(prev) = run_key.take() {
                push_group(&mut out, prev, std::mem::take(&mut run));
            }
            run_key = Some(key);
        }
        run.push(contact);
    }
    if let Some(prev) = run_key {
        push_group(&mut out, prev, run);
    }

    out
}

fn push_group(out: &mut DuplicateGroups, key: IdentityKey, members: Vec<Contact>) {
    if members.len() <= 1 {
        return;
    }
    out.pos.insert(key.clone(), out.groups.len());
    out.groups.push(DuplicateGroup::new(key, members));
}
