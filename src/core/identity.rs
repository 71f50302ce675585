use std::fmt;

use crate::contact::Contact;

/// Matching key derived from `(last, first, middle)`.
///
/// Renders as `"<last>,<first>,<middle>"`. Backslashes and commas inside a
/// field are escaped, so distinct triples never collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IdentityKey(String);

impl IdentityKey {
    /// Derives the key for `contact`. Missing fields become empty.
    pub fn of(contact: &Contact) -> Self {
        Self::from_parts(
            contact.last_name.as_deref(),
            contact.first_name.as_deref(),
            contact.middle_name.as_deref(),
        )
    }

    /// Builds a key from raw name parts in key order.
    pub fn from_parts(last: Option<&str>, first: Option<&str>, middle: Option<&str>) -> Self {
        let mut key = String::new();
        push_escaped(&mut key, last.unwrap_or(""));
        key.push(',');
        push_escaped(&mut key, first.unwrap_or(""));
        key.push(',');
        push_escaped(&mut key, middle.unwrap_or(""));
        Self(key)
    }

    /// Borrowed key text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn push_escaped(out: &mut String, field: &str) {
    for ch in field.chars() {
        if ch == '\\' || ch == ',' {
            out.push('\\');
        }
        out.push(ch);
    }
}

/// Deterministic processing order: identity key, then creation time, then id.
pub fn sort_by_identity(contacts: &mut [Contact]) {
    contacts.sort_by_cached_key(|c| (IdentityKey::of(c), c.created, c.id.clone()));
}
