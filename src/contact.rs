//! Contact domain record, draft, and payload types.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{ContactId, FieldName};

/// JSON object used as a creation payload.
pub type ContactPayload = serde_json::Map<String, serde_json::Value>;

/// Multi-valued attributes compared field by field.
pub type Attributes = BTreeMap<FieldName, Vec<String>>;

/// Opaque per-contact metadata that comparison never looks at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Extension(pub serde_json::Value);

impl Extension {
    /// Returns true when no payload is carried.
    pub fn is_empty(&self) -> bool {
        self.0.is_null()
    }
}

/// Contact record as returned by a directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    /// Source-assigned identifier.
    pub id: ContactId,
    /// Given name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    /// Middle name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub middle_name: Option<String>,
    /// Family name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    /// Creation time reported by the directory.
    pub created: DateTime<Utc>,
    /// Opaque extension payload.
    #[serde(default, skip_serializing_if = "Extension::is_empty")]
    pub extension: Extension,
    /// Compared attributes.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: Attributes,
}

impl Contact {
    /// `"First Last"` for console and report output.
    pub fn display_name(&self) -> String {
        let parts: Vec<&str> = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .filter(|s| !s.is_empty())
            .collect();
        parts.join(" ")
    }

    /// Returns this contact carrying `from`'s extension payload instead of its own.
    pub fn inherit_extension(mut self, from: &Contact) -> Self {
        self.extension = from.extension.clone();
        self
    }

    /// Strips leading and trailing whitespace from the name fields.
    pub fn trim_names(&mut self) {
        for name in [
            &mut self.first_name,
            &mut self.middle_name,
            &mut self.last_name,
        ] {
            if let Some(v) = name {
                let trimmed = v.trim();
                if trimmed.len() != v.len() {
                    *v = trimmed.to_string();
                }
            }
        }
    }

    /// Looks up one attribute's values.
    pub fn attribute(&self, field: &str) -> &[String] {
        self.attributes.get(field).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Insert payload used to create a new [`Contact`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ContactDraft {
    /// Given name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    /// Middle name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub middle_name: Option<String>,
    /// Family name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    /// Opaque extension payload.
    #[serde(default, skip_serializing_if = "Extension::is_empty")]
    pub extension: Extension,
    /// Compared attributes.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: Attributes,
}

impl ContactDraft {
    /// Copies everything but the source-assigned identity out of `contact`.
    pub fn from_contact(contact: &Contact) -> Self {
        Self {
            first_name: contact.first_name.clone(),
            middle_name: contact.middle_name.clone(),
            last_name: contact.last_name.clone(),
            extension: contact.extension.clone(),
            attributes: contact.attributes.clone(),
        }
    }

    /// Serializes into a creation payload.
    pub fn into_payload(self) -> serde_json::Result<ContactPayload> {
        match serde_json::to_value(self)? {
            serde_json::Value::Object(map) => Ok(map),
            _ => Ok(ContactPayload::new()),
        }
    }

    /// Parses a creation payload.
    pub fn from_payload(payload: ContactPayload) -> serde_json::Result<Self> {
        serde_json::from_value(serde_json::Value::Object(payload))
    }

    /// Materializes the draft under a directory-assigned id and timestamp.
    pub fn into_contact(self, id: ContactId, created: DateTime<Utc>) -> Contact {
        Contact {
            id,
            first_name: self.first_name,
            middle_name: self.middle_name,
            last_name: self.last_name,
            created,
            extension: self.extension,
            attributes: self.attributes,
        }
    }
}
