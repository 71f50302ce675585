//! SQLite-backed contact directory.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use serde::{Deserialize, Serialize};

use crate::contact::{Contact, ContactDraft, ContactPayload};

use super::{Directory, DirectoryError, DirectoryResult};

const PAYLOAD_FORMAT_VERSION: u16 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PayloadEnvelope {
    format_version: u16,
    draft: ContactDraft,
}

/// SQLite implementation of [`crate::persist::Directory`].
///
/// Ids are the decimal rowid of the `contacts` table.
pub struct SqliteDirectory {
    label: String,
    conn: Mutex<Connection>,
}

impl SqliteDirectory {
    /// Opens or creates a SQLite-backed directory at `path`.
    ///
    /// Enables WAL mode and sets `synchronous=NORMAL`.
    pub fn open(label: impl Into<String>, path: impl AsRef<Path>) -> DirectoryResult<Self> {
        let conn = Connection::open(path)?;
        let dir = Self::init_connection(label.into(), conn)?;
        dir.conn()?.pragma_update(None, "journal_mode", "WAL")?;
        Ok(dir)
    }

    /// Opens an in-memory SQLite directory.
    pub fn open_in_memory(label: impl Into<String>) -> DirectoryResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_connection(label.into(), conn)
    }

    fn init_connection(label: String, conn: Connection) -> DirectoryResult<Self> {
        conn.execute_batch(include_str!("schema.sql"))?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        Ok(Self {
            label,
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> DirectoryResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| DirectoryError::Poisoned)
    }

    /// Inserts `draft` with an explicit creation time.
    pub fn insert_draft(&self, draft: ContactDraft, created: DateTime<Utc>) -> DirectoryResult<Contact> {
        let conn = self.conn()?;
        let payload = encode_payload(&draft)?;
        conn.execute(
            "INSERT INTO contacts(created_ms, first_name, last_name, payload) VALUES (?1, ?2, ?3, ?4)",
            params![
                created.timestamp_millis(),
                draft.first_name,
                draft.last_name,
                payload
            ],
        )?;
        let id = conn.last_insert_rowid();
        let created = from_millis(created.timestamp_millis())?;
        Ok(draft.into_contact(id.to_string(), created))
    }

    /// Number of stored contacts.
    pub fn count(&self) -> DirectoryResult<usize> {
        let n: i64 = self
            .conn()?
            .query_row("SELECT COUNT(*) FROM contacts", [], |row| row.get(0))?;
        Ok(n as usize)
    }

    fn query(&self, sql: &str, args: &[&dyn rusqlite::ToSql]) -> DirectoryResult<Vec<Contact>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map(args, |row| {
            let id: i64 = row.get(0)?;
            let created_ms: i64 = row.get(1)?;
            let payload: Vec<u8> = row.get(2)?;
            Ok((id, created_ms, payload))
        })?;

        let mut out = Vec::new();
        for row in rows {
            let (id, created_ms, payload) = row?;
            let draft = decode_payload(&payload)?;
            out.push(draft.into_contact(id.to_string(), from_millis(created_ms)?));
        }
        Ok(out)
    }

    fn row_created_ms(conn: &Connection, id: i64) -> DirectoryResult<Option<i64>> {
        Ok(conn
            .query_row(
                "SELECT created_ms FROM contacts WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()?)
    }
}

#[async_trait]
impl Directory for SqliteDirectory {
    fn label(&self) -> &str {
        &self.label
    }

    async fn list(&self) -> DirectoryResult<Vec<Contact>> {
        self.query(
            "SELECT id, created_ms, payload FROM contacts ORDER BY id ASC",
            &[],
        )
    }

    async fn get_by_name(&self, first: &str, last: &str) -> DirectoryResult<Vec<Contact>> {
        self.query(
            "SELECT id, created_ms, payload FROM contacts WHERE first_name = ?1 AND last_name = ?2 ORDER BY id ASC",
            &[&first, &last],
        )
    }

    async fn create(&self, payload: ContactPayload) -> DirectoryResult<Option<Contact>> {
        let draft = ContactDraft::from_payload(payload)?;
        self.insert_draft(draft, Utc::now()).map(Some)
    }

    async fn update(&self, contact: &Contact) -> DirectoryResult<Option<Contact>> {
        let id = parse_id(&contact.id)?;
        let conn = self.conn()?;
        let Some(created_ms) = Self::row_created_ms(&conn, id)? else {
            return Err(DirectoryError::NotFound(contact.id.clone()));
        };
        let draft = ContactDraft::from_contact(contact);
        let payload = encode_payload(&draft)?;
        conn.execute(
            "UPDATE contacts SET first_name = ?1, last_name = ?2, payload = ?3 WHERE id = ?4",
            params![draft.first_name, draft.last_name, payload, id],
        )?;
        let created = from_millis(created_ms)?;
        Ok(Some(draft.into_contact(contact.id.clone(), created)))
    }

    async fn delete(&self, contact: &Contact) -> DirectoryResult<Option<Contact>> {
        let id = parse_id(&contact.id)?;
        let removed = self
            .conn()?
            .execute("DELETE FROM contacts WHERE id = ?1", params![id])?;
        if removed == 0 {
            return Err(DirectoryError::NotFound(contact.id.clone()));
        }
        Ok(Some(contact.clone()))
    }
}

fn parse_id(id: &str) -> DirectoryResult<i64> {
    id.parse()
        .map_err(|_| DirectoryError::NotFound(id.to_string()))
}

fn from_millis(ms: i64) -> DirectoryResult<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ms)
        .ok_or_else(|| DirectoryError::Rejected(format!("created_ms out of range: {ms}")))
}

fn encode_payload(draft: &ContactDraft) -> DirectoryResult<Vec<u8>> {
    Ok(serde_json::to_vec(&PayloadEnvelope {
        format_version: PAYLOAD_FORMAT_VERSION,
        draft: draft.clone(),
    })?)
}

fn decode_payload(payload: &[u8]) -> DirectoryResult<ContactDraft> {
    let envelope: PayloadEnvelope = serde_json::from_slice(payload)?;
    if envelope.format_version != PAYLOAD_FORMAT_VERSION {
        return Err(DirectoryError::Rejected(format!(
            "unsupported payload format version: {}",
            envelope.format_version
        )));
    }
    Ok(envelope.draft)
}
