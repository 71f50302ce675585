//! Bidirectional contact reconciliation between two directories.
//!
//! # Examples
//!
//! Matching and duplicate detection are pure:
//! ```
//! use chrono::{TimeZone, Utc};
//! use contactsync::{
//!     contact::Contact,
//!     core::{dupes::find_duplicates, indices::NameIndex, matcher::{match_contacts, FoundSet}},
//! };
//!
//! let ann = |id: &str, secs: i64| Contact {
//!     id: id.to_string(),
//!     first_name: Some("Ann".to_string()),
//!     middle_name: None,
//!     last_name: Some("Smith".to_string()),
//!     created: Utc.timestamp_opt(secs, 0).unwrap(),
//!     extension: Default::default(),
//!     attributes: Default::default(),
//! };
//!
//! let left = NameIndex::new(vec![ann("1", 0), ann("2", 10)]);
//! let right = NameIndex::new(vec![ann("r1", 5)]);
//!
//! let dupes = find_duplicates(&[ann("1", 0), ann("2", 10)]);
//! assert_eq!(dupes.len(), 1);
//!
//! let report = match_contacts(&left, &right, FoundSet::new());
//! assert_eq!(report.matches.len(), 2);
//! assert!(report.unmatched_right.is_empty());
//! ```
//!
//! A full run against two directories:
//! ```no_run
//! use contactsync::{
//!     engine::fieldwise::FieldwiseComparator,
//!     persist::memory::MemoryDirectory,
//!     runtime::orchestrator::{Reconciler, Scope, SyncPolicy},
//! };
//!
//! # #[tokio::main]
//! # async fn main() {
//! let left = MemoryDirectory::new("Airtable", "a");
//! let right = MemoryDirectory::new("Google", "g");
//! let comparator = FieldwiseComparator;
//! let run = Reconciler::new(&left, &right, &comparator, SyncPolicy::default())
//!     .run(&Scope::All)
//!     .await
//!     .expect("sync");
//! println!("{}", run.summary());
//! # }
//! ```
#![deny(missing_docs)]

/// Run configuration.
pub mod config;
/// Contact domain records and payloads.
pub mod contact;
/// Identity keys, duplicate detection, and cross-source matching.
pub mod core;
/// Change digest rendering.
pub mod digest;
/// Comparator traits and merge resolver.
pub mod engine;
/// Sync run errors.
pub mod error;
/// Notification channels.
pub mod notify;
/// Run outcome model.
pub mod outcome;
/// Directory abstraction and bundled backends.
pub mod persist;
/// Sequential orchestrator and stages.
pub mod runtime;
/// Tracing subscriber setup.
pub mod telemetry;
/// Shared primitive types and enums.
pub mod types;
