//! Error types for a sync run.

use thiserror::Error;

use crate::{
    config::ConfigError,
    persist::DirectoryError,
    types::{Side, Stage},
};

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that abort a sync run.
#[derive(Debug, Error)]
pub enum SyncError {
    /// A directory failed outside the per-item mutation stages.
    #[error("{side} directory error: {source}")]
    Directory {
        /// Which directory failed.
        side: Side,
        /// Underlying failure.
        #[source]
        source: DirectoryError,
    },

    /// An item was rejected while `stop_on_first_error` is set.
    #[error("{stage} in {side} directory rejected: {message}")]
    ItemRejected {
        /// Stage that was running.
        stage: Stage,
        /// Directory that rejected the item.
        side: Side,
        /// Rejection message.
        message: String,
    },

    /// The update stage collected more errors than the configured threshold.
    #[error(
        "found {} errors while updating {side} contacts (listed {listed}, skipped {skipped}, updated {updated}):\n{}",
        .messages.len(),
        .messages.join("\n")
    )]
    TooManyErrors {
        /// Directory being updated.
        side: Side,
        /// Matched pairs considered for update.
        listed: usize,
        /// Pairs that needed no write.
        skipped: usize,
        /// Pairs written before aborting.
        updated: usize,
        /// Every collected error message.
        messages: Vec<String>,
    },

    /// A bias/side value could not be parsed.
    #[error("invalid bias {0:?}: must be left or right")]
    InvalidBias(String),

    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),
}
