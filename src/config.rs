//! Run configuration (`contactsync.toml`).
//!
//! The file path comes from `CONTACTSYNC_CONFIG`, falling back to
//! [`DEFAULT_CONFIG_PATH`]. A missing file yields all defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::{
    digest::DigestConfig,
    notify::NotifyKind,
    persist::DirectoryKind,
    runtime::orchestrator::SyncPolicy,
};

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "CONTACTSYNC_CONFIG";
/// Config path used when [`CONFIG_ENV`] is unset.
pub const DEFAULT_CONFIG_PATH: &str = "contactsync.toml";

/// Errors loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file exists but could not be read.
    #[error("failed to read config {path}: {source}")]
    Io {
        /// Path that failed.
        path: PathBuf,
        /// Underlying failure.
        #[source]
        source: std::io::Error,
    },
    /// The file is not valid TOML for [`SyncConfig`].
    #[error("failed to parse config {path}: {source}")]
    Parse {
        /// Path that failed.
        path: PathBuf,
        /// Underlying failure.
        #[source]
        source: toml::de::Error,
    },
    /// A value parsed but is unusable.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level configuration.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SyncConfig {
    /// Left directory.
    #[serde(default = "DirectoryConfig::default_left")]
    pub left: DirectoryConfig,
    /// Right directory.
    #[serde(default = "DirectoryConfig::default_right")]
    pub right: DirectoryConfig,
    /// Orchestrator policy.
    #[serde(default)]
    pub sync: SyncSection,
    /// Digest thresholds.
    #[serde(default)]
    pub digest: DigestSection,
    /// Notification channel.
    #[serde(default)]
    pub notify: NotifySection,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            left: DirectoryConfig::default_left(),
            right: DirectoryConfig::default_right(),
            sync: SyncSection::default(),
            digest: DigestSection::default(),
            notify: NotifySection::default(),
        }
    }
}

impl SyncConfig {
    /// Loads from `path`; a missing file gives defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        let cfg = Self::parse(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Loads from `CONTACTSYNC_CONFIG` or the default path.
    pub fn load_from_env() -> Result<Self, ConfigError> {
        let path = std::env::var_os(CONFIG_ENV)
            .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);
        Self::load(&path)
    }

    /// Parses TOML text.
    pub fn parse(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.left.path == self.right.path {
            return Err(ConfigError::Invalid(format!(
                "left and right directories share the path {}",
                self.left.path.display()
            )));
        }
        Ok(())
    }

    /// Orchestrator policy derived from `[sync]`.
    pub fn policy(&self) -> SyncPolicy {
        SyncPolicy {
            stop_on_first_error: self.sync.stop_on_first_error,
            update_error_threshold: self.sync.update_error_threshold,
            left_update_delay: Duration::from_millis(self.sync.left_update_delay_ms),
            right_update_delay: Duration::from_millis(self.sync.right_update_delay_ms),
        }
    }

    /// Digest settings derived from `[digest]`.
    pub fn digest(&self) -> DigestConfig {
        DigestConfig {
            detail_threshold: self.digest.detail_threshold,
            count_deletions: self.digest.count_deletions,
        }
    }
}

// ---------------------------------------------------------------------------
// DirectoryConfig
// ---------------------------------------------------------------------------

/// One directory's backend.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DirectoryConfig {
    /// Operator-facing name.
    pub label: String,
    /// Backend kind.
    pub kind: DirectoryKind,
    /// Backend file.
    pub path: PathBuf,
}

impl DirectoryConfig {
    fn default_left() -> Self {
        Self {
            label: "Left".to_owned(),
            kind: DirectoryKind::Sqlite,
            path: PathBuf::from("left-contacts.db"),
        }
    }

    fn default_right() -> Self {
        Self {
            label: "Right".to_owned(),
            kind: DirectoryKind::Json,
            path: PathBuf::from("right-contacts.json"),
        }
    }
}

// ---------------------------------------------------------------------------
// SyncSection
// ---------------------------------------------------------------------------

/// `[sync]` table.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct SyncSection {
    /// Abort delete/create stages on the first rejection.
    pub stop_on_first_error: bool,
    /// Update-stage error count that aborts the run.
    pub update_error_threshold: usize,
    /// Pause after each left update, in milliseconds.
    pub left_update_delay_ms: u64,
    /// Pause after each right update, in milliseconds.
    pub right_update_delay_ms: u64,
}

impl Default for SyncSection {
    fn default() -> Self {
        let policy = SyncPolicy::default();
        Self {
            stop_on_first_error: policy.stop_on_first_error,
            update_error_threshold: policy.update_error_threshold,
            left_update_delay_ms: duration_ms(policy.left_update_delay),
            right_update_delay_ms: duration_ms(policy.right_update_delay),
        }
    }
}

fn duration_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

// ---------------------------------------------------------------------------
// DigestSection
// ---------------------------------------------------------------------------

/// `[digest]` table.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct DigestSection {
    /// Change count above which the report drops field-level diffs.
    pub detail_threshold: usize,
    /// Whether deletions count as changes and appear in the report.
    pub count_deletions: bool,
}

impl Default for DigestSection {
    fn default() -> Self {
        let cfg = DigestConfig::default();
        Self {
            detail_threshold: cfg.detail_threshold,
            count_deletions: cfg.count_deletions,
        }
    }
}

// ---------------------------------------------------------------------------
// NotifySection
// ---------------------------------------------------------------------------

/// `[notify]` table.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct NotifySection {
    /// Channel kind.
    pub kind: NotifyKind,
    /// Directory for the outbox channel.
    pub outbox_dir: PathBuf,
}

impl Default for NotifySection {
    fn default() -> Self {
        Self {
            kind: NotifyKind::Log,
            outbox_dir: PathBuf::from("outbox"),
        }
    }
}
