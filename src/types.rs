//! Shared primitive IDs and side/stage enums.

use std::fmt;
use std::str::FromStr;

use crate::error::SyncError;

/// Source-assigned contact identifier.
pub type ContactId = String;
/// Attribute name used by the comparator (e.g. `email`).
pub type FieldName = String;

/// One of the two directories being reconciled.
///
/// Also used as the merge bias: the side a given update pass writes toward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    /// The left source.
    Left,
    /// The right source.
    Right,
}

impl Side {
    /// Returns the opposite side.
    pub const fn other(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Left => f.write_str("left"),
            Self::Right => f.write_str("right"),
        }
    }
}

impl FromStr for Side {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "left" => Ok(Self::Left),
            "right" => Ok(Self::Right),
            _ => Err(SyncError::InvalidBias(s.to_string())),
        }
    }
}

/// Mutation stage of a sync run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Removal of redundant duplicates.
    Delete,
    /// Creation of records missing from one side.
    Create,
    /// Update of matched-but-divergent pairs.
    Update,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Delete => f.write_str("delete"),
            Self::Create => f.write_str("create"),
            Self::Update => f.write_str("update"),
        }
    }
}
