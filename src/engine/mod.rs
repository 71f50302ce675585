//! Comparator integration and merge resolution.

/// Bundled set-based comparator.
pub mod fieldwise;
/// Merge resolver for matched pairs.
pub mod resolver;
/// Comparator trait and comparison model.
pub mod traits;
