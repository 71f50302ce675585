//! Pure matching core: identity keys, duplicate detection, cross-source matching.

/// Duplicate detection within one source.
pub mod dupes;
/// Identity key derivation and deterministic ordering.
pub mod identity;
/// Searchable contact index.
pub mod indices;
/// Cross-source matcher.
pub mod matcher;
