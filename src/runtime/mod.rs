//! Sequential sync orchestration.

/// Reconciler, policy, and notification boundary.
pub mod orchestrator;
/// Delete, create, and update stages.
pub mod stages;
