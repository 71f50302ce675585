//! Per-run outcome accumulated by the orchestrator.

use std::fmt::Write as _;

use crate::{
    contact::Contact,
    types::{Side, Stage},
};

/// A written merge and the destination record it replaced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdatedPair {
    /// Record that was written.
    pub merged: Contact,
    /// Destination record before the write.
    pub original: Contact,
}

/// Rejection messages collected per operation kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StageErrors {
    /// Delete-stage rejections.
    pub delete: Vec<String>,
    /// Create-stage rejections.
    pub create: Vec<String>,
    /// Update-stage rejections.
    pub update: Vec<String>,
}

impl StageErrors {
    /// Messages for `stage`.
    pub fn get(&self, stage: Stage) -> &[String] {
        match stage {
            Stage::Delete => &self.delete,
            Stage::Create => &self.create,
            Stage::Update => &self.update,
        }
    }

    /// Mutable messages for `stage`.
    pub fn get_mut(&mut self, stage: Stage) -> &mut Vec<String> {
        match stage {
            Stage::Delete => &mut self.delete,
            Stage::Create => &mut self.create,
            Stage::Update => &mut self.update,
        }
    }

    /// Total messages across stages.
    pub fn len(&self) -> usize {
        self.delete.len() + self.create.len() + self.update.len()
    }

    /// True when nothing was rejected.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// What one directory received during a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SideOutcome {
    /// Contacts created in this directory, as returned by it.
    pub created: Vec<Contact>,
    /// Contacts rewritten in this directory.
    pub updated: Vec<UpdatedPair>,
    /// Redundant duplicates removed from this directory.
    pub deleted: Vec<Contact>,
    /// Matched pairs that needed no write in this directory.
    pub skipped: usize,
    /// Rejections by stage.
    pub errors: StageErrors,
}

/// Both directories' outcomes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncOutcome {
    /// Left directory outcome.
    pub left: SideOutcome,
    /// Right directory outcome.
    pub right: SideOutcome,
}

impl SyncOutcome {
    /// Outcome for `side`.
    pub fn side(&self, side: Side) -> &SideOutcome {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }

    /// Mutable outcome for `side`.
    pub fn side_mut(&mut self, side: Side) -> &mut SideOutcome {
        match side {
            Side::Left => &mut self.left,
            Side::Right => &mut self.right,
        }
    }

    /// Created contacts across both sides.
    pub fn created(&self) -> usize {
        self.left.created.len() + self.right.created.len()
    }

    /// Updated contacts across both sides.
    pub fn updated(&self) -> usize {
        self.left.updated.len() + self.right.updated.len()
    }

    /// Deleted contacts across both sides.
    pub fn deleted(&self) -> usize {
        self.left.deleted.len() + self.right.deleted.len()
    }
}

/// Matching and detection counts for the operator summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Matched pairs.
    pub matches: usize,
    /// Contacts only in the left directory.
    pub only_left: usize,
    /// Contacts only in the right directory.
    pub only_right: usize,
    /// Duplicate groups inside the left directory.
    pub left_duplicate_groups: usize,
    /// Duplicate groups inside the right directory.
    pub right_duplicate_groups: usize,
    /// Matches with several left candidates.
    pub left_match_duplicates: usize,
    /// Matches with several right candidates.
    pub right_match_duplicates: usize,
}

/// Everything a finished run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncRun {
    /// Left directory label.
    pub left_label: String,
    /// Right directory label.
    pub right_label: String,
    /// Matching counts.
    pub stats: RunStats,
    /// Writes and rejections.
    pub outcome: SyncOutcome,
}

impl SyncRun {
    /// Label for `side`.
    pub fn label(&self, side: Side) -> &str {
        match side {
            Side::Left => &self.left_label,
            Side::Right => &self.right_label,
        }
    }

    /// Plain-text summary printed after every run.
    pub fn summary(&self) -> String {
        let l = &self.left_label;
        let r = &self.right_label;
        let s = &self.stats;
        let o = &self.outcome;
        let mut out = String::new();
        let _ = writeln!(out, "=== STATS ===");
        let _ = writeln!(out, "{} matches", s.matches);
        let _ = writeln!(out, "{} only in left ({l})", s.only_left);
        let _ = writeln!(out, "{} only in right ({r})", s.only_right);
        let _ = writeln!(out, "{} duplicate groups in left ({l})", s.left_duplicate_groups);
        let _ = writeln!(out, "{} duplicate groups in right ({r})", s.right_duplicate_groups);
        let _ = writeln!(out, "{} left match duplicates ({l})", s.left_match_duplicates);
        let _ = writeln!(out, "{} right match duplicates ({r})", s.right_match_duplicates);
        let _ = writeln!(out, "==============");
        let _ = writeln!(out);
        let _ = writeln!(out, "{} deleted from left ({l})", o.left.deleted.len());
        let _ = writeln!(out, "{} deleted from right ({r})", o.right.deleted.len());
        let _ = writeln!(out, "{} added to left ({l})", o.left.created.len());
        let _ = writeln!(out, "{} edited in left ({l})", o.left.updated.len());
        let _ = writeln!(out, "{} added to right ({r})", o.right.created.len());
        let _ = writeln!(out, "{} edited in right ({r})", o.right.updated.len());
        for side in [Side::Left, Side::Right] {
            let errors = &o.side(side).errors;
            if errors.is_empty() {
                continue;
            }
            let _ = writeln!(out, "{} errors in {side} ({})", errors.len(), self.label(side));
            for stage in [Stage::Delete, Stage::Create, Stage::Update] {
                let msgs = errors.get(stage);
                if !msgs.is_empty() {
                    let _ = writeln!(
                        out,
                        "{} {stage} errors in {side} ({})",
                        msgs.len(),
                        self.label(side)
                    );
                }
            }
        }
        out
    }
}
