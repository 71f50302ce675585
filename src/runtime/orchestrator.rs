use std::time::Duration;

use tracing::{info, warn};

use crate::{
    contact::Contact,
    core::{
        dupes::find_duplicates,
        indices::{ContactSearch, NameIndex},
        matcher::{FoundSet, match_contacts},
    },
    digest::Digest,
    engine::traits::Comparator,
    error::{SyncError, SyncResult},
    notify::Notifier,
    outcome::{RunStats, SyncOutcome, SyncRun},
    persist::Directory,
    types::Side,
};

use super::stages::{Removed, create_missing, delete_duplicates, update_matched};

/// Failure handling and pacing for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncPolicy {
    /// Abort on the first rejected delete or create.
    pub stop_on_first_error: bool,
    /// Number of update errors tolerated before the run aborts.
    pub update_error_threshold: usize,
    /// Pause after each successful left update.
    pub left_update_delay: Duration,
    /// Pause after each successful right update.
    pub right_update_delay: Duration,
}

impl Default for SyncPolicy {
    fn default() -> Self {
        Self {
            stop_on_first_error: false,
            update_error_threshold: 5000,
            left_update_delay: Duration::ZERO,
            right_update_delay: Duration::from_secs(1),
        }
    }
}

impl SyncPolicy {
    /// Pause applied after each update written to `side`.
    pub fn update_delay(&self, side: Side) -> Duration {
        match side {
            Side::Left => self.left_update_delay,
            Side::Right => self.right_update_delay,
        }
    }
}

/// Which contacts a run operates on.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Scope {
    /// Every contact in both directories.
    #[default]
    All,
    /// Only contacts with this exact first and last name.
    Named {
        /// First name.
        first: String,
        /// Last name.
        last: String,
    },
}

/// Drives one bidirectional reconciliation between two directories.
pub struct Reconciler<'a> {
    left: &'a dyn Directory,
    right: &'a dyn Directory,
    comparator: &'a dyn Comparator,
    policy: SyncPolicy,
}

impl<'a> Reconciler<'a> {
    /// Builds a reconciler over `left` and `right`.
    pub fn new(
        left: &'a dyn Directory,
        right: &'a dyn Directory,
        comparator: &'a dyn Comparator,
        policy: SyncPolicy,
    ) -> Self {
        Self {
            left,
            right,
            comparator,
            policy,
        }
    }

    fn directory(&self, side: Side) -> &'a dyn Directory {
        match side {
            Side::Left => self.left,
            Side::Right => self.right,
        }
    }

    async fn fetch(&self, side: Side, scope: &Scope) -> SyncResult<Vec<Contact>> {
        let dir = self.directory(side);
        let fetched = match scope {
            Scope::All => dir.list().await,
            Scope::Named { first, last } => dir.get_by_name(first, last).await,
        };
        fetched.map_err(|source| SyncError::Directory { side, source })
    }

    /// Runs every stage in order and returns what was done.
    ///
    /// Duplicate detection and matching both look at the contacts as
    /// fetched. Creates and updates that involve a contact removed by the
    /// delete stage are skipped.
    pub async fn run(&self, scope: &Scope) -> SyncResult<SyncRun> {
        let (run, result) = self.run_partial(scope).await;
        result.map(|()| run)
    }

    /// Like [`Reconciler::run`], but also hands back the writes made before
    /// an abort.
    #[tracing::instrument(skip_all, fields(left = self.left.label(), right = self.right.label()))]
    pub async fn run_partial(&self, scope: &Scope) -> (SyncRun, SyncResult<()>) {
        let mut run = SyncRun {
            left_label: self.left.label().to_string(),
            right_label: self.right.label().to_string(),
            stats: RunStats::default(),
            outcome: SyncOutcome::default(),
        };
        let result = self.execute(scope, &mut run.stats, &mut run.outcome).await;
        if let Err(err) = &result {
            warn!(error = %err, "run aborted");
        }
        (run, result)
    }

    async fn execute(
        &self,
        scope: &Scope,
        stats: &mut RunStats,
        outcome: &mut SyncOutcome,
    ) -> SyncResult<()> {
        match scope {
            Scope::All => info!("no name provided, operating on all contacts"),
            Scope::Named { first, last } => info!("working on {first} {last}"),
        }

        let left = NameIndex::new(self.fetch(Side::Left, scope).await?);
        let right = NameIndex::new(self.fetch(Side::Right, scope).await?);
        info!(left = left.len(), right = right.len(), "fetched contacts");

        let report = match_contacts(&left, &right, FoundSet::new());
        let left_dupes = find_duplicates(left.contacts());
        let right_dupes = find_duplicates(right.contacts());
        info!(
            left = left_dupes.len(),
            right = right_dupes.len(),
            "duplicate groups"
        );

        *stats = RunStats {
            matches: report.matches.len(),
            only_left: report.unmatched_left.len(),
            only_right: report.unmatched_right.len(),
            left_duplicate_groups: left_dupes.len(),
            right_duplicate_groups: right_dupes.len(),
            left_match_duplicates: report.left_duplicates.len(),
            right_match_duplicates: report.right_duplicates.len(),
        };

        let policy = &self.policy;

        delete_duplicates(self.left, Side::Left, &left_dupes, policy, &mut outcome.left).await?;
        delete_duplicates(self.right, Side::Right, &right_dupes, policy, &mut outcome.right).await?;
        let removed = Removed::from_outcomes(&outcome.left, &outcome.right);

        create_missing(
            self.left,
            Side::Left,
            &report.unmatched_right,
            &removed,
            policy,
            &mut outcome.left,
        )
        .await?;
        create_missing(
            self.right,
            Side::Right,
            &report.unmatched_left,
            &removed,
            policy,
            &mut outcome.right,
        )
        .await?;

        let pairs = report.pairs();
        for side in [Side::Left, Side::Right] {
            update_matched(
                self.directory(side),
                side,
                &pairs,
                &removed,
                self.comparator,
                policy,
                outcome.side_mut(side),
            )
            .await?;
        }
        Ok(())
    }
}

/// Sends `digest` when it reports changes. Returns whether a send succeeded.
///
/// Notification is best-effort: failures are logged, never propagated.
pub async fn deliver(digest: &Digest, notifier: &dyn Notifier) -> bool {
    if !digest.should_notify {
        info!("no changes, skipping notification");
        return false;
    }
    match notifier.send(&digest.subject, &digest.body).await {
        Ok(()) => true,
        Err(err) => {
            warn!(error = %err, "notification failed");
            false
        }
    }
}
