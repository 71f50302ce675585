use hashbrown::HashSet;
use tracing::{info, warn};

use crate::{
    contact::Contact,
    core::dupes::DuplicateGroups,
    engine::{
        resolver::{Resolution, resolve_pair},
        traits::Comparator,
    },
    error::{SyncError, SyncResult},
    outcome::{SideOutcome, UpdatedPair},
    persist::Directory,
    types::{ContactId, Side, Stage},
};

use super::orchestrator::SyncPolicy;

/// Ids removed by the delete stage, per side.
#[derive(Debug, Default, Clone)]
pub struct Removed {
    left: HashSet<ContactId>,
    right: HashSet<ContactId>,
}

impl Removed {
    /// Collects the ids deleted from each side so far.
    pub fn from_outcomes(left: &SideOutcome, right: &SideOutcome) -> Self {
        Self {
            left: left.deleted.iter().map(|c| c.id.clone()).collect(),
            right: right.deleted.iter().map(|c| c.id.clone()).collect(),
        }
    }

    /// True when `contact`, fetched from `side`, was deleted this run.
    pub fn contains(&self, side: Side, contact: &Contact) -> bool {
        match side {
            Side::Left => self.left.contains(&contact.id),
            Side::Right => self.right.contains(&contact.id),
        }
    }

    /// True when either member of a `(left, right)` pair was deleted this run.
    pub fn touches(&self, left: &Contact, right: &Contact) -> bool {
        self.contains(Side::Left, left) || self.contains(Side::Right, right)
    }
}

fn reject(
    stage: Stage,
    side: Side,
    contact: &Contact,
    err: impl std::fmt::Display,
    policy: &SyncPolicy,
    out: &mut SideOutcome,
) -> SyncResult<()> {
    let message = format!("{} {}: {err}", contact.display_name(), contact.id);
    warn!(%stage, %side, id = %contact.id, error = %err, "item rejected");
    out.errors.get_mut(stage).push(message.clone());
    if policy.stop_on_first_error && stage != Stage::Update {
        return Err(SyncError::ItemRejected {
            stage,
            side,
            message,
        });
    }
    Ok(())
}

/// Deletes every non-survivor of each duplicate group from `dir`.
#[tracing::instrument(skip_all, fields(side = %side, directory = dir.label()))]
pub async fn delete_duplicates(
    dir: &dyn Directory,
    side: Side,
    groups: &DuplicateGroups,
    policy: &SyncPolicy,
    out: &mut SideOutcome,
) -> SyncResult<()> {
    for group in groups.iter() {
        for contact in group.redundant() {
            match dir.delete(contact).await {
                Ok(Some(_)) => {
                    info!(id = %contact.id, "Deleted {}", contact.display_name());
                    out.deleted.push(contact.clone());
                }
                Ok(None) => {}
                Err(err) => reject(Stage::Delete, side, contact, err, policy, out)?,
            }
        }
    }
    Ok(())
}

/// Creates each contact from the opposite source in `dir`.
///
/// Contacts deleted from their own source earlier in the run are skipped.
#[tracing::instrument(skip_all, fields(side = %side, directory = dir.label()))]
pub async fn create_missing(
    dir: &dyn Directory,
    side: Side,
    contacts: &[Contact],
    removed: &Removed,
    policy: &SyncPolicy,
    out: &mut SideOutcome,
) -> SyncResult<()> {
    for contact in contacts {
        if removed.contains(side.other(), contact) {
            continue;
        }
        let result = match dir.contact_to_payload(contact) {
            Ok(payload) => dir.create(payload).await,
            Err(err) => Err(err),
        };
        match result {
            Ok(Some(created)) => {
                info!(id = %created.id, "Added {}", created.display_name());
                out.created.push(created);
            }
            Ok(None) => {}
            Err(err) => reject(Stage::Create, side, contact, err, policy, out)?,
        }
    }
    Ok(())
}

/// Writes merged records toward `bias` for every matched `(left, right)` pair.
#[tracing::instrument(skip_all, fields(side = %bias, directory = dir.label()))]
pub async fn update_matched(
    dir: &dyn Directory,
    bias: Side,
    pairs: &[(Contact, Contact)],
    removed: &Removed,
    comparator: &dyn Comparator,
    policy: &SyncPolicy,
    out: &mut SideOutcome,
) -> SyncResult<()> {
    let delay = policy.update_delay(bias);
    let mut errors = 0usize;

    for (left, right) in pairs {
        if removed.touches(left, right) {
            out.skipped += 1;
            continue;
        }

        let (merged, original, changes) = match resolve_pair(comparator, left, right, bias) {
            Resolution::Unchanged | Resolution::NoOp { .. } => {
                out.skipped += 1;
                continue;
            }
            Resolution::Update {
                merged,
                original,
                changes,
            } => (merged, original, changes),
        };

        match dir.update(&merged).await {
            Ok(Some(_)) => {
                let fields: Vec<&str> = changes.keys().map(String::as_str).collect();
                info!(
                    n = out.updated.len() + 1,
                    id = %merged.id,
                    fields = ?fields,
                    "Edited {}",
                    merged.display_name()
                );
                out.updated.push(UpdatedPair { merged, original });
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
            }
            Ok(None) => out.skipped += 1,
            Err(err) => {
                errors += 1;
                reject(Stage::Update, bias, &original, err, policy, out)?;
                if errors > policy.update_error_threshold {
                    warn!(
                        listed = pairs.len(),
                        skipped = out.skipped,
                        updated = out.updated.len(),
                        "update error threshold exceeded"
                    );
                    return Err(SyncError::TooManyErrors {
                        side: bias,
                        listed: pairs.len(),
                        skipped: out.skipped,
                        updated: out.updated.len(),
                        messages: out.errors.update.clone(),
                    });
                }
            }
        }
    }
    Ok(())
}
