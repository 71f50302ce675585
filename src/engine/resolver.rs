use std::collections::BTreeMap;

use crate::{
    contact::Contact,
    types::{FieldName, Side},
};

use super::traits::{Comparator, FieldValues};

/// Outcome of reconciling one matched pair toward one side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The pair already compares equal.
    Unchanged,
    /// A merge was computed but gives the bias side nothing new.
    NoOp {
        /// The merged candidate that was discarded.
        merged: Contact,
    },
    /// The bias side should be rewritten with `merged`.
    Update {
        /// Record to write to the bias side.
        merged: Contact,
        /// The bias side's record before the write.
        original: Contact,
        /// Differing fields between `original` (left) and `merged` (right).
        changes: BTreeMap<FieldName, FieldValues>,
    },
}

/// Decides whether `left`/`right` need reconciling toward `bias` and builds the merged record.
pub fn resolve_pair(
    comparator: &dyn Comparator,
    left: &Contact,
    right: &Contact,
    bias: Side,
) -> Resolution {
    if comparator.compare(left, right).is_equal {
        return Resolution::Unchanged;
    }

    let mut merged = comparator.dedup(comparator.resolve(left, right, bias));
    merged.trim_names();

    let (target, other) = match bias {
        Side::Left => (left, right),
        Side::Right => (right, left),
    };

    let check = comparator.compare(target, &merged);
    if check.is_equal || !check.verdicts.values().any(|v| v.right_contributes()) {
        return Resolution::NoOp { merged };
    }

    let changes = check
        .differing()
        .filter_map(|(name, _)| check.values.get(name).map(|v| (name.clone(), v.clone())))
        .collect();

    Resolution::Update {
        merged: merged.inherit_extension(other),
        original: target.clone(),
        changes,
    }
}
