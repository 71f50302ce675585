use std::collections::BTreeMap;

use crate::{
    contact::Contact,
    types::{FieldName, Side},
};

/// Per-field outcome of comparing `a` (left argument) with `b` (right argument).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verdict {
    /// `a` carries something `b` lacks and nothing the other way.
    LeftWins,
    /// `b` carries something `a` lacks and nothing the other way.
    RightWins,
    /// Both sides agree.
    Equal,
    /// Both sides carry something the other lacks.
    Diverged,
}

impl Verdict {
    /// The verdict seen from the swapped argument order.
    pub const fn swapped(self) -> Self {
        match self {
            Self::LeftWins => Self::RightWins,
            Self::RightWins => Self::LeftWins,
            other => other,
        }
    }

    /// True when the right argument has something the left one would gain.
    pub const fn right_contributes(self) -> bool {
        matches!(self, Self::RightWins | Self::Diverged)
    }
}

/// Raw values of one field on both sides of a comparison.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FieldValues {
    /// Values on the left argument.
    pub left: Vec<String>,
    /// Values on the right argument.
    pub right: Vec<String>,
}

/// Result of [`Comparator::compare`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Comparison {
    /// True when every field is [`Verdict::Equal`].
    pub is_equal: bool,
    /// Verdict for each compared field.
    pub verdicts: BTreeMap<FieldName, Verdict>,
    /// Values for each compared field.
    pub values: BTreeMap<FieldName, FieldValues>,
}

impl Comparison {
    /// Fields whose verdict is not [`Verdict::Equal`].
    pub fn differing(&self) -> impl Iterator<Item = (&FieldName, Verdict)> {
        self.verdicts
            .iter()
            .filter(|(_, v)| **v != Verdict::Equal)
            .map(|(k, v)| (k, *v))
    }
}

/// Field-level compare/merge capability for single contacts.
pub trait Comparator: Send + Sync {
    /// Compares `a` with `b`.
    ///
    /// Swapping the arguments must swap `LeftWins`/`RightWins` verdicts and
    /// keep `Equal`/`Diverged`.
    fn compare(&self, a: &Contact, b: &Contact) -> Comparison;

    /// Produces a new merged contact.
    ///
    /// `bias` selects whose id and creation time are kept and whose value
    /// wins a genuine conflict.
    fn resolve(&self, a: &Contact, b: &Contact, bias: Side) -> Contact;

    /// Collapses repeated equivalent sub-values. Idempotent.
    fn dedup(&self, contact: Contact) -> Contact;

    /// Human-readable HTML diff, or `None` when nothing meaningful differs.
    fn compare_visual(&self, edited: &Contact, original: &Contact) -> Option<String>;
}
