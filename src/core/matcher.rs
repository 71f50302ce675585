use hashbrown::HashSet;

use crate::{contact::Contact, types::ContactId};

use super::{identity::sort_by_identity, indices::ContactSearch};

/// Ids of right-side contacts that were referenced as a match candidate.
pub type FoundSet = HashSet<ContactId>;

/// A left contact paired with its right-side candidates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchRecord {
    /// Candidates on the left; matching starts from the left, so one entry.
    pub left: Vec<Contact>,
    /// Candidates on the right, primary first. Never empty.
    pub right: Vec<Contact>,
}

impl MatchRecord {
    /// The left contact that initiated the match.
    pub fn left_primary(&self) -> &Contact {
        &self.left[0]
    }

    /// The first right candidate.
    pub fn right_primary(&self) -> &Contact {
        &self.right[0]
    }

    /// True when the right source holds several candidates for this person.
    pub fn has_right_duplicates(&self) -> bool {
        self.right.len() > 1
    }

    /// True when the left source holds several candidates for this person.
    pub fn has_left_duplicates(&self) -> bool {
        self.left.len() > 1
    }
}

/// Partitioned result of [`match_contacts`].
#[derive(Debug, Clone, Default)]
pub struct MatchReport {
    /// Matched pairs in left identity-key order.
    pub matches: Vec<MatchRecord>,
    /// Left contacts with no right candidate.
    pub unmatched_left: Vec<Contact>,
    /// Right contacts never referenced as a candidate.
    pub unmatched_right: Vec<Contact>,
    /// Right candidate lists of matches with more than one candidate.
    pub right_duplicates: Vec<Vec<Contact>>,
    /// Left candidate lists of matches with more than one candidate.
    pub left_duplicates: Vec<Vec<Contact>>,
    /// Right ids marked found during this pass.
    pub found: FoundSet,
}

impl MatchReport {
    /// `(left, primary right)` pairs, cloned for the update stages.
    pub fn pairs(&self) -> Vec<(Contact, Contact)> {
        self.matches
            .iter()
            .map(|m| (m.left_primary().clone(), m.right_primary().clone()))
            .collect()
    }
}

/// Pairs contacts across sources.
///
/// `found` seeds the found-set; the updated set is returned in
/// [`MatchReport::found`].
pub fn match_contacts(
    left: &dyn ContactSearch,
    right: &dyn ContactSearch,
    found: FoundSet,
) -> MatchReport {
    let mut report = MatchReport {
        found,
        ..MatchReport::default()
    };

    let mut lefts = left.contacts().to_vec();
    sort_by_identity(&mut lefts);

    for contact in lefts {
        let candidates = right.find(&contact);
        if candidates.is_empty() {
            report.unmatched_left.push(contact);
            continue;
        }
        for candidate in &candidates {
            report.found.insert(candidate.id.clone());
        }
        report.matches.push(MatchRecord {
            left: vec![contact],
            right: candidates,
        });
    }

    let mut rights = right.contacts().to_vec();
    sort_by_identity(&mut rights);
    report.unmatched_right = rights
        .into_iter()
        .filter(|c| !report.found.contains(&c.id))
        .collect();

    for m in &report.matches {
        if m.has_right_duplicates() {
            report.right_duplicates.push(m.right.clone());
        }
        if m.has_left_duplicates() {
            report.left_duplicates.push(m.left.clone());
        }
    }

    report
}
