use std::collections::{BTreeMap, BTreeSet};

use crate::{
    contact::{Attributes, Contact},
    digest::escape_html,
    types::Side,
};

use super::traits::{Comparator, Comparison, FieldValues, Verdict};

/// Name of the first-name field in comparisons.
pub const FIRST_NAME: &str = "first_name";
/// Name of the middle-name field in comparisons.
pub const MIDDLE_NAME: &str = "middle_name";
/// Name of the last-name field in comparisons.
pub const LAST_NAME: &str = "last_name";

/// Set-based comparator over name fields and attribute lists.
///
/// A field's values are compared as sets. Whichever side is a strict
/// superset wins. Resolution unions attribute lists (bias side first) and
/// takes the bias side's name on a conflict.
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldwiseComparator;

impl FieldwiseComparator {
    fn fields(contact: &Contact) -> BTreeMap<String, Vec<String>> {
        let mut out = BTreeMap::new();
        for (name, value) in [
            (FIRST_NAME, &contact.first_name),
            (MIDDLE_NAME, &contact.middle_name),
            (LAST_NAME, &contact.last_name),
        ] {
            out.insert(
                name.to_string(),
                value.iter().filter(|v| !v.is_empty()).cloned().collect(),
            );
        }
        for (name, values) in &contact.attributes {
            out.insert(name.clone(), values.clone());
        }
        out
    }
}

fn verdict(a: &[String], b: &[String]) -> Verdict {
    let a: BTreeSet<&String> = a.iter().collect();
    let b: BTreeSet<&String> = b.iter().collect();
    let a_extra = a.difference(&b).next().is_some();
    let b_extra = b.difference(&a).next().is_some();
    match (a_extra, b_extra) {
        (false, false) => Verdict::Equal,
        (true, false) => Verdict::LeftWins,
        (false, true) => Verdict::RightWins,
        (true, true) => Verdict::Diverged,
    }
}

fn pick_name(win: &Option<String>, lose: &Option<String>) -> Option<String> {
    match win.as_deref() {
        Some(v) if !v.is_empty() => Some(v.to_string()),
        _ => lose.clone().filter(|v| !v.is_empty()),
    }
}

fn union_attributes(win: &Attributes, lose: &Attributes) -> Attributes {
    let mut out = win.clone();
    for (name, values) in lose {
        let merged = out.entry(name.clone()).or_default();
        for v in values {
            if !merged.contains(v) {
                merged.push(v.clone());
            }
        }
    }
    out
}

fn equivalence_key(value: &str) -> String {
    value.trim().to_lowercase()
}

impl Comparator for FieldwiseComparator {
    fn compare(&self, a: &Contact, b: &Contact) -> Comparison {
        let fa = Self::fields(a);
        let fb = Self::fields(b);
        let names: BTreeSet<&String> = fa.keys().chain(fb.keys()).collect();

        let mut cmp = Comparison {
            is_equal: true,
            ..Comparison::default()
        };
        for name in names {
            let left = fa.get(name).cloned().unwrap_or_default();
            let right = fb.get(name).cloned().unwrap_or_default();
            let v = verdict(&left, &right);
            if v != Verdict::Equal {
                cmp.is_equal = false;
            }
            cmp.verdicts.insert(name.clone(), v);
            cmp.values.insert(name.clone(), FieldValues { left, right });
        }
        cmp
    }

    fn resolve(&self, a: &Contact, b: &Contact, bias: Side) -> Contact {
        let (win, lose) = match bias {
            Side::Left => (a, b),
            Side::Right => (b, a),
        };
        Contact {
            id: win.id.clone(),
            first_name: pick_name(&win.first_name, &lose.first_name),
            middle_name: pick_name(&win.middle_name, &lose.middle_name),
            last_name: pick_name(&win.last_name, &lose.last_name),
            created: win.created,
            extension: win.extension.clone(),
            attributes: union_attributes(&win.attributes, &lose.attributes),
        }
    }

    fn dedup(&self, mut contact: Contact) -> Contact {
        for values in contact.attributes.values_mut() {
            let mut seen = BTreeSet::new();
            values.retain(|v| !v.trim().is_empty() && seen.insert(equivalence_key(v)));
        }
        contact.attributes.retain(|_, values| !values.is_empty());
        for name in [
            &mut contact.first_name,
            &mut contact.middle_name,
            &mut contact.last_name,
        ] {
            if name.as_deref().is_some_and(|v| v.trim().is_empty()) {
                *name = None;
            }
        }
        contact
    }

    fn compare_visual(&self, edited: &Contact, original: &Contact) -> Option<String> {
        let cmp = self.compare(original, edited);
        let mut rows = String::new();
        for (name, _) in cmp.differing() {
            let values = cmp.values.get(name).cloned().unwrap_or_default();
            rows.push_str(&format!(
                "<tr><th>{}</th><td>{}</td><td>{}</td></tr>",
                escape_html(name),
                escape_html(&values.left.join(", ")),
                escape_html(&values.right.join(", ")),
            ));
        }
        if rows.is_empty() {
            return None;
        }
        Some(format!(
            "<table><tr><th>{}</th><th>before</th><th>after</th></tr>{rows}</table>",
            escape_html(&original.display_name()),
        ))
    }
}
