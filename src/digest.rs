//! Change digest: turns a finished run into a notification subject and HTML body.
//!
//! Rendering is pure. Whether and how the digest is sent is decided by
//! [`crate::runtime::orchestrator::deliver`].

use std::fmt::Write as _;

use chrono::{DateTime, Utc};

use crate::{
    contact::Contact,
    engine::traits::Comparator,
    outcome::{SyncOutcome, SyncRun},
    types::Side,
};

/// Crate version stamped at the top of every report.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Size cutoffs for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DigestConfig {
    /// Change count above which the report lists names only.
    pub detail_threshold: usize,
    /// Whether deletions count as changes and are reported.
    pub count_deletions: bool,
}

impl Default for DigestConfig {
    fn default() -> Self {
        Self {
            detail_threshold: 50,
            count_deletions: true,
        }
    }
}

/// How much detail the body carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DigestDetail {
    /// Totals plus name lists.
    Condensed,
    /// Per-contact tables and field-level diffs.
    Detailed,
}

/// Rendered report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Digest {
    /// Notification subject.
    pub subject: String,
    /// HTML body.
    pub body: String,
    /// Counted changes.
    pub changes: usize,
    /// Detail level chosen for `body`.
    pub detail: DigestDetail,
    /// False when nothing changed.
    pub should_notify: bool,
}

/// Creates plus updates, plus deletes when `count_deletions` is set.
pub fn change_count(outcome: &SyncOutcome, config: &DigestConfig) -> usize {
    let mut n = outcome.created() + outcome.updated();
    if config.count_deletions {
        n += outcome.deleted();
    }
    n
}

/// Renders `run` into a [`Digest`].
pub fn summarize(
    run: &SyncRun,
    comparator: &dyn Comparator,
    config: &DigestConfig,
    now: DateTime<Utc>,
) -> Digest {
    let changes = change_count(&run.outcome, config);
    let subject = format!(
        "{} <=> {} sync changes={changes} ({})",
        run.left_label,
        run.right_label,
        now.format("%Y-%m-%d %H:%M:%S")
    );

    let mut body = format!("contactsync version: {VERSION}<br>");
    body.push_str(&escape_html(&run.summary()).replace('\n', "<br>"));
    body.push_str("<br>=====<p>");

    let detail = if changes > config.detail_threshold {
        render_condensed(&mut body, run, changes, config);
        DigestDetail::Condensed
    } else {
        render_detailed(&mut body, run, comparator, config);
        DigestDetail::Detailed
    };

    Digest {
        subject,
        body,
        changes,
        detail,
        should_notify: changes > 0,
    }
}

fn render_condensed(body: &mut String, run: &SyncRun, changes: usize, config: &DigestConfig) {
    let _ = write!(
        body,
        "Too many changes to break down with graphics ({changes})<p>"
    );
    let sides = [Side::Left, Side::Right];
    if config.count_deletions {
        for side in sides {
            let names = run.outcome.side(side).deleted.iter();
            name_list(body, &format!("deleted from {}", run.label(side)), names);
        }
    }
    for side in sides {
        let names = run.outcome.side(side).created.iter();
        name_list(body, &format!("added to {}", run.label(side)), names);
    }
    for side in sides {
        let names = run.outcome.side(side).updated.iter().map(|p| &p.original);
        name_list(body, &format!("edited in {}", run.label(side)), names);
    }
}

fn name_list<'a>(body: &mut String, heading: &str, contacts: impl Iterator<Item = &'a Contact>) {
    let _ = write!(body, "<p>{}:<br>", escape_html(heading));
    for (ind, c) in contacts.enumerate() {
        let _ = write!(body, "{}: {}<br>", ind + 1, escape_html(&c.display_name()));
    }
}

fn render_detailed(
    body: &mut String,
    run: &SyncRun,
    comparator: &dyn Comparator,
    config: &DigestConfig,
) {
    let sides = [Side::Left, Side::Right];
    if config.count_deletions {
        for side in sides {
            for c in &run.outcome.side(side).deleted {
                let _ = write!(
                    body,
                    "[Deleted from {}]<br>{}<p>",
                    escape_html(run.label(side)),
                    contact_table(c)
                );
            }
        }
    }
    for side in sides {
        for c in &run.outcome.side(side).created {
            let _ = write!(
                body,
                "[Added to {}]<br>{}<p>",
                escape_html(run.label(side)),
                contact_table(c)
            );
        }
    }
    for side in sides {
        for pair in &run.outcome.side(side).updated {
            let Some(diff) = comparator.compare_visual(&pair.merged, &pair.original) else {
                continue;
            };
            let _ = write!(
                body,
                "[Edited in {}]<br>{diff}<p>",
                escape_html(run.label(side))
            );
        }
    }
}

/// Two-column table of a contact's non-empty fields.
pub fn contact_table(contact: &Contact) -> String {
    let mut rows = String::new();
    let names = [
        ("first_name", &contact.first_name),
        ("middle_name", &contact.middle_name),
        ("last_name", &contact.last_name),
    ];
    for (field, value) in names {
        if let Some(v) = value.as_deref().filter(|v| !v.is_empty()) {
            let _ = write!(
                rows,
                "<tr><th>{field}</th><td>{}</td></tr>",
                escape_html(v)
            );
        }
    }
    for (field, values) in &contact.attributes {
        if values.is_empty() {
            continue;
        }
        let _ = write!(
            rows,
            "<tr><th>{}</th><td>{}</td></tr>",
            escape_html(field),
            escape_html(&values.join(", "))
        );
    }
    format!("<table>{rows}</table>")
}

/// Simple HTML escaping.
pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}
