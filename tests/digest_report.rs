use chrono::{DateTime, TimeZone, Utc};

use contactsync::{
    contact::Contact,
    digest::{DigestConfig, DigestDetail, change_count, summarize},
    engine::fieldwise::FieldwiseComparator,
    outcome::{RunStats, SyncOutcome, SyncRun, UpdatedPair},
};

fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).single().expect("timestamp")
}

fn contact(id: &str, first: &str, last: &str) -> Contact {
    Contact {
        id: id.to_string(),
        first_name: Some(first.to_string()),
        middle_name: None,
        last_name: Some(last.to_string()),
        created: at(0),
        extension: Default::default(),
        attributes: Default::default(),
    }
}

fn run(outcome: SyncOutcome) -> SyncRun {
    SyncRun {
        left_label: "Airtable".to_string(),
        right_label: "Google".to_string(),
        stats: RunStats::default(),
        outcome,
    }
}

fn edited(id: &str) -> UpdatedPair {
    let original = contact(id, "Ann", "Smith");
    let mut merged = original.clone();
    merged
        .attributes
        .insert("email".to_string(), vec!["ann@x.org".to_string()]);
    UpdatedPair { merged, original }
}

#[test]
fn large_runs_are_condensed_to_name_lists() {
    let mut outcome = SyncOutcome::default();
    outcome.right.created = (0..60)
        .map(|i| contact(&format!("g{i}"), "Person", &format!("N{i}")))
        .collect();
    let digest = summarize(
        &run(outcome),
        &FieldwiseComparator,
        &DigestConfig::default(),
        at(0),
    );

    assert_eq!(digest.changes, 60);
    assert_eq!(digest.detail, DigestDetail::Condensed);
    assert!(digest.should_notify);
    assert!(digest.body.contains("Too many changes to break down with graphics (60)"));
    assert!(digest.body.contains("added to Google:"));
    assert!(digest.body.contains("60: Person N59"));
    assert!(!digest.body.contains("<table>"));
    assert_eq!(
        digest.subject,
        "Airtable <=> Google sync changes=60 (1970-01-01 00:00:00)"
    );
}

#[test]
fn small_runs_carry_tables_and_diffs() {
    let mut outcome = SyncOutcome::default();
    outcome.right.created = vec![contact("g1", "Bob", "Jones")];
    outcome.left.updated = vec![edited("a1")];
    outcome.left.deleted = vec![contact("a2", "Ann", "Smith")];
    let digest = summarize(
        &run(outcome),
        &FieldwiseComparator,
        &DigestConfig::default(),
        at(0),
    );

    assert_eq!(digest.changes, 3);
    assert_eq!(digest.detail, DigestDetail::Detailed);
    assert!(digest.body.contains("[Deleted from Airtable]"));
    assert!(digest.body.contains("[Added to Google]"));
    assert!(digest.body.contains("<td>Jones</td>"));
    assert!(digest.body.contains("[Edited in Airtable]"));
    assert!(digest.body.contains("ann@x.org"));
    assert!(digest.body.starts_with("contactsync version: "));
}

#[test]
fn exactly_threshold_changes_stay_detailed() {
    let mut outcome = SyncOutcome::default();
    outcome.left.created = (0..50)
        .map(|i| contact(&format!("a{i}"), "Person", &format!("N{i}")))
        .collect();
    let digest = summarize(
        &run(outcome),
        &FieldwiseComparator,
        &DigestConfig::default(),
        at(0),
    );
    assert_eq!(digest.detail, DigestDetail::Detailed);
}

#[test]
fn empty_run_does_not_notify() {
    let digest = summarize(
        &run(SyncOutcome::default()),
        &FieldwiseComparator,
        &DigestConfig::default(),
        at(0),
    );
    assert_eq!(digest.changes, 0);
    assert!(!digest.should_notify);
    assert!(digest.body.contains("=== STATS ==="));
}

#[test]
fn deletions_can_be_left_out_of_the_count() {
    let mut outcome = SyncOutcome::default();
    outcome.left.deleted = vec![contact("a2", "Ann", "Smith")];
    let config = DigestConfig {
        count_deletions: false,
        ..DigestConfig::default()
    };

    assert_eq!(change_count(&outcome, &config), 0);
    assert_eq!(change_count(&outcome, &DigestConfig::default()), 1);

    let digest = summarize(&run(outcome), &FieldwiseComparator, &config, at(0));
    assert!(!digest.should_notify);
    assert!(!digest.body.contains("[Deleted from"));
}

#[test]
fn markup_in_names_is_escaped() {
    let mut outcome = SyncOutcome::default();
    outcome.right.created = vec![contact("g1", "<b>Bob</b>", "Jones")];
    let digest = summarize(
        &run(outcome),
        &FieldwiseComparator,
        &DigestConfig::default(),
        at(0),
    );
    assert!(digest.body.contains("&lt;b&gt;Bob&lt;/b&gt;"));
    assert!(!digest.body.contains("<b>Bob"));
}
