use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};

use contactsync::{
    contact::Contact,
    digest::{DigestConfig, summarize},
    engine::fieldwise::FieldwiseComparator,
    error::SyncError,
    notify::{Notifier, NotifyError},
    persist::memory::{Call, MemoryDirectory},
    runtime::orchestrator::{Reconciler, Scope, SyncPolicy, deliver},
    types::{Side, Stage},
};

fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).single().expect("timestamp")
}

fn contact(id: &str, first: &str, last: &str, secs: i64) -> Contact {
    Contact {
        id: id.to_string(),
        first_name: Some(first.to_string()),
        middle_name: None,
        last_name: Some(last.to_string()),
        created: at(secs),
        extension: Default::default(),
        attributes: Default::default(),
    }
}

fn with_email(mut c: Contact, email: &str) -> Contact {
    c.attributes
        .entry("email".to_string())
        .or_default()
        .push(email.to_string());
    c
}

fn quick_policy() -> SyncPolicy {
    SyncPolicy {
        right_update_delay: Duration::ZERO,
        ..SyncPolicy::default()
    }
}

#[derive(Default, Clone)]
struct RecordingNotifier {
    sent: Arc<Mutex<Vec<(String, String)>>>,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, subject: &str, html_body: &str) -> Result<(), NotifyError> {
        self.sent
            .lock()
            .expect("lock")
            .push((subject.to_string(), html_body.to_string()));
        Ok(())
    }
}

#[tokio::test]
async fn left_duplicates_are_deleted_and_survivor_is_reconciled() {
    let left = MemoryDirectory::with_contacts(
        "Airtable",
        "a",
        vec![
            contact("2", "Ann", "Smith", 100),
            contact("1", "Ann", "Smith", 0),
        ],
    );
    let right = MemoryDirectory::with_contacts(
        "Google",
        "g",
        vec![with_email(contact("r1", "Ann", "Smith", 50), "ann@x.org")],
    );
    let cmp = FieldwiseComparator;

    let run = Reconciler::new(&left, &right, &cmp, quick_policy())
        .run(&Scope::All)
        .await
        .expect("run");

    assert_eq!(run.stats.matches, 2);
    assert_eq!(run.stats.left_duplicate_groups, 1);
    assert_eq!(run.stats.only_left, 0);
    assert_eq!(run.stats.only_right, 0);

    assert_eq!(run.outcome.left.deleted.len(), 1);
    assert_eq!(run.outcome.left.deleted[0].id, "2");
    assert_eq!(
        left.calls(),
        vec![Call::Delete("2".to_string()), Call::Update("1".to_string())]
    );
    assert!(right.calls().is_empty());

    let remaining = left.snapshot();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, "1");
    assert_eq!(remaining[0].attribute("email"), &["ann@x.org"]);

    assert_eq!(run.outcome.left.updated.len(), 1);
    assert_eq!(run.outcome.left.skipped, 1);
    assert!(run.outcome.right.updated.is_empty());
}

#[tokio::test]
async fn unmatched_contacts_are_created_on_the_other_side() {
    let left = MemoryDirectory::with_contacts(
        "Airtable",
        "a",
        vec![
            contact("1", "Bob", "Jones", 0),
            contact("2", "Dup", "Only", 0),
            contact("3", "Dup", "Only", 10),
        ],
    );
    let right = MemoryDirectory::with_contacts("Google", "g", vec![contact("r1", "Cy", "Young", 0)]);
    let cmp = FieldwiseComparator;

    let run = Reconciler::new(&left, &right, &cmp, quick_policy())
        .run(&Scope::All)
        .await
        .expect("run");

    let left_names: Vec<String> = left.snapshot().iter().map(Contact::display_name).collect();
    assert_eq!(left_names, vec!["Bob Jones", "Dup Only", "Cy Young"]);
    assert_eq!(run.outcome.left.created[0].id, "a-1");

    let right_names: Vec<String> = right.snapshot().iter().map(Contact::display_name).collect();
    assert_eq!(right_names, vec!["Cy Young", "Bob Jones", "Dup Only"]);
    assert_eq!(run.outcome.right.created.len(), 2);
    assert_eq!(run.outcome.left.deleted.len(), 1);
}

#[tokio::test]
async fn rejections_are_collected_and_processing_continues() {
    let left = MemoryDirectory::with_contacts(
        "Airtable",
        "a",
        vec![
            contact("1", "Ann", "Smith", 0),
            contact("2", "Ann", "Smith", 1),
            contact("3", "Ann", "Smith", 2),
            contact("4", "Bob", "Jones", 0),
            contact("5", "Eve", "Adams", 0),
        ],
    );
    let right = MemoryDirectory::new("Google", "g");
    left.reject_id("2");
    right.reject_name("Bob Jones");
    let cmp = FieldwiseComparator;

    let run = Reconciler::new(&left, &right, &cmp, quick_policy())
        .run(&Scope::All)
        .await
        .expect("run");

    assert_eq!(run.outcome.left.errors.delete.len(), 1);
    assert_eq!(run.outcome.left.deleted.len(), 1);
    assert_eq!(run.outcome.left.deleted[0].id, "3");

    assert_eq!(run.outcome.right.errors.create.len(), 1);
    let created: Vec<String> = run
        .outcome
        .right
        .created
        .iter()
        .map(Contact::display_name)
        .collect();
    assert!(created.contains(&"Eve Adams".to_string()));
    assert!(!created.contains(&"Bob Jones".to_string()));
    let summary = run.summary();
    assert!(summary.contains("1 errors in left (Airtable)"));
    assert!(summary.contains("1 delete errors in left (Airtable)"));
    assert!(summary.contains("1 create errors in right (Google)"));
}

#[tokio::test]
async fn stop_on_first_error_aborts_the_batch() {
    let left = MemoryDirectory::with_contacts(
        "Airtable",
        "a",
        vec![
            contact("1", "Ann", "Smith", 0),
            contact("2", "Ann", "Smith", 1),
            contact("3", "Ann", "Smith", 2),
        ],
    );
    let right = MemoryDirectory::new("Google", "g");
    left.reject_id("2");
    let cmp = FieldwiseComparator;
    let policy = SyncPolicy {
        stop_on_first_error: true,
        ..quick_policy()
    };

    let err = Reconciler::new(&left, &right, &cmp, policy)
        .run(&Scope::All)
        .await
        .expect_err("should abort");

    assert!(matches!(
        err,
        SyncError::ItemRejected {
            stage: Stage::Delete,
            side: Side::Left,
            ..
        }
    ));
    assert_eq!(left.calls(), vec![Call::Delete("2".to_string())]);
    assert!(right.calls().is_empty());
}

#[tokio::test]
async fn stop_on_first_error_aborts_creates_and_keeps_earlier_writes() {
    let left = MemoryDirectory::with_contacts(
        "Airtable",
        "a",
        vec![
            contact("1", "Ann", "Smith", 0),
            contact("2", "Ann", "Smith", 1),
            contact("3", "Eve", "Adams", 0),
        ],
    );
    let right = MemoryDirectory::new("Google", "g");
    right.reject_name("Eve Adams");
    let cmp = FieldwiseComparator;
    let policy = SyncPolicy {
        stop_on_first_error: true,
        ..quick_policy()
    };

    let (run, result) = Reconciler::new(&left, &right, &cmp, policy)
        .run_partial(&Scope::All)
        .await;

    assert!(matches!(
        result,
        Err(SyncError::ItemRejected {
            stage: Stage::Create,
            side: Side::Right,
            ..
        })
    ));
    assert_eq!(right.calls(), vec![Call::Create("Eve Adams".to_string())]);
    assert_eq!(run.outcome.left.deleted.len(), 1);
    assert_eq!(run.outcome.left.deleted[0].id, "2");
    assert_eq!(run.outcome.right.errors.create.len(), 1);
    assert_eq!(run.stats.only_left, 3);

    let summary = run.summary();
    assert!(summary.contains("1 deleted from left (Airtable)"));
    assert!(summary.contains("1 create errors in right (Google)"));
}

#[tokio::test]
async fn update_stage_keeps_going_under_stop_on_first_error() {
    let names = [("A", "One"), ("B", "Two"), ("C", "Three")];
    let lefts = names
        .iter()
        .enumerate()
        .map(|(i, (f, l))| contact(&format!("l{i}"), f, l, 0))
        .collect();
    let rights = names
        .iter()
        .enumerate()
        .map(|(i, (f, l))| with_email(contact(&format!("r{i}"), f, l, 0), "x@y.org"))
        .collect();
    let left = MemoryDirectory::with_contacts("Airtable", "a", lefts);
    let right = MemoryDirectory::with_contacts("Google", "g", rights);
    left.reject_id("l0");
    left.reject_id("l1");
    let cmp = FieldwiseComparator;
    let policy = SyncPolicy {
        stop_on_first_error: true,
        ..quick_policy()
    };

    let run = Reconciler::new(&left, &right, &cmp, policy)
        .run(&Scope::All)
        .await
        .expect("update errors stay under the threshold");

    assert_eq!(run.outcome.left.errors.update.len(), 2);
    assert_eq!(run.outcome.left.updated.len(), 1);
    assert_eq!(run.outcome.left.updated[0].merged.id, "l2");
    assert_eq!(
        left.calls(),
        vec![
            Call::Update("l0".to_string()),
            Call::Update("l2".to_string()),
            Call::Update("l1".to_string()),
        ]
    );
    assert!(run.summary().contains("2 update errors in left (Airtable)"));
}

#[tokio::test]
async fn update_error_threshold_aborts_with_all_messages() {
    let names = [("A", "One"), ("B", "Two"), ("C", "Three")];
    let lefts = names
        .iter()
        .enumerate()
        .map(|(i, (f, l))| contact(&format!("l{i}"), f, l, 0))
        .collect();
    let rights = names
        .iter()
        .enumerate()
        .map(|(i, (f, l))| with_email(contact(&format!("r{i}"), f, l, 0), "x@y.org"))
        .collect();
    let left = MemoryDirectory::with_contacts("Airtable", "a", lefts);
    let right = MemoryDirectory::with_contacts("Google", "g", rights);
    for i in 0..3 {
        left.reject_id(format!("l{i}"));
    }
    let cmp = FieldwiseComparator;
    let policy = SyncPolicy {
        update_error_threshold: 1,
        ..quick_policy()
    };

    let err = Reconciler::new(&left, &right, &cmp, policy)
        .run(&Scope::All)
        .await
        .expect_err("should abort");

    match err {
        SyncError::TooManyErrors {
            side,
            listed,
            updated,
            messages,
            ..
        } => {
            assert_eq!(side, Side::Left);
            assert_eq!(listed, 3);
            assert_eq!(updated, 0);
            assert_eq!(messages.len(), 2);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(right.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn right_pass_waits_between_updates() {
    let left = MemoryDirectory::with_contacts(
        "Airtable",
        "a",
        vec![
            with_email(contact("l1", "Ann", "Smith", 0), "ann@x.org"),
            with_email(contact("l2", "Bob", "Jones", 0), "bob@x.org"),
        ],
    );
    let right = MemoryDirectory::with_contacts(
        "Google",
        "g",
        vec![contact("r1", "Ann", "Smith", 0), contact("r2", "Bob", "Jones", 0)],
    );
    let cmp = FieldwiseComparator;
    let policy = SyncPolicy {
        right_update_delay: Duration::from_secs(1),
        ..SyncPolicy::default()
    };

    let start = tokio::time::Instant::now();
    let run = Reconciler::new(&left, &right, &cmp, policy)
        .run(&Scope::All)
        .await
        .expect("run");

    assert_eq!(run.outcome.right.updated.len(), 2);
    assert!(run.outcome.left.updated.is_empty());
    assert!(start.elapsed() >= Duration::from_secs(2));
}

#[tokio::test]
async fn named_scope_only_touches_that_person() {
    let left = MemoryDirectory::with_contacts(
        "Airtable",
        "a",
        vec![contact("1", "Ann", "Smith", 0), contact("2", "Bob", "Jones", 0)],
    );
    let right = MemoryDirectory::with_contacts("Google", "g", vec![contact("r1", "Cy", "Young", 0)]);
    let cmp = FieldwiseComparator;

    let run = Reconciler::new(&left, &right, &cmp, quick_policy())
        .run(&Scope::Named {
            first: "Ann".to_string(),
            last: "Smith".to_string(),
        })
        .await
        .expect("run");

    assert_eq!(run.stats.only_left, 1);
    assert_eq!(run.stats.only_right, 0);
    assert_eq!(right.calls(), vec![Call::Create("Ann Smith".to_string())]);
    assert!(left.calls().is_empty());
}

#[tokio::test]
async fn no_changes_means_no_notification() {
    let left = MemoryDirectory::with_contacts("Airtable", "a", vec![contact("1", "Ann", "Smith", 0)]);
    let right = MemoryDirectory::with_contacts("Google", "g", vec![contact("r1", "Ann", "Smith", 0)]);
    let cmp = FieldwiseComparator;

    let run = Reconciler::new(&left, &right, &cmp, quick_policy())
        .run(&Scope::All)
        .await
        .expect("run");
    let digest = summarize(&run, &cmp, &DigestConfig::default(), at(0));
    assert_eq!(digest.changes, 0);
    assert!(!digest.should_notify);
    assert!(left.calls().is_empty());
    assert!(right.calls().is_empty());
    assert!(!run.summary().contains("errors in"));

    let notifier = RecordingNotifier::default();
    assert!(!deliver(&digest, &notifier).await);
    assert!(notifier.sent.lock().expect("lock").is_empty());
}

#[tokio::test]
async fn changes_are_delivered_once() {
    let left = MemoryDirectory::with_contacts("Airtable", "a", vec![contact("1", "Ann", "Smith", 0)]);
    let right = MemoryDirectory::new("Google", "g");
    let cmp = FieldwiseComparator;

    let run = Reconciler::new(&left, &right, &cmp, quick_policy())
        .run(&Scope::All)
        .await
        .expect("run");
    let digest = summarize(&run, &cmp, &DigestConfig::default(), at(0));

    let notifier = RecordingNotifier::default();
    assert!(deliver(&digest, &notifier).await);
    let sent = notifier.sent.lock().expect("lock");
    assert_eq!(sent.len(), 1);
    assert!(sent[0].0.starts_with("Airtable <=> Google sync changes=1"));
    assert!(sent[0].1.contains("[Added to Google]"));
}
