use chrono::{TimeZone, Utc};
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};

use contactsync::{
    contact::Contact,
    core::{
        dupes::find_duplicates,
        indices::NameIndex,
        matcher::{FoundSet, match_contacts},
    },
    engine::fieldwise::FieldwiseComparator,
    engine::resolver::resolve_pair,
    types::Side,
};

fn contact(prefix: &str, i: u64) -> Contact {
    let family = i % 7_000;
    Contact {
        id: format!("{prefix}{i}"),
        first_name: Some(format!("F{}", i % 13)),
        middle_name: None,
        last_name: Some(format!("L{family}")),
        created: Utc
            .timestamp_opt(i as i64, 0)
            .single()
            .expect("timestamp"),
        extension: Default::default(),
        attributes: [("email".to_string(), vec![format!("{prefix}{i}@x.org")])]
            .into_iter()
            .collect(),
    }
}

fn side(prefix: &str, n: u64) -> Vec<Contact> {
    (0..n).map(|i| contact(prefix, i)).collect()
}

fn bench_match(c: &mut Criterion) {
    let left = NameIndex::new(side("l", 50_000));
    let right = NameIndex::new(side("r", 50_000));
    c.bench_function("match_contacts_50k", |b| {
        b.iter(|| match_contacts(&left, &right, FoundSet::new()));
    });
}

fn bench_duplicates(c: &mut Criterion) {
    let mut group = c.benchmark_group("find_duplicates");
    for n in [1_000u64, 10_000, 50_000] {
        let contacts = side("c", n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &contacts, |b, contacts| {
            b.iter(|| find_duplicates(contacts));
        });
    }
    group.finish();
}

fn bench_resolve(c: &mut Criterion) {
    let cmp = FieldwiseComparator;
    let left = contact("l", 1);
    let right = contact("r", 1);
    c.bench_function("resolve_pair", |b| {
        b.iter(|| resolve_pair(&cmp, &left, &right, Side::Left));
    });
}

criterion_group!(benches, bench_match, bench_duplicates, bench_resolve);
criterion_main!(benches);
