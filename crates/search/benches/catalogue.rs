//! Benchmarks for index builds and queries.

use catalogue_search::{ProviderRecord, QuerySession, SearchConfig};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

const WORDS: [&str; 12] = [
    "Storage", "Compute", "Queue", "Identity", "Analytics", "Gateway",
    "Backup", "Messaging", "Database", "Monitoring", "Archive", "Directory",
];

fn create_catalogue(count: usize) -> Vec<ProviderRecord> {
    (0..count)
        .map(|i| {
            let kind = if i % 3 == 0 { "SaaS" } else { "CSP" };
            let mut record = ProviderRecord::new(format!("Provider {i} {}", WORDS[i % WORDS.len()]), kind)
                .with_underlying(WORDS[(i + 5) % WORDS.len()]);
            for j in 0..12 {
                let title = format!("{} {}", WORDS[(i + j) % WORDS.len()], WORDS[(i * j + 1) % WORDS.len()]);
                record = record.with_service(title, ["Medium"]);
            }
            record
        })
        .collect()
}

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("build");

    for size in [50, 500, 5000].iter() {
        let catalogue = create_catalogue(*size);
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| {
                let mut session = QuerySession::new(SearchConfig::default());
                session.build(black_box(catalogue.clone()))
            })
        });
    }

    group.finish();
}

fn bench_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("search");

    for size in [50, 500, 5000].iter() {
        let mut session = QuerySession::new(SearchConfig::default());
        session.build(create_catalogue(*size));

        group.bench_with_input(BenchmarkId::new("exact", size), size, |b, _| {
            b.iter(|| session.search(black_box("storage")))
        });
        group.bench_with_input(BenchmarkId::new("typo", size), size, |b, _| {
            b.iter(|| session.search(black_box("monitorring")))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_build, bench_search);
criterion_main!(benches);
