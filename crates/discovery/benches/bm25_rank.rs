use chrono::{Duration, TimeZone, Utc};
use criterion::{criterion_group, criterion_main, Criterion};
use discovery_core::{Bm25Params, Document};
use discovery_index::Bm25Ranker;
use std::hint::black_box;

const WORDS: [&str; 12] = [
    "rust", "async", "tokio", "vue", "react", "router", "component", "ownership", "borrow",
    "training", "dog", "garden",
];

fn corpus(size: usize) -> Vec<Document> {
    let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    (0..size)
        .map(|i| {
            let pick = |offset: usize| WORDS[(i * 7 + offset) % WORDS.len()];
            Document {
                id: i as i64,
                title: format!("{} {} notes {}", pick(0), pick(3), i),
                content: format!(
                    "a longer body about {} and {} with some {} examples",
                    pick(1),
                    pick(5),
                    pick(9)
                ),
                tags: vec![pick(0).to_string(), pick(2).to_string()],
                author_id: (i % 50) as i64,
                author_name: format!("user{}", i % 50),
                circle_id: None,
                circle_name: None,
                created_at: base + Duration::minutes(i as i64),
                views: 0,
                likes: 0,
            }
        })
        .collect()
}

fn bench_rank_800_candidates(c: &mut Criterion) {
    let ranker = Bm25Ranker::new(Bm25Params::default());
    let documents = corpus(800);

    c.bench_function("bm25_rank_800_candidates", |b| {
        b.iter(|| {
            ranker.rank(
                black_box("rust async router"),
                black_box(documents.clone()),
                Some(20),
            )
        });
    });
}

fn bench_blank_query_recency(c: &mut Criterion) {
    let ranker = Bm25Ranker::new(Bm25Params::default());
    let documents = corpus(800);

    c.bench_function("recency_800_candidates", |b| {
        b.iter(|| ranker.rank(black_box(""), black_box(documents.clone()), Some(20)));
    });
}

criterion_group!(benches, bench_rank_800_candidates, bench_blank_query_recency);
criterion_main!(benches);
