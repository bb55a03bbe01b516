//! Seeded fetches decide the same way every time

use mockfetch_source::{AsyncFetchSource, FetchOutcome, draws_failure};

use crate::common::{seeded, users_source};

async fn decide(source: &AsyncFetchSource, p: f64, seed: u64) -> FetchOutcome {
    let mut handle = source.fetch(&seeded(0, p, seed)).unwrap();
    handle.outcome().await
}

#[tokio::test(start_paused = true)]
async fn same_seed_same_decision() {
    let source = users_source();

    for p in [0.0, 0.25, 0.5, 0.75, 1.0] {
        for seed in 0..32 {
            let first = decide(&source, p, seed).await;
            let second = decide(&source, p, seed).await;
            assert_eq!(first, second, "p = {p}, seed = {seed}");
        }
    }
}

#[tokio::test(start_paused = true)]
async fn decision_does_not_depend_on_source_instance() {
    let a = users_source();
    let b = users_source();

    for seed in 0..32 {
        assert_eq!(decide(&a, 0.5, seed).await, decide(&b, 0.5, seed).await);
    }
}

#[tokio::test(start_paused = true)]
async fn outcome_matches_the_pure_draw() {
    let source = users_source();

    for seed in 0..32 {
        let outcome = decide(&source, 0.5, seed).await;
        assert_eq!(outcome.is_err(), draws_failure(seed, 0.5), "seed = {seed}");
    }
}
