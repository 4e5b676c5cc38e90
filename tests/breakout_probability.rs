// tests/breakout_probability.rs
use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use talent_radar::config::{BreakoutPolicy, MomentumPolicy};
use talent_radar::store::ScoreSource;
use talent_radar::{
    BreakoutCalculator, InMemoryStore, MomentumDirection, MomentumEngine, ScoreSnapshot,
};

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 4, 7, 9, 0, 0).unwrap()
}

fn calculator(store: Arc<InMemoryStore>) -> BreakoutCalculator {
    let momentum = MomentumEngine::new(store.clone(), MomentumPolicy::default());
    BreakoutCalculator::new(store, momentum, BreakoutPolicy::default())
}

/// Pushes `(composite, breakout, momentum, scene)` rows one week apart.
fn seed(store: &InMemoryStore, id: &str, rows: &[(f64, f64, f64, f64)]) {
    for (i, (c, b, m, s)) in rows.iter().enumerate() {
        store
            .push_snapshot(ScoreSnapshot::new(
                id,
                t0() + Duration::weeks(i as i64),
                *c,
                *b,
                *m,
                *s,
            ))
            .unwrap();
    }
}

#[tokio::test]
async fn no_snapshot_no_probability() {
    let store = Arc::new(InMemoryStore::new());
    assert!(calculator(store)
        .compute_breakout_probability("ghost")
        .await
        .is_none());
}

#[tokio::test]
async fn single_snapshot_uses_raw_momentum_and_half_confidence() {
    let store = Arc::new(InMemoryStore::new());
    seed(&store, "a", &[(0.6, 0.5, 0.5, 0.5)]);

    let r = calculator(store)
        .compute_breakout_probability("a")
        .await
        .unwrap();
    assert_eq!(r.confidence, 0.5);
    assert_eq!(r.momentum_direction, None);
    assert_eq!(r.factors.momentum_score, 0.5);
    // 0.4*0.5 + 0.35*0.5 + 0.25*0.5
    assert_eq!(r.probability, 0.5);
    assert_eq!(
        r.explanation,
        "Moderate breakout probability (50%) with not enough history to read momentum."
    );
}

#[tokio::test]
async fn maxed_scores_with_strong_momentum_cap_at_one() {
    let store = Arc::new(InMemoryStore::new());
    seed(
        &store,
        "a",
        &[
            (0.1, 1.0, 1.0, 1.0),
            (0.2, 1.0, 1.0, 1.0),
            (0.4, 1.0, 1.0, 1.0),
            (0.8, 1.0, 1.0, 1.0),
        ],
    );

    let r = calculator(store)
        .compute_breakout_probability("a")
        .await
        .unwrap();
    assert_eq!(r.momentum_direction, Some(MomentumDirection::StronglyUp));
    assert_eq!(r.probability, 1.0);
    assert!((0.2..=1.0).contains(&r.confidence));
    assert!(r.explanation.starts_with("High breakout probability (100%)"));
}

#[tokio::test]
async fn probability_and_confidence_stay_in_range() {
    let store = Arc::new(InMemoryStore::new());
    let grid = [0.0, 0.3, 0.7, 1.0];
    let mut ids = Vec::new();
    for (n, &x) in grid.iter().enumerate() {
        for (k, &y) in grid.iter().enumerate() {
            let id = format!("c{n}{k}");
            seed(
                &store,
                &id,
                &[(x, x, y, y), (y, y, x, x), (x, y, x, y), (y, x, y, x)],
            );
            ids.push(id);
        }
    }

    let calc = calculator(store);
    for id in ids {
        let r = calc.compute_breakout_probability(&id).await.unwrap();
        assert!((0.0..=1.0).contains(&r.probability), "{id}: {r:?}");
        assert!((0.2..=1.0).contains(&r.confidence), "{id}: {r:?}");
    }
}

#[tokio::test]
async fn volatile_history_lowers_confidence() {
    let store = Arc::new(InMemoryStore::new());
    seed(
        &store,
        "steady",
        &[(0.5, 0.5, 0.5, 0.5), (0.5, 0.5, 0.5, 0.5), (0.5, 0.5, 0.5, 0.5)],
    );
    seed(
        &store,
        "wild",
        &[(0.0, 0.5, 0.5, 0.5), (1.0, 0.5, 0.5, 0.5), (0.0, 0.5, 0.5, 0.5)],
    );

    let calc = calculator(store);
    let steady = calc.compute_breakout_probability("steady").await.unwrap();
    let wild = calc.compute_breakout_probability("wild").await.unwrap();
    assert_eq!(steady.confidence, 1.0);
    assert!(steady.explanation.ends_with("(high confidence)."));
    assert_eq!(wild.confidence, 0.2);
    assert!(wild.explanation.ends_with("(limited data, lower confidence)."));
}

#[tokio::test]
async fn identical_inputs_give_identical_output() {
    let store = Arc::new(InMemoryStore::new());
    seed(
        &store,
        "a",
        &[(0.3, 0.4, 0.6, 0.7), (0.35, 0.45, 0.6, 0.7), (0.45, 0.5, 0.65, 0.7)],
    );
    let calc = calculator(store);
    let first = calc.compute_breakout_probability("a").await.unwrap();
    let second = calc.compute_breakout_probability("a").await.unwrap();
    assert_eq!(first, second);
}

/// Score source whose latest-score or history reads can be made to fail.
struct FailingReads {
    inner: InMemoryStore,
    latest_fails: bool,
    history_fails: bool,
}

#[async_trait]
impl ScoreSource for FailingReads {
    async fn get_score_history(&self, id: &str, limit: usize) -> Result<Vec<ScoreSnapshot>> {
        if self.history_fails {
            return Err(anyhow!("history query cancelled"));
        }
        self.inner.get_score_history(id, limit).await
    }
    async fn get_latest_score(&self, id: &str) -> Result<Option<ScoreSnapshot>> {
        if self.latest_fails {
            return Err(anyhow!("latest score query cancelled"));
        }
        self.inner.get_latest_score(id).await
    }
}

fn failing_calculator(latest_fails: bool, history_fails: bool) -> BreakoutCalculator {
    let inner = InMemoryStore::new();
    seed(
        &inner,
        "a",
        &[(0.2, 0.6, 0.5, 0.5), (0.4, 0.6, 0.5, 0.5), (0.7, 0.6, 0.5, 0.5)],
    );
    let scores = Arc::new(FailingReads {
        inner,
        latest_fails,
        history_fails,
    });
    let momentum = MomentumEngine::new(scores.clone(), MomentumPolicy::default());
    BreakoutCalculator::new(scores, momentum, BreakoutPolicy::default())
}

#[tokio::test]
async fn latest_score_failure_gives_none() {
    let calc = failing_calculator(true, false);
    assert!(calc.compute_breakout_probability("a").await.is_none());
}

#[tokio::test]
async fn history_failure_falls_back_to_neutral_momentum() {
    let calc = failing_calculator(false, true);
    let r = calc
        .compute_breakout_probability("a")
        .await
        .expect("latest snapshot is still readable");
    assert_eq!(r.momentum_direction, None);
    assert_eq!(r.confidence, 0.5);
    assert_eq!(r.factors.momentum_score, 0.5);
    // 0.4*0.6 + 0.35*0.5 + 0.25*0.5
    assert_eq!(r.probability, 0.54);
}
