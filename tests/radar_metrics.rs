// tests/radar_metrics.rs
// Installs the process-wide Prometheus recorder, so this binary holds one test only.

use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use talent_radar::metrics::RadarMetrics;
use talent_radar::{
    AgencyCriteria, BatchOp, Candidate, Collaborators, InMemoryStore, Radar, RadarConfig,
    ScoreSnapshot, ShortlistCriteria, StaticSceneMembership,
};

#[tokio::test]
async fn engines_report_through_the_prometheus_recorder() {
    let metrics = RadarMetrics::install().expect("first recorder install");

    let t0 = Utc.with_ymd_and_hms(2025, 7, 1, 0, 0, 0).unwrap();
    let store = Arc::new(InMemoryStore::new());
    store
        .upsert_candidate(Candidate::new("a", "a-slug", t0).country("GB"))
        .unwrap();
    for (i, c) in [0.2, 0.3, 0.5].iter().enumerate() {
        store
            .push_snapshot(ScoreSnapshot::new("a", t0 + Duration::weeks(i as i64), *c, 0.5, 0.5, 0.5))
            .unwrap();
    }
    store
        .push_snapshot(ScoreSnapshot::new("b", t0, 0.4, 0.5, 0.5, 0.5))
        .unwrap();

    let radar = Radar::new(
        Collaborators::in_memory(store, Arc::new(StaticSceneMembership::new())),
        RadarConfig::default(),
    );
    let ids = vec!["a".to_string(), "b".to_string()];
    radar.batch_compute(&ids, BatchOp::BreakoutProbability).await;
    radar
        .generate_shortlist(
            "owner-1",
            ShortlistCriteria::Agency(AgencyCriteria {
                name: "Metrics check".into(),
                ..Default::default()
            }),
        )
        .await
        .unwrap()
        .unwrap();

    let text = metrics.render();
    for needle in [
        "radar_momentum_total",
        "radar_momentum_insufficient_total",
        "radar_breakout_total",
        "radar_batch_chunks_total",
        "radar_shortlists_generated_total",
        "radar_shortlist_size",
    ] {
        assert!(text.contains(needle), "missing {needle} in:\n{text}");
    }
    assert!(text.contains(r#"mode="agency""#), "{text}");
    assert!(RadarMetrics::install().is_err());
}
