//! Demo that seeds an in-memory store, scores a few candidates and prints the
//! resulting shortlists as JSON.

use std::sync::Arc;

use chrono::{Duration, Utc};
use talent_radar::{
    AgencyCriteria, BatchOp, Candidate, Collaborators, InMemoryStore, MomentumDirection, Radar,
    RadarConfig, ScoreSnapshot, ShortlistCriteria, StaticSceneMembership,
};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn seed(store: &InMemoryStore) -> anyhow::Result<Vec<String>> {
    let now = Utc::now();
    let roster = [
        ("c1", "nova-lights", "Nova Lights", "uk-garage", "GB", [0.42, 0.51, 0.63, 0.78]),
        ("c2", "tide-&-ash", "Tide & Ash", "alte", "NG", [0.55, 0.56, 0.54, 0.55]),
        ("c3", "kaya-north", "Kaya North", "uk-garage", "GB", [0.81, 0.72, 0.64, 0.52]),
        ("c4", "lumen-yard", "Lumen Yard", "amapiano", "ZA", [0.30, 0.38, 0.47, 0.58]),
    ];

    let mut ids = Vec::new();
    for (i, (id, slug, name, scene, country, series)) in roster.iter().enumerate() {
        store.upsert_candidate(
            Candidate::new(*id, *slug, now - Duration::days(30 - i as i64))
                .display_name(*name)
                .scene(*scene)
                .country(*country),
        )?;
        for (week, composite) in series.iter().enumerate() {
            let at = now - Duration::weeks((series.len() - week) as i64);
            store.push_snapshot(ScoreSnapshot::new(
                *id,
                at,
                *composite,
                composite * 0.9,
                composite * 0.8,
                0.6,
            ))?;
        }
        ids.push(id.to_string());
    }
    Ok(ids)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();

    let config = RadarConfig::load_default()?;
    let store = Arc::new(InMemoryStore::new());
    let ids = seed(&store)?;

    let scenes = StaticSceneMembership::new()
        .with_scene("uk-garage", ["nova-lights", "kaya-north"])
        .with_scene("alte", ["tide-&-ash"]);
    let radar = Radar::new(Collaborators::in_memory(store, Arc::new(scenes)), config);

    let probabilities = radar
        .batch_compute(&ids, BatchOp::BreakoutProbability)
        .await;
    println!("{}", serde_json::to_string_pretty(&probabilities)?);

    let requests = [
        ShortlistCriteria::Agency(AgencyCriteria {
            name: "Rising UK acts".into(),
            countries: vec!["GB".into()],
            momentum_direction: Some(MomentumDirection::StronglyUp),
            ..Default::default()
        }),
        ShortlistCriteria::Scene {
            scene_slug: "uk-garage".into(),
            limit: None,
        },
        ShortlistCriteria::RosterGap {
            user_scenes: vec!["uk-garage".into()],
        },
    ];
    for criteria in requests {
        match radar.generate_shortlist("demo-owner", criteria).await? {
            Some(generated) => println!("{}", serde_json::to_string_pretty(&generated)?),
            None => println!("shortlist could not be persisted"),
        }
    }

    println!("radar-demo done");
    Ok(())
}
