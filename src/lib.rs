// src/lib.rs
// Public library surface for the application layer and integration tests.

pub mod batch;
pub mod breakout;
pub mod config;
pub mod engine;
pub mod error;
pub mod math;
pub mod metrics;
pub mod model;
pub mod momentum;
pub mod shortlist;
pub mod store;

// ---- Re-exports for stable public API ----
pub use crate::batch::{BatchOp, BatchOrchestrator, BatchOutcome};
pub use crate::breakout::BreakoutCalculator;
pub use crate::config::RadarConfig;
pub use crate::engine::{Collaborators, Radar};
pub use crate::error::CriteriaError;
pub use crate::model::{
    AgencyCriteria, BreakoutProbability, Candidate, MomentumAnalysis, MomentumDirection,
    ScoreSnapshot, Shortlist, ShortlistCriteria, ShortlistMember, ShortlistWithMembers,
};
pub use crate::momentum::MomentumEngine;
pub use crate::shortlist::ShortlistGenerator;
pub use crate::store::{InMemoryStore, StaticSceneMembership};
