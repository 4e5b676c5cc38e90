//! # Radar Engine
//! Wires the momentum engine, breakout calculator, shortlist generator and batch
//! orchestrator over one set of collaborators and one `RadarConfig`.
//!
//! No process-wide state: callers build a `Radar` with the stores they own and
//! clone it freely (all collaborators are behind `Arc`).

use std::sync::Arc;

use crate::batch::{BatchOp, BatchOrchestrator, BatchOutcome};
use crate::breakout::BreakoutCalculator;
use crate::config::RadarConfig;
use crate::model::{BreakoutProbability, MomentumAnalysis, ShortlistCriteria};
use crate::momentum::MomentumEngine;
use crate::shortlist::{GenerationResult, ShortlistGenerator};
use crate::store::{
    DynCandidateSource, DynSceneMembership, DynScoreSource, DynShortlistSink, InMemoryStore,
};

/// External collaborators consumed by the core.
#[derive(Clone)]
pub struct Collaborators {
    pub scores: DynScoreSource,
    pub candidates: DynCandidateSource,
    pub shortlists: DynShortlistSink,
    pub scenes: DynSceneMembership,
}

impl Collaborators {
    /// One in-memory store serving scores, candidates and shortlists.
    pub fn in_memory(store: Arc<InMemoryStore>, scenes: DynSceneMembership) -> Self {
        Self {
            scores: store.clone(),
            candidates: store.clone(),
            shortlists: store,
            scenes,
        }
    }
}

#[derive(Clone)]
pub struct Radar {
    config: RadarConfig,
    momentum: MomentumEngine,
    breakout: BreakoutCalculator,
    shortlists: ShortlistGenerator,
    batch: BatchOrchestrator,
}

impl Radar {
    pub fn new(collab: Collaborators, config: RadarConfig) -> Self {
        let config = config.sanitized();
        let momentum = MomentumEngine::new(collab.scores.clone(), config.momentum);
        let breakout =
            BreakoutCalculator::new(collab.scores.clone(), momentum.clone(), config.breakout);
        let shortlists = ShortlistGenerator::new(
            collab.candidates,
            collab.scores,
            collab.shortlists,
            collab.scenes,
            momentum.clone(),
            config.shortlist,
            config.batch.chunk_size,
        );
        let batch =
            BatchOrchestrator::new(momentum.clone(), breakout.clone(), config.batch.chunk_size);
        tracing::debug!(target: "radar", ?config, "radar engine ready");
        Self {
            config,
            momentum,
            breakout,
            shortlists,
            batch,
        }
    }

    pub fn config(&self) -> &RadarConfig {
        &self.config
    }

    pub fn momentum(&self) -> &MomentumEngine {
        &self.momentum
    }

    pub fn breakout(&self) -> &BreakoutCalculator {
        &self.breakout
    }

    pub fn shortlists(&self) -> &ShortlistGenerator {
        &self.shortlists
    }

    pub fn batch(&self) -> &BatchOrchestrator {
        &self.batch
    }

    pub async fn compute_momentum(&self, candidate_id: &str) -> Option<MomentumAnalysis> {
        self.momentum.compute_momentum(candidate_id).await
    }

    pub async fn compute_breakout_probability(
        &self,
        candidate_id: &str,
    ) -> Option<BreakoutProbability> {
        self.breakout.compute_breakout_probability(candidate_id).await
    }

    pub async fn batch_compute(
        &self,
        candidate_ids: &[String],
        op: BatchOp,
    ) -> std::collections::BTreeMap<String, Option<BatchOutcome>> {
        self.batch.batch_compute(candidate_ids, op).await
    }

    pub async fn generate_shortlist(
        &self,
        owner_id: &str,
        criteria: ShortlistCriteria,
    ) -> GenerationResult {
        self.shortlists.generate(owner_id, criteria).await
    }
}
