//! # Batch Orchestrator
//! Momentum / breakout computation across many candidates with bounded
//! parallelism: each chunk's candidates run concurrently, chunks run one after
//! another. A failing candidate only ever produces its own `None`.

use futures::future::join_all;
use metrics::counter;
use serde::Serialize;
use std::collections::BTreeMap;
use std::future::Future;

use crate::breakout::BreakoutCalculator;
use crate::metrics::BATCH_CHUNKS_TOTAL;
use crate::model::{BreakoutProbability, MomentumAnalysis};
use crate::momentum::MomentumEngine;

/// Run `f` for every id, at most `chunk_size` at a time.
/// Output keeps the input order (one entry per input id, duplicates included).
pub async fn run_chunked<'a, T, F, Fut>(
    ids: &'a [String],
    chunk_size: usize,
    f: F,
) -> Vec<(&'a str, T)>
where
    F: Fn(&'a str) -> Fut,
    Fut: Future<Output = T>,
{
    let chunk_size = chunk_size.max(1);
    let mut out = Vec::with_capacity(ids.len());
    for (n, chunk) in ids.chunks(chunk_size).enumerate() {
        let results = join_all(chunk.iter().map(|id| f(id.as_str()))).await;
        out.extend(chunk.iter().map(String::as_str).zip(results));

        counter!(BATCH_CHUNKS_TOTAL).increment(1);
        tracing::debug!(
            target: "batch",
            chunk = n + 1,
            completed = out.len(),
            total = ids.len(),
            "chunk processed"
        );
    }
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchOp {
    Momentum,
    BreakoutProbability,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum BatchOutcome {
    Momentum(MomentumAnalysis),
    Breakout(BreakoutProbability),
}

#[derive(Clone)]
pub struct BatchOrchestrator {
    momentum: MomentumEngine,
    breakout: BreakoutCalculator,
    chunk_size: usize,
}

impl BatchOrchestrator {
    pub fn new(momentum: MomentumEngine, breakout: BreakoutCalculator, chunk_size: usize) -> Self {
        Self {
            momentum,
            breakout,
            chunk_size: chunk_size.max(1),
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub async fn batch_compute(
        &self,
        candidate_ids: &[String],
        op: BatchOp,
    ) -> BTreeMap<String, Option<BatchOutcome>> {
        tracing::info!(target: "batch", count = candidate_ids.len(), ?op, "batch compute started");
        let results: BTreeMap<String, Option<BatchOutcome>> = match op {
            BatchOp::Momentum => self
                .batch_momentum(candidate_ids)
                .await
                .into_iter()
                .map(|(id, r)| (id, r.map(BatchOutcome::Momentum)))
                .collect(),
            BatchOp::BreakoutProbability => self
                .batch_breakout_probability(candidate_ids)
                .await
                .into_iter()
                .map(|(id, r)| (id, r.map(BatchOutcome::Breakout)))
                .collect(),
        };
        tracing::info!(target: "batch", count = candidate_ids.len(), ?op, "batch compute complete");
        results
    }

    pub async fn batch_momentum(
        &self,
        candidate_ids: &[String],
    ) -> BTreeMap<String, Option<MomentumAnalysis>> {
        run_chunked(candidate_ids, self.chunk_size, |id| {
            self.momentum.compute_momentum(id)
        })
        .await
        .into_iter()
        .map(|(id, r)| (id.to_string(), r))
        .collect()
    }

    pub async fn batch_breakout_probability(
        &self,
        candidate_ids: &[String],
    ) -> BTreeMap<String, Option<BreakoutProbability>> {
        run_chunked(candidate_ids, self.chunk_size, |id| {
            self.breakout.compute_breakout_probability(id)
        })
        .await
        .into_iter()
        .map(|(id, r)| (id.to_string(), r))
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn run_chunked_keeps_order_and_bounds_in_flight() {
        let ids: Vec<String> = (0..23).map(|i| format!("c{i}")).collect();
        let in_flight = AtomicUsize::new(0);
        let peak = AtomicUsize::new(0);

        let out = run_chunked(&ids, 10, |id| {
            let in_flight = &in_flight;
            let peak = &peak;
            async move {
                let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::task::yield_now().await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
                id.len()
            }
        })
        .await;

        assert_eq!(out.len(), 23);
        assert_eq!(out[0].0, "c0");
        assert_eq!(out[22].0, "c22");
        assert_eq!(out[22].1, 3);
        assert!(peak.load(Ordering::SeqCst) <= 10);
    }

    #[tokio::test]
    async fn zero_chunk_size_is_treated_as_one() {
        let ids = vec!["a".to_string(), "b".to_string()];
        let out = run_chunked(&ids, 0, |id| async move { id.to_uppercase() }).await;
        assert_eq!(out, vec![("a", "A".to_string()), ("b", "B".to_string())]);
    }
}
