//! # Momentum Engine
//! Turns a candidate's composite-score history into a trend classification.
//!
//! `analyze_history` is the pure core (no I/O, suitable for unit tests); the
//! `MomentumEngine` wraps it with the history fetch and the fail-soft policy:
//! any collaborator error is logged and reported as `None`, exactly like
//! insufficient history.

use metrics::counter;

use crate::config::MomentumPolicy;
use crate::math::{acceleration, round4, velocity};
use crate::metrics::{
    collaborator_error, ensure_metrics_described, MOMENTUM_INSUFFICIENT_TOTAL, MOMENTUM_TOTAL,
};
use crate::model::{MomentumAnalysis, MomentumDirection, ScoreSnapshot};
use crate::store::DynScoreSource;

/// Fixed-threshold classification of `(velocity, acceleration)`.
pub fn classify_direction(
    velocity: f64,
    acceleration: f64,
    policy: &MomentumPolicy,
) -> MomentumDirection {
    if velocity > policy.velocity_threshold && acceleration > policy.acceleration_threshold {
        MomentumDirection::StronglyUp
    } else if velocity > policy.velocity_threshold {
        MomentumDirection::ModeratelyUp
    } else if velocity < -policy.velocity_threshold {
        MomentumDirection::Down
    } else {
        MomentumDirection::Flat
    }
}

/// Momentum over the most recent `lookback` snapshots, in whatever order they come.
/// `None` when fewer than two snapshots are available.
pub fn analyze_history(
    candidate_id: &str,
    mut snapshots: Vec<ScoreSnapshot>,
    lookback: usize,
    policy: &MomentumPolicy,
) -> Option<MomentumAnalysis> {
    // oldest-first; stable so equal timestamps keep collaborator order
    snapshots.sort_by(|a, b| a.captured_at.cmp(&b.captured_at));
    if snapshots.len() > lookback {
        snapshots.drain(..snapshots.len() - lookback);
    }
    if snapshots.len() < 2 {
        return None;
    }

    let series: Vec<f64> = snapshots.iter().map(|s| s.composite_score).collect();
    let v = velocity(&series);
    let a = acceleration(&series);
    let direction = classify_direction(v, a, policy);

    snapshots.reverse();
    Some(MomentumAnalysis {
        candidate_id: candidate_id.to_string(),
        direction,
        velocity: round4(v),
        acceleration: round4(a),
        amplitude: round4(v.abs()),
        snapshots,
    })
}

#[derive(Clone)]
pub struct MomentumEngine {
    scores: DynScoreSource,
    policy: MomentumPolicy,
}

impl MomentumEngine {
    pub fn new(scores: DynScoreSource, policy: MomentumPolicy) -> Self {
        ensure_metrics_described();
        Self { scores, policy }
    }

    /// Momentum over the configured lookback window (6 periods by default).
    pub async fn compute_momentum(&self, candidate_id: &str) -> Option<MomentumAnalysis> {
        self.compute_momentum_with_lookback(candidate_id, self.policy.lookback_periods)
            .await
    }

    pub async fn compute_momentum_with_lookback(
        &self,
        candidate_id: &str,
        lookback_periods: usize,
    ) -> Option<MomentumAnalysis> {
        let history = match self
            .scores
            .get_score_history(candidate_id, lookback_periods)
            .await
        {
            Ok(h) => h,
            Err(e) => {
                tracing::warn!(
                    target: "momentum",
                    candidate_id = %candidate_id,
                    op = "compute_momentum",
                    error = ?e,
                    "score history fetch failed"
                );
                collaborator_error("get_score_history");
                return None;
            }
        };

        match analyze_history(candidate_id, history, lookback_periods, &self.policy) {
            Some(m) => {
                counter!(MOMENTUM_TOTAL, "direction" => m.direction.as_str()).increment(1);
                tracing::debug!(
                    target: "momentum",
                    candidate_id = %candidate_id,
                    direction = %m.direction,
                    velocity = m.velocity,
                    acceleration = m.acceleration,
                    "momentum computed"
                );
                Some(m)
            }
            None => {
                counter!(MOMENTUM_INSUFFICIENT_TOTAL).increment(1);
                tracing::debug!(
                    target: "momentum",
                    candidate_id = %candidate_id,
                    "insufficient history for momentum"
                );
                None
            }
        }
    }
}
