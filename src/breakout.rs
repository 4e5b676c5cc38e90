//! # Breakout Probability Calculator
//! Fuses the latest score snapshot with momentum into a probability, a
//! confidence and a one-sentence explanation.
//!
//! Policy:
//! - momentum score is boosted for `strongly_up`, damped for `down`
//! - probability = weighted sum of breakout / adjusted momentum / scene alignment
//! - confidence shrinks with the spread of recent composite scores
//!
//! The explanation is plain string assembly, so identical inputs always yield
//! identical text.

use metrics::counter;

use crate::config::BreakoutPolicy;
use crate::math::{clamp, round4, standard_deviation};
use crate::metrics::{collaborator_error, ensure_metrics_described, BREAKOUT_TOTAL};
use crate::model::{
    BreakoutFactors, BreakoutProbability, MomentumAnalysis, MomentumDirection, ScoreSnapshot,
};
use crate::momentum::MomentumEngine;
use crate::store::DynScoreSource;

/// Momentum score after the direction adjustment.
pub fn adjust_momentum_score(
    momentum_score: f64,
    direction: Option<MomentumDirection>,
    policy: &BreakoutPolicy,
) -> f64 {
    match direction {
        Some(MomentumDirection::StronglyUp) => {
            (momentum_score * policy.strong_momentum_boost).min(1.0)
        }
        Some(MomentumDirection::Down) => momentum_score * policy.down_momentum_damping,
        _ => momentum_score,
    }
}

/// Confidence from the consistency of the momentum window.
pub fn confidence_for(momentum: Option<&MomentumAnalysis>, policy: &BreakoutPolicy) -> f64 {
    let Some(m) = momentum else {
        return policy.default_confidence;
    };
    let series = m.composite_series();
    if series.len() < policy.min_confidence_points {
        return policy.default_confidence;
    }
    let spread = policy.confidence_spread_factor * standard_deviation(&series);
    clamp((1.0 - spread).max(policy.confidence_floor), 0.0, 1.0)
}

/// Pure fusion of a snapshot and optional momentum.
pub fn fuse_breakout(
    latest: &ScoreSnapshot,
    momentum: Option<&MomentumAnalysis>,
    policy: &BreakoutPolicy,
) -> BreakoutProbability {
    let direction = momentum.map(|m| m.direction);
    let adjusted = adjust_momentum_score(latest.momentum_score, direction, policy);

    let raw = policy.weight_breakout * latest.breakout_score
        + policy.weight_momentum * adjusted
        + policy.weight_scene_alignment * latest.scene_alignment_score;
    let probability = round4(clamp(raw, 0.0, 1.0));
    let confidence = round4(confidence_for(momentum, policy));

    BreakoutProbability {
        candidate_id: latest.candidate_id.clone(),
        probability,
        confidence,
        factors: BreakoutFactors {
            breakout_score: round4(latest.breakout_score),
            momentum_score: round4(adjusted),
            scene_alignment_score: round4(latest.scene_alignment_score),
        },
        momentum_direction: direction,
        explanation: explain(probability, direction, confidence, policy),
    }
}

/// One deterministic sentence: probability tier, momentum, confidence.
pub fn explain(
    probability: f64,
    direction: Option<MomentumDirection>,
    confidence: f64,
    policy: &BreakoutPolicy,
) -> String {
    let tier = if probability >= policy.high_probability {
        "High breakout probability"
    } else if probability >= policy.moderate_probability {
        "Moderate breakout probability"
    } else if probability >= policy.low_probability {
        "Low breakout probability"
    } else {
        "Very early stage"
    };

    let trend = match direction {
        Some(MomentumDirection::StronglyUp) => "with strongly accelerating momentum",
        Some(MomentumDirection::ModeratelyUp) => "with rising momentum",
        Some(MomentumDirection::Flat) => "with flat momentum",
        Some(MomentumDirection::Down) => "with declining momentum",
        None => "with not enough history to read momentum",
    };

    let qualifier = if confidence >= policy.high_confidence {
        " (high confidence)"
    } else if confidence < policy.limited_confidence {
        " (limited data, lower confidence)"
    } else {
        ""
    };

    let pct = (probability * 100.0).round() as i64;
    format!("{tier} ({pct}%) {trend}{qualifier}.")
}

#[derive(Clone)]
pub struct BreakoutCalculator {
    scores: DynScoreSource,
    momentum: MomentumEngine,
    policy: BreakoutPolicy,
}

impl BreakoutCalculator {
    pub fn new(scores: DynScoreSource, momentum: MomentumEngine, policy: BreakoutPolicy) -> Self {
        ensure_metrics_described();
        Self {
            scores,
            momentum,
            policy,
        }
    }

    pub async fn compute_breakout_probability(
        &self,
        candidate_id: &str,
    ) -> Option<BreakoutProbability> {
        let latest = match self.scores.get_latest_score(candidate_id).await {
            Ok(Some(s)) => s,
            Ok(None) => {
                tracing::debug!(target: "breakout", candidate_id = %candidate_id, "no score snapshot yet");
                return None;
            }
            Err(e) => {
                tracing::warn!(
                    target: "breakout",
                    candidate_id = %candidate_id,
                    op = "compute_breakout_probability",
                    error = ?e,
                    "latest score fetch failed"
                );
                collaborator_error("get_latest_score");
                return None;
            }
        };

        // thin history is allowed here: fusion falls back to neutral momentum
        let momentum = self.momentum.compute_momentum(candidate_id).await;
        let result = fuse_breakout(&latest, momentum.as_ref(), &self.policy);

        counter!(BREAKOUT_TOTAL).increment(1);
        tracing::debug!(
            target: "breakout",
            candidate_id = %candidate_id,
            probability = result.probability,
            confidence = result.confidence,
            "breakout probability computed"
        );
        Some(result)
    }
}
