// src/config.rs
//! Scoring policy: every threshold and weight used by the engines, as named,
//! overridable values.
//!
//! TOML shape (all sections and keys optional):
//! ```toml
//! [momentum]
//! velocity_threshold = 0.05
//! acceleration_threshold = 0.02
//! lookback_periods = 6
//!
//! [breakout]
//! weight_breakout = 0.40
//! weight_momentum = 0.35
//! weight_scene_alignment = 0.25
//!
//! [shortlist]
//! scene_limit = 20
//!
//! [batch]
//! chunk_size = 10
//! ```

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const ENV_CONFIG_PATH: &str = "RADAR_CONFIG_PATH";
pub const DEFAULT_TOML_PATH: &str = "config/radar.toml";
pub const DEFAULT_JSON_PATH: &str = "config/radar.json";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MomentumPolicy {
    /// Average period change (fraction of the `[0,1]` scale) that counts as significant.
    pub velocity_threshold: f64,
    pub acceleration_threshold: f64,
    pub lookback_periods: usize,
}

impl Default for MomentumPolicy {
    fn default() -> Self {
        Self {
            velocity_threshold: 0.05,
            acceleration_threshold: 0.02,
            lookback_periods: 6,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BreakoutPolicy {
    pub weight_breakout: f64,
    pub weight_momentum: f64,
    pub weight_scene_alignment: f64,
    /// Momentum multiplier for `strongly_up` (result capped at 1.0).
    pub strong_momentum_boost: f64,
    /// Momentum multiplier for `down`.
    pub down_momentum_damping: f64,
    pub confidence_floor: f64,
    /// Confidence = 1 - spread_factor * stdev(composite history).
    pub confidence_spread_factor: f64,
    /// Used when momentum is unavailable or history is too short.
    pub default_confidence: f64,
    pub min_confidence_points: usize,
    pub high_probability: f64,
    pub moderate_probability: f64,
    pub low_probability: f64,
    pub high_confidence: f64,
    pub limited_confidence: f64,
}

impl Default for BreakoutPolicy {
    fn default() -> Self {
        Self {
            weight_breakout: 0.40,
            weight_momentum: 0.35,
            weight_scene_alignment: 0.25,
            strong_momentum_boost: 1.2,
            down_momentum_damping: 0.8,
            confidence_floor: 0.2,
            confidence_spread_factor: 2.0,
            default_confidence: 0.5,
            min_confidence_points: 3,
            high_probability: 0.75,
            moderate_probability: 0.5,
            low_probability: 0.3,
            high_confidence: 0.7,
            limited_confidence: 0.5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShortlistPolicy {
    /// Pool size requested from the candidate store when criteria give none.
    pub candidate_pool_limit: usize,
    /// Scene members requested from the membership adapter before ranking.
    pub scene_pool_limit: usize,
    pub scene_limit: usize,
    pub roster_gap_limit: usize,
    pub opportunity_weight_scene_alignment: f64,
    pub opportunity_weight_breakout: f64,
}

impl Default for ShortlistPolicy {
    fn default() -> Self {
        Self {
            candidate_pool_limit: 50,
            scene_pool_limit: 500,
            scene_limit: 20,
            roster_gap_limit: 20,
            opportunity_weight_scene_alignment: 0.5,
            opportunity_weight_breakout: 0.5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchPolicy {
    /// Candidates in flight at once.
    pub chunk_size: usize,
}

impl Default for BatchPolicy {
    fn default() -> Self {
        Self { chunk_size: 10 }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RadarConfig {
    pub momentum: MomentumPolicy,
    pub breakout: BreakoutPolicy,
    pub shortlist: ShortlistPolicy,
    pub batch: BatchPolicy,
}

impl RadarConfig {
    /// Load from an explicit path. Format follows the extension (`.toml` / `.json`).
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading radar config from {}", path.display()))?;
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        let cfg = parse_config(&content, ext.as_str())
            .with_context(|| format!("parsing radar config {}", path.display()))?;
        Ok(cfg.sanitized())
    }

    /// Load using env var + fallbacks:
    /// 1) $RADAR_CONFIG_PATH
    /// 2) config/radar.toml
    /// 3) config/radar.json
    /// 4) built-in defaults
    pub fn load_default() -> Result<Self> {
        if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if pb.exists() {
                return Self::load_from(&pb);
            } else {
                return Err(anyhow!("RADAR_CONFIG_PATH points to non-existent path"));
            }
        }
        let toml_p = PathBuf::from(DEFAULT_TOML_PATH);
        if toml_p.exists() {
            return Self::load_from(&toml_p);
        }
        let json_p = PathBuf::from(DEFAULT_JSON_PATH);
        if json_p.exists() {
            return Self::load_from(&json_p);
        }
        tracing::debug!(target: "config", "no radar config found, using defaults");
        Ok(Self::default())
    }

    /// Replace out-of-range values with their defaults.
    pub fn sanitized(mut self) -> Self {
        let dm = MomentumPolicy::default();
        let m = &mut self.momentum;
        if !non_negative(m.velocity_threshold) {
            m.velocity_threshold = dm.velocity_threshold;
        }
        if !non_negative(m.acceleration_threshold) {
            m.acceleration_threshold = dm.acceleration_threshold;
        }
        if m.lookback_periods < 2 {
            m.lookback_periods = dm.lookback_periods;
        }

        let db = BreakoutPolicy::default();
        let b = &mut self.breakout;
        for (v, d) in [
            (&mut b.weight_breakout, db.weight_breakout),
            (&mut b.weight_momentum, db.weight_momentum),
            (&mut b.weight_scene_alignment, db.weight_scene_alignment),
            (&mut b.confidence_floor, db.confidence_floor),
            (&mut b.default_confidence, db.default_confidence),
            (&mut b.high_probability, db.high_probability),
            (&mut b.moderate_probability, db.moderate_probability),
            (&mut b.low_probability, db.low_probability),
            (&mut b.high_confidence, db.high_confidence),
            (&mut b.limited_confidence, db.limited_confidence),
        ] {
            if !unit(*v) {
                *v = d;
            }
        }
        if !non_negative(b.strong_momentum_boost) {
            b.strong_momentum_boost = db.strong_momentum_boost;
        }
        if !non_negative(b.down_momentum_damping) {
            b.down_momentum_damping = db.down_momentum_damping;
        }
        if !non_negative(b.confidence_spread_factor) {
            b.confidence_spread_factor = db.confidence_spread_factor;
        }

        let ds = ShortlistPolicy::default();
        let s = &mut self.shortlist;
        if s.candidate_pool_limit == 0 {
            s.candidate_pool_limit = ds.candidate_pool_limit;
        }
        if s.scene_pool_limit == 0 {
            s.scene_pool_limit = ds.scene_pool_limit;
        }
        if s.scene_limit == 0 {
            s.scene_limit = ds.scene_limit;
        }
        if s.roster_gap_limit == 0 {
            s.roster_gap_limit = ds.roster_gap_limit;
        }
        if !unit(s.opportunity_weight_scene_alignment) {
            s.opportunity_weight_scene_alignment = ds.opportunity_weight_scene_alignment;
        }
        if !unit(s.opportunity_weight_breakout) {
            s.opportunity_weight_breakout = ds.opportunity_weight_breakout;
        }

        if self.batch.chunk_size == 0 {
            self.batch.chunk_size = BatchPolicy::default().chunk_size;
        }
        self
    }
}

fn non_negative(x: f64) -> bool {
    x.is_finite() && x >= 0.0
}

fn unit(x: f64) -> bool {
    x.is_finite() && (0.0..=1.0).contains(&x)
}

fn parse_config(s: &str, hint_ext: &str) -> Result<RadarConfig> {
    match hint_ext {
        "json" => Ok(serde_json::from_str(s)?),
        "toml" => Ok(toml::from_str(s)?),
        // Unknown extension: JSON objects start with '{', anything else is tried as TOML.
        _ if s.trim_start().starts_with('{') => Ok(serde_json::from_str(s)?),
        _ => Ok(toml::from_str(s)?),
    }
}
