//! Domain types shared by the engines and the collaborator traits.
//!
//! Candidates and score snapshots come from upstream jobs and are read-only here.
//! `MomentumAnalysis` and `BreakoutProbability` are derived on demand and never
//! stored by this crate. Shortlists are the only thing the core writes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An artist tracked for breakout potential.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: String,
    pub artist_slug: String,
    pub display_name: String,
    /// Primary scene/genre classification, e.g. "uk-drill".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_scene_slug: Option<String>,
    /// ISO country code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default)]
    pub microgenres: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl Candidate {
    /// Minimal candidate; `display_name` defaults to the slug.
    pub fn new(
        id: impl Into<String>,
        artist_slug: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        let artist_slug = artist_slug.into();
        Self {
            id: id.into(),
            display_name: artist_slug.clone(),
            artist_slug,
            primary_scene_slug: None,
            country: None,
            microgenres: Vec::new(),
            created_at,
        }
    }

    pub fn display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = name.into();
        self
    }

    pub fn scene(mut self, scene_slug: impl Into<String>) -> Self {
        self.primary_scene_slug = Some(scene_slug.into());
        self
    }

    pub fn country(mut self, country: impl Into<String>) -> Self {
        self.country = Some(country.into());
        self
    }

    pub fn microgenres<I, S>(mut self, genres: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.microgenres = genres.into_iter().map(Into::into).collect();
        self
    }
}

/// One time-stamped measurement for a candidate. All sub-scores live in `[0,1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreSnapshot {
    pub candidate_id: String,
    pub captured_at: DateTime<Utc>,
    pub composite_score: f64,
    pub breakout_score: f64,
    pub momentum_score: f64,
    pub scene_alignment_score: f64,
}

impl ScoreSnapshot {
    /// Safe constructor with clamping into `[0,1]`.
    pub fn new(
        candidate_id: impl Into<String>,
        captured_at: DateTime<Utc>,
        composite: f64,
        breakout: f64,
        momentum: f64,
        scene_alignment: f64,
    ) -> Self {
        fn c(x: f64) -> f64 {
            if x.is_nan() {
                0.0
            } else {
                x.clamp(0.0, 1.0)
            }
        }
        Self {
            candidate_id: candidate_id.into(),
            captured_at,
            composite_score: c(composite),
            breakout_score: c(breakout),
            momentum_score: c(momentum),
            scene_alignment_score: c(scene_alignment),
        }
    }
}

/// Trend class of a candidate's composite score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MomentumDirection {
    StronglyUp,
    ModeratelyUp,
    Flat,
    Down,
}

impl MomentumDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            MomentumDirection::StronglyUp => "strongly_up",
            MomentumDirection::ModeratelyUp => "moderately_up",
            MomentumDirection::Flat => "flat",
            MomentumDirection::Down => "down",
        }
    }
}

impl std::fmt::Display for MomentumDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Momentum of a candidate over the snapshot window used.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MomentumAnalysis {
    pub candidate_id: String,
    pub direction: MomentumDirection,
    pub velocity: f64,
    pub acceleration: f64,
    /// `|velocity|`
    pub amplitude: f64,
    /// Window used for the computation, newest-first.
    pub snapshots: Vec<ScoreSnapshot>,
}

impl MomentumAnalysis {
    /// Composite scores of the window, oldest-first.
    pub fn composite_series(&self) -> Vec<f64> {
        self.snapshots
            .iter()
            .rev()
            .map(|s| s.composite_score)
            .collect()
    }
}

/// The three weighted inputs of a breakout probability.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BreakoutFactors {
    pub breakout_score: f64,
    /// Momentum score after the direction adjustment.
    pub momentum_score: f64,
    pub scene_alignment_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakoutProbability {
    pub candidate_id: String,
    pub probability: f64,
    pub confidence: f64,
    pub factors: BreakoutFactors,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub momentum_direction: Option<MomentumDirection>,
    pub explanation: String,
}

/// Coarse candidate-pool filters understood by the candidate store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CandidateFilters {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scenes: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub countries: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub microgenres: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<usize>,
}

impl CandidateFilters {
    pub fn with_limit(limit: usize) -> Self {
        Self {
            limit: Some(limit),
            ..Self::default()
        }
    }
}

/// One page of a paginated listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub total: usize,
    pub limit: usize,
    pub offset: usize,
    pub has_more: bool,
}

/// Filters and score floors of an agency shortlist.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgencyCriteria {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scenes: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub countries: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub microgenres: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_composite_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_breakout_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_momentum_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub momentum_direction: Option<MomentumDirection>,
    /// Pool size; signed so that malformed input can be rejected explicitly.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
}

/// Criteria stored verbatim on every shortlist, tagged by generation mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ShortlistCriteria {
    Agency(AgencyCriteria),
    Scene {
        scene_slug: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        limit: Option<i64>,
    },
    RosterGap {
        user_scenes: Vec<String>,
    },
}

impl ShortlistCriteria {
    pub fn mode(&self) -> &'static str {
        match self {
            ShortlistCriteria::Agency(_) => "agency",
            ShortlistCriteria::Scene { .. } => "scene",
            ShortlistCriteria::RosterGap { .. } => "roster_gap",
        }
    }
}

/// Input for `create_shortlist`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewShortlist {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub criteria: ShortlistCriteria,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shortlist {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub criteria: ShortlistCriteria,
    pub created_at: DateTime<Utc>,
}

/// Score and rank captured at generation time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MemberPlacement {
    pub score: f64,
    /// 1-based.
    pub position: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShortlistMember {
    pub shortlist_id: String,
    pub candidate_id: String,
    pub score: f64,
    pub position: usize,
}

/// A persisted shortlist together with its ordered membership.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShortlistWithMembers {
    pub shortlist: Shortlist,
    pub members: Vec<ShortlistMember>,
}
