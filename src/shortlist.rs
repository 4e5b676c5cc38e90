//! # Shortlist Generator
//! Filter a candidate pool, score it, rank it, persist it.
//!
//! Three modes share that shape:
//! - agency: coarse store filters + score floors + optional momentum direction,
//!   ranked by composite score
//! - scene: members of one scene, ranked by composite score
//! - roster gap: candidates outside the caller's covered scenes, ranked by an
//!   opportunity score (scene alignment + breakout)
//!
//! Ranking is a stable descending sort, so equal scores keep the pool's order.
//! Scores are read once per candidate before sorting; writes happen only at the
//! end. An empty result still creates the shortlist record.

use metrics::{counter, histogram};
use std::collections::HashSet;

use crate::batch::run_chunked;
use crate::config::ShortlistPolicy;
use crate::error::CriteriaError;
use crate::math::round4;
use crate::metrics::{
    collaborator_error, ensure_metrics_described, SHORTLISTS_GENERATED_TOTAL, SHORTLIST_SIZE,
};
use crate::model::{
    AgencyCriteria, Candidate, CandidateFilters, MemberPlacement, NewShortlist, ScoreSnapshot,
    ShortlistCriteria, ShortlistWithMembers,
};
use crate::momentum::MomentumEngine;
use crate::store::{DynCandidateSource, DynSceneMembership, DynScoreSource, DynShortlistSink};

/// Outcome of a generation call: `Ok(None)` means the shortlist record itself could
/// not be persisted (logged); malformed criteria are rejected before any fetch.
pub type GenerationResult = Result<Option<ShortlistWithMembers>, CriteriaError>;

/// A candidate with the one snapshot it is ranked on.
#[derive(Debug, Clone)]
pub struct RankedCandidate {
    pub candidate: Candidate,
    pub snapshot: ScoreSnapshot,
    pub score: f64,
}

/// Stable descending sort by score; ties keep input order.
pub fn rank(mut items: Vec<RankedCandidate>) -> Vec<RankedCandidate> {
    items.sort_by(|a, b| b.score.total_cmp(&a.score));
    items
}

/// "Opportunity" used by roster-gap shortlists.
pub fn opportunity_score(snapshot: &ScoreSnapshot, policy: &ShortlistPolicy) -> f64 {
    policy.opportunity_weight_scene_alignment * snapshot.scene_alignment_score
        + policy.opportunity_weight_breakout * snapshot.breakout_score
}

/// True when every floor that is set is met.
pub fn meets_floors(snapshot: &ScoreSnapshot, criteria: &AgencyCriteria) -> bool {
    let ok = |floor: Option<f64>, value: f64| floor.map_or(true, |f| value >= f);
    ok(criteria.min_composite_score, snapshot.composite_score)
        && ok(criteria.min_breakout_score, snapshot.breakout_score)
        && ok(criteria.min_momentum_score, snapshot.momentum_score)
}

fn check_limit(field: &'static str, limit: Option<i64>) -> Result<(), CriteriaError> {
    match limit {
        Some(value) if value <= 0 => Err(CriteriaError::NonPositiveLimit { field, value }),
        _ => Ok(()),
    }
}

fn check_floor(field: &'static str, floor: Option<f64>) -> Result<(), CriteriaError> {
    match floor {
        Some(value) if !(value.is_finite() && (0.0..=1.0).contains(&value)) => {
            Err(CriteriaError::FloorOutOfRange { field, value })
        }
        _ => Ok(()),
    }
}

pub fn validate_agency(criteria: &AgencyCriteria) -> Result<(), CriteriaError> {
    if criteria.name.trim().is_empty() {
        return Err(CriteriaError::EmptyName);
    }
    check_limit("limit", criteria.limit)?;
    check_floor("min_composite_score", criteria.min_composite_score)?;
    check_floor("min_breakout_score", criteria.min_breakout_score)?;
    check_floor("min_momentum_score", criteria.min_momentum_score)?;
    Ok(())
}

pub fn validate_scene(scene_slug: &str, limit: Option<i64>) -> Result<(), CriteriaError> {
    if scene_slug.trim().is_empty() {
        return Err(CriteriaError::EmptySceneSlug);
    }
    check_limit("limit", limit)
}

pub fn validate_roster_gap(user_scenes: &[String]) -> Result<(), CriteriaError> {
    if user_scenes.iter().any(|s| s.trim().is_empty()) {
        return Err(CriteriaError::BlankUserScene);
    }
    Ok(())
}

pub fn validate(criteria: &ShortlistCriteria) -> Result<(), CriteriaError> {
    match criteria {
        ShortlistCriteria::Agency(c) => validate_agency(c),
        ShortlistCriteria::Scene { scene_slug, limit } => validate_scene(scene_slug, *limit),
        ShortlistCriteria::RosterGap { user_scenes } => validate_roster_gap(user_scenes),
    }
}

#[derive(Clone)]
pub struct ShortlistGenerator {
    candidates: DynCandidateSource,
    scores: DynScoreSource,
    shortlists: DynShortlistSink,
    scenes: DynSceneMembership,
    momentum: MomentumEngine,
    policy: ShortlistPolicy,
    chunk_size: usize,
}

impl ShortlistGenerator {
    pub fn new(
        candidates: DynCandidateSource,
        scores: DynScoreSource,
        shortlists: DynShortlistSink,
        scenes: DynSceneMembership,
        momentum: MomentumEngine,
        policy: ShortlistPolicy,
        chunk_size: usize,
    ) -> Self {
        ensure_metrics_described();
        Self {
            candidates,
            scores,
            shortlists,
            scenes,
            momentum,
            policy,
            chunk_size: chunk_size.max(1),
        }
    }

    /// Dispatch on the criteria's mode.
    pub async fn generate(&self, owner_id: &str, criteria: ShortlistCriteria) -> GenerationResult {
        match criteria {
            ShortlistCriteria::Agency(c) => self.generate_agency_shortlist(owner_id, c).await,
            ShortlistCriteria::Scene { scene_slug, limit } => {
                self.generate_scene_shortlist(owner_id, &scene_slug, limit)
                    .await
            }
            ShortlistCriteria::RosterGap { user_scenes } => {
                self.generate_roster_gap_shortlist(owner_id, user_scenes)
                    .await
            }
        }
    }

    /// Run a stored shortlist's criteria again. Always creates a new shortlist;
    /// the old one keeps its point-in-time membership.
    pub async fn regenerate(&self, shortlist_id: &str) -> GenerationResult {
        let stored = match self.shortlists.get_shortlist(shortlist_id).await {
            Ok(Some(s)) => s.shortlist,
            Ok(None) => {
                tracing::warn!(target: "shortlist", shortlist_id = %shortlist_id, "regenerate: unknown shortlist");
                return Ok(None);
            }
            Err(e) => {
                tracing::warn!(
                    target: "shortlist",
                    shortlist_id = %shortlist_id,
                    op = "regenerate",
                    error = ?e,
                    "shortlist fetch failed"
                );
                collaborator_error("get_shortlist");
                return Ok(None);
            }
        };
        self.generate(&stored.owner_id, stored.criteria).await
    }

    pub async fn generate_agency_shortlist(
        &self,
        owner_id: &str,
        criteria: AgencyCriteria,
    ) -> GenerationResult {
        validate_agency(&criteria)?;

        let filters = CandidateFilters {
            scenes: criteria.scenes.clone(),
            countries: criteria.countries.clone(),
            microgenres: criteria.microgenres.clone(),
            limit: Some(
                criteria
                    .limit
                    .map_or(self.policy.candidate_pool_limit, |l| l as usize),
            ),
            offset: None,
        };
        let pool = self.fetch_pool(&filters, "agency").await;
        let scored = self.attach_latest_scores(pool).await;

        let mut survivors: Vec<RankedCandidate> = scored
            .into_iter()
            .filter(|(_, s)| meets_floors(s, &criteria))
            .map(|(candidate, snapshot)| RankedCandidate {
                score: snapshot.composite_score,
                candidate,
                snapshot,
            })
            .collect();

        if let Some(wanted) = criteria.momentum_direction {
            let ids: Vec<String> = survivors.iter().map(|r| r.candidate.id.clone()).collect();
            let momenta = run_chunked(&ids, self.chunk_size, |id| {
                self.momentum.compute_momentum(id)
            })
            .await;
            let keep: Vec<bool> = momenta
                .into_iter()
                .map(|(_, m)| m.is_some_and(|m| m.direction == wanted))
                .collect();
            survivors = survivors
                .into_iter()
                .zip(keep)
                .filter_map(|(r, k)| k.then_some(r))
                .collect();
        }

        let ranked = rank(survivors);
        let new = NewShortlist {
            name: criteria.name.clone(),
            description: criteria.description.clone(),
            criteria: ShortlistCriteria::Agency(criteria),
        };
        Ok(self.persist(owner_id, new, ranked).await)
    }

    pub async fn generate_scene_shortlist(
        &self,
        owner_id: &str,
        scene_slug: &str,
        limit: Option<i64>,
    ) -> GenerationResult {
        validate_scene(scene_slug, limit)?;
        let limit_n = limit.map_or(self.policy.scene_limit, |l| l as usize);
        // rank the whole scene, never fewer members than the caller asked for
        let pool_n = limit_n.max(self.policy.scene_pool_limit);

        let members = match self
            .scenes
            .get_artists_in_scene(scene_slug, pool_n)
            .await
        {
            Ok(m) => m,
            Err(e) => {
                tracing::warn!(
                    target: "shortlist",
                    scene_slug = %scene_slug,
                    op = "scene_shortlist",
                    error = ?e,
                    "scene membership fetch failed"
                );
                collaborator_error("get_artists_in_scene");
                Vec::new()
            }
        };

        // intersect with tracked candidates, keeping the adapter's order
        let mut seen = HashSet::new();
        let slugs: Vec<String> = members
            .into_iter()
            .filter(|s| seen.insert(s.clone()))
            .collect();
        let resolved = run_chunked(&slugs, self.chunk_size, |slug| {
            self.candidates.get_candidate_by_slug(slug)
        })
        .await;
        let pool: Vec<Candidate> = resolved
            .into_iter()
            .filter_map(|(slug, r)| match r {
                Ok(c) => c,
                Err(e) => {
                    tracing::warn!(
                        target: "shortlist",
                        artist_slug = %slug,
                        op = "scene_shortlist",
                        error = ?e,
                        "candidate lookup failed"
                    );
                    collaborator_error("get_candidate_by_slug");
                    None
                }
            })
            .collect();

        let scored = self.attach_latest_scores(pool).await;
        let mut ranked = rank(
            scored
                .into_iter()
                .map(|(candidate, snapshot)| RankedCandidate {
                    score: snapshot.composite_score,
                    candidate,
                    snapshot,
                })
                .collect(),
        );
        ranked.truncate(limit_n);

        let new = NewShortlist {
            name: format!("Scene shortlist: {scene_slug}"),
            description: Some(format!(
                "Top {limit_n} candidates in {scene_slug} by composite score"
            )),
            criteria: ShortlistCriteria::Scene {
                scene_slug: scene_slug.to_string(),
                limit,
            },
        };
        Ok(self.persist(owner_id, new, ranked).await)
    }

    pub async fn generate_roster_gap_shortlist(
        &self,
        owner_id: &str,
        user_scenes: Vec<String>,
    ) -> GenerationResult {
        validate_roster_gap(&user_scenes)?;

        let filters = CandidateFilters::with_limit(self.policy.candidate_pool_limit);
        let pool: Vec<Candidate> = self
            .fetch_pool(&filters, "roster_gap")
            .await
            .into_iter()
            .filter(|c| {
                !c.primary_scene_slug
                    .as_ref()
                    .is_some_and(|scene| user_scenes.contains(scene))
            })
            .collect();

        let scored = self.attach_latest_scores(pool).await;
        let mut ranked = rank(
            scored
                .into_iter()
                .map(|(candidate, snapshot)| RankedCandidate {
                    score: opportunity_score(&snapshot, &self.policy),
                    candidate,
                    snapshot,
                })
                .collect(),
        );
        ranked.truncate(self.policy.roster_gap_limit);

        let description = if user_scenes.is_empty() {
            "Uncovered opportunities across all scenes".to_string()
        } else {
            format!(
                "Uncovered opportunities outside: {}",
                user_scenes.join(", ")
            )
        };
        let new = NewShortlist {
            name: "Roster gap opportunities".to_string(),
            description: Some(description),
            criteria: ShortlistCriteria::RosterGap { user_scenes },
        };
        Ok(self.persist(owner_id, new, ranked).await)
    }

    /// Candidate pool; a store failure degrades to an empty pool.
    async fn fetch_pool(&self, filters: &CandidateFilters, mode: &'static str) -> Vec<Candidate> {
        match self.candidates.list_candidates(filters).await {
            Ok(page) => {
                tracing::debug!(
                    target: "shortlist",
                    mode,
                    pool = page.data.len(),
                    total = page.total,
                    "candidate pool fetched"
                );
                page.data
            }
            Err(e) => {
                tracing::warn!(
                    target: "shortlist",
                    mode,
                    op = "list_candidates",
                    error = ?e,
                    "candidate pool fetch failed"
                );
                collaborator_error("list_candidates");
                Vec::new()
            }
        }
    }

    /// Pair each candidate with its latest snapshot, in pool order. Candidates
    /// without a snapshot, or whose fetch failed, are dropped.
    async fn attach_latest_scores(
        &self,
        pool: Vec<Candidate>,
    ) -> Vec<(Candidate, ScoreSnapshot)> {
        let ids: Vec<String> = pool.iter().map(|c| c.id.clone()).collect();
        let latest = run_chunked(&ids, self.chunk_size, |id| self.scores.get_latest_score(id)).await;

        pool.into_iter()
            .zip(latest)
            .filter_map(|(candidate, (_, r))| match r {
                Ok(Some(s)) => Some((candidate, s)),
                Ok(None) => None,
                Err(e) => {
                    tracing::warn!(
                        target: "shortlist",
                        candidate_id = %candidate.id,
                        op = "get_latest_score",
                        error = ?e,
                        "latest score fetch failed, dropping candidate"
                    );
                    collaborator_error("get_latest_score");
                    None
                }
            })
            .collect()
    }

    async fn persist(
        &self,
        owner_id: &str,
        new: NewShortlist,
        ranked: Vec<RankedCandidate>,
    ) -> Option<ShortlistWithMembers> {
        let mode = new.criteria.mode();
        let shortlist = match self.shortlists.create_shortlist(owner_id, new).await {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(
                    target: "shortlist",
                    owner_id = %owner_id,
                    mode,
                    op = "create_shortlist",
                    error = ?e,
                    "shortlist creation failed"
                );
                collaborator_error("create_shortlist");
                return None;
            }
        };

        let mut members = Vec::with_capacity(ranked.len());
        for (i, r) in ranked.iter().enumerate() {
            let placement = MemberPlacement {
                score: round4(r.score),
                position: i + 1,
            };
            match self
                .shortlists
                .add_candidate_to_shortlist(&shortlist.id, &r.candidate.id, placement)
                .await
            {
                Ok(m) => members.push(m),
                Err(e) => {
                    tracing::warn!(
                        target: "shortlist",
                        shortlist_id = %shortlist.id,
                        candidate_id = %r.candidate.id,
                        position = placement.position,
                        error = ?e,
                        "adding shortlist member failed"
                    );
                    collaborator_error("add_candidate_to_shortlist");
                }
            }
        }

        counter!(SHORTLISTS_GENERATED_TOTAL, "mode" => mode).increment(1);
        histogram!(SHORTLIST_SIZE).record(members.len() as f64);
        tracing::info!(
            target: "shortlist",
            shortlist_id = %shortlist.id,
            owner_id = %owner_id,
            mode,
            members = members.len(),
            "shortlist generated"
        );

        Some(ShortlistWithMembers { shortlist, members })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn ranked(id: &str, score: f64) -> RankedCandidate {
        let t = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        RankedCandidate {
            candidate: Candidate::new(id, id, t),
            snapshot: ScoreSnapshot::new(id, t, score, 0.0, 0.0, 0.0),
            score,
        }
    }

    #[test]
    fn rank_is_descending_and_stable() {
        let out = rank(vec![
            ranked("a", 0.5),
            ranked("b", 0.9),
            ranked("c", 0.5),
            ranked("d", 0.7),
            ranked("e", 0.5),
        ]);
        let ids: Vec<_> = out.iter().map(|r| r.candidate.id.as_str()).collect();
        assert_eq!(ids, ["b", "d", "a", "c", "e"]);
    }

    #[test]
    fn floors_are_inclusive() {
        let t = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let s = ScoreSnapshot::new("a", t, 0.6, 0.4, 0.3, 0.0);
        let mut c = AgencyCriteria {
            name: "x".into(),
            min_composite_score: Some(0.6),
            ..Default::default()
        };
        assert!(meets_floors(&s, &c));
        c.min_breakout_score = Some(0.41);
        assert!(!meets_floors(&s, &c));
        c.min_breakout_score = None;
        c.min_momentum_score = Some(0.3);
        assert!(meets_floors(&s, &c));
    }

    #[test]
    fn opportunity_blends_alignment_and_breakout() {
        let t = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let s = ScoreSnapshot::new("a", t, 0.0, 0.5, 0.0, 1.0);
        assert_eq!(opportunity_score(&s, &ShortlistPolicy::default()), 0.75);
    }

    #[test]
    fn malformed_criteria_are_rejected() {
        let bad_limit = AgencyCriteria {
            name: "x".into(),
            limit: Some(-3),
            ..Default::default()
        };
        assert_eq!(
            validate_agency(&bad_limit),
            Err(CriteriaError::NonPositiveLimit {
                field: "limit",
                value: -3
            })
        );

        let bad_floor = AgencyCriteria {
            name: "x".into(),
            min_breakout_score: Some(1.5),
            ..Default::default()
        };
        assert!(matches!(
            validate_agency(&bad_floor),
            Err(CriteriaError::FloorOutOfRange {
                field: "min_breakout_score",
                ..
            })
        ));

        assert_eq!(
            validate_agency(&AgencyCriteria::default()),
            Err(CriteriaError::EmptyName)
        );
        assert_eq!(validate_scene("  ", None), Err(CriteriaError::EmptySceneSlug));
        assert!(validate_scene("grime", Some(0)).is_err());
        assert_eq!(
            validate_roster_gap(&["grime".to_string(), " ".to_string()]),
            Err(CriteriaError::BlankUserScene)
        );
        assert!(validate_roster_gap(&[]).is_ok());
    }
}
