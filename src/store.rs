// src/store.rs
//! Collaborator interfaces consumed by the engines, plus an in-memory reference
//! implementation.
//!
//! The engines only ever see the traits (`Arc<dyn ...>`); the real database lives
//! in the application layer. `InMemoryStore` follows the same listing semantics a
//! database-backed store is expected to have:
//! - countries filter by membership, scenes by primary scene, microgenres by overlap
//! - newest candidates first (ties keep insertion order)
//! - default page size 50, offset pagination
//! - score history newest-first

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::model::{
    Candidate, CandidateFilters, MemberPlacement, NewShortlist, Page, ScoreSnapshot, Shortlist,
    ShortlistMember, ShortlistWithMembers,
};

pub const DEFAULT_PAGE_LIMIT: usize = 50;

#[async_trait]
pub trait ScoreSource: Send + Sync {
    /// Up to `limit` most recent snapshots, in any order.
    async fn get_score_history(&self, candidate_id: &str, limit: usize)
        -> Result<Vec<ScoreSnapshot>>;
    async fn get_latest_score(&self, candidate_id: &str) -> Result<Option<ScoreSnapshot>>;
}

#[async_trait]
pub trait CandidateSource: Send + Sync {
    async fn list_candidates(&self, filters: &CandidateFilters) -> Result<Page<Candidate>>;
    async fn get_candidate_by_slug(&self, artist_slug: &str) -> Result<Option<Candidate>>;
}

/// Scene-membership adapter: which artists belong to a scene.
#[async_trait]
pub trait SceneMembership: Send + Sync {
    /// Artist slugs of the scene's members.
    async fn get_artists_in_scene(&self, scene_slug: &str, limit: usize) -> Result<Vec<String>>;
}

#[async_trait]
pub trait ShortlistSink: Send + Sync {
    async fn create_shortlist(&self, owner_id: &str, new: NewShortlist) -> Result<Shortlist>;
    async fn add_candidate_to_shortlist(
        &self,
        shortlist_id: &str,
        candidate_id: &str,
        placement: MemberPlacement,
    ) -> Result<ShortlistMember>;
    /// Shortlist with members ordered by position; `None` if unknown.
    async fn get_shortlist(&self, shortlist_id: &str) -> Result<Option<ShortlistWithMembers>>;
    /// Newest first.
    async fn list_shortlists_for_owner(&self, owner_id: &str) -> Result<Vec<Shortlist>>;
}

pub type DynScoreSource = Arc<dyn ScoreSource>;
pub type DynCandidateSource = Arc<dyn CandidateSource>;
pub type DynSceneMembership = Arc<dyn SceneMembership>;
pub type DynShortlistSink = Arc<dyn ShortlistSink>;

#[derive(Debug, Default)]
struct Tables {
    /// Insertion order is kept; listing sorts a copy.
    candidates: Vec<Candidate>,
    scores: HashMap<String, Vec<ScoreSnapshot>>,
    shortlists: Vec<Shortlist>,
    members: HashMap<String, Vec<ShortlistMember>>,
}

/// Thread-safe in-memory store implementing every store-side trait.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    inner: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace (by `id`) a candidate.
    pub fn upsert_candidate(&self, candidate: Candidate) -> Result<()> {
        let mut t = self.write()?;
        match t.candidates.iter_mut().find(|c| c.id == candidate.id) {
            Some(existing) => *existing = candidate,
            None => t.candidates.push(candidate),
        }
        Ok(())
    }

    /// Append a snapshot. Snapshots are never mutated afterwards.
    pub fn push_snapshot(&self, snapshot: ScoreSnapshot) -> Result<()> {
        let mut t = self.write()?;
        t.scores
            .entry(snapshot.candidate_id.clone())
            .or_default()
            .push(snapshot);
        Ok(())
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Tables>> {
        self.inner
            .read()
            .map_err(|_| anyhow!("in-memory store lock poisoned"))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, Tables>> {
        self.inner
            .write()
            .map_err(|_| anyhow!("in-memory store lock poisoned"))
    }

    fn history_newest_first(t: &Tables, candidate_id: &str) -> Vec<ScoreSnapshot> {
        let mut v = t.scores.get(candidate_id).cloned().unwrap_or_default();
        // stable: equal timestamps keep append order, later appends first
        v.reverse();
        v.sort_by(|a, b| b.captured_at.cmp(&a.captured_at));
        v
    }
}

fn matches_filters(c: &Candidate, f: &CandidateFilters) -> bool {
    if !f.countries.is_empty()
        && !c
            .country
            .as_ref()
            .is_some_and(|country| f.countries.iter().any(|x| x == country))
    {
        return false;
    }
    if !f.scenes.is_empty()
        && !c
            .primary_scene_slug
            .as_ref()
            .is_some_and(|scene| f.scenes.iter().any(|x| x == scene))
    {
        return false;
    }
    if !f.microgenres.is_empty() && !c.microgenres.iter().any(|g| f.microgenres.contains(g)) {
        return false;
    }
    true
}

#[async_trait]
impl ScoreSource for InMemoryStore {
    async fn get_score_history(
        &self,
        candidate_id: &str,
        limit: usize,
    ) -> Result<Vec<ScoreSnapshot>> {
        let t = self.read()?;
        let mut v = Self::history_newest_first(&t, candidate_id);
        v.truncate(limit);
        Ok(v)
    }

    async fn get_latest_score(&self, candidate_id: &str) -> Result<Option<ScoreSnapshot>> {
        let t = self.read()?;
        Ok(Self::history_newest_first(&t, candidate_id)
            .into_iter()
            .next())
    }
}

#[async_trait]
impl CandidateSource for InMemoryStore {
    async fn list_candidates(&self, filters: &CandidateFilters) -> Result<Page<Candidate>> {
        let limit = filters.limit.unwrap_or(DEFAULT_PAGE_LIMIT);
        let offset = filters.offset.unwrap_or(0);

        let t = self.read()?;
        let mut matched: Vec<&Candidate> = t
            .candidates
            .iter()
            .filter(|c| matches_filters(c, filters))
            .collect();
        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = matched.len();
        let data = matched
            .into_iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect();
        Ok(Page {
            data,
            total,
            limit,
            offset,
            has_more: total > offset + limit,
        })
    }

    async fn get_candidate_by_slug(&self, artist_slug: &str) -> Result<Option<Candidate>> {
        let t = self.read()?;
        Ok(t
            .candidates
            .iter()
            .find(|c| c.artist_slug == artist_slug)
            .cloned())
    }
}

#[async_trait]
impl ShortlistSink for InMemoryStore {
    async fn create_shortlist(&self, owner_id: &str, new: NewShortlist) -> Result<Shortlist> {
        let shortlist = Shortlist {
            id: uuid::Uuid::new_v4().to_string(),
            owner_id: owner_id.to_string(),
            name: new.name,
            description: new.description,
            criteria: new.criteria,
            created_at: Utc::now(),
        };
        let mut t = self.write()?;
        t.shortlists.push(shortlist.clone());
        t.members.insert(shortlist.id.clone(), Vec::new());
        Ok(shortlist)
    }

    async fn add_candidate_to_shortlist(
        &self,
        shortlist_id: &str,
        candidate_id: &str,
        placement: MemberPlacement,
    ) -> Result<ShortlistMember> {
        let mut t = self.write()?;
        let members = t
            .members
            .get_mut(shortlist_id)
            .ok_or_else(|| anyhow!("unknown shortlist {shortlist_id}"))?;
        if members.iter().any(|m| m.candidate_id == candidate_id) {
            return Err(anyhow!(
                "candidate {candidate_id} already on shortlist {shortlist_id}"
            ));
        }
        let member = ShortlistMember {
            shortlist_id: shortlist_id.to_string(),
            candidate_id: candidate_id.to_string(),
            score: placement.score,
            position: placement.position,
        };
        members.push(member.clone());
        Ok(member)
    }

    async fn get_shortlist(&self, shortlist_id: &str) -> Result<Option<ShortlistWithMembers>> {
        let t = self.read()?;
        let Some(shortlist) = t.shortlists.iter().find(|s| s.id == shortlist_id).cloned() else {
            return Ok(None);
        };
        let mut members = t.members.get(shortlist_id).cloned().unwrap_or_default();
        members.sort_by_key(|m| m.position);
        Ok(Some(ShortlistWithMembers { shortlist, members }))
    }

    async fn list_shortlists_for_owner(&self, owner_id: &str) -> Result<Vec<Shortlist>> {
        let t = self.read()?;
        let mut v: Vec<Shortlist> = t
            .shortlists
            .iter()
            .filter(|s| s.owner_id == owner_id)
            .cloned()
            .collect();
        // newest first; later inserts win ties
        v.reverse();
        v.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(v)
    }
}

/// Scene-membership adapter backed by a fixed map (tests, demos, static exports).
#[derive(Debug, Clone, Default)]
pub struct StaticSceneMembership {
    scenes: HashMap<String, Vec<String>>,
}

impl StaticSceneMembership {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_scene<I, S>(mut self, scene_slug: impl Into<String>, artist_slugs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scenes.insert(
            scene_slug.into(),
            artist_slugs.into_iter().map(Into::into).collect(),
        );
        self
    }
}

#[async_trait]
impl SceneMembership for StaticSceneMembership {
    async fn get_artists_in_scene(&self, scene_slug: &str, limit: usize) -> Result<Vec<String>> {
        Ok(self
            .scenes
            .get(scene_slug)
            .map(|v| v.iter().take(limit).cloned().collect())
            .unwrap_or_default())
    }
}
