//! Errors returned to callers of the shortlist generator.
//!
//! Collaborator failures never surface here: they are logged and degrade to
//! `None` or an empty pool. Only malformed criteria are rejected.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CriteriaError {
    /// `limit` was zero or negative
    #[error("invalid criteria: {field} must be positive, got {value}")]
    NonPositiveLimit { field: &'static str, value: i64 },

    /// Score floor outside `[0,1]` or not a number
    #[error("invalid criteria: {field} must be within [0, 1], got {value}")]
    FloorOutOfRange { field: &'static str, value: f64 },

    #[error("invalid criteria: scene_slug must not be empty")]
    EmptySceneSlug,

    #[error("invalid criteria: user_scenes contains a blank entry")]
    BlankUserScene,

    #[error("invalid criteria: shortlist name must not be empty")]
    EmptyName,
}
