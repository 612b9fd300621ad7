//! Domain entities shared across the pipeline.
//!
//! Every entity carries its own `id` plus `created_at`/`updated_at` so the
//! same struct round-trips through either store backend unchanged. Status
//! enums keep the wire strings the HR frontend expects ("Review Needed",
//! "Pending Approval", ...).

pub mod candidate;
pub mod feedback;
pub mod matching;
pub mod offer;
pub mod role;

pub use candidate::{Candidate, CandidateCreate, CandidateUpdate};
pub use feedback::{
    EntityKind, Feedback, FeedbackAnalysis, FeedbackCreate, FeedbackType, LearningEntry, Patterns,
};
pub use matching::{
    MatchFilter, MatchRecord, MatchStatus, MatchUpdate, MatchUpsert, MatchWithDetails, SkillMatch,
    MATCH_SCORE_THRESHOLD,
};
pub use offer::{
    OfferFilter, OfferPackage, OfferRecord, OfferStatus, OfferUpdate, OfferUpsert,
    OfferWithDetails,
};
pub use role::{Role, RoleCreate, RoleUpdate};

/// Renders an optional free-text field for prompt building.
pub(crate) fn text_or_unspecified(value: Option<&str>) -> &str {
    match value {
        Some(v) if !v.trim().is_empty() => v,
        _ => "Not specified",
    }
}

/// Renders a string list for prompt building.
pub(crate) fn joined(values: &[String]) -> String {
    values.join(", ")
}
