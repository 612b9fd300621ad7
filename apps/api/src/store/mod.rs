//! Persistence layer.
//!
//! All business code talks to `dyn Store`; the backend is chosen once at
//! startup. `MemStore` is the default and what every engine test runs
//! against; `PgStore` persists the same documents in Postgres JSONB when
//! `DATABASE_URL` is set.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    Candidate, CandidateCreate, CandidateUpdate, Feedback, LearningEntry, MatchFilter, MatchRecord,
    MatchUpdate, MatchUpsert, OfferFilter, OfferRecord, OfferUpdate, OfferUpsert, Role, RoleCreate,
    RoleUpdate,
};

pub mod memory;
pub mod postgres;

pub use memory::MemStore;
pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,

    #[error("duplicate record: {0}")]
    Duplicate(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Typed persistence operations over the six collections.
///
/// Upserts are the idempotency points: candidates key on email, matches
/// and offers key on the (candidate, role) pair. The `put_*` methods
/// replace a whole record by id and exist for feedback-driven
/// modifications, which edit the record as a JSON document.
#[async_trait]
pub trait Store: Send + Sync {
    // candidates
    async fn upsert_candidate(&self, input: CandidateCreate) -> Result<Candidate, StoreError>;
    async fn get_candidate(&self, id: Uuid) -> Result<Candidate, StoreError>;
    async fn list_candidates(&self) -> Result<Vec<Candidate>, StoreError>;
    async fn update_candidate(
        &self,
        id: Uuid,
        patch: CandidateUpdate,
    ) -> Result<Candidate, StoreError>;
    async fn delete_candidate(&self, id: Uuid) -> Result<(), StoreError>;

    // roles
    async fn create_role(&self, input: RoleCreate) -> Result<Role, StoreError>;
    async fn get_role(&self, id: Uuid) -> Result<Role, StoreError>;
    async fn list_roles(&self, include_inactive: bool) -> Result<Vec<Role>, StoreError>;
    async fn update_role(&self, id: Uuid, patch: RoleUpdate) -> Result<Role, StoreError>;
    async fn delete_role(&self, id: Uuid) -> Result<(), StoreError>;

    // matches
    async fn upsert_match(&self, input: MatchUpsert) -> Result<MatchRecord, StoreError>;
    async fn get_match(&self, id: Uuid) -> Result<MatchRecord, StoreError>;
    async fn list_matches(&self, filter: &MatchFilter) -> Result<Vec<MatchRecord>, StoreError>;
    async fn update_match(&self, id: Uuid, patch: MatchUpdate) -> Result<MatchRecord, StoreError>;
    async fn put_match(&self, record: MatchRecord) -> Result<(), StoreError>;
    async fn delete_match(&self, id: Uuid) -> Result<(), StoreError>;

    // offers
    async fn upsert_offer(&self, input: OfferUpsert) -> Result<OfferRecord, StoreError>;
    async fn get_offer(&self, id: Uuid) -> Result<OfferRecord, StoreError>;
    async fn list_offers(&self, filter: &OfferFilter) -> Result<Vec<OfferRecord>, StoreError>;
    async fn update_offer(&self, id: Uuid, patch: OfferUpdate) -> Result<OfferRecord, StoreError>;
    async fn put_offer(&self, record: OfferRecord) -> Result<(), StoreError>;
    async fn delete_offer(&self, id: Uuid) -> Result<(), StoreError>;

    // feedback
    async fn insert_feedback(&self, record: Feedback) -> Result<(), StoreError>;
    async fn get_feedback(&self, id: Uuid) -> Result<Feedback, StoreError>;
    async fn list_feedback(&self, entity_id: Option<Uuid>) -> Result<Vec<Feedback>, StoreError>;
    async fn list_unanalyzed_feedback(&self) -> Result<Vec<Feedback>, StoreError>;
    async fn put_feedback(&self, record: Feedback) -> Result<(), StoreError>;

    // learnings (append-only)
    async fn append_learning(&self, entry: LearningEntry) -> Result<(), StoreError>;
    async fn list_learnings(&self, limit: usize) -> Result<Vec<LearningEntry>, StoreError>;
}

/// Sets `value` at a flat or dot-separated path inside a JSON document,
/// creating intermediate objects as needed. "offer.base_salary" routes into
/// the nested package; "status" hits the top level.
pub fn apply_dot_path(doc: &mut Value, path: &str, value: Value) {
    let mut current = doc;
    let mut parts = path.split('.').peekable();
    while let Some(part) = parts.next() {
        if parts.peek().is_none() {
            if let Value::Object(map) = current {
                map.insert(part.to_string(), value);
            }
            return;
        }
        let Value::Object(map) = current else {
            return;
        };
        current = map
            .entry(part.to_string())
            .or_insert_with(|| Value::Object(serde_json::Map::new()));
        if !current.is_object() {
            *current = Value::Object(serde_json::Map::new());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn dot_path_sets_flat_key() {
        let mut doc = json!({"status": "Pending"});
        apply_dot_path(&mut doc, "status", json!("Approved"));
        assert_eq!(doc, json!({"status": "Approved"}));
    }

    #[test]
    fn dot_path_routes_into_nested_object() {
        let mut doc = json!({"offer": {"base_salary": 100000.0, "total_ctc": 120000.0}});
        apply_dot_path(&mut doc, "offer.base_salary", json!(110000.0));
        assert_eq!(doc["offer"]["base_salary"], json!(110000.0));
        assert_eq!(doc["offer"]["total_ctc"], json!(120000.0));
    }

    #[test]
    fn dot_path_creates_missing_intermediates() {
        let mut doc = json!({});
        apply_dot_path(&mut doc, "a.b.c", json!(1));
        assert_eq!(doc, json!({"a": {"b": {"c": 1}}}));
    }

    #[test]
    fn dot_path_replaces_scalar_intermediate() {
        let mut doc = json!({"a": 5});
        apply_dot_path(&mut doc, "a.b", json!(1));
        assert_eq!(doc, json!({"a": {"b": 1}}));
    }
}
