//! In-memory `Store` backend.
//!
//! Default when no `DATABASE_URL` is configured, and the backend every
//! engine test runs against. Same upsert and filter semantics as the
//! Postgres backend.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::{
    Candidate, CandidateCreate, CandidateUpdate, Feedback, LearningEntry, MatchFilter, MatchRecord,
    MatchUpdate, MatchUpsert, OfferFilter, OfferRecord, OfferUpdate, OfferUpsert, Role, RoleCreate,
    RoleUpdate,
};

use super::{Store, StoreError};

#[derive(Default)]
pub struct MemStore {
    candidates: RwLock<HashMap<Uuid, Candidate>>,
    roles: RwLock<HashMap<Uuid, Role>>,
    matches: RwLock<HashMap<Uuid, MatchRecord>>,
    offers: RwLock<HashMap<Uuid, OfferRecord>>,
    feedback: RwLock<HashMap<Uuid, Feedback>>,
    learnings: RwLock<Vec<LearningEntry>>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemStore {
    async fn upsert_candidate(&self, input: CandidateCreate) -> Result<Candidate, StoreError> {
        let mut candidates = self.candidates.write().await;
        if let Some(existing) = candidates.values_mut().find(|c| c.email == input.email) {
            existing.refresh(input);
            return Ok(existing.clone());
        }
        let candidate = Candidate::from_create(input);
        candidates.insert(candidate.id, candidate.clone());
        Ok(candidate)
    }

    async fn get_candidate(&self, id: Uuid) -> Result<Candidate, StoreError> {
        self.candidates
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn list_candidates(&self) -> Result<Vec<Candidate>, StoreError> {
        let mut all: Vec<Candidate> = self.candidates.read().await.values().cloned().collect();
        all.sort_by_key(|c| c.created_at);
        Ok(all)
    }

    async fn update_candidate(
        &self,
        id: Uuid,
        patch: CandidateUpdate,
    ) -> Result<Candidate, StoreError> {
        let mut candidates = self.candidates.write().await;
        if let Some(new_email) = patch.email.as_deref() {
            if candidates
                .values()
                .any(|c| c.id != id && c.email == new_email)
            {
                return Err(StoreError::Duplicate(format!(
                    "candidate with email '{new_email}' already exists"
                )));
            }
        }
        let candidate = candidates.get_mut(&id).ok_or(StoreError::NotFound)?;
        candidate.apply_update(patch);
        Ok(candidate.clone())
    }

    async fn delete_candidate(&self, id: Uuid) -> Result<(), StoreError> {
        self.candidates
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }

    async fn create_role(&self, input: RoleCreate) -> Result<Role, StoreError> {
        let role = Role::from_create(input);
        self.roles.write().await.insert(role.id, role.clone());
        Ok(role)
    }

    async fn get_role(&self, id: Uuid) -> Result<Role, StoreError> {
        self.roles
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn list_roles(&self, include_inactive: bool) -> Result<Vec<Role>, StoreError> {
        let mut all: Vec<Role> = self
            .roles
            .read()
            .await
            .values()
            .filter(|r| include_inactive || r.is_active)
            .cloned()
            .collect();
        all.sort_by_key(|r| r.created_at);
        Ok(all)
    }

    async fn update_role(&self, id: Uuid, patch: RoleUpdate) -> Result<Role, StoreError> {
        let mut roles = self.roles.write().await;
        let role = roles.get_mut(&id).ok_or(StoreError::NotFound)?;
        role.apply_update(patch);
        Ok(role.clone())
    }

    async fn delete_role(&self, id: Uuid) -> Result<(), StoreError> {
        self.roles
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }

    async fn upsert_match(&self, input: MatchUpsert) -> Result<MatchRecord, StoreError> {
        let mut matches = self.matches.write().await;
        if let Some(existing) = matches
            .values_mut()
            .find(|m| m.candidate_id == input.candidate_id && m.role_id == input.role_id)
        {
            existing.match_score = input.match_score;
            existing.skill_match = input.skill_match;
            existing.explanation = input.explanation;
            existing.status = input.status;
            existing.updated_at = Utc::now();
            return Ok(existing.clone());
        }
        let now = Utc::now();
        let record = MatchRecord {
            id: Uuid::new_v4(),
            candidate_id: input.candidate_id,
            role_id: input.role_id,
            match_score: input.match_score,
            skill_match: input.skill_match,
            explanation: input.explanation,
            status: input.status,
            created_at: now,
            updated_at: now,
        };
        matches.insert(record.id, record.clone());
        Ok(record)
    }

    async fn get_match(&self, id: Uuid) -> Result<MatchRecord, StoreError> {
        self.matches
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn list_matches(&self, filter: &MatchFilter) -> Result<Vec<MatchRecord>, StoreError> {
        let mut all: Vec<MatchRecord> = self
            .matches
            .read()
            .await
            .values()
            .filter(|m| filter.accepts(m))
            .cloned()
            .collect();
        all.sort_by_key(|m| m.created_at);
        Ok(all)
    }

    async fn update_match(&self, id: Uuid, patch: MatchUpdate) -> Result<MatchRecord, StoreError> {
        let mut matches = self.matches.write().await;
        let record = matches.get_mut(&id).ok_or(StoreError::NotFound)?;
        if let Some(v) = patch.match_score {
            record.match_score = v;
        }
        if let Some(v) = patch.skill_match {
            record.skill_match = v;
        }
        if let Some(v) = patch.explanation {
            record.explanation = v;
        }
        if let Some(v) = patch.status {
            record.status = v;
        }
        record.updated_at = Utc::now();
        Ok(record.clone())
    }

    async fn put_match(&self, record: MatchRecord) -> Result<(), StoreError> {
        let mut matches = self.matches.write().await;
        if !matches.contains_key(&record.id) {
            return Err(StoreError::NotFound);
        }
        matches.insert(record.id, record);
        Ok(())
    }

    async fn delete_match(&self, id: Uuid) -> Result<(), StoreError> {
        self.matches
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }

    async fn upsert_offer(&self, input: OfferUpsert) -> Result<OfferRecord, StoreError> {
        let mut offers = self.offers.write().await;
        if let Some(existing) = offers
            .values_mut()
            .find(|o| o.candidate_id == input.candidate_id && o.role_id == input.role_id)
        {
            existing.match_id = input.match_id;
            existing.match_score = input.match_score;
            existing.offer = input.offer;
            existing.explanation = input.explanation;
            existing.status = input.status;
            existing.updated_at = Utc::now();
            return Ok(existing.clone());
        }
        let now = Utc::now();
        let record = OfferRecord {
            id: Uuid::new_v4(),
            candidate_id: input.candidate_id,
            role_id: input.role_id,
            match_id: input.match_id,
            match_score: input.match_score,
            offer: input.offer,
            explanation: input.explanation,
            status: input.status,
            created_at: now,
            updated_at: now,
        };
        offers.insert(record.id, record.clone());
        Ok(record)
    }

    async fn get_offer(&self, id: Uuid) -> Result<OfferRecord, StoreError> {
        self.offers
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn list_offers(&self, filter: &OfferFilter) -> Result<Vec<OfferRecord>, StoreError> {
        let mut all: Vec<OfferRecord> = self
            .offers
            .read()
            .await
            .values()
            .filter(|o| filter.accepts(o))
            .cloned()
            .collect();
        all.sort_by_key(|o| o.created_at);
        Ok(all)
    }

    async fn update_offer(&self, id: Uuid, patch: OfferUpdate) -> Result<OfferRecord, StoreError> {
        let mut offers = self.offers.write().await;
        let record = offers.get_mut(&id).ok_or(StoreError::NotFound)?;
        if let Some(v) = patch.offer {
            record.offer = v;
        }
        if let Some(v) = patch.explanation {
            record.explanation = v;
        }
        if let Some(v) = patch.status {
            record.status = v;
        }
        record.updated_at = Utc::now();
        Ok(record.clone())
    }

    async fn put_offer(&self, record: OfferRecord) -> Result<(), StoreError> {
        let mut offers = self.offers.write().await;
        if !offers.contains_key(&record.id) {
            return Err(StoreError::NotFound);
        }
        offers.insert(record.id, record);
        Ok(())
    }

    async fn delete_offer(&self, id: Uuid) -> Result<(), StoreError> {
        self.offers
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }

    async fn insert_feedback(&self, record: Feedback) -> Result<(), StoreError> {
        self.feedback.write().await.insert(record.id, record);
        Ok(())
    }

    async fn get_feedback(&self, id: Uuid) -> Result<Feedback, StoreError> {
        self.feedback
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn list_feedback(&self, entity_id: Option<Uuid>) -> Result<Vec<Feedback>, StoreError> {
        let mut all: Vec<Feedback> = self
            .feedback
            .read()
            .await
            .values()
            .filter(|f| entity_id.map_or(true, |id| f.entity_id == id))
            .cloned()
            .collect();
        all.sort_by_key(|f| f.created_at);
        Ok(all)
    }

    async fn list_unanalyzed_feedback(&self) -> Result<Vec<Feedback>, StoreError> {
        let mut all: Vec<Feedback> = self
            .feedback
            .read()
            .await
            .values()
            .filter(|f| f.analysis.is_none())
            .cloned()
            .collect();
        all.sort_by_key(|f| f.created_at);
        Ok(all)
    }

    async fn put_feedback(&self, record: Feedback) -> Result<(), StoreError> {
        let mut feedback = self.feedback.write().await;
        if !feedback.contains_key(&record.id) {
            return Err(StoreError::NotFound);
        }
        feedback.insert(record.id, record);
        Ok(())
    }

    async fn append_learning(&self, entry: LearningEntry) -> Result<(), StoreError> {
        self.learnings.write().await.push(entry);
        Ok(())
    }

    async fn list_learnings(&self, limit: usize) -> Result<Vec<LearningEntry>, StoreError> {
        let learnings = self.learnings.read().await;
        Ok(learnings.iter().rev().take(limit).cloned().collect())
    }
}
