//! Offer engine: turns accepted matches into compensation packages.
//!
//! Two oracle calls per match: a free-text market-data lookup that
//! degrades to a placeholder on failure, then a structured offer
//! recommendation. One offer per (candidate, role) pair; regenerating
//! updates the existing record and resets it to Pending Approval.

use std::sync::Arc;

use chrono::{Duration, Utc};
use futures::stream::{self, StreamExt};
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::llm_client::{oracle_json, Oracle};
use crate::models::{
    Candidate, MatchFilter, MatchRecord, MatchStatus, OfferPackage, OfferRecord, OfferStatus,
    OfferUpsert, Role, MATCH_SCORE_THRESHOLD,
};
use crate::store::{Store, StoreError};

pub mod handlers;
pub mod prompts;

/// Shape the offer oracle must return.
#[derive(Debug, Deserialize)]
pub struct OfferAssessment {
    pub offer: OfferPackage,
    pub explanation: String,
}

pub struct OfferEngine {
    store: Arc<dyn Store>,
    oracle: Arc<dyn Oracle>,
    concurrency: usize,
}

impl OfferEngine {
    pub fn new(store: Arc<dyn Store>, oracle: Arc<dyn Oracle>, concurrency: usize) -> Self {
        Self {
            store,
            oracle,
            concurrency: concurrency.max(1),
        }
    }

    /// Generates offers for the given match ids, or for every match that
    /// is Matched with a qualifying score when no ids are supplied.
    /// Failed matches are logged and skipped.
    pub async fn generate(&self, match_ids: Option<Vec<Uuid>>) -> Result<Vec<OfferRecord>, AppError> {
        let matches = self.select_matches(match_ids).await?;
        info!(matches = matches.len(), "generating offers");

        let outcomes = stream::iter(matches)
            .map(|record| async move {
                let outcome = self.generate_for_match(&record).await;
                (record, outcome)
            })
            .buffer_unordered(self.concurrency)
            .collect::<Vec<_>>()
            .await;

        let mut offers = Vec::new();
        for (record, outcome) in outcomes {
            match outcome {
                Ok(offer) => offers.push(offer),
                Err(e) => warn!(match_id = %record.id, "offer generation failed, skipping: {e}"),
            }
        }
        Ok(offers)
    }

    async fn select_matches(
        &self,
        match_ids: Option<Vec<Uuid>>,
    ) -> Result<Vec<MatchRecord>, StoreError> {
        match match_ids {
            Some(ids) => {
                let mut selected = Vec::with_capacity(ids.len());
                for id in ids {
                    match self.store.get_match(id).await {
                        Ok(record) => selected.push(record),
                        Err(StoreError::NotFound) => warn!(%id, "match not found, skipping"),
                        Err(e) => return Err(e),
                    }
                }
                Ok(selected)
            }
            None => {
                let filter = MatchFilter {
                    min_score: Some(MATCH_SCORE_THRESHOLD),
                    status: Some(MatchStatus::Matched),
                    ..Default::default()
                };
                self.store.list_matches(&filter).await
            }
        }
    }

    /// Builds and upserts the offer for one match.
    pub async fn generate_for_match(&self, record: &MatchRecord) -> Result<OfferRecord, AppError> {
        let candidate = self.store.get_candidate(record.candidate_id).await?;
        let role = self.store.get_role(record.role_id).await?;

        let market_data = self.market_data(&role, &candidate).await;
        let prompt = prompts::offer_prompt(
            &candidate.profile_text(),
            &role.profile_text(),
            record.match_score,
            &record.skill_match.matched.join(", "),
            &record.skill_match.missing.join(", "),
            &market_data,
        );
        let mut assessment: OfferAssessment =
            oracle_json(self.oracle.as_ref(), &prompt, prompts::OFFER_SYSTEM).await?;

        if assessment.offer.start_date.is_none() {
            let start = Utc::now() + Duration::days(30);
            assessment.offer.start_date = Some(start.format("%Y-%m-%d").to_string());
        }

        let offer = self
            .store
            .upsert_offer(OfferUpsert {
                candidate_id: candidate.id,
                role_id: role.id,
                match_id: record.id,
                match_score: record.match_score,
                offer: assessment.offer,
                explanation: assessment.explanation,
                status: OfferStatus::PendingApproval,
            })
            .await?;
        info!(
            candidate = %candidate.name,
            role = %role.title,
            offer_id = %offer.id,
            "stored offer"
        );
        Ok(offer)
    }

    /// Free-text market context. Oracle trouble degrades to a placeholder.
    async fn market_data(&self, role: &Role, candidate: &Candidate) -> String {
        let prompt = prompts::market_data_prompt(
            &role.title,
            &role.department,
            role.location.as_deref().unwrap_or("Not specified"),
            candidate.experience.as_deref().unwrap_or("Not specified"),
        );
        match self
            .oracle
            .generate(&prompt, prompts::MARKET_DATA_SYSTEM)
            .await
        {
            Ok(text) => text,
            Err(e) => {
                warn!(role = %role.title, "market data lookup failed: {e}");
                "Market data not available.".to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::LlmError;
    use crate::models::{CandidateCreate, MatchUpsert, OfferFilter, RoleCreate, SkillMatch};
    use crate::store::MemStore;
    use async_trait::async_trait;

    fn candidate_input() -> CandidateCreate {
        CandidateCreate {
            name: "Asha Rao".to_string(),
            email: "asha@ex.com".to_string(),
            phone: None,
            skills: vec!["rust".to_string()],
            experience: Some("4 years".to_string()),
            education: None,
            certifications: None,
            current_ctc: Some(90000.0),
            expected_ctc: Some(110000.0),
            notice_period: None,
            location: Some("Pune".to_string()),
            remote_preference: None,
            interview_scores: None,
            interview_feedback: None,
            preferences: None,
        }
    }

    fn role_input() -> RoleCreate {
        RoleCreate {
            title: "Backend Engineer".to_string(),
            department: "Platform".to_string(),
            description: None,
            required_skills: vec!["rust".to_string()],
            preferred_skills: None,
            experience_required: None,
            education_required: None,
            certifications_required: None,
            certifications_mandatory: false,
            salary_range: None,
            location: Some("Pune".to_string()),
            remote_option: None,
            team_size: None,
            hiring_manager: None,
        }
    }

    async fn seeded_match(store: &MemStore, score: i32) -> MatchRecord {
        let candidate = store.upsert_candidate(candidate_input()).await.unwrap();
        let role = store.create_role(role_input()).await.unwrap();
        store
            .upsert_match(MatchUpsert {
                candidate_id: candidate.id,
                role_id: role.id,
                match_score: score,
                skill_match: SkillMatch {
                    matched: vec!["rust".to_string()],
                    missing: vec![],
                },
                explanation: "good fit".to_string(),
                status: MatchStatus::from_score(score),
            })
            .await
            .unwrap()
    }

    /// Market call returns prose; offer call returns a package. Start date
    /// is controlled by the `with_start_date` flag.
    struct OfferStub {
        with_start_date: bool,
    }

    #[async_trait]
    impl Oracle for OfferStub {
        async fn generate(&self, _prompt: &str, system: &str) -> Result<String, LlmError> {
            if system == prompts::MARKET_DATA_SYSTEM {
                return Ok("Mid-range salary for this role is 100k-130k.".to_string());
            }
            let start_date = if self.with_start_date {
                r#""start_date": "2026-10-01","#
            } else {
                ""
            };
            Ok(format!(
                r#"{{"offer": {{"base_salary": 115000.0, "bonus": 10000.0, "equity": "0.05%", "benefits": ["health insurance"], "total_ctc": 125000.0, {start_date} "remote": "hybrid"}}, "explanation": "Competitive against market data."}}"#
            ))
        }
    }

    #[tokio::test]
    async fn generates_pending_offer_for_matched_records() {
        let store = Arc::new(MemStore::new());
        seeded_match(&store, 85).await;

        let engine = OfferEngine::new(store.clone(), Arc::new(OfferStub { with_start_date: true }), 2);
        let offers = engine.generate(None).await.unwrap();

        assert_eq!(offers.len(), 1);
        assert_eq!(offers[0].status, OfferStatus::PendingApproval);
        assert_eq!(offers[0].offer.base_salary, 115000.0);
        assert_eq!(offers[0].offer.start_date.as_deref(), Some("2026-10-01"));
    }

    #[tokio::test]
    async fn missing_start_date_defaults_to_thirty_days_out() {
        let store = Arc::new(MemStore::new());
        seeded_match(&store, 85).await;

        let engine = OfferEngine::new(store.clone(), Arc::new(OfferStub { with_start_date: false }), 2);
        let offers = engine.generate(None).await.unwrap();

        let expected = (Utc::now() + Duration::days(30)).format("%Y-%m-%d").to_string();
        assert_eq!(offers[0].offer.start_date.as_deref(), Some(expected.as_str()));
    }

    #[tokio::test]
    async fn review_needed_matches_are_not_offered_by_default() {
        let store = Arc::new(MemStore::new());
        seeded_match(&store, 55).await;

        let engine = OfferEngine::new(store.clone(), Arc::new(OfferStub { with_start_date: true }), 2);
        assert!(engine.generate(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn explicit_match_ids_bypass_the_score_filter() {
        let store = Arc::new(MemStore::new());
        let record = seeded_match(&store, 55).await;

        let engine = OfferEngine::new(store.clone(), Arc::new(OfferStub { with_start_date: true }), 2);
        let offers = engine.generate(Some(vec![record.id])).await.unwrap();
        assert_eq!(offers.len(), 1);
    }

    #[tokio::test]
    async fn regeneration_updates_the_same_offer() {
        let store = Arc::new(MemStore::new());
        let record = seeded_match(&store, 85).await;

        let engine = OfferEngine::new(store.clone(), Arc::new(OfferStub { with_start_date: true }), 2);
        let first = engine.generate(Some(vec![record.id])).await.unwrap();
        let second = engine.generate(Some(vec![record.id])).await.unwrap();

        assert_eq!(first[0].id, second[0].id);
        assert_eq!(
            store.list_offers(&OfferFilter::default()).await.unwrap().len(),
            1
        );
    }

    struct FailingOracle;

    #[async_trait]
    impl Oracle for FailingOracle {
        async fn generate(&self, _prompt: &str, _system: &str) -> Result<String, LlmError> {
            Err(LlmError::EmptyContent)
        }
    }

    #[tokio::test]
    async fn oracle_failure_skips_the_match_without_erroring() {
        let store = Arc::new(MemStore::new());
        seeded_match(&store, 85).await;

        let engine = OfferEngine::new(store.clone(), Arc::new(FailingOracle), 2);
        let offers = engine.generate(None).await.unwrap();
        assert!(offers.is_empty());
        assert!(store.list_offers(&OfferFilter::default()).await.unwrap().is_empty());
    }
}
