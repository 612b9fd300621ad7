//! Feedback loop: human decisions flow back into the system.
//!
//! Each feedback event is analyzed by the oracle for learnings, applied
//! to its entity (status transition or field modifications), and its
//! insights appended to the knowledge log. Analysis failure never blocks
//! the transition: a fallback analysis records the error and processing
//! continues.

use std::sync::Arc;

use serde_json::Value;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::llm_client::{oracle_json, Oracle};
use crate::models::{Feedback, FeedbackAnalysis, FeedbackType, LearningEntry, Patterns};
use crate::store::Store;

pub mod entity;
pub mod handlers;
pub mod prompts;

use entity::{FeedbackEntity, ReviewOutcome};

pub struct FeedbackProcessor {
    store: Arc<dyn Store>,
    oracle: Arc<dyn Oracle>,
}

impl FeedbackProcessor {
    pub fn new(store: Arc<dyn Store>, oracle: Arc<dyn Oracle>) -> Self {
        Self { store, oracle }
    }

    /// Processes one feedback event end to end: analysis, entity
    /// transition, knowledge-log append.
    pub async fn process(&self, feedback_id: Uuid) -> Result<FeedbackAnalysis, AppError> {
        let mut feedback = self.store.get_feedback(feedback_id).await?;
        let entity =
            FeedbackEntity::fetch(self.store.as_ref(), feedback.entity_type, feedback.entity_id)
                .await?;

        let analysis = self.analyze(&feedback, &entity).await;

        feedback.analysis = Some(analysis.clone());
        self.store.put_feedback(feedback.clone()).await?;

        self.apply(&feedback, &entity).await?;
        self.store_learnings(&analysis).await?;

        info!(%feedback_id, "processed feedback");
        Ok(analysis)
    }

    /// Sweeps every feedback record still lacking analysis. Individual
    /// failures are logged and skipped. Returns the number processed.
    pub async fn process_pending(&self) -> Result<usize, AppError> {
        let pending = self.store.list_unanalyzed_feedback().await?;
        info!(count = pending.len(), "processing pending feedback");

        let mut processed = 0;
        for feedback in pending {
            match self.process(feedback.id).await {
                Ok(_) => processed += 1,
                Err(e) => error!(feedback_id = %feedback.id, "failed to process feedback: {e}"),
            }
        }
        Ok(processed)
    }

    /// Oracle analysis with a fallback that records the failure as a
    /// learning, so the event is never silently dropped.
    async fn analyze(&self, feedback: &Feedback, entity: &FeedbackEntity) -> FeedbackAnalysis {
        let modifications = feedback
            .modifications
            .as_ref()
            .map(|m| Value::Object(m.clone()).to_string())
            .unwrap_or_else(|| "{}".to_string());
        let prompt = prompts::analysis_prompt(
            feedback.entity_type.as_str(),
            feedback.feedback_type.as_str(),
            feedback.comments.as_deref().unwrap_or(""),
            &modifications,
            &entity.details_text(),
        );

        match oracle_json::<FeedbackAnalysis>(
            self.oracle.as_ref(),
            &prompt,
            prompts::ANALYSIS_SYSTEM,
        )
        .await
        {
            Ok(analysis) => analysis,
            Err(e) => {
                warn!(feedback_id = %feedback.id, "feedback analysis failed: {e}");
                FeedbackAnalysis {
                    learnings: vec![format!("Error analyzing feedback: {e}")],
                    patterns: Patterns::default(),
                    parameters: Default::default(),
                }
            }
        }
    }

    async fn apply(&self, feedback: &Feedback, entity: &FeedbackEntity) -> Result<(), AppError> {
        match feedback.feedback_type {
            FeedbackType::Approval => {
                entity
                    .apply_status(self.store.as_ref(), ReviewOutcome::Approved)
                    .await?;
            }
            FeedbackType::Rejection => {
                entity
                    .apply_status(self.store.as_ref(), ReviewOutcome::Rejected)
                    .await?;
            }
            FeedbackType::Modification => {
                let empty = serde_json::Map::new();
                let modifications = feedback.modifications.as_ref().unwrap_or(&empty);
                entity
                    .apply_modifications(self.store.as_ref(), modifications)
                    .await?;
            }
        }
        Ok(())
    }

    /// Appends the analysis to the append-only knowledge log.
    async fn store_learnings(&self, analysis: &FeedbackAnalysis) -> Result<(), AppError> {
        info!(
            learnings = ?analysis.learnings,
            reinforce = ?analysis.patterns.reinforce,
            avoid = ?analysis.patterns.avoid,
            "recording learnings"
        );
        self.store
            .append_learning(LearningEntry::from_analysis(analysis))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::LlmError;
    use crate::models::{
        CandidateCreate, EntityKind, FeedbackCreate, MatchStatus, MatchUpsert, OfferPackage,
        OfferStatus, OfferUpsert, RoleCreate, SkillMatch,
    };
    use crate::store::MemStore;
    use async_trait::async_trait;
    use serde_json::json;

    struct AnalysisStub;

    #[async_trait]
    impl Oracle for AnalysisStub {
        async fn generate(&self, _prompt: &str, _system: &str) -> Result<String, LlmError> {
            Ok(r#"{"learnings": ["approvals correlate with skill overlap"], "patterns": {"reinforce": ["skill-based scoring"], "avoid": []}, "parameters": {"score_weight": 1.1}}"#.to_string())
        }
    }

    struct FailingOracle;

    #[async_trait]
    impl Oracle for FailingOracle {
        async fn generate(&self, _prompt: &str, _system: &str) -> Result<String, LlmError> {
            Err(LlmError::EmptyContent)
        }
    }

    async fn seed(store: &MemStore) -> (Uuid, Uuid) {
        let candidate = store
            .upsert_candidate(CandidateCreate {
                name: "Asha Rao".to_string(),
                email: "asha@ex.com".to_string(),
                phone: None,
                skills: vec!["rust".to_string()],
                experience: Some("4 years".to_string()),
                education: None,
                certifications: None,
                current_ctc: None,
                expected_ctc: None,
                notice_period: None,
                location: None,
                remote_preference: None,
                interview_scores: None,
                interview_feedback: None,
                preferences: None,
            })
            .await
            .unwrap();
        let role = store
            .create_role(RoleCreate {
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
                location: None,
                remote_option: None,
                team_size: None,
                hiring_manager: None,
            })
            .await
            .unwrap();
        (candidate.id, role.id)
    }

    async fn seeded_match(store: &MemStore) -> Uuid {
        let (candidate_id, role_id) = seed(store).await;
        store
            .upsert_match(MatchUpsert {
                candidate_id,
                role_id,
                match_score: 82,
                skill_match: SkillMatch::default(),
                explanation: "fit".to_string(),
                status: MatchStatus::Matched,
            })
            .await
            .unwrap()
            .id
    }

    async fn seeded_offer(store: &MemStore) -> Uuid {
        let (candidate_id, role_id) = seed(store).await;
        let match_id = store
            .upsert_match(MatchUpsert {
                candidate_id,
                role_id,
                match_score: 82,
                skill_match: SkillMatch::default(),
                explanation: "fit".to_string(),
                status: MatchStatus::Matched,
            })
            .await
            .unwrap()
            .id;
        store
            .upsert_offer(OfferUpsert {
                candidate_id,
                role_id,
                match_id,
                match_score: 82,
                offer: OfferPackage {
                    base_salary: 100000.0,
                    bonus: Some(8000.0),
                    equity: None,
                    benefits: vec!["health insurance".to_string()],
                    total_ctc: 108000.0,
                    start_date: Some("2026-10-01".to_string()),
                    remote: Some("hybrid".to_string()),
                },
                explanation: "market aligned".to_string(),
                status: OfferStatus::PendingApproval,
            })
            .await
            .unwrap()
            .id
    }

    async fn submit(
        store: &MemStore,
        entity_type: EntityKind,
        entity_id: Uuid,
        feedback_type: FeedbackType,
        modifications: Option<serde_json::Map<String, Value>>,
    ) -> Uuid {
        let record = Feedback::from_create(FeedbackCreate {
            entity_type,
            entity_id,
            feedback_type,
            comments: Some("reviewed".to_string()),
            modifications,
        });
        let id = record.id;
        store.insert_feedback(record).await.unwrap();
        id
    }

    #[tokio::test]
    async fn approval_transitions_match_and_records_learning() {
        let store = Arc::new(MemStore::new());
        let match_id = seeded_match(&store).await;
        let feedback_id = submit(
            &store,
            EntityKind::Match,
            match_id,
            FeedbackType::Approval,
            None,
        )
        .await;

        let processor = FeedbackProcessor::new(store.clone(), Arc::new(AnalysisStub));
        let analysis = processor.process(feedback_id).await.unwrap();

        assert_eq!(
            analysis.learnings,
            vec!["approvals correlate with skill overlap".to_string()]
        );
        let updated = store.get_match(match_id).await.unwrap();
        assert_eq!(updated.status, MatchStatus::Approved);
        assert_eq!(
            store.get_feedback(feedback_id).await.unwrap().analysis.is_some(),
            true
        );
        assert_eq!(store.list_learnings(10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn rejection_transitions_offer() {
        let store = Arc::new(MemStore::new());
        let offer_id = seeded_offer(&store).await;
        let feedback_id = submit(
            &store,
            EntityKind::Offer,
            offer_id,
            FeedbackType::Rejection,
            None,
        )
        .await;

        FeedbackProcessor::new(store.clone(), Arc::new(AnalysisStub))
            .process(feedback_id)
            .await
            .unwrap();

        assert_eq!(
            store.get_offer(offer_id).await.unwrap().status,
            OfferStatus::Rejected
        );
    }

    #[tokio::test]
    async fn flat_modification_edits_match_fields() {
        let store = Arc::new(MemStore::new());
        let match_id = seeded_match(&store).await;

        let mut modifications = serde_json::Map::new();
        modifications.insert("match_score".to_string(), json!(64));
        let feedback_id = submit(
            &store,
            EntityKind::Match,
            match_id,
            FeedbackType::Modification,
            Some(modifications),
        )
        .await;

        FeedbackProcessor::new(store.clone(), Arc::new(AnalysisStub))
            .process(feedback_id)
            .await
            .unwrap();

        let updated = store.get_match(match_id).await.unwrap();
        assert_eq!(updated.match_score, 64);
        assert_eq!(updated.status, MatchStatus::Modified);
    }

    #[tokio::test]
    async fn dot_path_modification_routes_into_offer_package() {
        let store = Arc::new(MemStore::new());
        let offer_id = seeded_offer(&store).await;

        let mut modifications = serde_json::Map::new();
        modifications.insert("offer.base_salary".to_string(), json!(112000.0));
        let feedback_id = submit(
            &store,
            EntityKind::Offer,
            offer_id,
            FeedbackType::Modification,
            Some(modifications),
        )
        .await;

        FeedbackProcessor::new(store.clone(), Arc::new(AnalysisStub))
            .process(feedback_id)
            .await
            .unwrap();

        let updated = store.get_offer(offer_id).await.unwrap();
        assert_eq!(updated.offer.base_salary, 112000.0);
        // Untouched nested fields survive.
        assert_eq!(updated.offer.total_ctc, 108000.0);
        assert_eq!(updated.status, OfferStatus::Modified);
    }

    #[tokio::test]
    async fn analysis_failure_still_applies_the_transition() {
        let store = Arc::new(MemStore::new());
        let match_id = seeded_match(&store).await;
        let feedback_id = submit(
            &store,
            EntityKind::Match,
            match_id,
            FeedbackType::Approval,
            None,
        )
        .await;

        let analysis = FeedbackProcessor::new(store.clone(), Arc::new(FailingOracle))
            .process(feedback_id)
            .await
            .unwrap();

        assert!(analysis.learnings[0].starts_with("Error analyzing feedback"));
        assert_eq!(
            store.get_match(match_id).await.unwrap().status,
            MatchStatus::Approved
        );
    }

    #[tokio::test]
    async fn missing_entity_is_an_error() {
        let store = Arc::new(MemStore::new());
        let feedback_id = submit(
            &store,
            EntityKind::Match,
            Uuid::new_v4(),
            FeedbackType::Approval,
            None,
        )
        .await;

        let result = FeedbackProcessor::new(store.clone(), Arc::new(AnalysisStub))
            .process(feedback_id)
            .await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn pending_sweep_processes_everything_unanalyzed() {
        let store = Arc::new(MemStore::new());
        let match_id = seeded_match(&store).await;
        submit(&store, EntityKind::Match, match_id, FeedbackType::Approval, None).await;
        submit(&store, EntityKind::Match, match_id, FeedbackType::Rejection, None).await;

        let processor = FeedbackProcessor::new(store.clone(), Arc::new(AnalysisStub));
        assert_eq!(processor.process_pending().await.unwrap(), 2);
        assert_eq!(processor.process_pending().await.unwrap(), 0);
    }
}
