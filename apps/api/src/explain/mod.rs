//! Explanation engine: regenerates richer, reviewer-facing explanations
//! for match and offer records. The regenerated text replaces the
//! record's stored explanation.

use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::llm_client::Oracle;
use crate::models::{MatchFilter, MatchUpdate, OfferFilter, OfferUpdate};
use crate::store::Store;

pub mod prompts;

/// Which collection a batch pass covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchTarget {
    Match,
    Offer,
}

pub struct ExplanationEngine {
    store: Arc<dyn Store>,
    oracle: Arc<dyn Oracle>,
}

impl ExplanationEngine {
    pub fn new(store: Arc<dyn Store>, oracle: Arc<dyn Oracle>) -> Self {
        Self { store, oracle }
    }

    pub async fn regenerate_match(&self, match_id: Uuid) -> Result<String, AppError> {
        let record = self.store.get_match(match_id).await?;
        let candidate = self.store.get_candidate(record.candidate_id).await?;
        let role = self.store.get_role(record.role_id).await?;

        let prompt = prompts::match_explanation_prompt(
            &candidate.profile_text(),
            &role.profile_text(),
            record.match_score,
            &record.skill_match.matched.join(", "),
            &record.skill_match.missing.join(", "),
        );
        let explanation = self
            .oracle
            .generate(&prompt, prompts::MATCH_EXPLANATION_SYSTEM)
            .await?;

        self.store
            .update_match(
                match_id,
                MatchUpdate {
                    explanation: Some(explanation.clone()),
                    ..Default::default()
                },
            )
            .await?;
        info!(%match_id, "regenerated match explanation");
        Ok(explanation)
    }

    pub async fn regenerate_offer(&self, offer_id: Uuid) -> Result<String, AppError> {
        let record = self.store.get_offer(offer_id).await?;
        let candidate = self.store.get_candidate(record.candidate_id).await?;
        let role = self.store.get_role(record.role_id).await?;

        let prompt = prompts::offer_explanation_prompt(
            &candidate.profile_text(),
            &role.profile_text(),
            record.match_score,
            &record.offer.package_text(),
        );
        let explanation = self
            .oracle
            .generate(&prompt, prompts::OFFER_EXPLANATION_SYSTEM)
            .await?;

        self.store
            .update_offer(
                offer_id,
                OfferUpdate {
                    explanation: Some(explanation.clone()),
                    ..Default::default()
                },
            )
            .await?;
        info!(%offer_id, "regenerated offer explanation");
        Ok(explanation)
    }

    /// Fills in explanations for every record that has none. Individual
    /// failures are logged and skipped. Returns the number regenerated.
    pub async fn batch_generate(&self, target: BatchTarget) -> Result<usize, AppError> {
        let mut generated = 0;

        match target {
            BatchTarget::Match => {
                let matches = self.store.list_matches(&MatchFilter::default()).await?;
                for record in matches.into_iter().filter(|m| m.explanation.is_empty()) {
                    match self.regenerate_match(record.id).await {
                        Ok(_) => generated += 1,
                        Err(e) => warn!(match_id = %record.id, "explanation failed, skipping: {e}"),
                    }
                }
            }
            BatchTarget::Offer => {
                let offers = self.store.list_offers(&OfferFilter::default()).await?;
                for record in offers.into_iter().filter(|o| o.explanation.is_empty()) {
                    match self.regenerate_offer(record.id).await {
                        Ok(_) => generated += 1,
                        Err(e) => warn!(offer_id = %record.id, "explanation failed, skipping: {e}"),
                    }
                }
            }
        }

        info!(generated, "batch explanation pass complete");
        Ok(generated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::LlmError;
    use crate::models::{
        CandidateCreate, MatchStatus, MatchUpsert, RoleCreate, SkillMatch,
    };
    use crate::store::MemStore;
    use async_trait::async_trait;

    struct ProseOracle;

    #[async_trait]
    impl Oracle for ProseOracle {
        async fn generate(&self, _prompt: &str, _system: &str) -> Result<String, LlmError> {
            Ok("The candidate's skills map directly onto the role's core requirements.".to_string())
        }
    }

    async fn seeded_match(store: &MemStore, explanation: &str) -> Uuid {
        let candidate = store
            .upsert_candidate(CandidateCreate {
                name: "Asha Rao".to_string(),
                email: "asha@ex.com".to_string(),
                phone: None,
                skills: vec!["rust".to_string()],
                experience: None,
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
        store
            .upsert_match(MatchUpsert {
                candidate_id: candidate.id,
                role_id: role.id,
                match_score: 80,
                skill_match: SkillMatch::default(),
                explanation: explanation.to_string(),
                status: MatchStatus::Matched,
            })
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn regenerate_replaces_the_stored_explanation() {
        let store = Arc::new(MemStore::new());
        let match_id = seeded_match(&store, "terse").await;

        let engine = ExplanationEngine::new(store.clone(), Arc::new(ProseOracle));
        let explanation = engine.regenerate_match(match_id).await.unwrap();

        assert!(explanation.contains("core requirements"));
        assert_eq!(
            store.get_match(match_id).await.unwrap().explanation,
            explanation
        );
    }

    #[tokio::test]
    async fn batch_only_fills_empty_explanations() {
        let store = Arc::new(MemStore::new());
        let with_text = seeded_match(&store, "already explained").await;

        let engine = ExplanationEngine::new(store.clone(), Arc::new(ProseOracle));
        assert_eq!(engine.batch_generate(BatchTarget::Match).await.unwrap(), 0);
        assert_eq!(
            store.get_match(with_text).await.unwrap().explanation,
            "already explained"
        );
    }

    #[tokio::test]
    async fn batch_target_scopes_the_pass_to_one_collection() {
        let store = Arc::new(MemStore::new());
        let bare = seeded_match(&store, "").await;

        let engine = ExplanationEngine::new(store.clone(), Arc::new(ProseOracle));
        // An offer pass must not touch matches missing explanations.
        assert_eq!(engine.batch_generate(BatchTarget::Offer).await.unwrap(), 0);
        assert!(store.get_match(bare).await.unwrap().explanation.is_empty());

        assert_eq!(engine.batch_generate(BatchTarget::Match).await.unwrap(), 1);
        assert!(!store.get_match(bare).await.unwrap().explanation.is_empty());
    }

    #[tokio::test]
    async fn unknown_match_is_not_found() {
        let store = Arc::new(MemStore::new());
        let engine = ExplanationEngine::new(store, Arc::new(ProseOracle));
        assert!(matches!(
            engine.regenerate_match(Uuid::new_v4()).await,
            Err(AppError::NotFound(_))
        ));
    }
}
