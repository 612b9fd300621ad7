//! Matching engine: scores candidates against open roles.
//!
//! For each non-blacklisted (candidate, role) pair the engine retrieves
//! similar-role benchmarks and skill-mapping context from the vector
//! store, asks the oracle for a structured assessment, and upserts one
//! match record per pair. A failed pair is logged and skipped; it never
//! aborts the batch.

use std::collections::BTreeSet;
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

use crate::embedding::Embedder;
use crate::errors::AppError;
use crate::llm_client::{oracle_json, Oracle};
use crate::models::{Candidate, MatchRecord, MatchStatus, MatchUpsert, Role, SkillMatch};
use crate::store::{Store, StoreError};
use crate::vector::{VectorMatch, VectorStore, TYPE_ROLE_BENCHMARK, TYPE_SKILL_MAPPING};

pub mod blacklist;
pub mod handlers;
pub mod prompts;

/// Shape the match oracle must return.
#[derive(Debug, Deserialize)]
pub struct MatchAssessment {
    pub match_score: i32,
    #[serde(default)]
    pub skill_match: SkillMatch,
    pub explanation: String,
}

/// Resolves an optional id selection to records; unknown ids are logged
/// and skipped rather than failing the batch.
pub(crate) async fn select_candidates(
    store: &dyn Store,
    ids: Option<Vec<Uuid>>,
) -> Result<Vec<Candidate>, StoreError> {
    match ids {
        None => store.list_candidates().await,
        Some(ids) => {
            let mut selected = Vec::with_capacity(ids.len());
            for id in ids {
                match store.get_candidate(id).await {
                    Ok(candidate) => selected.push(candidate),
                    Err(StoreError::NotFound) => warn!(%id, "candidate not found, skipping"),
                    Err(e) => return Err(e),
                }
            }
            Ok(selected)
        }
    }
}

/// Same selection for roles; inactive roles are never matched.
pub(crate) async fn select_roles(
    store: &dyn Store,
    ids: Option<Vec<Uuid>>,
) -> Result<Vec<Role>, StoreError> {
    let roles = match ids {
        None => store.list_roles(false).await?,
        Some(ids) => {
            let mut selected = Vec::with_capacity(ids.len());
            for id in ids {
                match store.get_role(id).await {
                    Ok(role) => selected.push(role),
                    Err(StoreError::NotFound) => warn!(%id, "role not found, skipping"),
                    Err(e) => return Err(e),
                }
            }
            selected.into_iter().filter(|r| r.is_active).collect()
        }
    };
    Ok(roles)
}

pub struct MatchingEngine {
    store: Arc<dyn Store>,
    vectors: Arc<dyn VectorStore>,
    oracle: Arc<dyn Oracle>,
    embedder: Arc<dyn Embedder>,
    concurrency: usize,
}

impl MatchingEngine {
    pub fn new(
        store: Arc<dyn Store>,
        vectors: Arc<dyn VectorStore>,
        oracle: Arc<dyn Oracle>,
        embedder: Arc<dyn Embedder>,
        concurrency: usize,
    ) -> Self {
        Self {
            store,
            vectors,
            oracle,
            embedder,
            concurrency: concurrency.max(1),
        }
    }

    /// Matches the selected candidates against the selected active roles.
    /// Returns the records that were stored; blacklisted and failed pairs
    /// are absent from the result.
    pub async fn process(
        &self,
        candidate_ids: Option<Vec<Uuid>>,
        role_ids: Option<Vec<Uuid>>,
    ) -> Result<Vec<MatchRecord>, AppError> {
        let candidates = select_candidates(self.store.as_ref(), candidate_ids).await?;
        let roles = select_roles(self.store.as_ref(), role_ids).await?;
        info!(
            candidates = candidates.len(),
            roles = roles.len(),
            "matching candidates to roles"
        );

        let mut pairs = Vec::new();
        for candidate in &candidates {
            for role in &roles {
                if blacklist::should_blacklist(candidate, role) {
                    info!(
                        candidate = %candidate.name,
                        role = %role.title,
                        "skipping pair due to blacklist conditions"
                    );
                    continue;
                }
                pairs.push((candidate.clone(), role.clone()));
            }
        }

        let outcomes = stream::iter(pairs)
            .map(|(candidate, role)| async move {
                let outcome = self.match_pair(&candidate, &role).await;
                (candidate, role, outcome)
            })
            .buffer_unordered(self.concurrency)
            .collect::<Vec<_>>()
            .await;

        let mut records = Vec::new();
        for (candidate, role, outcome) in outcomes {
            match outcome {
                Ok(record) => records.push(record),
                Err(e) => warn!(
                    candidate = %candidate.name,
                    role = %role.title,
                    "match failed, skipping pair: {e}"
                ),
            }
        }
        Ok(records)
    }

    /// Scores one pair and upserts the match record.
    pub async fn match_pair(
        &self,
        candidate: &Candidate,
        role: &Role,
    ) -> Result<MatchRecord, AppError> {
        let benchmarks = self.role_benchmarks(role).await;
        let mappings = self.skill_mappings(role, candidate).await;

        let prompt = prompts::match_prompt(
            &candidate.profile_text(),
            &role.profile_text(),
            &benchmarks,
            &mappings,
        );
        let assessment: MatchAssessment =
            oracle_json(self.oracle.as_ref(), &prompt, prompts::MATCH_SYSTEM).await?;

        let score = assessment.match_score.clamp(0, 100);
        let record = self
            .store
            .upsert_match(MatchUpsert {
                candidate_id: candidate.id,
                role_id: role.id,
                match_score: score,
                skill_match: assessment.skill_match,
                explanation: assessment.explanation,
                status: MatchStatus::from_score(score),
            })
            .await?;
        info!(
            candidate = %candidate.name,
            role = %role.title,
            score,
            "stored match"
        );
        Ok(record)
    }

    /// Top 3 similar-role benchmarks as prompt context. Retrieval trouble
    /// degrades to a placeholder, never an error.
    async fn role_benchmarks(&self, role: &Role) -> String {
        let query = format!(
            "{} {} {}",
            role.title,
            role.department,
            role.required_skills.join(" ")
        );
        let embedding = self.embedder.embed(&query);
        match self
            .vectors
            .query(&embedding, 3, Some(TYPE_ROLE_BENCHMARK))
            .await
        {
            Ok(hits) if hits.is_empty() => "No similar role benchmarks found.".to_string(),
            Ok(hits) => hits.iter().map(format_benchmark).collect::<Vec<_>>().join("\n"),
            Err(e) => {
                warn!(role = %role.title, "benchmark retrieval failed: {e}");
                "Error retrieving role benchmarks.".to_string()
            }
        }
    }

    /// Top 5 skill mappings over the union of role and candidate skills.
    async fn skill_mappings(&self, role: &Role, candidate: &Candidate) -> String {
        let all_skills: BTreeSet<&str> = role
            .required_skills
            .iter()
            .chain(role.preferred_skills.as_deref().unwrap_or(&[]))
            .chain(candidate.skills.iter())
            .map(String::as_str)
            .collect();
        if all_skills.is_empty() {
            return "No skills to map.".to_string();
        }

        let query = format!(
            "skill mappings for {}",
            all_skills.into_iter().collect::<Vec<_>>().join(" ")
        );
        let embedding = self.embedder.embed(&query);
        match self
            .vectors
            .query(&embedding, 5, Some(TYPE_SKILL_MAPPING))
            .await
        {
            Ok(hits) if hits.is_empty() => "No skill mappings found.".to_string(),
            Ok(hits) => hits.iter().map(format_mapping).collect::<Vec<_>>().join("\n"),
            Err(e) => {
                warn!("skill mapping retrieval failed: {e}");
                "Error retrieving skill mappings.".to_string()
            }
        }
    }
}

fn meta_str<'a>(metadata: &'a Value, key: &str) -> &'a str {
    metadata
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or("Not specified")
}

fn meta_list(metadata: &Value, key: &str) -> String {
    metadata
        .get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        })
        .unwrap_or_default()
}

fn format_benchmark(hit: &VectorMatch) -> String {
    format!(
        "Similar Role: {}\nTypical Experience: {}\nKey Skills: {}\nTypical Salary Range: {}",
        meta_str(&hit.metadata, "title"),
        meta_str(&hit.metadata, "typical_experience"),
        meta_list(&hit.metadata, "key_skills"),
        meta_str(&hit.metadata, "salary_range"),
    )
}

fn format_mapping(hit: &VectorMatch) -> String {
    format!(
        "Skill: {}\nSimilar Skills: {}\nCategory: {}",
        meta_str(&hit.metadata, "skill"),
        meta_list(&hit.metadata, "similar_skills"),
        meta_str(&hit.metadata, "category"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::HashEmbedder;
    use crate::llm_client::LlmError;
    use crate::models::{CandidateCreate, MatchFilter, RoleCreate};
    use crate::store::MemStore;
    use crate::vector::MemVectorStore;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn candidate_input(name: &str, email: &str, experience: &str) -> CandidateCreate {
        CandidateCreate {
            name: name.to_string(),
            email: email.to_string(),
            phone: None,
            skills: vec!["rust".to_string(), "sql".to_string()],
            experience: Some(experience.to_string()),
            education: None,
            certifications: None,
            current_ctc: None,
            expected_ctc: None,
            notice_period: None,
            location: Some("Pune".to_string()),
            remote_preference: None,
            interview_scores: None,
            interview_feedback: None,
            preferences: None,
        }
    }

    fn role_input(title: &str) -> RoleCreate {
        RoleCreate {
            title: title.to_string(),
            department: "Platform".to_string(),
            description: None,
            required_skills: vec!["rust".to_string()],
            preferred_skills: None,
            experience_required: Some("2+ years".to_string()),
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

    /// Returns a fixed assessment and counts its invocations.
    struct ScoringStub {
        score: i32,
        calls: AtomicUsize,
    }

    impl ScoringStub {
        fn new(score: i32) -> Self {
            Self {
                score,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl Oracle for ScoringStub {
        async fn generate(&self, _prompt: &str, _system: &str) -> Result<String, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(format!(
                r#"{{"match_score": {}, "skill_match": {{"matched": ["rust"], "missing": []}}, "explanation": "Strong overlap."}}"#,
                self.score
            ))
        }
    }

    fn engine_with(store: Arc<MemStore>, oracle: Arc<dyn Oracle>) -> MatchingEngine {
        MatchingEngine::new(
            store,
            Arc::new(MemVectorStore::new()),
            oracle,
            Arc::new(HashEmbedder::new()),
            2,
        )
    }

    #[tokio::test]
    async fn high_score_is_stored_as_matched() {
        let store = Arc::new(MemStore::new());
        store
            .upsert_candidate(candidate_input("A", "a@ex.com", "4 years"))
            .await
            .unwrap();
        store.create_role(role_input("Backend Engineer")).await.unwrap();

        let engine = engine_with(store.clone(), Arc::new(ScoringStub::new(85)));
        let records = engine.process(None, None).await.unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].match_score, 85);
        assert_eq!(records[0].status, MatchStatus::Matched);
    }

    #[tokio::test]
    async fn low_score_needs_review() {
        let store = Arc::new(MemStore::new());
        store
            .upsert_candidate(candidate_input("A", "a@ex.com", "4 years"))
            .await
            .unwrap();
        store.create_role(role_input("Backend Engineer")).await.unwrap();

        let engine = engine_with(store.clone(), Arc::new(ScoringStub::new(55)));
        let records = engine.process(None, None).await.unwrap();
        assert_eq!(records[0].status, MatchStatus::ReviewNeeded);
    }

    #[tokio::test]
    async fn reprocessing_updates_the_same_record() {
        let store = Arc::new(MemStore::new());
        store
            .upsert_candidate(candidate_input("A", "a@ex.com", "4 years"))
            .await
            .unwrap();
        store.create_role(role_input("Backend Engineer")).await.unwrap();

        let first = engine_with(store.clone(), Arc::new(ScoringStub::new(85)))
            .process(None, None)
            .await
            .unwrap();
        let second = engine_with(store.clone(), Arc::new(ScoringStub::new(40)))
            .process(None, None)
            .await
            .unwrap();

        assert_eq!(first[0].id, second[0].id);
        assert_eq!(second[0].match_score, 40);
        assert_eq!(
            store.list_matches(&MatchFilter::default()).await.unwrap().len(),
            1
        );
    }

    #[tokio::test]
    async fn blacklisted_pairs_never_reach_the_oracle() {
        let store = Arc::new(MemStore::new());
        // 1 year of experience against a 2+ years requirement.
        store
            .upsert_candidate(candidate_input("Junior", "j@ex.com", "1 year"))
            .await
            .unwrap();
        store.create_role(role_input("Backend Engineer")).await.unwrap();

        let oracle = Arc::new(ScoringStub::new(90));
        let engine = engine_with(store.clone(), oracle.clone());
        let records = engine.process(None, None).await.unwrap();

        assert!(records.is_empty());
        assert_eq!(oracle.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn inactive_roles_are_excluded() {
        let store = Arc::new(MemStore::new());
        store
            .upsert_candidate(candidate_input("A", "a@ex.com", "4 years"))
            .await
            .unwrap();
        let role = store.create_role(role_input("Backend Engineer")).await.unwrap();
        store
            .update_role(
                role.id,
                crate::models::RoleUpdate {
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let engine = engine_with(store.clone(), Arc::new(ScoringStub::new(85)));
        assert!(engine.process(None, None).await.unwrap().is_empty());
    }

    /// Fails only for the named candidate; every other pair succeeds.
    struct SelectiveFailure {
        poison: String,
    }

    #[async_trait]
    impl Oracle for SelectiveFailure {
        async fn generate(&self, prompt: &str, _system: &str) -> Result<String, LlmError> {
            if prompt.contains(&self.poison) {
                return Err(LlmError::EmptyContent);
            }
            Ok(r#"{"match_score": 75, "skill_match": {"matched": [], "missing": []}, "explanation": "ok"}"#.to_string())
        }
    }

    #[tokio::test]
    async fn one_failed_pair_does_not_abort_the_batch() {
        let store = Arc::new(MemStore::new());
        for i in 0..5 {
            store
                .upsert_candidate(candidate_input(
                    &format!("Candidate {i}"),
                    &format!("c{i}@ex.com"),
                    "4 years",
                ))
                .await
                .unwrap();
        }
        store.create_role(role_input("Backend Engineer")).await.unwrap();

        let engine = engine_with(
            store.clone(),
            Arc::new(SelectiveFailure {
                poison: "Candidate 3".to_string(),
            }),
        );
        let records = engine.process(None, None).await.unwrap();

        assert_eq!(records.len(), 4);
        assert_eq!(
            store.list_matches(&MatchFilter::default()).await.unwrap().len(),
            4
        );
    }

    #[tokio::test]
    async fn out_of_range_scores_are_clamped() {
        let store = Arc::new(MemStore::new());
        store
            .upsert_candidate(candidate_input("A", "a@ex.com", "4 years"))
            .await
            .unwrap();
        store.create_role(role_input("Backend Engineer")).await.unwrap();

        let engine = engine_with(store.clone(), Arc::new(ScoringStub::new(140)));
        let records = engine.process(None, None).await.unwrap();
        assert_eq!(records[0].match_score, 100);
    }

    #[tokio::test]
    async fn benchmark_context_reflects_stored_vectors() {
        let store = Arc::new(MemStore::new());
        let vectors = Arc::new(MemVectorStore::new());
        let embedder = HashEmbedder::new();
        vectors
            .store(
                "bench_1",
                embedder.embed("Backend Engineer Platform rust"),
                serde_json::json!({
                    "type": "role_benchmark",
                    "title": "Backend Engineer",
                    "typical_experience": "3-5 years",
                    "key_skills": ["rust", "sql"],
                    "salary_range": "90k-120k"
                }),
            )
            .await
            .unwrap();

        let engine = MatchingEngine::new(
            store,
            vectors,
            Arc::new(ScoringStub::new(80)),
            Arc::new(HashEmbedder::new()),
            1,
        );
        let role = Role::from_create(role_input("Backend Engineer"));
        let context = engine.role_benchmarks(&role).await;
        assert!(context.contains("Similar Role: Backend Engineer"));
        assert!(context.contains("rust, sql"));
    }
}
