//! Postgres `Store` backend.
//!
//! Records are stored as JSONB documents alongside the key columns the
//! constraints live on: `UNIQUE (email)` for candidates and
//! `UNIQUE (candidate_id, role_id)` for matches and offers, so the
//! idempotency guarantees hold even under concurrent writers. Filtering
//! happens in Rust through the same predicates the in-memory backend
//! uses, which keeps the two backends behaviorally identical.

use async_trait::async_trait;
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::models::{
    Candidate, CandidateCreate, CandidateUpdate, Feedback, LearningEntry, MatchFilter, MatchRecord,
    MatchUpdate, MatchUpsert, OfferFilter, OfferRecord, OfferUpdate, OfferUpsert, Role, RoleCreate,
    RoleUpdate,
};

use super::{Store, StoreError};

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS candidates (
        id UUID PRIMARY KEY,
        email TEXT NOT NULL UNIQUE,
        doc JSONB NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS roles (
        id UUID PRIMARY KEY,
        doc JSONB NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS matches (
        id UUID PRIMARY KEY,
        candidate_id UUID NOT NULL,
        role_id UUID NOT NULL,
        doc JSONB NOT NULL,
        UNIQUE (candidate_id, role_id)
    )",
    "CREATE TABLE IF NOT EXISTS offers (
        id UUID PRIMARY KEY,
        candidate_id UUID NOT NULL,
        role_id UUID NOT NULL,
        doc JSONB NOT NULL,
        UNIQUE (candidate_id, role_id)
    )",
    "CREATE TABLE IF NOT EXISTS feedback (
        id UUID PRIMARY KEY,
        entity_id UUID NOT NULL,
        doc JSONB NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS learnings (
        seq BIGSERIAL PRIMARY KEY,
        doc JSONB NOT NULL
    )",
];

pub async fn create_pool(database_url: &str) -> Result<PgPool, StoreError> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;
    Ok(pool)
}

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates the tables if they do not exist. Run once at startup.
    pub async fn init_schema(&self) -> Result<(), StoreError> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        info!("database schema ready");
        Ok(())
    }
}

fn decode<T: DeserializeOwned>(doc: Value) -> Result<T, StoreError> {
    Ok(serde_json::from_value(doc)?)
}

fn encode<T: serde::Serialize>(record: &T) -> Result<Value, StoreError> {
    Ok(serde_json::to_value(record)?)
}

fn map_unique_violation(err: sqlx::Error, message: String) -> StoreError {
    if let sqlx::Error::Database(ref db) = err {
        if db.code().as_deref() == Some("23505") {
            return StoreError::Duplicate(message);
        }
    }
    StoreError::Database(err)
}

#[async_trait]
impl Store for PgStore {
    async fn upsert_candidate(&self, input: CandidateCreate) -> Result<Candidate, StoreError> {
        let existing: Option<Value> =
            sqlx::query_scalar("SELECT doc FROM candidates WHERE email = $1")
                .bind(&input.email)
                .fetch_optional(&self.pool)
                .await?;

        if let Some(doc) = existing {
            let mut candidate: Candidate = decode(doc)?;
            candidate.refresh(input);
            sqlx::query("UPDATE candidates SET doc = $2 WHERE id = $1")
                .bind(candidate.id)
                .bind(encode(&candidate)?)
                .execute(&self.pool)
                .await?;
            return Ok(candidate);
        }

        let candidate = Candidate::from_create(input);
        sqlx::query("INSERT INTO candidates (id, email, doc) VALUES ($1, $2, $3)")
            .bind(candidate.id)
            .bind(&candidate.email)
            .bind(encode(&candidate)?)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                map_unique_violation(
                    e,
                    format!("candidate with email '{}' already exists", candidate.email),
                )
            })?;
        Ok(candidate)
    }

    async fn get_candidate(&self, id: Uuid) -> Result<Candidate, StoreError> {
        let doc: Option<Value> = sqlx::query_scalar("SELECT doc FROM candidates WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        decode(doc.ok_or(StoreError::NotFound)?)
    }

    async fn list_candidates(&self) -> Result<Vec<Candidate>, StoreError> {
        let docs: Vec<Value> = sqlx::query_scalar("SELECT doc FROM candidates")
            .fetch_all(&self.pool)
            .await?;
        let mut all = docs
            .into_iter()
            .map(decode)
            .collect::<Result<Vec<Candidate>, _>>()?;
        all.sort_by_key(|c| c.created_at);
        Ok(all)
    }

    async fn update_candidate(
        &self,
        id: Uuid,
        patch: CandidateUpdate,
    ) -> Result<Candidate, StoreError> {
        let mut candidate = self.get_candidate(id).await?;
        candidate.apply_update(patch);
        sqlx::query("UPDATE candidates SET email = $2, doc = $3 WHERE id = $1")
            .bind(id)
            .bind(&candidate.email)
            .bind(encode(&candidate)?)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                map_unique_violation(
                    e,
                    format!("candidate with email '{}' already exists", candidate.email),
                )
            })?;
        Ok(candidate)
    }

    async fn delete_candidate(&self, id: Uuid) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM candidates WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn create_role(&self, input: RoleCreate) -> Result<Role, StoreError> {
        let role = Role::from_create(input);
        sqlx::query("INSERT INTO roles (id, doc) VALUES ($1, $2)")
            .bind(role.id)
            .bind(encode(&role)?)
            .execute(&self.pool)
            .await?;
        Ok(role)
    }

    async fn get_role(&self, id: Uuid) -> Result<Role, StoreError> {
        let doc: Option<Value> = sqlx::query_scalar("SELECT doc FROM roles WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        decode(doc.ok_or(StoreError::NotFound)?)
    }

    async fn list_roles(&self, include_inactive: bool) -> Result<Vec<Role>, StoreError> {
        let docs: Vec<Value> = sqlx::query_scalar("SELECT doc FROM roles")
            .fetch_all(&self.pool)
            .await?;
        let mut all = docs
            .into_iter()
            .map(decode)
            .collect::<Result<Vec<Role>, _>>()?;
        all.retain(|r| include_inactive || r.is_active);
        all.sort_by_key(|r| r.created_at);
        Ok(all)
    }

    async fn update_role(&self, id: Uuid, patch: RoleUpdate) -> Result<Role, StoreError> {
        let mut role = self.get_role(id).await?;
        role.apply_update(patch);
        sqlx::query("UPDATE roles SET doc = $2 WHERE id = $1")
            .bind(id)
            .bind(encode(&role)?)
            .execute(&self.pool)
            .await?;
        Ok(role)
    }

    async fn delete_role(&self, id: Uuid) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM roles WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn upsert_match(&self, input: MatchUpsert) -> Result<MatchRecord, StoreError> {
        let existing: Option<Value> = sqlx::query_scalar(
            "SELECT doc FROM matches WHERE candidate_id = $1 AND role_id = $2",
        )
        .bind(input.candidate_id)
        .bind(input.role_id)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(doc) = existing {
            let mut record: MatchRecord = decode(doc)?;
            record.match_score = input.match_score;
            record.skill_match = input.skill_match;
            record.explanation = input.explanation;
            record.status = input.status;
            record.updated_at = Utc::now();
            sqlx::query("UPDATE matches SET doc = $2 WHERE id = $1")
                .bind(record.id)
                .bind(encode(&record)?)
                .execute(&self.pool)
                .await?;
            return Ok(record);
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
        sqlx::query("INSERT INTO matches (id, candidate_id, role_id, doc) VALUES ($1, $2, $3, $4)")
            .bind(record.id)
            .bind(record.candidate_id)
            .bind(record.role_id)
            .bind(encode(&record)?)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                map_unique_violation(e, "match for this candidate and role already exists".into())
            })?;
        Ok(record)
    }

    async fn get_match(&self, id: Uuid) -> Result<MatchRecord, StoreError> {
        let doc: Option<Value> = sqlx::query_scalar("SELECT doc FROM matches WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        decode(doc.ok_or(StoreError::NotFound)?)
    }

    async fn list_matches(&self, filter: &MatchFilter) -> Result<Vec<MatchRecord>, StoreError> {
        let docs: Vec<Value> = sqlx::query_scalar("SELECT doc FROM matches")
            .fetch_all(&self.pool)
            .await?;
        let mut all = docs
            .into_iter()
            .map(decode)
            .collect::<Result<Vec<MatchRecord>, _>>()?;
        all.retain(|m| filter.accepts(m));
        all.sort_by_key(|m| m.created_at);
        Ok(all)
    }

    async fn update_match(&self, id: Uuid, patch: MatchUpdate) -> Result<MatchRecord, StoreError> {
        let mut record = self.get_match(id).await?;
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
        self.put_match(record.clone()).await?;
        Ok(record)
    }

    async fn put_match(&self, record: MatchRecord) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE matches SET doc = $2 WHERE id = $1")
            .bind(record.id)
            .bind(encode(&record)?)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn delete_match(&self, id: Uuid) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM matches WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn upsert_offer(&self, input: OfferUpsert) -> Result<OfferRecord, StoreError> {
        let existing: Option<Value> = sqlx::query_scalar(
            "SELECT doc FROM offers WHERE candidate_id = $1 AND role_id = $2",
        )
        .bind(input.candidate_id)
        .bind(input.role_id)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(doc) = existing {
            let mut record: OfferRecord = decode(doc)?;
            record.match_id = input.match_id;
            record.match_score = input.match_score;
            record.offer = input.offer;
            record.explanation = input.explanation;
            record.status = input.status;
            record.updated_at = Utc::now();
            sqlx::query("UPDATE offers SET doc = $2 WHERE id = $1")
                .bind(record.id)
                .bind(encode(&record)?)
                .execute(&self.pool)
                .await?;
            return Ok(record);
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
        sqlx::query("INSERT INTO offers (id, candidate_id, role_id, doc) VALUES ($1, $2, $3, $4)")
            .bind(record.id)
            .bind(record.candidate_id)
            .bind(record.role_id)
            .bind(encode(&record)?)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                map_unique_violation(e, "offer for this candidate and role already exists".into())
            })?;
        Ok(record)
    }

    async fn get_offer(&self, id: Uuid) -> Result<OfferRecord, StoreError> {
        let doc: Option<Value> = sqlx::query_scalar("SELECT doc FROM offers WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        decode(doc.ok_or(StoreError::NotFound)?)
    }

    async fn list_offers(&self, filter: &OfferFilter) -> Result<Vec<OfferRecord>, StoreError> {
        let docs: Vec<Value> = sqlx::query_scalar("SELECT doc FROM offers")
            .fetch_all(&self.pool)
            .await?;
        let mut all = docs
            .into_iter()
            .map(decode)
            .collect::<Result<Vec<OfferRecord>, _>>()?;
        all.retain(|o| filter.accepts(o));
        all.sort_by_key(|o| o.created_at);
        Ok(all)
    }

    async fn update_offer(&self, id: Uuid, patch: OfferUpdate) -> Result<OfferRecord, StoreError> {
        let mut record = self.get_offer(id).await?;
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
        self.put_offer(record.clone()).await?;
        Ok(record)
    }

    async fn put_offer(&self, record: OfferRecord) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE offers SET doc = $2 WHERE id = $1")
            .bind(record.id)
            .bind(encode(&record)?)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn delete_offer(&self, id: Uuid) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM offers WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn insert_feedback(&self, record: Feedback) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO feedback (id, entity_id, doc) VALUES ($1, $2, $3)")
            .bind(record.id)
            .bind(record.entity_id)
            .bind(encode(&record)?)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get_feedback(&self, id: Uuid) -> Result<Feedback, StoreError> {
        let doc: Option<Value> = sqlx::query_scalar("SELECT doc FROM feedback WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        decode(doc.ok_or(StoreError::NotFound)?)
    }

    async fn list_feedback(&self, entity_id: Option<Uuid>) -> Result<Vec<Feedback>, StoreError> {
        let docs: Vec<Value> = match entity_id {
            Some(id) => {
                sqlx::query_scalar("SELECT doc FROM feedback WHERE entity_id = $1")
                    .bind(id)
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                sqlx::query_scalar("SELECT doc FROM feedback")
                    .fetch_all(&self.pool)
                    .await?
            }
        };
        let mut all = docs
            .into_iter()
            .map(decode)
            .collect::<Result<Vec<Feedback>, _>>()?;
        all.sort_by_key(|f| f.created_at);
        Ok(all)
    }

    async fn list_unanalyzed_feedback(&self) -> Result<Vec<Feedback>, StoreError> {
        let mut all = self.list_feedback(None).await?;
        all.retain(|f| f.analysis.is_none());
        Ok(all)
    }

    async fn put_feedback(&self, record: Feedback) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE feedback SET doc = $2 WHERE id = $1")
            .bind(record.id)
            .bind(encode(&record)?)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn append_learning(&self, entry: LearningEntry) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO learnings (doc) VALUES ($1)")
            .bind(encode(&entry)?)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn list_learnings(&self, limit: usize) -> Result<Vec<LearningEntry>, StoreError> {
        let docs: Vec<Value> =
            sqlx::query_scalar("SELECT doc FROM learnings ORDER BY seq DESC LIMIT $1")
                .bind(limit as i64)
                .fetch_all(&self.pool)
                .await?;
        docs.into_iter().map(decode).collect()
    }
}
