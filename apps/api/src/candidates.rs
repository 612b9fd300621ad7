//! Candidate ingestion and CRUD. Ingestion is an upsert keyed by email,
//! and every write refreshes the candidate's self-vector so retrieval
//! stays in step with the profile. Vector trouble never fails the
//! request; the profile is the source of truth.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use tracing::warn;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{Candidate, CandidateCreate, CandidateUpdate};
use crate::state::AppState;
use crate::vector::TYPE_CANDIDATE;

fn vector_id(candidate_id: Uuid) -> String {
    format!("candidate_{candidate_id}")
}

async fn sync_vector(state: &AppState, candidate: &Candidate) {
    let embedding = state.embedder.embed(&candidate.embedding_text());
    let metadata = json!({
        "name": candidate.name,
        "skills": candidate.skills,
        "location": candidate.location,
        "type": TYPE_CANDIDATE,
    });
    if let Err(e) = state
        .vectors
        .store(&vector_id(candidate.id), embedding, metadata)
        .await
    {
        warn!(candidate_id = %candidate.id, "candidate vector sync failed: {e}");
    }
}

/// `POST /api/v1/candidates` - ingest a candidate. Re-ingesting the same
/// email refreshes the existing profile instead of creating a duplicate.
pub async fn handle_create(
    State(state): State<AppState>,
    Json(input): Json<CandidateCreate>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    if input.email.trim().is_empty() {
        return Err(AppError::Validation("email is required".to_string()));
    }
    let candidate = state.store.upsert_candidate(input).await?;
    sync_vector(&state, &candidate).await;
    Ok((
        StatusCode::CREATED,
        Json(json!({"message": "Candidate stored", "candidate": candidate})),
    ))
}

/// `GET /api/v1/candidates`
pub async fn handle_list(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let candidates = state.store.list_candidates().await?;
    Ok(Json(
        json!({"total": candidates.len(), "candidates": candidates}),
    ))
}

/// `GET /api/v1/candidates/:id`
pub async fn handle_get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Candidate>, AppError> {
    Ok(Json(state.store.get_candidate(id).await?))
}

/// `PUT /api/v1/candidates/:id`
pub async fn handle_update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(patch): Json<CandidateUpdate>,
) -> Result<Json<Value>, AppError> {
    let updated = state.store.update_candidate(id, patch).await?;
    sync_vector(&state, &updated).await;
    Ok(Json(
        json!({"message": "Candidate updated", "candidate": updated}),
    ))
}

/// `DELETE /api/v1/candidates/:id` - removes the profile and purges its
/// vector entry.
pub async fn handle_delete(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    state.store.delete_candidate(id).await?;
    if let Err(e) = state.vectors.delete(&vector_id(id)).await {
        warn!(candidate_id = %id, "candidate vector purge failed: {e}");
    }
    Ok(Json(json!({"message": "Candidate deleted"})))
}
