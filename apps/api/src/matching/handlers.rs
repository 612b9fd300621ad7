//! HTTP handlers for the matching pipeline.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{error, info};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{MatchFilter, MatchUpdate, MatchWithDetails};
use crate::state::AppState;

use super::blacklist::{self, BlacklistReport};
use crate::explain::BatchTarget;

/// Optional id selections for a processing run. An empty body matches
/// every candidate against every active role.
#[derive(Debug, Default, Deserialize)]
pub struct ProcessRequest {
    #[serde(default)]
    pub candidate_ids: Option<Vec<Uuid>>,
    #[serde(default)]
    pub role_ids: Option<Vec<Uuid>>,
}

/// `POST /api/v1/matches/process` - kick off a matching run in the
/// background and return immediately.
pub async fn handle_process(
    State(state): State<AppState>,
    body: Option<Json<ProcessRequest>>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let request = body.map(|Json(r)| r).unwrap_or_default();
    info!("match processing requested");

    tokio::spawn(async move {
        let engine = state.matching_engine();
        match engine.process(request.candidate_ids, request.role_ids).await {
            Ok(records) => info!(stored = records.len(), "match processing run complete"),
            Err(e) => error!("match processing run failed: {e}"),
        }
    });

    Ok((
        StatusCode::ACCEPTED,
        Json(json!({"message": "Match processing started"})),
    ))
}

/// `GET /api/v1/matches` - list match records, optionally filtered.
pub async fn handle_list(
    State(state): State<AppState>,
    Query(filter): Query<MatchFilter>,
) -> Result<Json<Value>, AppError> {
    let matches = state.store.list_matches(&filter).await?;
    Ok(Json(json!({"total": matches.len(), "matches": matches})))
}

/// `GET /api/v1/matches/:id` - one match with its candidate and role.
pub async fn handle_get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MatchWithDetails>, AppError> {
    let record = state.store.get_match(id).await?;
    let candidate = state.store.get_candidate(record.candidate_id).await?;
    let role = state.store.get_role(record.role_id).await?;
    Ok(Json(MatchWithDetails {
        record,
        candidate,
        role,
    }))
}

/// `PUT /api/v1/matches/:id` - partial update of a match record.
pub async fn handle_update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(patch): Json<MatchUpdate>,
) -> Result<Json<Value>, AppError> {
    let updated = state.store.update_match(id, patch).await?;
    Ok(Json(json!({"message": "Match updated", "match": updated})))
}

/// `POST /api/v1/matches/:id/regenerate-explanation` - synchronous; the
/// caller waits for the new text.
pub async fn handle_regenerate_explanation(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let explanation = state.explanation_engine().regenerate_match(id).await?;
    Ok(Json(json!({"match_id": id, "explanation": explanation})))
}

/// `POST /api/v1/matches/batch-explain` - fill in missing match
/// explanations in the background.
pub async fn handle_batch_explain(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    tokio::spawn(async move {
        match state.explanation_engine().batch_generate(BatchTarget::Match).await {
            Ok(generated) => info!(generated, "batch match explanation complete"),
            Err(e) => error!("batch match explanation failed: {e}"),
        }
    });
    Ok((
        StatusCode::ACCEPTED,
        Json(json!({"message": "Batch explanation started"})),
    ))
}

/// `DELETE /api/v1/matches/:id`
pub async fn handle_delete(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    state.store.delete_match(id).await?;
    Ok(Json(json!({"message": "Match deleted"})))
}

/// `POST /api/v1/matches/blacklist-check` - dry-run the oracle-backed
/// blacklist over a selection without storing anything.
pub async fn handle_blacklist_check(
    State(state): State<AppState>,
    body: Option<Json<ProcessRequest>>,
) -> Result<Json<Vec<BlacklistReport>>, AppError> {
    let request = body.map(|Json(r)| r).unwrap_or_default();
    let reports = blacklist::evaluate_batch(
        state.store.as_ref(),
        state.oracle.as_ref(),
        request.candidate_ids,
        request.role_ids,
    )
    .await?;
    Ok(Json(reports))
}
