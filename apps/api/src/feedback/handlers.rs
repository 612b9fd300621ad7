//! HTTP handlers for feedback submission and the knowledge log.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{error, info};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{EntityKind, Feedback, FeedbackCreate, FeedbackType};
use crate::state::AppState;
use crate::store::StoreError;

/// `POST /api/v1/feedback` - record a human decision and analyze it in
/// the background. The target entity must exist.
pub async fn handle_submit(
    State(state): State<AppState>,
    Json(input): Json<FeedbackCreate>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    if input.feedback_type == FeedbackType::Modification
        && input.modifications.as_ref().map_or(true, |m| m.is_empty())
    {
        return Err(AppError::Validation(
            "Modification feedback requires a non-empty modifications object".to_string(),
        ));
    }
    ensure_entity_exists(&state, input.entity_type, input.entity_id).await?;

    let record = Feedback::from_create(input);
    let feedback_id = record.id;
    state.store.insert_feedback(record).await?;
    info!(%feedback_id, "feedback submitted");

    tokio::spawn(async move {
        if let Err(e) = state.feedback_processor().process(feedback_id).await {
            error!(%feedback_id, "feedback processing failed: {e}");
        }
    });

    Ok((
        StatusCode::ACCEPTED,
        Json(json!({"message": "Feedback submitted", "feedback_id": feedback_id})),
    ))
}

async fn ensure_entity_exists(
    state: &AppState,
    kind: EntityKind,
    entity_id: Uuid,
) -> Result<(), AppError> {
    let found = match kind {
        EntityKind::Match => state.store.get_match(entity_id).await.map(|_| ()),
        EntityKind::Offer => state.store.get_offer(entity_id).await.map(|_| ()),
    };
    match found {
        Ok(()) => Ok(()),
        Err(StoreError::NotFound) => Err(AppError::NotFound(format!(
            "{} {entity_id} not found",
            kind.as_str()
        ))),
        Err(e) => Err(e.into()),
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct FeedbackListParams {
    pub entity_id: Option<Uuid>,
}

/// `GET /api/v1/feedback`
pub async fn handle_list(
    State(state): State<AppState>,
    Query(params): Query<FeedbackListParams>,
) -> Result<Json<Value>, AppError> {
    let feedback = state.store.list_feedback(params.entity_id).await?;
    Ok(Json(json!({"total": feedback.len(), "feedback": feedback})))
}

/// `POST /api/v1/feedback/process-pending` - sweep every event still
/// lacking analysis. Synchronous so callers see the count.
pub async fn handle_process_pending(
    State(state): State<AppState>,
) -> Result<Json<Value>, AppError> {
    let processed = state.feedback_processor().process_pending().await?;
    Ok(Json(json!({"processed": processed})))
}

#[derive(Debug, Deserialize)]
pub struct LearningsParams {
    #[serde(default = "default_learnings_limit")]
    pub limit: usize,
}

fn default_learnings_limit() -> usize {
    50
}

/// `GET /api/v1/feedback/learnings` - newest entries from the
/// append-only knowledge log.
pub async fn handle_learnings(
    State(state): State<AppState>,
    Query(params): Query<LearningsParams>,
) -> Result<Json<Value>, AppError> {
    let learnings = state.store.list_learnings(params.limit).await?;
    Ok(Json(json!({"total": learnings.len(), "learnings": learnings})))
}
