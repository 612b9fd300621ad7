//! HTTP handlers for offer generation and HR review actions.

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
use crate::explain::BatchTarget;
use crate::models::{
    EntityKind, Feedback, FeedbackCreate, FeedbackType, OfferFilter, OfferStatus, OfferUpdate,
    OfferWithDetails,
};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct GenerateRequest {
    /// Explicit match ids bypass the score/status filter.
    #[serde(default)]
    pub match_ids: Option<Vec<Uuid>>,
}

/// `POST /api/v1/offers/generate` - generate offers in the background
/// for the selected matches, or every qualifying match when unselected.
pub async fn handle_generate(
    State(state): State<AppState>,
    body: Option<Json<GenerateRequest>>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let request = body.map(|Json(r)| r).unwrap_or_default();
    info!("offer generation requested");

    tokio::spawn(async move {
        let engine = state.offer_engine();
        match engine.generate(request.match_ids).await {
            Ok(offers) => info!(stored = offers.len(), "offer generation run complete"),
            Err(e) => error!("offer generation run failed: {e}"),
        }
    });

    Ok((
        StatusCode::ACCEPTED,
        Json(json!({"message": "Offer generation started"})),
    ))
}

/// `GET /api/v1/offers`
pub async fn handle_list(
    State(state): State<AppState>,
    Query(filter): Query<OfferFilter>,
) -> Result<Json<Value>, AppError> {
    let offers = state.store.list_offers(&filter).await?;
    Ok(Json(json!({"total": offers.len(), "offers": offers})))
}

/// `GET /api/v1/offers/:id` - one offer with its candidate and role.
pub async fn handle_get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<OfferWithDetails>, AppError> {
    let record = state.store.get_offer(id).await?;
    let candidate = state.store.get_candidate(record.candidate_id).await?;
    let role = state.store.get_role(record.role_id).await?;
    Ok(Json(OfferWithDetails {
        record,
        candidate,
        role,
    }))
}

/// `PUT /api/v1/offers/:id` - editing the package of a pending offer
/// moves it to Modified unless the patch sets a status itself.
pub async fn handle_update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(mut patch): Json<OfferUpdate>,
) -> Result<Json<Value>, AppError> {
    if patch.offer.is_some() && patch.status.is_none() {
        let current = state.store.get_offer(id).await?;
        if current.status == OfferStatus::PendingApproval {
            patch.status = Some(OfferStatus::Modified);
        }
    }
    let updated = state.store.update_offer(id, patch).await?;
    Ok(Json(json!({"message": "Offer updated", "offer": updated})))
}

#[derive(Debug, Default, Deserialize)]
pub struct ReviewParams {
    pub comments: Option<String>,
}

/// `POST /api/v1/offers/:id/approve` - set the offer to Approved and
/// record the decision as feedback so the learning loop sees it.
pub async fn handle_approve(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<ReviewParams>,
) -> Result<Json<Value>, AppError> {
    let comments = params
        .comments
        .unwrap_or_else(|| "Offer approved by HR".to_string());
    let updated = review(state, id, OfferStatus::Approved, FeedbackType::Approval, comments).await?;
    Ok(Json(json!({"message": "Offer approved", "offer": updated})))
}

/// `POST /api/v1/offers/:id/reject`
pub async fn handle_reject(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<ReviewParams>,
) -> Result<Json<Value>, AppError> {
    let comments = params
        .comments
        .unwrap_or_else(|| "Offer rejected by HR".to_string());
    let updated = review(state, id, OfferStatus::Rejected, FeedbackType::Rejection, comments).await?;
    Ok(Json(json!({"message": "Offer rejected", "offer": updated})))
}

/// Shared approve/reject flow: transition the offer synchronously, then
/// hand the recorded feedback to the processor for analysis.
async fn review(
    state: AppState,
    offer_id: Uuid,
    status: OfferStatus,
    feedback_type: FeedbackType,
    comments: String,
) -> Result<crate::models::OfferRecord, AppError> {
    let updated = state
        .store
        .update_offer(
            offer_id,
            OfferUpdate {
                status: Some(status),
                ..Default::default()
            },
        )
        .await?;

    let feedback = Feedback::from_create(FeedbackCreate {
        entity_type: EntityKind::Offer,
        entity_id: offer_id,
        feedback_type,
        comments: Some(comments),
        modifications: None,
    });
    let feedback_id = feedback.id;
    state.store.insert_feedback(feedback).await?;

    tokio::spawn(async move {
        if let Err(e) = state.feedback_processor().process(feedback_id).await {
            error!(%feedback_id, "offer review feedback processing failed: {e}");
        }
    });

    Ok(updated)
}

/// `POST /api/v1/offers/:id/regenerate-explanation`
pub async fn handle_regenerate_explanation(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let explanation = state.explanation_engine().regenerate_offer(id).await?;
    Ok(Json(json!({"offer_id": id, "explanation": explanation})))
}

/// `POST /api/v1/offers/batch-explain`
pub async fn handle_batch_explain(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    tokio::spawn(async move {
        match state.explanation_engine().batch_generate(BatchTarget::Offer).await {
            Ok(generated) => info!(generated, "batch offer explanation complete"),
            Err(e) => error!("batch offer explanation failed: {e}"),
        }
    });
    Ok((
        StatusCode::ACCEPTED,
        Json(json!({"message": "Batch explanation started"})),
    ))
}

/// `DELETE /api/v1/offers/:id`
pub async fn handle_delete(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    state.store.delete_offer(id).await?;
    Ok(Json(json!({"message": "Offer deleted"})))
}
