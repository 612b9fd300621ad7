pub mod health;

use axum::{
    routing::{delete, get, post, put},
    Router,
};

use crate::state::AppState;
use crate::{candidates, feedback, matching, offers, roles};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Candidates
        .route("/api/v1/candidates", post(candidates::handle_create))
        .route("/api/v1/candidates", get(candidates::handle_list))
        .route("/api/v1/candidates/:id", get(candidates::handle_get))
        .route("/api/v1/candidates/:id", put(candidates::handle_update))
        .route("/api/v1/candidates/:id", delete(candidates::handle_delete))
        // Roles
        .route("/api/v1/roles", post(roles::handle_create))
        .route("/api/v1/roles", get(roles::handle_list))
        .route("/api/v1/roles/:id", get(roles::handle_get))
        .route("/api/v1/roles/:id", put(roles::handle_update))
        .route("/api/v1/roles/:id", delete(roles::handle_delete))
        // Matching
        .route(
            "/api/v1/matches/process",
            post(matching::handlers::handle_process),
        )
        .route(
            "/api/v1/matches/blacklist-check",
            post(matching::handlers::handle_blacklist_check),
        )
        .route(
            "/api/v1/matches/batch-explain",
            post(matching::handlers::handle_batch_explain),
        )
        .route("/api/v1/matches", get(matching::handlers::handle_list))
        .route("/api/v1/matches/:id", get(matching::handlers::handle_get))
        .route("/api/v1/matches/:id", put(matching::handlers::handle_update))
        .route(
            "/api/v1/matches/:id",
            delete(matching::handlers::handle_delete),
        )
        .route(
            "/api/v1/matches/:id/regenerate-explanation",
            post(matching::handlers::handle_regenerate_explanation),
        )
        // Offers
        .route(
            "/api/v1/offers/generate",
            post(offers::handlers::handle_generate),
        )
        .route(
            "/api/v1/offers/batch-explain",
            post(offers::handlers::handle_batch_explain),
        )
        .route("/api/v1/offers", get(offers::handlers::handle_list))
        .route("/api/v1/offers/:id", get(offers::handlers::handle_get))
        .route("/api/v1/offers/:id", put(offers::handlers::handle_update))
        .route(
            "/api/v1/offers/:id",
            delete(offers::handlers::handle_delete),
        )
        .route(
            "/api/v1/offers/:id/approve",
            post(offers::handlers::handle_approve),
        )
        .route(
            "/api/v1/offers/:id/reject",
            post(offers::handlers::handle_reject),
        )
        .route(
            "/api/v1/offers/:id/regenerate-explanation",
            post(offers::handlers::handle_regenerate_explanation),
        )
        // Feedback
        .route("/api/v1/feedback", post(feedback::handlers::handle_submit))
        .route("/api/v1/feedback", get(feedback::handlers::handle_list))
        .route(
            "/api/v1/feedback/process-pending",
            post(feedback::handlers::handle_process_pending),
        )
        .route(
            "/api/v1/feedback/learnings",
            get(feedback::handlers::handle_learnings),
        )
        .with_state(state)
}
