//! Role CRUD. Roles are soft-deleted by default so historical matches
//! keep resolving; a hard delete also purges the role's vector entry.
//! Embeddings are refreshed only when a patch touches embedded fields.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::warn;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{Role, RoleCreate, RoleUpdate};
use crate::state::AppState;
use crate::vector::TYPE_ROLE;

fn vector_id(role_id: Uuid) -> String {
    format!("role_{role_id}")
}

async fn sync_vector(state: &AppState, role: &Role) {
    let embedding = state.embedder.embed(&role.embedding_text());
    let metadata = json!({
        "title": role.title,
        "department": role.department,
        "required_skills": role.required_skills,
        "preferred_skills": role.preferred_skills,
        "type": TYPE_ROLE,
    });
    if let Err(e) = state
        .vectors
        .store(&vector_id(role.id), embedding, metadata)
        .await
    {
        warn!(role_id = %role.id, "role vector sync failed: {e}");
    }
}

/// `POST /api/v1/roles`
pub async fn handle_create(
    State(state): State<AppState>,
    Json(input): Json<RoleCreate>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    if input.title.trim().is_empty() {
        return Err(AppError::Validation("title is required".to_string()));
    }
    let role = state.store.create_role(input).await?;
    sync_vector(&state, &role).await;
    Ok((
        StatusCode::CREATED,
        Json(json!({"message": "Role created", "role": role})),
    ))
}

#[derive(Debug, Deserialize)]
pub struct RoleListParams {
    /// Soft-deleted roles are hidden unless this is set to false.
    #[serde(default = "default_active_only")]
    pub active_only: bool,
}

fn default_active_only() -> bool {
    true
}

impl Default for RoleListParams {
    fn default() -> Self {
        Self {
            active_only: default_active_only(),
        }
    }
}

/// `GET /api/v1/roles`
pub async fn handle_list(
    State(state): State<AppState>,
    Query(params): Query<RoleListParams>,
) -> Result<Json<Value>, AppError> {
    let roles = state.store.list_roles(!params.active_only).await?;
    Ok(Json(json!({"total": roles.len(), "roles": roles})))
}

/// `GET /api/v1/roles/:id`
pub async fn handle_get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Role>, AppError> {
    Ok(Json(state.store.get_role(id).await?))
}

/// `PUT /api/v1/roles/:id`
pub async fn handle_update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(patch): Json<RoleUpdate>,
) -> Result<Json<Value>, AppError> {
    let reembed = Role::update_touches_embedding(&patch);
    let updated = state.store.update_role(id, patch).await?;
    if reembed {
        sync_vector(&state, &updated).await;
    }
    Ok(Json(json!({"message": "Role updated", "role": updated})))
}

#[derive(Debug, Default, Deserialize)]
pub struct RoleDeleteParams {
    #[serde(default)]
    pub hard: bool,
}

/// `DELETE /api/v1/roles/:id` - soft delete by default; `?hard=true`
/// removes the record and its vector entry.
pub async fn handle_delete(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<RoleDeleteParams>,
) -> Result<Json<Value>, AppError> {
    if params.hard {
        state.store.delete_role(id).await?;
        if let Err(e) = state.vectors.delete(&vector_id(id)).await {
            warn!(role_id = %id, "role vector purge failed: {e}");
        }
        return Ok(Json(json!({"message": "Role deleted"})));
    }

    state
        .store
        .update_role(
            id,
            RoleUpdate {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await?;
    Ok(Json(json!({"message": "Role deactivated"})))
}
