use axum::Json;
use serde_json::{json, Value};

/// Liveness probe.
pub async fn health_handler() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "rolematch-api"
    }))
}
