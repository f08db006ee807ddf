// src/handlers/health.rs
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

/// GET /healthz
pub async fn health_check() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}
