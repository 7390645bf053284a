use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde_json::json;

use crate::api::envelope;
use crate::database::EntityKind;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

/// GET /
pub async fn root() -> ApiResult<serde_json::Value> {
    let resources: Vec<String> = EntityKind::ALL
        .iter()
        .filter(|kind| **kind != EntityKind::User)
        .map(|kind| format!("{}[/:id] (session)", kind.path()))
        .collect();

    Ok(ApiResponse::success(json!({
        "name": "Tally API",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Session-authenticated record keeping backend",
        "endpoints": {
            "home": "/ (public)",
            "health": "/health (public)",
            "auth": "/auth/join, /auth/login (public); /auth/me, /auth/logout (session)",
            "resources": resources,
        }
    })))
}

/// GET /health
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.store.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(envelope::success(json!({
                "status": "ok",
                "timestamp": now,
                "store": "ok"
            }))),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            let mut body = envelope::failure("store unavailable");
            body["data"] = json!({
                "status": "degraded",
                "timestamp": now,
                "store": "unavailable"
            });
            (StatusCode::SERVICE_UNAVAILABLE, Json(body))
        }
    }
}
