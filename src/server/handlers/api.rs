//! Service-level endpoints.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};

use super::super::AppState;

/// Health check endpoint for container orchestration.
pub async fn health() -> impl IntoResponse {
    StatusCode::OK
}

/// Liveness check for API clients, reporting whether the store answers.
pub async fn api_test(State(state): State<AppState>) -> impl IntoResponse {
    let store = match state.words.ping().await {
        Ok(()) => "available".to_string(),
        Err(e) => {
            tracing::warn!(error = %e, "Store check failed");
            "unavailable".to_string()
        }
    };

    Json(serde_json::json!({
        "status": "OK",
        "message": "API is working!",
        "store": store,
    }))
}
