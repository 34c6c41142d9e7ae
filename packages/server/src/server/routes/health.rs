use axum::{extract::Extension, http::StatusCode, Json};
use serde::Serialize;

use crate::server::app::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    status: String,
    providers: usize,
    slots: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Health check endpoint
///
/// Returns 200 OK with directory counts when the data files load,
/// 503 Service Unavailable otherwise.
pub async fn health_handler(Extension(state): Extension<AppState>) -> (StatusCode, Json<HealthResponse>) {
    match state.intake.store().load().await {
        Ok(snapshot) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "healthy".to_string(),
                providers: snapshot.providers.len(),
                slots: snapshot.slots.len(),
                error: None,
            }),
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(HealthResponse {
                status: "unhealthy".to_string(),
                providers: 0,
                slots: 0,
                error: Some(e.to_string()),
            }),
        ),
    }
}
