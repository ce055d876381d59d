use crate::models::HealthResponse;
use crate::state::AppState;
use axum::{Json, extract::State};

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        message: "OK".into(),
        backends: state.dispatcher.backends(),
    })
}
