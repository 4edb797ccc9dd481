use axum::extract::State;
use axum::Json;

use crate::models::HealthResponse;
use crate::state::AppState;

/// GET /api/health - Liveness plus the size of the loaded index
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        chunks: state.index.len(),
        dimension: state.index.dimension(),
    })
}
