use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use std::sync::Arc;

use crate::AppState;

#[derive(Debug, Serialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    pub inventory: bool,
    pub selection_store: bool,
}

// GET /ready
pub async fn readiness(State(state): State<Arc<AppState>>) -> (StatusCode, Json<ReadinessResponse>) {
    let (inventory, selection_store) = tokio::join!(
        state.selection.inventory().health_check(),
        state.selection.store().health_check(),
    );

    let ready = inventory && selection_store;
    if !ready {
        tracing::warn!(inventory, selection_store, "Service is not ready");
    }

    let status = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status, Json(ReadinessResponse { ready, inventory, selection_store }))
}
