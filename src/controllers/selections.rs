use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch},
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

use super::seats::ensure_room_id;
use crate::{errors::AppError, middleware::BookingSession, AppState};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/rooms/{room_id}/selection", get(get_selection).delete(clear_selection))
        .route("/rooms/{room_id}/selection/select", patch(select_seat))
        .route("/rooms/{room_id}/selection/release", patch(release_seat))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct SeatActionRequest {
    #[validate(length(min = 1, max = 64))]
    seat_id: String,
}

// GET /api/rooms/{room_id}/selection
async fn get_selection(
    State(state): State<Arc<AppState>>,
    BookingSession(session_id): BookingSession,
    Path(room_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    ensure_room_id(room_id)?;
    let view = state.selection.current(session_id, room_id).await?;
    Ok(Json(view))
}

// PATCH /api/rooms/{room_id}/selection/select
//
// Нарушение правила одиночных мест возвращается как 200 с isValid=false.
async fn select_seat(
    State(state): State<Arc<AppState>>,
    BookingSession(session_id): BookingSession,
    Path(room_id): Path<i64>,
    Json(req): Json<SeatActionRequest>,
) -> Result<impl IntoResponse, AppError> {
    ensure_room_id(room_id)?;
    req.validate()?;

    let view = state
        .selection
        .select_seat(session_id, room_id, &req.seat_id)
        .await?;
    Ok(Json(view))
}

// PATCH /api/rooms/{room_id}/selection/release
async fn release_seat(
    State(state): State<Arc<AppState>>,
    BookingSession(session_id): BookingSession,
    Path(room_id): Path<i64>,
    Json(req): Json<SeatActionRequest>,
) -> Result<impl IntoResponse, AppError> {
    ensure_room_id(room_id)?;
    req.validate()?;

    let view = state
        .selection
        .release_seat(session_id, room_id, &req.seat_id)
        .await?;
    Ok(Json(view))
}

// DELETE /api/rooms/{room_id}/selection
async fn clear_selection(
    State(state): State<Arc<AppState>>,
    BookingSession(session_id): BookingSession,
    Path(room_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    ensure_room_id(room_id)?;
    state.selection.clear(session_id, room_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
