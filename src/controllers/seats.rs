//! seats.rs
//!
//! Схема зала и проверка выбора без сохранения: по присланной схеме или по
//! актуальной схеме из источника мест.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

use crate::{errors::AppError, models::Seat, AppState};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/seats/validate", post(validate_layout))
        .route("/rooms/{room_id}/seats", get(get_room_seats))
        .route("/rooms/{room_id}/validate", post(validate_room))
        .route("/rooms/{room_id}/cache/invalidate", post(invalidate_room_cache))
}

pub(crate) fn ensure_room_id(room_id: i64) -> Result<(), AppError> {
    if room_id <= 0 {
        return Err(AppError::bad_request("room_id must be > 0"));
    }
    Ok(())
}

/* ---------- LAYOUT ---------- */

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RoomSeatsResponse {
    room_id: i64,
    seats: Vec<Seat>,
}

// GET /api/rooms/{room_id}/seats
async fn get_room_seats(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    ensure_room_id(room_id)?;

    let mut seats = state.selection.inventory().room_layout(room_id).await?;
    seats.sort_by(|a, b| a.row.cmp(&b.row).then(a.number.cmp(&b.number)));

    Ok(Json(RoomSeatsResponse { room_id, seats }))
}

// POST /api/rooms/{room_id}/cache/invalidate
async fn invalidate_room_cache(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    ensure_room_id(room_id)?;
    state.selection.inventory().invalidate(room_id).await;
    Ok(StatusCode::NO_CONTENT)
}

/* ---------- VALIDATION ---------- */

// POST /api/seats/validate
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct ValidateLayoutRequest {
    #[validate(length(max = 5000))]
    seats: Vec<Seat>,
    #[validate(length(max = 100))]
    selected_seat_ids: Vec<String>,
}

async fn validate_layout(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ValidateLayoutRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;
    let outcome = state.selection.validate(&req.seats, &req.selected_seat_ids);
    Ok(Json(outcome))
}

// POST /api/rooms/{room_id}/validate
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct ValidateRoomRequest {
    #[validate(length(max = 100))]
    selected_seat_ids: Vec<String>,
}

async fn validate_room(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<i64>,
    Json(req): Json<ValidateRoomRequest>,
) -> Result<impl IntoResponse, AppError> {
    ensure_room_id(room_id)?;
    req.validate()?;

    let outcome = state
        .selection
        .validate_room(room_id, &req.selected_seat_ids)
        .await?;
    Ok(Json(outcome))
}
