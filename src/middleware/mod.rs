use axum::{extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use crate::errors::AppError;

pub const BOOKING_SESSION_HEADER: &str = "x-booking-session";

/// Сессия бронирования из заголовка `X-Booking-Session`.
///
/// Сессию создаёт клиент при входе в выбор мест; аутентификация пользователя
/// остаётся на стороне сервиса бронирования.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookingSession(pub Uuid);

impl<S> FromRequestParts<S> for BookingSession
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(BOOKING_SESSION_HEADER)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::bad_request("X-Booking-Session header is required"))?;

        let session_id = Uuid::parse_str(raw.trim())
            .map_err(|_| AppError::bad_request("X-Booking-Session must be a UUID"))?;

        Ok(BookingSession(session_id))
    }
}
