//! Клиент REST API бронирования: `GET {base_url}/rooms/{room_id}/seats`.
//!
//! Все сетевые вызовы идут через `CircuitBreaker`. Ответ `404` означает
//! несуществующий зал и сбоем для выключателя не считается.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

use super::{InventoryError, SeatInventory};
use crate::config::{CircuitBreakerConfig, InventoryConfig};
use crate::models::Seat;
use crate::services::circuit_breaker::{CircuitBreaker, CircuitBreakerError, CircuitState};

// API отдаёт либо голый список, либо обёртку `{ "data": [...] }`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum LayoutPayload {
    Bare(Vec<Seat>),
    Wrapped {
        #[serde(alias = "data")]
        seats: Vec<Seat>,
    },
}

impl LayoutPayload {
    fn into_seats(self) -> Vec<Seat> {
        match self {
            LayoutPayload::Bare(seats) | LayoutPayload::Wrapped { seats } => seats,
        }
    }
}

#[derive(Clone)]
pub struct HttpSeatInventory {
    base_url: String,
    http_client: reqwest::Client,
    circuit_breaker: Arc<CircuitBreaker>,
}

impl HttpSeatInventory {
    pub fn new(base_url: &str, timeout: Duration, circuit_breaker: CircuitBreaker) -> Result<Self, InventoryError> {
        let http_client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http_client,
            circuit_breaker: Arc::new(circuit_breaker),
        })
    }

    pub fn from_config(
        inventory: &InventoryConfig,
        breaker: &CircuitBreakerConfig,
    ) -> Result<Self, InventoryError> {
        Self::new(
            &inventory.base_url,
            Duration::from_secs(inventory.timeout_seconds),
            CircuitBreaker::new(breaker.failure_threshold, breaker.timeout_seconds),
        )
    }

    pub fn circuit_state(&self) -> CircuitState {
        self.circuit_breaker.state()
    }

    async fn fetch_layout(&self, url: &str) -> Result<Option<Vec<Seat>>, reqwest::Error> {
        let response = self.http_client.get(url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let payload = response.error_for_status()?.json::<LayoutPayload>().await?;
        Ok(Some(payload.into_seats()))
    }
}

#[async_trait]
impl SeatInventory for HttpSeatInventory {
    async fn room_layout(&self, room_id: i64) -> Result<Vec<Seat>, InventoryError> {
        let url = format!("{}/rooms/{}/seats", self.base_url, room_id);
        info!(room_id, state = ?self.circuit_breaker.state(), "Fetching room layout from booking API");

        match self.circuit_breaker.call(self.fetch_layout(&url)).await {
            Ok(Some(seats)) => Ok(seats),
            Ok(None) => Err(InventoryError::RoomNotFound(room_id)),
            Err(CircuitBreakerError::Open) => Err(InventoryError::Unavailable(
                "circuit breaker is open".to_string(),
            )),
            Err(CircuitBreakerError::Inner(e)) => {
                error!(room_id, error = %e, "Booking API request failed");
                Err(InventoryError::Gateway(e))
            }
        }
    }

    async fn health_check(&self) -> bool {
        self.circuit_breaker.state() != CircuitState::Open
    }
}
