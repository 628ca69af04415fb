//! Источник схемы зала (внешний сервис мест).
//!
//! Схема читается один раз на сессию бронирования и дальше используется
//! только для проверки выбора. Реальная блокировка мест происходит на сервере
//! бронирования, здесь её нет.

pub mod http;
pub mod postgres;

use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::models::Seat;

pub use http::HttpSeatInventory;
pub use postgres::PgSeatInventory;

#[derive(Debug, Error)]
pub enum InventoryError {
    #[error("room {0} not found")]
    RoomNotFound(i64),
    #[error("seat inventory unavailable: {0}")]
    Unavailable(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("seat inventory request failed: {0}")]
    Gateway(#[from] reqwest::Error),
}

#[async_trait]
pub trait SeatInventory: Send + Sync {
    /// Полная схема зала в произвольном порядке.
    async fn room_layout(&self, room_id: i64) -> Result<Vec<Seat>, InventoryError>;

    /// Сбросить закешированную схему зала. Без кеша ничего не делает.
    async fn invalidate(&self, _room_id: i64) {}

    /// Доступен ли источник (для `/ready`).
    async fn health_check(&self) -> bool {
        true
    }
}

/// Схемы залов в памяти: для тестов и локального запуска.
#[derive(Default)]
pub struct InMemorySeatInventory {
    rooms: RwLock<HashMap<i64, Vec<Seat>>>,
}

impl InMemorySeatInventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_room(room_id: i64, seats: Vec<Seat>) -> Self {
        Self {
            rooms: RwLock::new(HashMap::from([(room_id, seats)])),
        }
    }

    /// Заменяет схему зала целиком, например после продажи мест.
    pub async fn put_room(&self, room_id: i64, seats: Vec<Seat>) {
        self.rooms.write().await.insert(room_id, seats);
    }
}

#[async_trait]
impl SeatInventory for InMemorySeatInventory {
    async fn room_layout(&self, room_id: i64) -> Result<Vec<Seat>, InventoryError> {
        self.rooms
            .read()
            .await
            .get(&room_id)
            .cloned()
            .ok_or(InventoryError::RoomNotFound(room_id))
    }
}
