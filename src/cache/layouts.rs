use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::room_layout_key;
use crate::models::Seat;
use crate::redis_client::CacheBackend;
use crate::services::inventory::{InventoryError, SeatInventory};
use crate::services::selection::StoreError;

/// Кеш схем залов в Redis поверх любого источника мест.
///
/// Redis здесь не обязателен: при его сбое запрос идёт напрямую в источник.
pub struct CachedSeatInventory {
    inner: Arc<dyn SeatInventory>,
    redis: Arc<dyn CacheBackend>,
    ttl_seconds: u64,
}

impl CachedSeatInventory {
    pub fn new(inner: Arc<dyn SeatInventory>, redis: Arc<dyn CacheBackend>, ttl_seconds: u64) -> Self {
        Self { inner, redis, ttl_seconds }
    }

    async fn get_from_cache(&self, room_id: i64) -> Result<Option<Vec<Seat>>, StoreError> {
        match self.redis.get(&room_layout_key(room_id)).await? {
            Some(data) => Ok(Some(serde_json::from_str(&data)?)),
            None => Ok(None),
        }
    }

    async fn save_to_cache(&self, room_id: i64, seats: &[Seat]) -> Result<(), StoreError> {
        let data = serde_json::to_string(seats)?;
        self.redis
            .set_ex(&room_layout_key(room_id), data, self.ttl_seconds)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl SeatInventory for CachedSeatInventory {
    async fn room_layout(&self, room_id: i64) -> Result<Vec<Seat>, InventoryError> {
        // Сначала пробуем кеш
        match self.get_from_cache(room_id).await {
            Ok(Some(seats)) => {
                debug!(room_id, "Room layout cache hit");
                return Ok(seats);
            }
            Ok(None) => debug!(room_id, "Room layout cache miss"),
            Err(e) => warn!(room_id, error = %e, "Room layout cache read failed"),
        }

        // Если в кеше нет - идем в источник
        let seats = self.inner.room_layout(room_id).await?;
        if let Err(e) = self.save_to_cache(room_id, &seats).await {
            warn!(room_id, error = %e, "Failed to cache room layout");
        }
        Ok(seats)
    }

    async fn invalidate(&self, room_id: i64) {
        match self.redis.del(&room_layout_key(room_id)).await {
            Ok(()) => info!(room_id, "Invalidated room layout cache"),
            Err(e) => warn!(room_id, error = %e, "Failed to invalidate room layout cache"),
        }
        self.inner.invalidate(room_id).await;
    }

    async fn health_check(&self) -> bool {
        self.redis.ping().await.is_ok() && self.inner.health_check().await
    }
}
