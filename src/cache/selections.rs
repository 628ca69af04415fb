use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use super::selection_key;
use crate::redis_client::CacheBackend;
use crate::services::selection::{SelectionStore, StoreError};

/// Выбор мест сессии в Redis. Ключ живёт `ttl_seconds` с последнего
/// изменения, брошенные сессии исчезают сами.
#[derive(Clone)]
pub struct RedisSelectionStore {
    redis: Arc<dyn CacheBackend>,
    ttl_seconds: u64,
}

impl RedisSelectionStore {
    pub fn new(redis: Arc<dyn CacheBackend>, ttl_seconds: u64) -> Self {
        Self { redis, ttl_seconds }
    }
}

#[async_trait]
impl SelectionStore for RedisSelectionStore {
    async fn get(&self, session_id: Uuid, room_id: i64) -> Result<Vec<String>, StoreError> {
        match self.redis.get(&selection_key(session_id, room_id)).await? {
            Some(data) => Ok(serde_json::from_str(&data)?),
            None => Ok(Vec::new()),
        }
    }

    async fn replace(&self, session_id: Uuid, room_id: i64, seat_ids: &[String]) -> Result<(), StoreError> {
        if seat_ids.is_empty() {
            return self.clear(session_id, room_id).await;
        }
        let data = serde_json::to_string(seat_ids)?;
        self.redis
            .set_ex(&selection_key(session_id, room_id), data, self.ttl_seconds)
            .await?;
        Ok(())
    }

    async fn clear(&self, session_id: Uuid, room_id: i64) -> Result<(), StoreError> {
        self.redis.del(&selection_key(session_id, room_id)).await?;
        Ok(())
    }

    async fn health_check(&self) -> bool {
        self.redis.ping().await.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::redis_client::testing::MemoryCache;

    fn ids(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|id| id.to_string()).collect()
    }

    #[tokio::test]
    async fn replace_writes_json_with_ttl() {
        let redis = Arc::new(MemoryCache::default());
        let store = RedisSelectionStore::new(redis.clone(), 600);
        let session = Uuid::new_v4();

        store.replace(session, 3, &ids(&["B1", "B2"])).await.unwrap();

        let (data, ttl) = redis.entry(&selection_key(session, 3)).unwrap();
        assert_eq!(data, r#"["B1","B2"]"#);
        assert_eq!(ttl, 600);
        assert_eq!(store.get(session, 3).await.unwrap(), ids(&["B1", "B2"]));
    }

    #[tokio::test]
    async fn empty_replace_clears_key() {
        let redis = Arc::new(MemoryCache::default());
        let store = RedisSelectionStore::new(redis.clone(), 600);
        let session = Uuid::new_v4();

        store.replace(session, 3, &ids(&["B1"])).await.unwrap();
        store.replace(session, 3, &[]).await.unwrap();

        assert!(redis.entry(&selection_key(session, 3)).is_none());
        assert!(store.get(session, 3).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_key_is_empty_selection() {
        let store = RedisSelectionStore::new(Arc::new(MemoryCache::default()), 600);
        assert!(store.get(Uuid::new_v4(), 1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn redis_errors_are_reported() {
        let redis = Arc::new(MemoryCache::default());
        let store = RedisSelectionStore::new(redis.clone(), 600);
        redis.set_down(true);

        assert!(matches!(
            store.replace(Uuid::new_v4(), 1, &ids(&["A1"])).await,
            Err(StoreError::Redis(_))
        ));
        assert!(!store.health_check().await);
    }

    #[tokio::test]
    async fn corrupted_payload_is_a_serialization_error() {
        let redis = Arc::new(MemoryCache::default());
        let store = RedisSelectionStore::new(redis.clone(), 600);
        let session = Uuid::new_v4();
        redis.insert_raw(&selection_key(session, 1), "{", 600);

        assert!(matches!(
            store.get(session, 1).await,
            Err(StoreError::Serialization(_))
        ));
    }
}
