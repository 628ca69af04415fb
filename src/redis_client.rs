use async_trait::async_trait;
use redis::{aio::ConnectionManager, AsyncCommands, Client, RedisResult};

/// Команды Redis, которыми пользуются кеш схем и хранилище выбора.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    async fn get(&self, key: &str) -> RedisResult<Option<String>>;
    async fn set_ex(&self, key: &str, value: String, ttl_seconds: u64) -> RedisResult<()>;
    async fn del(&self, key: &str) -> RedisResult<()>;
    async fn ping(&self) -> RedisResult<()>;
}

/// Соединение с Redis, переподключается само при обрыве.
#[derive(Clone)]
pub struct RedisClient {
    pub conn: ConnectionManager,
}

impl RedisClient {
    pub async fn new(redis_url: &str) -> RedisResult<Self> {
        let client = Client::open(redis_url)?;
        let conn = ConnectionManager::new(client).await?;
        Ok(RedisClient { conn })
    }
}

#[async_trait]
impl CacheBackend for RedisClient {
    async fn get(&self, key: &str) -> RedisResult<Option<String>> {
        let mut conn = self.conn.clone();
        conn.get(key).await
    }

    async fn set_ex(&self, key: &str, value: String, ttl_seconds: u64) -> RedisResult<()> {
        let mut conn = self.conn.clone();
        conn.set_ex(key, value, ttl_seconds).await
    }

    async fn del(&self, key: &str) -> RedisResult<()> {
        let mut conn = self.conn.clone();
        conn.del(key).await
    }

    async fn ping(&self) -> RedisResult<()> {
        let mut conn = self.conn.clone();
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }
}
