use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tracing::debug;

use crate::cache::traits::SharedCache;
use crate::errors::{RedronError, Result};

pub struct RedisSharedCache {
    /// ConnectionManager 自动处理重连
    connection: ConnectionManager,
}

impl RedisSharedCache {
    pub async fn new(url: &str) -> Result<Self> {
        debug!("Initializing RedisSharedCache");

        let client = redis::Client::open(url)
            .map_err(|e| RedronError::cache_connection(format!("invalid Redis URL: {e}")))?;

        // 使用 ConnectionManager，支持自动重连
        let connection = ConnectionManager::new(client).await.map_err(|e| {
            RedronError::cache_connection(format!("failed to create ConnectionManager: {e}"))
        })?;

        debug!("RedisSharedCache initialized with ConnectionManager");

        Ok(Self { connection })
    }
}

#[async_trait]
impl SharedCache for RedisSharedCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        // ConnectionManager 可以直接 clone 使用，自动处理重连
        let mut conn = self.connection.clone();
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str, ttl_secs: Option<u64>) -> Result<()> {
        let mut conn = self.connection.clone();
        match ttl_secs {
            Some(ttl) => conn.set_ex::<_, _, ()>(key, value, ttl).await?,
            None => conn.set::<_, _, ()>(key, value).await?,
        }
        Ok(())
    }

    async fn incr(&self, key: &str) -> Result<i64> {
        let mut conn = self.connection.clone();
        let value: i64 = conn.incr(key, 1).await?;
        Ok(value)
    }

    async fn expire(&self, key: &str, ttl_secs: i64) -> Result<()> {
        let mut conn = self.connection.clone();
        conn.expire::<_, ()>(key, ttl_secs).await?;
        Ok(())
    }

    async fn del(&self, key: &str) -> Result<()> {
        let mut conn = self.connection.clone();
        conn.del::<_, ()>(key).await?;
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        let mut conn = self.connection.clone();
        let pong: String = redis::cmd("PING").query_async(&mut conn).await?;
        if pong == "PONG" {
            Ok(())
        } else {
            Err(RedronError::cache_operation(format!(
                "unexpected PING reply: {pong}"
            )))
        }
    }
}
