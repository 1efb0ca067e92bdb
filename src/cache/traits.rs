use async_trait::async_trait;

use crate::errors::Result;

/// 远端 KV 存储契约
///
/// 覆盖本系统需要的全部操作：GET、带过期的 SET、原子 INCR、EXPIRE、
/// DEL 和 PING。实现必须保证 `incr` 的原子性，访客游标的单调性依赖它。
#[async_trait]
pub trait SharedCache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Set a value, optionally with a TTL in seconds.
    async fn set(&self, key: &str, value: &str, ttl_secs: Option<u64>) -> Result<()>;

    /// Atomically increment and return the post-increment value.
    async fn incr(&self, key: &str) -> Result<i64>;

    /// Set a TTL on an existing key.
    async fn expire(&self, key: &str, ttl_secs: i64) -> Result<()>;

    async fn del(&self, key: &str) -> Result<()>;

    /// Connectivity probe used by the detailed health check.
    async fn ping(&self) -> Result<()>;
}
