use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;

use crate::cache::traits::SharedCache;
use crate::errors::Result;

struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| Instant::now() >= at)
    }
}

/// 进程内的 SharedCache 实现
///
/// 单副本语义与远端一致（DashMap 分段锁保证 incr 原子性），
/// 用于测试和未配置 Redis 时的单进程运行。
#[derive(Default)]
pub struct MemorySharedCache {
    inner: DashMap<String, Entry>,
}

impl MemorySharedCache {
    pub fn new() -> Self {
        Self {
            inner: DashMap::new(),
        }
    }

    fn ttl_to_instant(ttl_secs: u64) -> Option<Instant> {
        Some(Instant::now() + Duration::from_secs(ttl_secs))
    }
}

#[async_trait]
impl SharedCache for MemorySharedCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        if let Some(entry) = self.inner.get(key) {
            if entry.is_expired() {
                drop(entry);
                self.inner.remove(key);
                return Ok(None);
            }
            return Ok(Some(entry.value.clone()));
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: &str, ttl_secs: Option<u64>) -> Result<()> {
        self.inner.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: ttl_secs.and_then(Self::ttl_to_instant),
            },
        );
        Ok(())
    }

    async fn incr(&self, key: &str) -> Result<i64> {
        let mut entry = self.inner.entry(key.to_string()).or_insert(Entry {
            value: "0".to_string(),
            expires_at: None,
        });

        // 过期的键按不存在处理，从 0 重新计数
        if entry.is_expired() {
            entry.value = "0".to_string();
            entry.expires_at = None;
        }

        let current: i64 = entry.value.parse().unwrap_or(0);
        let next = current + 1;
        entry.value = next.to_string();
        Ok(next)
    }

    async fn expire(&self, key: &str, ttl_secs: i64) -> Result<()> {
        if let Some(mut entry) = self.inner.get_mut(key) {
            entry.expires_at = Self::ttl_to_instant(ttl_secs.max(0) as u64);
        }
        Ok(())
    }

    async fn del(&self, key: &str) -> Result<()> {
        self.inner.remove(key);
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_get_roundtrip() {
        let cache = MemorySharedCache::new();
        cache.set("k", "v", None).await.unwrap();
        assert_eq!(cache.get("k").await.unwrap(), Some("v".to_string()));
        assert_eq!(cache.get("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_incr_is_sequential() {
        let cache = MemorySharedCache::new();
        assert_eq!(cache.incr("counter").await.unwrap(), 1);
        assert_eq!(cache.incr("counter").await.unwrap(), 2);
        assert_eq!(cache.incr("counter").await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_del_removes_key() {
        let cache = MemorySharedCache::new();
        cache.set("k", "v", None).await.unwrap();
        cache.del("k").await.unwrap();
        assert_eq!(cache.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_zero_ttl_expires_immediately() {
        let cache = MemorySharedCache::new();
        cache.set("k", "v", Some(0)).await.unwrap();
        assert_eq!(cache.get("k").await.unwrap(), None);
    }
}
