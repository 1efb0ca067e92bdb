//! Process-local fronting of the ranking keys
//!
//! Every dispatch consults the rankings; going to the shared cache each
//! time would saturate the cache tier under load. This module keeps a
//! local copy of `BestLinkMap` and the sorted domain list with a short
//! freshness window. When the shared cache is unreachable or empty the
//! last known copy keeps serving, however stale.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::cache::keys::{BEST_LINKS_MAP_KEY, SORTED_DOMAINS_KEY};
use crate::cache::traits::SharedCache;
use crate::ranking::{BestLinkMap, SortedDomain};

struct Snapshot<T> {
    value: Option<T>,
    fetched_at: Option<Instant>,
}

impl<T> Snapshot<T> {
    const fn empty() -> Self {
        Self {
            value: None,
            fetched_at: None,
        }
    }

    fn is_fresh(&self, window: Duration) -> bool {
        self.fetched_at
            .is_some_and(|at| at.elapsed() < window)
    }
}

pub struct RankingCache {
    shared: Arc<dyn SharedCache>,
    best_links: RwLock<Snapshot<BestLinkMap>>,
    sorted_domains: RwLock<Snapshot<Vec<SortedDomain>>>,
    freshness: Duration,
}

impl RankingCache {
    pub fn new(shared: Arc<dyn SharedCache>, freshness_secs: u64) -> Self {
        Self {
            shared,
            best_links: RwLock::new(Snapshot::empty()),
            sorted_domains: RwLock::new(Snapshot::empty()),
            freshness: Duration::from_secs(freshness_secs),
        }
    }

    /// 读取本地副本的 BestLinkMap，过期则从共享缓存刷新
    ///
    /// 共享缓存读取失败或键不存在时返回最后一次成功的副本；
    /// 两个键独立刷新，调用方不能假设两者大小一致。
    pub async fn best_links(&self) -> BestLinkMap {
        {
            let snapshot = self.best_links.read().await;
            if snapshot.is_fresh(self.freshness) {
                return snapshot.value.clone().unwrap_or_default();
            }
        }

        let mut snapshot = self.best_links.write().await;
        // 另一个请求可能已经抢先刷新
        if snapshot.is_fresh(self.freshness) {
            return snapshot.value.clone().unwrap_or_default();
        }

        match self.shared.get(BEST_LINKS_MAP_KEY).await {
            Ok(Some(json)) => match serde_json::from_str::<BestLinkMap>(&json) {
                Ok(map) => {
                    snapshot.value = Some(map.clone());
                    snapshot.fetched_at = Some(Instant::now());
                    return map;
                }
                Err(e) => {
                    warn!("Corrupt best links map in shared cache: {}", e);
                }
            },
            Ok(None) => {
                debug!("Best links map not present in shared cache");
                // 键过期也算一次成功读取，避免每个请求都打到共享缓存
                snapshot.fetched_at = Some(Instant::now());
            }
            Err(e) => {
                warn!("Shared cache read failed, serving stale best links: {}", e);
            }
        }

        snapshot.value.clone().unwrap_or_default()
    }

    /// 读取本地副本的排序域名列表，语义与 [`Self::best_links`] 相同
    pub async fn sorted_domains(&self) -> Vec<SortedDomain> {
        {
            let snapshot = self.sorted_domains.read().await;
            if snapshot.is_fresh(self.freshness) {
                return snapshot.value.clone().unwrap_or_default();
            }
        }

        let mut snapshot = self.sorted_domains.write().await;
        if snapshot.is_fresh(self.freshness) {
            return snapshot.value.clone().unwrap_or_default();
        }

        match self.shared.get(SORTED_DOMAINS_KEY).await {
            Ok(Some(json)) => match serde_json::from_str::<Vec<SortedDomain>>(&json) {
                Ok(list) => {
                    snapshot.value = Some(list.clone());
                    snapshot.fetched_at = Some(Instant::now());
                    return list;
                }
                Err(e) => {
                    warn!("Corrupt sorted domains list in shared cache: {}", e);
                }
            },
            Ok(None) => {
                debug!("Sorted domains list not present in shared cache");
                snapshot.fetched_at = Some(Instant::now());
            }
            Err(e) => {
                warn!(
                    "Shared cache read failed, serving stale sorted domains: {}",
                    e
                );
            }
        }

        snapshot.value.clone().unwrap_or_default()
    }

    /// 刷新任务发布成功后直接覆盖本地副本
    pub async fn store(&self, best_links: BestLinkMap, sorted_domains: Vec<SortedDomain>) {
        let now = Instant::now();
        {
            let mut snapshot = self.best_links.write().await;
            snapshot.value = Some(best_links);
            snapshot.fetched_at = Some(now);
        }
        {
            let mut snapshot = self.sorted_domains.write().await;
            snapshot.value = Some(sorted_domains);
            snapshot.fetched_at = Some(now);
        }
    }

    /// 本地副本的年龄（秒），尚未加载时为 None
    pub async fn age_secs(&self) -> Option<u64> {
        let snapshot = self.sorted_domains.read().await;
        snapshot.fetched_at.map(|at| at.elapsed().as_secs())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::memory::MemorySharedCache;
    use crate::ranking::BestLink;

    fn sample_map() -> BestLinkMap {
        let mut map = BestLinkMap::new();
        map.insert(
            "useuapp.com".to_string(),
            BestLink {
                url: "https://useuapp.com/?p=7".to_string(),
                post_id: "7".to_string(),
                ecpm: 2.0,
            },
        );
        map
    }

    #[tokio::test]
    async fn test_reads_from_shared_cache() {
        let shared = Arc::new(MemorySharedCache::new());
        shared
            .set(
                BEST_LINKS_MAP_KEY,
                &serde_json::to_string(&sample_map()).unwrap(),
                None,
            )
            .await
            .unwrap();

        let fronting = RankingCache::new(shared, 60);
        let map = fronting.best_links().await;
        assert_eq!(map.len(), 1);
        assert_eq!(map["useuapp.com"].post_id, "7");
    }

    #[tokio::test]
    async fn test_serves_local_copy_when_shared_is_emptied() {
        let shared = Arc::new(MemorySharedCache::new());
        shared
            .set(
                BEST_LINKS_MAP_KEY,
                &serde_json::to_string(&sample_map()).unwrap(),
                None,
            )
            .await
            .unwrap();

        // 新鲜度窗口内不会再访问共享缓存
        let fronting = RankingCache::new(shared.clone(), 60);
        assert_eq!(fronting.best_links().await.len(), 1);

        shared.del(BEST_LINKS_MAP_KEY).await.unwrap();
        assert_eq!(fronting.best_links().await.len(), 1);
    }

    #[tokio::test]
    async fn test_empty_when_nothing_published() {
        let shared = Arc::new(MemorySharedCache::new());
        let fronting = RankingCache::new(shared, 60);
        assert!(fronting.best_links().await.is_empty());
        assert!(fronting.sorted_domains().await.is_empty());
    }

    #[tokio::test]
    async fn test_store_overrides_local_copy() {
        let shared = Arc::new(MemorySharedCache::new());
        let fronting = RankingCache::new(shared, 60);
        fronting.store(sample_map(), Vec::new()).await;
        assert_eq!(fronting.best_links().await.len(), 1);
        assert!(fronting.age_secs().await.is_some());
    }
}
