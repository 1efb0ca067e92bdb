//! 组件接线
//!
//! 按「启动时显式构造、经构造函数传递」的方式接线所有资源；
//! 数据源配置缺失时不中止进程，而是进入降级模式。

use std::sync::Arc;

use tracing::{debug, warn};

use crate::cache::{MemorySharedCache, RankingCache, RedisSharedCache, SharedCache};
use crate::config::AppConfig;
use crate::dispatch::{ClickRecorder, DispatchEngine};
use crate::domains::DomainRegistry;
use crate::ranking::RankingRefresher;
use crate::services::{AppComponents, AppState};
use crate::storage::{self, MongoAnalyticsRepository, MongoClickStore, MongoLinkStore};

/// Wire every component, or return the degraded state when the
/// datastores are not configured or unreachable at startup.
pub async fn prepare_server_startup(config: &AppConfig) -> AppState {
    if config.is_degraded() {
        warn!("Datastore configuration missing, serving health endpoints only");
        return AppState::degraded();
    }

    let database = match storage::connect(&config.database).await {
        Ok(db) => db,
        Err(e) => {
            warn!("MongoDB connection failed ({}), entering degraded mode", e);
            return AppState::degraded();
        }
    };

    let cache: Arc<dyn SharedCache> = match RedisSharedCache::new(&config.cache.redis.url).await {
        Ok(redis) => Arc::new(redis),
        Err(e) => {
            // 单进程还能靠进程内缓存撑住，多副本部署必须修复 Redis
            warn!(
                "Redis connection failed ({}), falling back to in-process cache",
                e
            );
            Arc::new(MemorySharedCache::new())
        }
    };

    let registry = Arc::new(DomainRegistry::from_static());
    let rankings = Arc::new(RankingCache::new(
        Arc::clone(&cache),
        config.cache.fronting_ttl,
    ));

    let analytics = Arc::new(MongoAnalyticsRepository::new(&database));
    let links = Arc::new(MongoLinkStore::new(&database));
    let clicks = Arc::new(MongoClickStore::new(&database));

    // link_id 唯一索引保证并发首写不产生重复文档
    if let Err(e) = clicks.ensure_indexes().await {
        warn!("Failed to ensure click counter indexes: {}", e);
    }

    let engine = Arc::new(DispatchEngine::new(
        Arc::clone(&cache),
        Arc::clone(&rankings),
        Arc::clone(&registry),
    ));
    let recorder = Arc::new(ClickRecorder::new(clicks.clone(), Arc::clone(&cache)));
    let refresher = Arc::new(RankingRefresher::new(
        analytics.clone(),
        links.clone(),
        Arc::clone(&cache),
        Arc::clone(&rankings),
        Arc::clone(&registry),
    ));

    debug!("All components wired");

    AppState::new(Some(Arc::new(AppComponents {
        cache,
        rankings,
        engine,
        recorder,
        refresher,
        analytics,
        links,
        clicks,
        database: Some(database),
    })))
}
