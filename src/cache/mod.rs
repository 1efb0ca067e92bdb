//! Shared cache layer
//!
//! `SharedCache` is the thin contract over the remote key-value store that
//! all coordination between replicas flows through: ranking publication,
//! visitor cursors and the `/random` spill counter. `RedisSharedCache` is
//! the production implementation; `MemorySharedCache` backs tests.
//!
//! `RankingCache` is the process-local fronting copy of the two ranking
//! keys with a short freshness window, so the hot path does not hit the
//! cache tier on every request.

pub mod fronting;
pub mod memory;
pub mod redis;
pub mod traits;

pub use self::fronting::RankingCache;
pub use self::memory::MemorySharedCache;
pub use self::redis::RedisSharedCache;
pub use self::traits::SharedCache;

/// 共享缓存键名（所有副本约定一致）
pub mod keys {
    /// JSON of `domain -> {url, postId, ecpm}`
    pub const BEST_LINKS_MAP_KEY: &str = "redirect:best_links_map";
    /// JSON array of `{domain, url, postId, ecpm}` sorted desc by ecpm
    pub const SORTED_DOMAINS_KEY: &str = "redirect:sorted_domains";
    /// Global round-robin counter for the `/random` spill path
    pub const DOMAIN_COUNTER_KEY: &str = "redirect:domain:counter";

    pub fn visitor_count(ip: &str, hour_of_day: u32) -> String {
        format!("visitor_count:{}:{}", ip, hour_of_day)
    }

    pub fn recent(ip: &str) -> String {
        format!("recent:{}", ip)
    }
}

/// 排行键的 TTL
pub const RANKING_TTL_SECS: u64 = 3600;
/// 访客游标的 TTL（首次写入时设置）
pub const VISITOR_TTL_SECS: i64 = 3600;
/// 防重放备忘的 TTL
pub const RECENT_TTL_SECS: u64 = 5;
/// 全局轮询计数器的重置阈值
pub const DOMAIN_COUNTER_MAX: i64 = 1_000_000;
