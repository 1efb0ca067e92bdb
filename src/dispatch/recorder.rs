//! 点击记录与防重放备忘
//!
//! 两类写都从响应路径剥离：spawn 出去，失败只记日志，绝不拖慢
//! 302。客户端断开不影响写入完成。

use std::sync::Arc;

use tracing::{debug, warn};

use crate::cache::{keys, SharedCache, RECENT_TTL_SECS};
use crate::storage::ClickStore;

pub struct ClickRecorder {
    clicks: Arc<dyn ClickStore>,
    cache: Arc<dyn SharedCache>,
}

impl ClickRecorder {
    pub fn new(clicks: Arc<dyn ClickStore>, cache: Arc<dyn SharedCache>) -> Self {
        Self { clicks, cache }
    }

    /// Fire-and-forget upsert of the click counter for `link_id`.
    pub fn record_click(&self, link_id: &str) {
        let clicks = Arc::clone(&self.clicks);
        let link_id = link_id.to_string();
        tokio::spawn(async move {
            match clicks.increment_click(&link_id).await {
                Ok(counter) => {
                    debug!("Click recorded: {} -> {}", link_id, counter.count);
                }
                Err(e) => {
                    warn!("Failed to record click for '{}': {}", link_id, e);
                }
            }
        });
    }

    /// Fire-and-forget write of the short-lived `recent:<ip>` memo used
    /// to dedupe accidental refreshes.
    pub fn remember_recent(&self, ip: &str, final_url: &str) {
        let cache = Arc::clone(&self.cache);
        let key = keys::recent(ip);
        let url = final_url.to_string();
        tokio::spawn(async move {
            if let Err(e) = cache.set(&key, &url, Some(RECENT_TTL_SECS)).await {
                warn!("Failed to write recent memo for '{}': {}", key, e);
            }
        });
    }
}
