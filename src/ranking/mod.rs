//! Ranking refresher and the published ranking types
//!
//! The refresher aggregates the analytics collection once an hour,
//! computes the best post per publisher domain and the eCPM-sorted domain
//! list, and publishes both to the shared cache where every dispatcher
//! replica reads them.

pub mod refresher;
pub mod scheduler;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

pub use refresher::RankingRefresher;

/// 单个域名的当前最佳链接
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BestLink {
    pub url: String,
    #[serde(rename = "postId")]
    pub post_id: String,
    pub ecpm: f64,
}

/// domain -> BestLink，即 `redirect:best_links_map` 的值
pub type BestLinkMap = HashMap<String, BestLink>;

/// `redirect:sorted_domains` 数组的元素，按 ecpm 降序
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SortedDomain {
    pub domain: String,
    pub url: String,
    #[serde(rename = "postId")]
    pub post_id: String,
    pub ecpm: f64,
}
