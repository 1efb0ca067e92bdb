//! 排行刷新任务
//!
//! 每小时对分析集合做一次聚合，得出每个发布域名当天 eCPM 最高的
//! post，组装跳转 URL，发布到共享缓存（两个键，TTL 一小时），
//! 并将链接库对账为「每个赢家一条 active 记录」。

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::cache::keys::{BEST_LINKS_MAP_KEY, SORTED_DOMAINS_KEY};
use crate::cache::{RankingCache, SharedCache, RANKING_TTL_SECS};
use crate::domains::DomainRegistry;
use crate::errors::Result;
use crate::ranking::{BestLink, BestLinkMap, SortedDomain};
use crate::storage::models::AnalyticsRow;
use crate::storage::{AnalyticsRepository, LinkStore};

/// 分析行的分组键，取值即 post id
pub const POST_CUSTOM_KEY: &str = "id_post_wp";

pub struct RankingRefresher {
    analytics: Arc<dyn AnalyticsRepository>,
    links: Arc<dyn LinkStore>,
    cache: Arc<dyn SharedCache>,
    rankings: Arc<RankingCache>,
    registry: Arc<DomainRegistry>,
}

impl RankingRefresher {
    pub fn new(
        analytics: Arc<dyn AnalyticsRepository>,
        links: Arc<dyn LinkStore>,
        cache: Arc<dyn SharedCache>,
        rankings: Arc<RankingCache>,
        registry: Arc<DomainRegistry>,
    ) -> Self {
        Self {
            analytics,
            links,
            cache,
            rankings,
            registry,
        }
    }

    /// Run one refresh cycle.
    ///
    /// Returns the published map, or `None` when the analytics result was
    /// empty and the previous cache state was deliberately left intact.
    /// A cache-write error aborts the run before the local copies are
    /// touched; the next scheduled firing retries.
    pub async fn refresh(&self) -> Result<Option<BestLinkMap>> {
        let today = Utc::now().format("%Y-%m-%d").to_string();

        let rows = self
            .analytics
            .best_post_rows(&today, self.registry.hostnames(), POST_CUSTOM_KEY)
            .await?;

        if rows.is_empty() {
            // 空结果不清空缓存，旧排行继续服务到 TTL 过期
            warn!("Analytics returned no rows for {}, keeping previous rankings", today);
            return Ok(None);
        }

        let best_by_domain = Self::best_by_domain(&rows)?;
        let sorted_domains = Self::sort_by_ecpm(&best_by_domain);

        // 两个键都写成功才算一次完整发布
        let map_json = serde_json::to_string(&best_by_domain)?;
        let sorted_json = serde_json::to_string(&sorted_domains)?;
        self.cache
            .set(BEST_LINKS_MAP_KEY, &map_json, Some(RANKING_TTL_SECS))
            .await?;
        self.cache
            .set(SORTED_DOMAINS_KEY, &sorted_json, Some(RANKING_TTL_SECS))
            .await?;

        self.rankings
            .store(best_by_domain.clone(), sorted_domains.clone())
            .await;

        info!(
            "Rankings published: {} domains, top ecpm {:.4}",
            sorted_domains.len(),
            sorted_domains.first().map(|d| d.ecpm).unwrap_or(0.0)
        );

        // 链接库对账失败不影响缓存发布
        if let Err(e) = self.reconcile_links(&best_by_domain).await {
            error!("Link store reconciliation failed: {}", e);
        }

        Ok(Some(best_by_domain))
    }

    /// 逐行挑出每个域名 ecpm 严格更高的行，缺失的 ecpm 按 0 处理，
    /// 相等保留先出现的行
    fn best_by_domain(rows: &[AnalyticsRow]) -> Result<BestLinkMap> {
        let mut best: BestLinkMap = BestLinkMap::new();

        for row in rows {
            let ecpm = row.ecpm.unwrap_or(0.0);
            let replace = match best.get(&row.domain) {
                Some(current) => ecpm > current.ecpm,
                None => true,
            };
            if replace {
                best.insert(
                    row.domain.clone(),
                    BestLink {
                        url: Self::compose_url(&row.domain, &row.custom_value)?,
                        post_id: row.custom_value.clone(),
                        ecpm,
                    },
                );
            }
        }

        Ok(best)
    }

    /// `https://<domain>/?p=<urlencode(postId)>`
    fn compose_url(domain: &str, post_id: &str) -> Result<String> {
        let mut url = Url::parse(&format!("https://{domain}/"))?;
        url.query_pairs_mut().append_pair("p", post_id);
        Ok(url.into())
    }

    /// ecpm 降序；相等时保持 map 的迭代顺序（单次刷新内稳定）
    fn sort_by_ecpm(best: &BestLinkMap) -> Vec<SortedDomain> {
        let mut sorted: Vec<SortedDomain> = best
            .iter()
            .map(|(domain, link)| SortedDomain {
                domain: domain.clone(),
                url: link.url.clone(),
                post_id: link.post_id.clone(),
                ecpm: link.ecpm,
            })
            .collect();
        sorted.sort_by(|a, b| b.ecpm.partial_cmp(&a.ecpm).unwrap_or(std::cmp::Ordering::Equal));
        sorted
    }

    /// (a) 所有 active 记录置为 inactive，(b) 为每个赢家 upsert 一条
    /// active 记录
    async fn reconcile_links(&self, best: &BestLinkMap) -> anyhow::Result<()> {
        let deactivated = self.links.deactivate_all().await?;
        debug!("Deactivated {} previous link records", deactivated);

        for (domain, link) in best {
            self.links.upsert_active(domain, &link.url).await?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(domain: &str, post: &str, ecpm: Option<f64>) -> AnalyticsRow {
        AnalyticsRow {
            date: Some("2026-08-02".to_string()),
            domain: domain.to_string(),
            custom_key: Some(POST_CUSTOM_KEY.to_string()),
            custom_value: post.to_string(),
            impressions: Some(1000.0),
            clicks: Some(10.0),
            revenue: None,
            ecpm,
        }
    }

    #[test]
    fn test_best_by_domain_picks_strictly_greater() {
        let rows = vec![
            row("a.com", "1", Some(2.0)),
            row("a.com", "2", Some(5.0)),
            row("a.com", "3", Some(5.0)),
            row("b.com", "9", Some(1.0)),
        ];
        let best = RankingRefresher::best_by_domain(&rows).unwrap();
        assert_eq!(best.len(), 2);
        // 相等不替换，post 2 先到先得
        assert_eq!(best["a.com"].post_id, "2");
        assert_eq!(best["b.com"].post_id, "9");
    }

    #[test]
    fn test_missing_ecpm_counts_as_zero() {
        let rows = vec![row("a.com", "1", None), row("a.com", "2", Some(0.1))];
        let best = RankingRefresher::best_by_domain(&rows).unwrap();
        assert_eq!(best["a.com"].post_id, "2");
        assert_eq!(best["a.com"].ecpm, 0.1);
    }

    #[test]
    fn test_compose_url_encodes_post_id() {
        let url = RankingRefresher::compose_url("a.com", "café post/1").unwrap();
        let parsed = Url::parse(&url).unwrap();
        let (key, value) = parsed.query_pairs().next().unwrap();
        assert_eq!(key, "p");
        assert_eq!(value, "café post/1");
    }

    #[test]
    fn test_compose_url_plain_id() {
        let url = RankingRefresher::compose_url("useuapp.com", "1234").unwrap();
        assert_eq!(url, "https://useuapp.com/?p=1234");
    }

    #[test]
    fn test_sort_by_ecpm_descending() {
        let rows = vec![
            row("a.com", "1", Some(5.0)),
            row("b.com", "2", Some(10.0)),
            row("c.com", "3", Some(7.5)),
        ];
        let best = RankingRefresher::best_by_domain(&rows).unwrap();
        let sorted = RankingRefresher::sort_by_ecpm(&best);
        let domains: Vec<&str> = sorted.iter().map(|d| d.domain.as_str()).collect();
        assert_eq!(domains, vec!["b.com", "c.com", "a.com"]);
    }
}
