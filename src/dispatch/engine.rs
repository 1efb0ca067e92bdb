//! 选路引擎
//!
//! 每个 (ip, 小时) 维持一个访客游标，依次走完 eCPM 降序的域名；
//! 排行为空时按注册表顺序回退；都走完之后进入全局轮询 `/random`
//! 溢出路径。所有协调都走共享缓存，多副本之间无共享内存。

use std::sync::Arc;

use chrono::{Local, Timelike};
use tracing::{debug, trace};
use url::Url;

use crate::cache::{keys, RankingCache, SharedCache, DOMAIN_COUNTER_MAX, VISITOR_TTL_SECS};
use crate::dispatch::{language, utm, Dispatch, DispatchParams};
use crate::domains::DomainRegistry;
use crate::errors::Result;

pub struct DispatchEngine {
    cache: Arc<dyn SharedCache>,
    rankings: Arc<RankingCache>,
    registry: Arc<DomainRegistry>,
}

impl DispatchEngine {
    pub fn new(
        cache: Arc<dyn SharedCache>,
        rankings: Arc<RankingCache>,
        registry: Arc<DomainRegistry>,
    ) -> Self {
        Self {
            cache,
            rankings,
            registry,
        }
    }

    /// Produce the destination for one visitor request.
    ///
    /// Any error bubbles up to the HTTP layer, which answers with the
    /// emergency fallback redirect instead of a 5xx.
    pub async fn dispatch(&self, ip: &str, params: &DispatchParams) -> Result<Dispatch> {
        let visit = self.visitor_cursor(ip).await?;
        let sorted = self.rankings.sorted_domains().await;
        let ranked = sorted.len() as i64;

        let (mut url, domain, link_id) = if ranked > 0 && visit <= ranked {
            // 本小时第 visit 次访问，取排行上第 visit 名
            let entry = &sorted[(visit - 1) as usize];
            trace!("Visit {} of {} ranked domains -> {}", visit, ranked, entry.domain);
            (
                Url::parse(&entry.url)?,
                entry.domain.clone(),
                format!("best_{}_{}", entry.domain, entry.post_id),
            )
        } else if ranked == 0 && visit <= self.registry.len() as i64 {
            // 无排行时按注册表顺序回退，能查到最佳链接就用
            let domain = self.registry.at_wrapped((visit - 1) as usize).to_string();
            let best = self.rankings.best_links().await;
            match best.get(&domain) {
                Some(link) => {
                    debug!("Registry fallback hit best link for {}", domain);
                    (
                        Url::parse(&link.url)?,
                        domain.clone(),
                        format!("best_{}_{}", domain, link.post_id),
                    )
                }
                None => (
                    Url::parse(&format!("https://{domain}/random"))?,
                    domain.clone(),
                    format!("fallback_{domain}"),
                ),
            }
        } else {
            // 溢出：全局轮询计数器挑下一个域名
            let counter = self.next_spill_counter().await?;
            let domain = self
                .registry
                .at_wrapped((counter - 1) as usize)
                .to_string();
            trace!("Spill path: counter {} -> {}", counter, domain);
            (
                Url::parse(&format!("https://{domain}/random"))?,
                domain.clone(),
                format!("random_{domain}"),
            )
        };

        language::apply_language_prefix(
            &mut url,
            &domain,
            params.language.as_deref(),
            &self.registry,
        );
        utm::decorate(&mut url, params, &link_id);

        Ok(Dispatch {
            url: url.into(),
            link_id,
        })
    }

    /// 原子递增本小时的访客游标，首次写入时设置 TTL
    async fn visitor_cursor(&self, ip: &str) -> Result<i64> {
        let hour = Local::now().hour();
        let key = keys::visitor_count(ip, hour);
        let visit = self.cache.incr(&key).await?;
        if visit == 1 {
            self.cache.expire(&key, VISITOR_TTL_SECS).await?;
        }
        Ok(visit)
    }

    /// 全局轮询计数器，超过阈值重置为 1
    async fn next_spill_counter(&self) -> Result<i64> {
        let counter = self.cache.incr(keys::DOMAIN_COUNTER_KEY).await?;
        if counter > DOMAIN_COUNTER_MAX {
            self.cache.set(keys::DOMAIN_COUNTER_KEY, "1", None).await?;
            return Ok(1);
        }
        Ok(counter)
    }
}
