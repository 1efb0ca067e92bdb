//! HTTP services
//!
//! Handlers are grouped by surface: the dispatch hot path, the reporting
//! API and the health probes. Handlers receive their collaborators via
//! `web::Data<AppState>`; when the process started degraded (missing
//! datastore configuration) the components are absent and every surface
//! except health answers 503.

pub mod health;
pub mod redirect;
pub mod reporting;

use std::sync::Arc;

use actix_web::HttpResponse;
use chrono::{DateTime, Utc};

use crate::cache::{RankingCache, SharedCache};
use crate::dispatch::{ClickRecorder, DispatchEngine};
use crate::ranking::RankingRefresher;
use crate::storage::{AnalyticsRepository, ClickStore, LinkStore};

pub use health::{health_routes, HealthService};
pub use redirect::{redirect_routes, RedirectService};
pub use reporting::{reporting_routes, ReportingService};

/// 全部已接线的组件
pub struct AppComponents {
    pub cache: Arc<dyn SharedCache>,
    pub rankings: Arc<RankingCache>,
    pub engine: Arc<DispatchEngine>,
    pub recorder: Arc<ClickRecorder>,
    pub refresher: Arc<RankingRefresher>,
    pub analytics: Arc<dyn AnalyticsRepository>,
    pub links: Arc<dyn LinkStore>,
    pub clicks: Arc<dyn ClickStore>,
    /// 文档库句柄，详细健康检查用；降级/测试环境下缺席
    pub database: Option<mongodb::Database>,
}

/// 进程级共享状态
#[derive(Clone)]
pub struct AppState {
    pub components: Option<Arc<AppComponents>>,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(components: Option<Arc<AppComponents>>) -> Self {
        Self {
            components,
            started_at: Utc::now(),
        }
    }

    pub fn degraded() -> Self {
        Self::new(None)
    }
}

/// 降级模式下的统一 503 响应
pub(crate) fn degraded_response() -> HttpResponse {
    HttpResponse::ServiceUnavailable().json(serde_json::json!({
        "error": "service is running in degraded mode, datastores are not configured"
    }))
}
