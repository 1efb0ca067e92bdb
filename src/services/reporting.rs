use actix_web::{web, HttpResponse, Responder, ResponseError};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::ranking::BestLinkMap;
use crate::services::{degraded_response, AppState};
use crate::storage::analytics::DISTINCT_FIELDS;

/// /api/process 的响应体
#[derive(Debug, Serialize)]
pub struct ProcessResponse {
    pub success: bool,
    pub message: String,
    pub data: Option<BestLinkMap>,
}

#[derive(Debug, Deserialize)]
pub struct LinksQuery {
    pub active: Option<bool>,
}

#[derive(Debug, Serialize)]
struct TrafficStats {
    best_links: usize,
    sorted_domains: usize,
    local_copy_age_secs: Option<u64>,
}

pub struct ReportingService;

impl ReportingService {
    /// `GET /api/process` — 手动触发一次排行刷新
    pub async fn process(state: web::Data<AppState>) -> impl Responder {
        let Some(components) = state.components.as_ref() else {
            return degraded_response();
        };

        info!("Manual ranking refresh triggered");
        match components.refresher.refresh().await {
            Ok(Some(map)) => HttpResponse::Ok().json(ProcessResponse {
                success: true,
                message: format!("rankings refreshed for {} domains", map.len()),
                data: Some(map),
            }),
            Ok(None) => HttpResponse::Ok().json(ProcessResponse {
                success: true,
                message: "analytics returned no rows, previous rankings kept".to_string(),
                data: None,
            }),
            Err(e) => {
                error!("Manual refresh failed: {}", e);
                HttpResponse::InternalServerError().json(ProcessResponse {
                    success: false,
                    message: e.to_string(),
                    data: None,
                })
            }
        }
    }

    /// `GET /api/stats` — gam / clicks / traffic 三块统计
    pub async fn stats(state: web::Data<AppState>) -> impl Responder {
        let Some(components) = state.components.as_ref() else {
            return degraded_response();
        };

        let today = Utc::now().format("%Y-%m-%d").to_string();

        let gam = match components.analytics.daily_totals(&today).await {
            Ok(totals) => totals,
            Err(e) => return e.error_response(),
        };

        let clicks = match components.clicks.totals(10).await {
            Ok(totals) => totals,
            Err(e) => return e.error_response(),
        };

        let traffic = TrafficStats {
            best_links: components.rankings.best_links().await.len(),
            sorted_domains: components.rankings.sorted_domains().await.len(),
            local_copy_age_secs: components.rankings.age_secs().await,
        };

        HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "data": {
                "gam": gam,
                "clicks": clicks,
                "traffic": traffic,
            }
        }))
    }

    /// `GET /api/distinct/{field}` — 白名单字段的 distinct 值
    pub async fn distinct(
        state: web::Data<AppState>,
        field: web::Path<String>,
    ) -> impl Responder {
        let Some(components) = state.components.as_ref() else {
            return degraded_response();
        };

        let field = field.into_inner();
        if !DISTINCT_FIELDS.contains(&field.as_str()) {
            return HttpResponse::BadRequest().json(serde_json::json!({
                "error": format!("field '{}' is not queryable", field),
                "validFields": DISTINCT_FIELDS,
            }));
        }

        match components.analytics.distinct(&field).await {
            Ok(values) => HttpResponse::Ok().json(serde_json::json!({
                "success": true,
                "data": values,
            })),
            Err(e) => e.error_response(),
        }
    }

    /// `GET /api/links` — 链接库记录，支持 active 过滤
    pub async fn links(
        state: web::Data<AppState>,
        query: web::Query<LinksQuery>,
    ) -> impl Responder {
        let Some(components) = state.components.as_ref() else {
            return degraded_response();
        };

        match components.links.list(query.active).await {
            Ok(records) => HttpResponse::Ok().json(serde_json::json!({
                "success": true,
                "data": records,
            })),
            Err(e) => e.error_response(),
        }
    }
}

/// Reporting 路由配置
pub fn reporting_routes() -> actix_web::Scope {
    web::scope("/api")
        .route("/process", web::get().to(ReportingService::process))
        .route("/stats", web::get().to(ReportingService::stats))
        .route("/distinct/{field}", web::get().to(ReportingService::distinct))
        .route("/links", web::get().to(ReportingService::links))
}
