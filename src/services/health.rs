use std::time::{Duration, Instant};

use actix_web::{web, HttpResponse, Responder};
use serde::Serialize;
use tracing::{error, trace};

use crate::services::AppState;
use crate::storage;

/// 依赖检查的超时
const CHECK_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Serialize)]
struct DependencyCheck {
    status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl DependencyCheck {
    fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            error: None,
        }
    }

    fn unhealthy(error: String) -> Self {
        Self {
            status: "unhealthy".to_string(),
            error: Some(error),
        }
    }

    fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

pub struct HealthService;

impl HealthService {
    /// `GET /ping`
    pub async fn ping() -> impl Responder {
        trace!("Received ping request");
        HttpResponse::Ok()
            .append_header(("Content-Type", "text/plain"))
            .body("pong")
    }

    /// `GET /health` — 基本存活信息，不触碰依赖
    pub async fn health_check(state: web::Data<AppState>) -> impl Responder {
        let now = chrono::Utc::now();
        let uptime_seconds = (now - state.started_at).num_seconds().max(0);

        HttpResponse::Ok().json(serde_json::json!({
            "status": "ok",
            "timestamp": now.to_rfc3339(),
            "uptime": uptime_seconds,
            "degraded": state.components.is_none(),
        }))
    }

    /// `GET /health/ready` — 组件接线完成即就绪
    pub async fn readiness_check(state: web::Data<AppState>) -> impl Responder {
        if state.components.is_some() {
            HttpResponse::Ok()
                .append_header(("Content-Type", "text/plain"))
                .body("OK")
        } else {
            HttpResponse::ServiceUnavailable()
                .append_header(("Content-Type", "text/plain"))
                .body("degraded")
        }
    }

    /// `GET /health/detailed` — 同时探测文档库和共享缓存，
    /// 任一不可用返回 503
    pub async fn detailed_check(state: web::Data<AppState>) -> impl Responder {
        let start = Instant::now();

        let (database, cache) = match state.components.as_ref() {
            Some(components) => {
                let database = match &components.database {
                    Some(db) => match tokio::time::timeout(CHECK_TIMEOUT, storage::ping(db)).await {
                        Ok(Ok(())) => DependencyCheck::healthy(),
                        Ok(Err(e)) => {
                            error!("Database health check failed: {}", e);
                            DependencyCheck::unhealthy(e.to_string())
                        }
                        Err(_) => {
                            error!("Database health check timeout");
                            DependencyCheck::unhealthy("timeout".to_string())
                        }
                    },
                    None => DependencyCheck::unhealthy("not configured".to_string()),
                };

                let cache = match tokio::time::timeout(CHECK_TIMEOUT, components.cache.ping()).await
                {
                    Ok(Ok(())) => DependencyCheck::healthy(),
                    Ok(Err(e)) => {
                        error!("Cache health check failed: {}", e);
                        DependencyCheck::unhealthy(e.to_string())
                    }
                    Err(_) => {
                        error!("Cache health check timeout");
                        DependencyCheck::unhealthy("timeout".to_string())
                    }
                };

                (database, cache)
            }
            None => (
                DependencyCheck::unhealthy("not configured".to_string()),
                DependencyCheck::unhealthy("not configured".to_string()),
            ),
        };

        let is_healthy = database.is_healthy() && cache.is_healthy();
        let status = if is_healthy {
            actix_web::http::StatusCode::OK
        } else {
            actix_web::http::StatusCode::SERVICE_UNAVAILABLE
        };

        HttpResponse::build(status).json(serde_json::json!({
            "status": if is_healthy { "healthy" } else { "unhealthy" },
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "response_time_ms": start.elapsed().as_millis() as u64,
            "checks": {
                "database": database,
                "cache": cache,
            }
        }))
    }
}

/// Health 路由配置
pub fn health_routes() -> actix_web::Scope {
    web::scope("/health")
        .route("", web::get().to(HealthService::health_check))
        .route("/ready", web::get().to(HealthService::readiness_check))
        .route("/detailed", web::get().to(HealthService::detailed_check))
}
