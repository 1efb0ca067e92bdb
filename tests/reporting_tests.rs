//! Reporting and health endpoint tests

use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::test::{self, TestRequest};
use actix_web::{web, App};
use async_trait::async_trait;
use chrono::Utc;

use redron::cache::{MemorySharedCache, RankingCache, SharedCache};
use redron::dispatch::{ClickRecorder, DispatchEngine};
use redron::domains::DomainRegistry;
use redron::errors::{RedronError, Result};
use redron::ranking::RankingRefresher;
use redron::services::{health_routes, reporting_routes, AppComponents, AppState, HealthService};
use redron::storage::analytics::GamTotals;
use redron::storage::clicks::ClickTotals;
use redron::storage::models::{AnalyticsRow, ClickCounter, LinkRecord};
use redron::storage::{AnalyticsRepository, ClickStore, LinkStore};

// =============================================================================
// Mocks
// =============================================================================

struct StubAnalytics;

#[async_trait]
impl AnalyticsRepository for StubAnalytics {
    async fn best_post_rows(
        &self,
        _date: &str,
        _domains: &[String],
        _custom_key: &str,
    ) -> Result<Vec<AnalyticsRow>> {
        Ok(Vec::new())
    }

    async fn distinct(&self, field: &str) -> Result<Vec<String>> {
        match field {
            "domain" => Ok(vec!["a.com".to_string(), "b.com".to_string()]),
            _ => Err(RedronError::validation(format!(
                "field '{field}' is not queryable"
            ))),
        }
    }

    async fn daily_totals(&self, date: &str) -> Result<GamTotals> {
        Ok(GamTotals {
            date: date.to_string(),
            impressions: 10_000.0,
            clicks: 250.0,
            revenue: 42.0,
            ecpm: 4.2,
        })
    }
}

struct StubLinks;

#[async_trait]
impl LinkStore for StubLinks {
    async fn deactivate_all(&self) -> Result<u64> {
        Ok(0)
    }

    async fn upsert_active(&self, _domain: &str, _url: &str) -> Result<()> {
        Ok(())
    }

    async fn list(&self, active: Option<bool>) -> Result<Vec<LinkRecord>> {
        let all = vec![
            LinkRecord {
                id: None,
                domain: "a.com".to_string(),
                url: "https://a.com/?p=1".to_string(),
                status: true,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            },
            LinkRecord {
                id: None,
                domain: "a.com".to_string(),
                url: "https://a.com/?p=9".to_string(),
                status: false,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            },
        ];
        Ok(match active {
            Some(status) => all.into_iter().filter(|r| r.status == status).collect(),
            None => all,
        })
    }
}

struct StubClicks;

#[async_trait]
impl ClickStore for StubClicks {
    async fn increment_click(&self, link_id: &str) -> Result<ClickCounter> {
        Ok(ClickCounter {
            id: None,
            link_id: link_id.to_string(),
            count: 1,
            created_at: Utc::now(),
        })
    }

    async fn totals(&self, _top_n: i64) -> Result<ClickTotals> {
        Ok(ClickTotals {
            total: 37,
            links: 2,
            top: vec![ClickCounter {
                id: None,
                link_id: "best_a.com_1".to_string(),
                count: 30,
                created_at: Utc::now(),
            }],
        })
    }
}

// =============================================================================
// Test Setup
// =============================================================================

fn test_state() -> AppState {
    let cache: Arc<dyn SharedCache> = Arc::new(MemorySharedCache::new());
    let registry = Arc::new(DomainRegistry::from_static());
    let rankings = Arc::new(RankingCache::new(Arc::clone(&cache), 60));
    let analytics: Arc<dyn AnalyticsRepository> = Arc::new(StubAnalytics);
    let links: Arc<dyn LinkStore> = Arc::new(StubLinks);
    let clicks: Arc<dyn ClickStore> = Arc::new(StubClicks);

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
        registry,
    ));

    AppState::new(Some(Arc::new(AppComponents {
        cache,
        rankings,
        engine,
        recorder,
        refresher,
        analytics,
        links,
        clicks,
        database: None,
    })))
}

macro_rules! api_app {
    ($state:expr) => {{
        test::init_service(
            App::new()
                .app_data(web::Data::new($state))
                .route("/ping", web::get().to(HealthService::ping))
                .service(health_routes())
                .service(reporting_routes()),
        )
        .await
    }};
}

// =============================================================================
// Reporting Tests
// =============================================================================

#[tokio::test]
async fn test_distinct_rejects_unknown_field() {
    let app = api_app!(test_state());

    let req = TestRequest::get().uri("/api/distinct/password").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert!(body["error"].as_str().unwrap().contains("password"));
    assert!(body["validFields"]
        .as_array()
        .unwrap()
        .contains(&serde_json::json!("domain")));
}

#[tokio::test]
async fn test_distinct_returns_values() {
    let app = api_app!(test_state());

    let req = TestRequest::get().uri("/api/distinct/domain").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["data"], serde_json::json!(["a.com", "b.com"]));
}

#[tokio::test]
async fn test_links_filterable_by_status() {
    let app = api_app!(test_state());

    let resp =
        test::call_service(&app, TestRequest::get().uri("/api/links").to_request()).await;
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    let resp = test::call_service(
        &app,
        TestRequest::get().uri("/api/links?active=true").to_request(),
    )
    .await;
    let body: serde_json::Value = test::read_body_json(resp).await;
    let data = body["data"].as_array().unwrap();
    assert_eq!(data.len(), 1);
    assert_eq!(data[0]["status"], true);
}

#[tokio::test]
async fn test_stats_has_three_blocks() {
    let app = api_app!(test_state());

    let resp =
        test::call_service(&app, TestRequest::get().uri("/api/stats").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["gam"]["ecpm"], 4.2);
    assert_eq!(body["data"]["clicks"]["total"], 37);
    assert_eq!(body["data"]["traffic"]["sorted_domains"], 0);
}

#[tokio::test]
async fn test_api_degraded_returns_503() {
    let app = api_app!(AppState::degraded());

    for uri in ["/api/stats", "/api/links", "/api/process", "/api/distinct/domain"] {
        let resp = test::call_service(&app, TestRequest::get().uri(uri).to_request()).await;
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE, "{uri}");
    }
}

// =============================================================================
// Health Tests
// =============================================================================

#[tokio::test]
async fn test_ping() {
    let app = api_app!(test_state());

    let resp = test::call_service(&app, TestRequest::get().uri("/ping").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = test::read_body(resp).await;
    assert_eq!(body, web::Bytes::from_static(b"pong"));
}

#[tokio::test]
async fn test_health_responds_even_when_degraded() {
    let app = api_app!(AppState::degraded());

    let resp = test::call_service(&app, TestRequest::get().uri("/health").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["degraded"], true);
}

#[tokio::test]
async fn test_readiness_reflects_wiring() {
    let app = api_app!(test_state());
    let resp =
        test::call_service(&app, TestRequest::get().uri("/health/ready").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let app = api_app!(AppState::degraded());
    let resp =
        test::call_service(&app, TestRequest::get().uri("/health/ready").to_request()).await;
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_detailed_health_503_without_database() {
    // database 句柄缺席时详细检查必须报告不可用
    let app = api_app!(test_state());

    let resp =
        test::call_service(&app, TestRequest::get().uri("/health/detailed").to_request()).await;
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["checks"]["cache"]["status"], "healthy");
    assert_eq!(body["checks"]["database"]["status"], "unhealthy");
}
