use actix_web::{web, HttpRequest, HttpResponse, Responder};
use tracing::{debug, error, trace};

use crate::dispatch::DispatchParams;
use crate::services::{degraded_response, AppState};
use crate::utils::ip::client_ip;

/// 兜底跳转：Steps 2-9 里任何异常都 302 到这里，绝不 5xx
pub const EMERGENCY_FALLBACK_URL: &str = "https://useuapp.com/random";

pub struct RedirectService;

impl RedirectService {
    /// `GET /` — the dispatch hot path.
    pub async fn handle_dispatch(
        req: HttpRequest,
        query: web::Query<DispatchParams>,
        state: web::Data<AppState>,
    ) -> impl Responder {
        // favicon 请求直接 204，不碰缓存和计数器
        if req.uri().to_string().contains("favicon") {
            trace!("Favicon request short-circuited");
            return HttpResponse::NoContent().finish();
        }

        let Some(components) = state.components.as_ref() else {
            return degraded_response();
        };

        let ip = client_ip(&req);

        match components.engine.dispatch(&ip, &query).await {
            Ok(dispatch) => {
                debug!("Dispatch {} -> {}", ip, dispatch.link_id);

                // 点击计数与防重放备忘都不阻塞响应
                components.recorder.record_click(&dispatch.link_id);
                components.recorder.remember_recent(&ip, &dispatch.url);

                HttpResponse::Found()
                    .insert_header(("Location", dispatch.url))
                    .finish()
            }
            Err(e) => {
                error!("Dispatch failed for {}, emergency fallback: {}", ip, e);
                HttpResponse::Found()
                    .insert_header(("Location", EMERGENCY_FALLBACK_URL))
                    .finish()
            }
        }
    }

    /// Anything that is not a registered route: favicon requests get
    /// their 204, the rest a plain 404.
    pub async fn handle_unmatched(req: HttpRequest) -> impl Responder {
        if req.uri().to_string().contains("favicon") {
            trace!("Favicon request short-circuited");
            return HttpResponse::NoContent().finish();
        }
        HttpResponse::NotFound().json(serde_json::json!({"error": "not found"}))
    }
}

/// Redirect 路由配置
pub fn redirect_routes() -> actix_web::Scope {
    web::scope("")
        .route("/", web::get().to(RedirectService::handle_dispatch))
        .default_service(web::to(RedirectService::handle_unmatched))
}
