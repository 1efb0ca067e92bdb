//! Server mode
//!
//! Configures and starts the HTTP server with all routes, registers the
//! ranking refresher when this process is primary, and listens for
//! graceful shutdown signals.

use actix_cors::Cors;
use actix_web::middleware::Compress;
use actix_web::{web, App, HttpServer};
use anyhow::Result;
use tracing::{info, warn};

use crate::config::{AppConfig, CorsConfig};
use crate::ranking::scheduler;
use crate::services::{health_routes, redirect_routes, reporting_routes, HealthService};
use crate::system::shutdown;

/// Build CORS middleware from configuration
fn build_cors_middleware(cors_config: &CorsConfig) -> Cors {
    if cors_config.origin == "*" {
        return Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header();
    }

    Cors::default()
        .allowed_origin(&cors_config.origin)
        .allow_any_method()
        .allow_any_header()
}

/// Run the HTTP server
///
/// This function:
/// 1. Wires components (datastores, caches, engine, refresher)
/// 2. Registers the refresh schedule on the primary replica
/// 3. Configures and starts the HTTP server
/// 4. Listens for graceful shutdown signals
///
/// **Note**: Logging system must be initialized before calling this function
pub async fn run_server(config: &AppConfig) -> Result<()> {
    let state = crate::runtime::startup::prepare_server_startup(config).await;

    // Rust 部署是单进程多 worker：本进程即 primary，由入口决定是否
    // 注册刷新任务，其余副本只读 primary 发布的排行
    if let Some(components) = &state.components {
        if config.refresher.enabled {
            scheduler::spawn(
                components.refresher.clone(),
                config.refresher.refresh_at_startup,
            );
        } else {
            warn!("Ranking refresher is disabled, this replica only reads published rankings");
        }
    }

    let workers = if config.server.cluster_enabled {
        config.server.workers.max(1)
    } else {
        1
    };
    info!("Using {} HTTP workers", workers);

    let bind_address = format!("{}:{}", config.server.host, config.server.port);
    info!("Starting server at http://{}", bind_address);

    let cors_config = config.cors.clone();
    let app_state = state.clone();

    let server = HttpServer::new(move || {
        let cors = build_cors_middleware(&cors_config);

        App::new()
            .wrap(cors)
            .wrap(Compress::default())
            .app_data(web::Data::new(app_state.clone()))
            .route("/ping", web::get().to(HealthService::ping))
            .service(health_routes())
            .service(reporting_routes())
            .service(redirect_routes())
    })
    .keep_alive(std::time::Duration::from_secs(30))
    .client_request_timeout(std::time::Duration::from_millis(5000))
    .workers(workers)
    .bind(&bind_address)?
    .run();

    // Wait for server or shutdown signal
    tokio::select! {
        res = server => {
            res?;
        }
        _ = shutdown::listen_for_shutdown() => {
            warn!("Graceful shutdown: all tasks completed");
        }
    }

    Ok(())
}
