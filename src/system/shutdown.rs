use tokio::signal;
use tracing::{info, warn};

/// 等待进程终止信号（Ctrl+C 或 SIGTERM）
///
/// 热路径上的 fire-and-forget 写入由 tokio 运行时在 server future
/// 结束前自行排空，这里不需要额外的刷盘任务。
pub async fn listen_for_shutdown() {
    #[cfg(unix)]
    {
        let mut sigterm = match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(sig) => sig,
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                wait_for_ctrl_c().await;
                return;
            }
        };

        tokio::select! {
            _ = wait_for_ctrl_c() => {}
            _ = sigterm.recv() => {
                info!("SIGTERM received, shutting down...");
            }
        }
    }

    #[cfg(not(unix))]
    wait_for_ctrl_c().await;
}

async fn wait_for_ctrl_c() {
    match signal::ctrl_c().await {
        Ok(()) => {
            info!("Shutdown signal received, shutting down...");
        }
        Err(e) => {
            warn!(
                "Failed to listen for Ctrl+C: {}. Proceeding with shutdown anyway.",
                e
            );
        }
    }
}
