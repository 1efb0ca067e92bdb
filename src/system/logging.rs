//! 日志初始化
//!
//! 从 `LoggingConfig` 装配 tracing 管线：级别过滤、stdout 或文件输出
//! （可选按天滚动，保留 `max_backups` 份）、json/pretty 两种格式。
//! 文件目标打开失败时退回 stdout，进程不因日志配置而拒绝启动。

use std::io::Write;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::EnvFilter;

use crate::config::{AppConfig, LoggingConfig};

/// 持有 non-blocking writer 的后台线程句柄，随进程存活
pub struct LoggingGuard {
    _worker: WorkerGuard,
}

/// Install the global tracing subscriber. Call exactly once, right after
/// the configuration is loaded. The returned guard must be kept alive
/// until the process exits or buffered log lines are lost.
pub fn init_logging(config: &AppConfig) -> LoggingGuard {
    let logging = &config.logging;

    let (writer, to_file) = match open_log_target(logging) {
        Ok(Some(target)) => (target, true),
        Ok(None) => (stdout_target(), false),
        Err(e) => {
            // tracing 还没起来，只能走 stderr
            eprintln!("redron: log file unavailable ({e}), writing to stdout");
            (stdout_target(), false)
        }
    };

    let (writer, worker) = tracing_appender::non_blocking(writer);

    let filter =
        EnvFilter::try_new(&logging.level).unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(!to_file);

    if logging.format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }

    LoggingGuard { _worker: worker }
}

fn stdout_target() -> Box<dyn Write + Send + Sync> {
    Box::new(std::io::stdout())
}

/// 解析文件日志目标
///
/// 未配置文件时返回 `Ok(None)`；配置了滚动则把 `logging.file` 拆成
/// 目录 + 文件名主干，交给按天滚动的 appender 并限制保留份数。
fn open_log_target(config: &LoggingConfig) -> std::io::Result<Option<Box<dyn Write + Send + Sync>>> {
    let Some(path) = config.file.as_deref().filter(|p| !p.is_empty()) else {
        return Ok(None);
    };

    if !config.enable_rotation {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        return Ok(Some(Box::new(file)));
    }

    let path = Path::new(path);
    let dir = path
        .parent()
        .filter(|d| !d.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(env!("CARGO_PKG_NAME"));

    let appender = rolling::Builder::new()
        .rotation(rolling::Rotation::DAILY)
        .filename_prefix(stem)
        .filename_suffix("log")
        .max_log_files(config.max_backups.max(1) as usize)
        .build(dir)
        .map_err(std::io::Error::other)?;

    Ok(Some(Box::new(appender)))
}
