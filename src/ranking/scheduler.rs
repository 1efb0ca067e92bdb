//! 刷新任务调度
//!
//! 每小时的第 30 分钟（本地时区）触发一次刷新，进程启动时可以先跑
//! 一次预热。入口在确认本进程为 primary 后才注册本任务，其余副本只
//! 读 primary 发布的排行。错过的触发直接丢弃，不补偿。

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local, Timelike};
use tracing::{error, info};

use crate::ranking::RankingRefresher;

/// 每小时的触发分钟
const FIRE_MINUTE: u32 = 30;

/// 启动后台刷新任务
pub fn spawn(refresher: Arc<RankingRefresher>, refresh_at_startup: bool) {
    tokio::spawn(async move {
        if refresh_at_startup {
            run_once(&refresher).await;
        }

        loop {
            let wait = duration_until_next_firing(Local::now());
            tokio::time::sleep(wait).await;
            run_once(&refresher).await;
        }
    });

    info!(
        "Ranking refresher scheduled at minute {} of every hour",
        FIRE_MINUTE
    );
}

async fn run_once(refresher: &RankingRefresher) {
    match refresher.refresh().await {
        Ok(Some(map)) => {
            info!("Ranking refresh completed: {} domains", map.len());
        }
        Ok(None) => {
            info!("Ranking refresh skipped: no analytics rows");
        }
        Err(e) => {
            // 失败等下一次触发重试，旧缓存继续服务
            error!("Ranking refresh failed: {}", e);
        }
    }
}

/// 距离下一个「分钟 30」的时长
fn duration_until_next_firing(now: DateTime<Local>) -> Duration {
    let this_hour = now
        .with_minute(FIRE_MINUTE)
        .and_then(|t| t.with_second(0))
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(now);

    let next = if this_hour > now {
        this_hour
    } else {
        this_hour + chrono::Duration::hours(1)
    };

    (next - now).to_std().unwrap_or(Duration::from_secs(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn local(h: u32, m: u32, s: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 8, 2, h, m, s).unwrap()
    }

    #[test]
    fn test_before_half_hour_fires_same_hour() {
        let wait = duration_until_next_firing(local(10, 12, 0));
        assert_eq!(wait, Duration::from_secs(18 * 60));
    }

    #[test]
    fn test_after_half_hour_fires_next_hour() {
        let wait = duration_until_next_firing(local(10, 45, 0));
        assert_eq!(wait, Duration::from_secs(45 * 60));
    }

    #[test]
    fn test_exactly_on_the_minute_waits_a_full_hour() {
        let wait = duration_until_next_firing(local(10, 30, 0));
        assert_eq!(wait, Duration::from_secs(3600));
    }

    #[test]
    fn test_seconds_are_accounted_for() {
        let wait = duration_until_next_firing(local(10, 29, 30));
        assert_eq!(wait, Duration::from_secs(30));
    }
}
