// ==========================================
// 课程指标缓存引擎 - 命令行入口
// ==========================================
// 用法:
//   course-metrics [--db <path>]          执行一次批量重算, 输出 JSON 报告
//   course-metrics [--db <path>] --watch  按 batch_interval_minutes 周期执行
// ==========================================

use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use course_metrics::app::{get_default_db_path, AppState};
use course_metrics::logging;

struct CliArgs {
    db_path: String,
    watch: bool,
}

fn parse_args() -> Result<CliArgs> {
    let mut db_path = None;
    let mut watch = false;

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--watch" => watch = true,
            "--db" => {
                db_path = Some(args.next().ok_or_else(|| anyhow!("--db 需要路径参数"))?);
            }
            other => return Err(anyhow!("未知参数: {}", other)),
        }
    }

    Ok(CliArgs {
        db_path: db_path.unwrap_or_else(get_default_db_path),
        watch,
    })
}

/// 执行一次批量重算 (阻塞工作放到 spawn_blocking)
async fn run_once(state: Arc<AppState>) -> Result<()> {
    let report = tokio::task::spawn_blocking(move || {
        state.run_scheduled_batch(Utc::now().naive_utc())
    })
    .await
    .context("批量重算任务异常退出")??;

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init();

    tracing::info!("==================================================");
    tracing::info!("{} v{}", course_metrics::APP_NAME, course_metrics::VERSION);
    tracing::info!("==================================================");

    let args = parse_args()?;
    tracing::info!(db_path = %args.db_path, watch = args.watch, "使用数据库");

    let state = Arc::new(
        AppState::new(args.db_path)
            .await
            .map_err(|e| anyhow!("无法初始化AppState: {}", e))?,
    );

    if let Ok(snapshot) = state.config_manager.get_config_snapshot() {
        tracing::debug!(config = %snapshot, "配置快照");
    }

    if !args.watch {
        return run_once(state).await;
    }

    let period = std::time::Duration::from_secs(state.settings.batch_interval_minutes * 60);
    let mut interval = tokio::time::interval(period);
    tracing::info!(interval_minutes = state.settings.batch_interval_minutes, "进入常驻模式");

    loop {
        tokio::select! {
            _ = interval.tick() => {
                // 单次失败不退出常驻循环
                if let Err(e) = run_once(state.clone()).await {
                    tracing::error!(error = %e, "批量重算失败");
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("收到退出信号");
                break;
            }
        }
    }

    Ok(())
}
