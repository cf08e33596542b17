// apps/cf_cli/src/commands/run.rs

//! 运行模拟命令
//!
//! 在后台调度器上推进模拟，直到越过自动停止时间、达到墙钟时长上限或求解器崩溃。

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use clap::Args;
use cf_physics::Simulator;
use cf_workflow::{ArchivedFrame, LoggingListener, SchedulerEvent, SimulationScheduler};
use crossbeam_channel::RecvTimeoutError;
use tracing::{info, warn};

/// 运行模拟参数
#[derive(Args)]
pub struct RunArgs {
    /// 配置文件路径（JSON）
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// 未给配置文件时方腔的分辨率
    #[arg(short = 'n', long, default_value = "33")]
    pub resolution: usize,

    /// 自动停止的模拟时间 [s]，覆盖配置文件
    #[arg(short = 't', long)]
    pub end_time: Option<f64>,

    /// 墙钟时长上限 [s]
    #[arg(long, default_value = "60")]
    pub max_seconds: f64,

    /// 归档帧统计输出路径（JSON）
    #[arg(short, long)]
    pub summary: Option<PathBuf>,

    /// 记录每个归档帧的统计量
    #[arg(short, long)]
    pub verbose: bool,
}

/// 执行运行命令
pub fn execute(args: RunArgs) -> Result<()> {
    info!("=== CavityFlow 模拟启动 ===");

    let mut params = super::load_params(args.config.as_deref(), args.resolution)?;
    if let Some(end_time) = args.end_time {
        params.auto_stop_time = Some(end_time);
        params.validate().context("自动停止时间无效")?;
    }
    if !(args.max_seconds.is_finite() && args.max_seconds > 0.0) {
        bail!("墙钟时长上限必须为正数: {}", args.max_seconds);
    }

    info!(
        "网格: {}x{}, dx={:.4e}, dy={:.4e}, dt={:.4e}",
        params.wp,
        params.hp,
        params.dx(),
        params.dy(),
        params.dt
    );
    match params.auto_stop_time {
        Some(t) => info!("自动停止时间: {} s", t),
        None => info!("未设置自动停止时间，最长运行 {} s", args.max_seconds),
    }

    let simulator = Simulator::new(params).context("构建求解器失败")?;
    info!(
        "拓扑: {} 个独立单元, {} 个连通区域, {} 个内部锚点",
        simulator.topology().indep_count(),
        simulator.topology().region_count(),
        simulator.topology().anchors().len()
    );

    let mut listener = LoggingListener::new("cavityflow");
    if args.verbose {
        listener = listener.verbose();
    }
    let scheduler = SimulationScheduler::new(simulator).with_listener(Arc::new(listener));
    let events = scheduler.subscribe();

    let start = Instant::now();
    let deadline = start + Duration::from_secs_f64(args.max_seconds);
    let handle = scheduler.spawn().context("启动调度器失败")?;

    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match events.recv_timeout(remaining) {
            Ok(SchedulerEvent::AutoStopped { .. }) => break,
            Ok(SchedulerEvent::Crashed { reason, .. }) => {
                warn!("求解器崩溃: {}", reason);
                break;
            }
            Ok(_) => continue,
            Err(RecvTimeoutError::Timeout) => {
                info!("达到墙钟时长上限");
                break;
            }
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    let frames = handle.frames();
    let progress = handle.progress();
    let simulator = handle.stop().context("停止调度器失败")?;
    let elapsed = start.elapsed();

    if let Some(latest) = frames.last() {
        let stats = latest.frame.stats();
        info!(
            "最终帧 {}: t={:.4} s, max |u|={:.4e}, p in [{:.4e}, {:.4e}], mean p={:.4e}",
            latest.index,
            latest.time,
            stats.max_speed,
            stats.min_pressure,
            stats.max_pressure,
            stats.mean_pressure
        );
    }

    info!("=== 模拟结束 ({}) ===", progress.state);
    info!("总步数: {}", simulator.steps());
    info!("计算帧数: {}", progress.completed_frames);
    info!("归档帧数: {}", frames.len());
    info!("散度 L1: {:.4e}", simulator.divergence_l1());
    info!("计算时间: {:.2} s", elapsed.as_secs_f64());

    if let Some(path) = &args.summary {
        let summary = summarize(&frames);
        let content = serde_json::to_string_pretty(&summary)?;
        std::fs::write(path, content)
            .with_context(|| format!("写入统计失败: {}", path.display()))?;
        info!("统计已写入: {}", path.display());
    }

    if let Some(reason) = simulator.crash_reason() {
        bail!("模拟在 t={:.4} s 崩溃: {}", simulator.time(), reason);
    }
    Ok(())
}

/// 每个归档帧的统计量
fn summarize(frames: &[ArchivedFrame]) -> serde_json::Value {
    let entries: Vec<serde_json::Value> = frames
        .iter()
        .map(|f| {
            serde_json::json!({
                "index": f.index,
                "time": f.time,
                "stats": f.frame.stats(),
            })
        })
        .collect();
    serde_json::json!({ "frames": entries })
}
