// apps/cf_cli/src/main.rs

//! CavityFlow 命令行界面
//!
//! - `run`：加载 JSON 配置（或按 `-n` 构造方腔驱动流），在后台调度器上推进，
//!   直到越过自动停止时间、达到墙钟上限或求解器崩溃，最后汇报帧统计与散度
//! - `validate`：验证配置并报告拓扑分类（独立单元、连通区域、内部锚点）
//! - `info`：打印默认调优参数，`--json` 输出默认方腔配置
//!
//! 日志经 `tracing_subscriber` 输出到终端，级别由 `--log-level` 控制。

mod commands;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// CavityFlow 不可压缩流求解器命令行工具
#[derive(Parser)]
#[command(name = "cf_cli")]
#[command(author = "CavityFlow Team")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "CavityFlow incompressible 2D flow solver", long_about = None)]
struct Cli {
    /// 日志级别 (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 运行模拟
    Run(commands::run::RunArgs),
    /// 显示信息
    Info(commands::info::InfoArgs),
    /// 验证配置
    Validate(commands::validate::ValidateArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // 初始化日志
    let level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Run(args) => commands::run::execute(args),
        Commands::Info(args) => commands::info::execute(args),
        Commands::Validate(args) => commands::validate::execute(args),
    }
}
