// apps/cf_cli/src/commands/info.rs

//! 信息显示命令
//!
//! 显示构建信息和默认配置。

use anyhow::Result;
use cf_config::{SimulationParams, SolverTuning};
use clap::Args;
use tracing::info;

/// 信息显示参数
#[derive(Args)]
pub struct InfoArgs {
    /// 显示系统信息
    #[arg(long)]
    pub system: bool,

    /// 显示默认配置
    #[arg(long)]
    pub defaults: bool,

    /// 以 JSON 输出默认方腔配置
    #[arg(long)]
    pub json: bool,
}

/// 执行信息命令
pub fn execute(args: InfoArgs) -> Result<()> {
    info!("=== CavityFlow 信息 ===");

    if args.json {
        let params = SimulationParams::lid_driven_cavity(33);
        println!("{}", serde_json::to_string_pretty(&params)?);
        return Ok(());
    }

    if args.system {
        print_system_info();
    }

    if args.defaults {
        print_default_config();
    }

    if !args.system && !args.defaults {
        print_system_info();
        println!();
        print_default_config();
    }

    Ok(())
}

fn print_system_info() {
    println!("=== 系统信息 ===");
    println!("CavityFlow CLI 版本: {}", env!("CARGO_PKG_VERSION"));
    println!("目标平台: {}", std::env::consts::ARCH);
    println!("操作系统: {}", std::env::consts::OS);
}

fn print_default_config() {
    println!("=== 默认调优参数 ===");

    let tuning = SolverTuning::default();
    println!("松弛容差 (每单元): {:e}", tuning.relax_tolerance);
    println!("源项上限: {:e}", tuning.source_limit);
    println!("暂停检查间隔: {} 次扫描", tuning.pause_check_interval);
    match tuning.max_sweeps {
        Some(n) => println!("最大扫描次数: {}", n),
        None => println!("最大扫描次数: 直到收敛"),
    }
    println!("扩散系数取法: {:?}", tuning.diffusion);

    let params = SimulationParams::lid_driven_cavity(33);
    println!("\n=== 默认方腔 (33 x 33) ===");
    println!("dt: {} s", params.dt);
    println!("rho: {}, mu: {}", params.rho, params.mu);
    println!("扩散系数: {}", params.diffusion_coefficient());
    println!("每帧步数: {}", params.steps_per_frame);
    println!("历史容量: {}", params.history_capacity);
    println!(
        "收敛阈值 (L1): {:e}",
        tuning.convergence_threshold(params.wp, params.hp)
    );
}
