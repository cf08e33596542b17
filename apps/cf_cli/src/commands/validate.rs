// apps/cf_cli/src/commands/validate.rs

//! 配置验证命令
//!
//! 加载并验证配置，然后报告拓扑分类结果。

use std::path::PathBuf;

use anyhow::{bail, Result};
use cf_config::SimulationParams;
use cf_physics::{BoundaryEnforcer, Topology};
use clap::Args;
use tracing::{error, warn};

/// 验证参数
#[derive(Args)]
pub struct ValidateArgs {
    /// 配置文件路径（JSON）
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// 未给配置文件时方腔的分辨率
    #[arg(short = 'n', long, default_value = "33")]
    pub resolution: usize,

    /// 严格模式（警告也视为失败）
    #[arg(long)]
    pub strict: bool,
}

/// 验证结果
#[derive(Default)]
struct ValidationResult {
    errors: Vec<String>,
    warnings: Vec<String>,
}

impl ValidationResult {
    fn add_error(&mut self, msg: impl Into<String>) {
        self.errors.push(msg.into());
    }

    fn add_warning(&mut self, msg: impl Into<String>) {
        self.warnings.push(msg.into());
    }

    fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    fn is_ok_strict(&self) -> bool {
        self.errors.is_empty() && self.warnings.is_empty()
    }
}

/// 执行验证命令
pub fn execute(args: ValidateArgs) -> Result<()> {
    let mut result = ValidationResult::default();

    match super::load_params(args.config.as_deref(), args.resolution) {
        Ok(params) => check_params(&params, &mut result),
        Err(err) => result.add_error(format!("{:#}", err)),
    }

    print_validation_result(&result, args.strict)
}

fn check_params(params: &SimulationParams, result: &mut ValidationResult) {
    println!("=== 配置 ===");
    println!("区域: {} x {}", params.width, params.height);
    println!("网格: {} x {} ({} 个单元)", params.wp, params.hp, params.cell_count());
    println!("时间步长: {} s, 每帧 {} 步", params.dt, params.steps_per_frame);
    println!("障碍物: {}", params.obstacles.len());

    if !params.boundaries.has_pressure_reference() {
        result.add_warning("没有 Dirichlet 压力边界，压力只在相差常数意义下确定");
    }
    let ratio = params.dx() / params.dy();
    if !(0.1..=10.0).contains(&ratio) {
        result.add_warning(format!("网格纵横比 dx/dy = {:.3} 偏离 1 较大", ratio));
    }
    let nu = params.diffusion_coefficient();
    let fourier = nu * params.dt * (1.0 / (params.dx() * params.dx()) + 1.0 / (params.dy() * params.dy()));
    if fourier > 0.5 {
        result.add_warning(format!("扩散数 {:.3} 大于 0.5，显式格式可能发散", fourier));
    }

    let topology = Topology::classify(params);
    let enforcer = BoundaryEnforcer::new(&topology, params.boundaries);

    println!("\n=== 拓扑 ===");
    println!("固体单元: {}", topology.solid_count());
    println!("独立单元: {}", topology.indep_count());
    println!("连通流体区域: {}", topology.region_count());
    println!("内部锚点: {}", topology.anchors().len());
    println!("障碍物表面单元: {}", enforcer.face_count());

    if topology.indep_count() == 0 {
        result.add_error("没有独立单元，障碍物覆盖了整个内部");
    }
    if !topology.is_complete() {
        result.add_error("存在既无 Dirichlet 边界也无锚点的压力区域");
    }
    if !topology.anchors().is_empty() {
        result.add_warning(format!(
            "{} 个流体区域与 Dirichlet 压力边界不连通，已钉住内部参考压力",
            topology.anchors().len()
        ));
    }
}

fn print_validation_result(result: &ValidationResult, strict: bool) -> Result<()> {
    println!("\n=== 验证结果 ===");

    if !result.errors.is_empty() {
        println!("\n错误 ({}):", result.errors.len());
        for err in &result.errors {
            error!("  ✗ {}", err);
            println!("  ✗ {}", err);
        }
    }

    if !result.warnings.is_empty() {
        println!("\n警告 ({}):", result.warnings.len());
        for warning in &result.warnings {
            warn!("  ⚠ {}", warning);
            println!("  ⚠ {}", warning);
        }
    }

    let success = if strict {
        result.is_ok_strict()
    } else {
        result.is_ok()
    };

    if success {
        println!("\n✓ 验证通过");
        Ok(())
    } else {
        println!("\n✗ 验证失败");
        bail!(
            "验证失败：发现 {} 个错误，{} 个警告",
            result.errors.len(),
            result.warnings.len()
        )
    }
}
