// crates/cf_config/src/tuning.rs

//! 求解器调优参数
//!
//! 收敛容差与崩溃阈值没有理论推导，作为可调配置而非固定常数。

use serde::{Deserialize, Serialize};

/// 扩散系数取法
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DiffusionModel {
    /// `nu = rho / mu`，与既有结果保持一致
    #[default]
    DensityOverViscosity,
    /// `nu = mu / rho`，常规运动黏度
    Kinematic,
}

impl DiffusionModel {
    /// 由密度和动力黏度计算扩散系数
    #[inline]
    pub fn coefficient(self, rho: f64, mu: f64) -> f64 {
        match self {
            Self::DensityOverViscosity => rho / mu,
            Self::Kinematic => mu / rho,
        }
    }
}

/// 求解器调优参数
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolverTuning {
    /// 每个单元的松弛收敛容差，总阈值按 `wp * hp` 线性放大
    #[serde(default = "default_relax_tolerance")]
    pub relax_tolerance: f64,

    /// 源项幅值上限，超过即判定显式格式发散
    #[serde(default = "default_source_limit")]
    pub source_limit: f64,

    /// 每隔多少次松弛扫描检查一次暂停信号
    #[serde(default = "default_pause_check_interval")]
    pub pause_check_interval: u64,

    /// 单个时间步的最大扫描次数（None 表示直到收敛）
    #[serde(default)]
    pub max_sweeps: Option<u64>,

    /// 扩散系数取法
    #[serde(default)]
    pub diffusion: DiffusionModel,
}

fn default_relax_tolerance() -> f64 { 1e-6 }
fn default_source_limit() -> f64 { 1e8 }
fn default_pause_check_interval() -> u64 { 1000 }

impl Default for SolverTuning {
    fn default() -> Self {
        Self {
            relax_tolerance: default_relax_tolerance(),
            source_limit: default_source_limit(),
            pause_check_interval: default_pause_check_interval(),
            max_sweeps: None,
            diffusion: DiffusionModel::default(),
        }
    }
}

impl SolverTuning {
    /// 给定分辨率下的 L1 收敛阈值
    #[inline]
    pub fn convergence_threshold(&self, wp: usize, hp: usize) -> f64 {
        self.relax_tolerance * (wp * hp) as f64
    }

    /// 设置暂停检查间隔
    pub fn with_pause_check_interval(mut self, interval: u64) -> Self {
        self.pause_check_interval = interval;
        self
    }

    /// 设置源项上限
    pub fn with_source_limit(mut self, limit: f64) -> Self {
        self.source_limit = limit;
        self
    }
}
