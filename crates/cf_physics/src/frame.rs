// crates/cf_physics/src/frame.rs

//! 模拟帧
//!
//! 一帧是压力场与速度场的完整快照。跨线程时只以 `Arc<SimFrame>` 共享，
//! 归档之后不再修改。

use cf_foundation::{CfError, CfResult, Grid};
use glam::DVec2;
use serde::{Deserialize, Serialize};

/// 压力/速度快照
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimFrame {
    /// 压力场
    pub pressure: Grid<f64>,
    /// 速度场
    pub velocity: Grid<DVec2>,
}

/// 帧统计量
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FrameStats {
    /// 最大速度模
    pub max_speed: f64,
    /// 最小压力
    pub min_pressure: f64,
    /// 最大压力
    pub max_pressure: f64,
    /// 平均压力
    pub mean_pressure: f64,
}

impl SimFrame {
    /// 全零帧
    pub fn zeros(width: usize, height: usize) -> Self {
        Self {
            pressure: Grid::new(width, height),
            velocity: Grid::new(width, height),
        }
    }

    /// 由压力场和速度场组装，尺寸必须一致
    pub fn new(pressure: Grid<f64>, velocity: Grid<DVec2>) -> CfResult<Self> {
        CfError::check_dimensions("velocity", pressure.dimensions(), velocity.dimensions())?;
        Ok(Self { pressure, velocity })
    }

    /// 宽度
    #[inline]
    pub fn width(&self) -> usize {
        self.pressure.width()
    }

    /// 高度
    #[inline]
    pub fn height(&self) -> usize {
        self.pressure.height()
    }

    /// `(width, height)`
    #[inline]
    pub fn dimensions(&self) -> (usize, usize) {
        self.pressure.dimensions()
    }

    /// 整帧赋值，尺寸相同时不重新分配
    pub fn copy_from(&mut self, other: &SimFrame) {
        self.pressure.copy_from(&other.pressure);
        self.velocity.copy_from(&other.velocity);
    }

    /// 所有值是否有限
    pub fn is_finite(&self) -> bool {
        self.pressure.iter().all(|p| p.is_finite()) && self.velocity.iter().all(|v| v.is_finite())
    }

    /// 计算统计量
    pub fn stats(&self) -> FrameStats {
        if self.pressure.is_empty() {
            return FrameStats::default();
        }
        let max_speed = self
            .velocity
            .iter()
            .map(|v| v.length())
            .fold(0.0_f64, f64::max);
        let (min_pressure, max_pressure, sum) = self.pressure.iter().fold(
            (f64::INFINITY, f64::NEG_INFINITY, 0.0),
            |(lo, hi, sum), &p| (lo.min(p), hi.max(p), sum + p),
        );
        FrameStats {
            max_speed,
            min_pressure,
            max_pressure,
            mean_pressure: sum / self.pressure.len() as f64,
        }
    }
}
