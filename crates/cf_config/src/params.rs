// crates/cf_config/src/params.rs

//! SimulationParams - 模拟运行参数
//!
//! 一次运行的全部物理、离散和调度参数。由配置层一次性完整构造，
//! 求解器构造后只读共享。

use glam::DVec2;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::boundary::{BoundaryCond, DomainBoundaries};
use crate::error::ConfigError;
use crate::obstacle::ObstacleShape;
use crate::tuning::SolverTuning;

/// 模拟运行参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationParams {
    /// 计算域物理宽度 [m]
    pub width: f64,

    /// 计算域物理高度 [m]
    pub height: f64,

    /// x 方向节点数（≥ 2）
    pub wp: usize,

    /// y 方向节点数（≥ 2）
    pub hp: usize,

    /// 时间步长 [s]
    pub dt: f64,

    /// 四边边界条件
    #[serde(default)]
    pub boundaries: DomainBoundaries,

    /// 密度
    #[serde(default = "default_rho")]
    pub rho: f64,

    /// 黏度
    #[serde(default = "default_mu")]
    pub mu: f64,

    /// 障碍物
    #[serde(default)]
    pub obstacles: Vec<ObstacleShape>,

    /// 自动停止的模拟时间 [s]
    #[serde(default)]
    pub auto_stop_time: Option<f64>,

    /// 每帧包含的时间步数
    #[serde(default = "default_steps_per_frame")]
    pub steps_per_frame: usize,

    /// 帧历史容量（偶数）
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,

    /// 求解器调优参数
    #[serde(default)]
    pub tuning: SolverTuning,
}

fn default_rho() -> f64 { 1.0 }
fn default_mu() -> f64 { 10.0 }
fn default_steps_per_frame() -> usize { 10 }
fn default_history_capacity() -> usize { 256 }

impl Default for SimulationParams {
    fn default() -> Self {
        Self::lid_driven_cavity(41)
    }
}

impl SimulationParams {
    /// 单位方腔顶盖驱动流
    ///
    /// 顶盖以 (1, 0) 运动并作为压力参考边，其余三边为无滑移固壁。
    pub fn lid_driven_cavity(n: usize) -> Self {
        let mut boundaries = DomainBoundaries::uniform(BoundaryCond::wall());
        boundaries.top = BoundaryCond::moving_wall(DVec2::X).with_pressure(0.0);
        Self {
            width: 1.0,
            height: 1.0,
            wp: n,
            hp: n,
            dt: 0.001,
            boundaries,
            rho: default_rho(),
            mu: default_mu(),
            obstacles: Vec::new(),
            auto_stop_time: None,
            steps_per_frame: default_steps_per_frame(),
            history_capacity: default_history_capacity(),
            tuning: SolverTuning::default(),
        }
    }

    /// 带圆柱绕流的槽道
    ///
    /// 左侧速度入流，右侧压力出流，上下为固壁，圆柱位于槽道前三分之一处。
    pub fn channel_with_cylinder(wp: usize, hp: usize, inflow: f64, radius: f64) -> Self {
        let width = 2.0;
        let height = 1.0;
        let boundaries = DomainBoundaries {
            bottom: BoundaryCond::wall(),
            top: BoundaryCond::wall(),
            left: BoundaryCond::inflow(DVec2::new(inflow, 0.0)),
            right: BoundaryCond::outflow(0.0),
        };
        Self {
            width,
            height,
            wp,
            hp,
            dt: 0.0005,
            boundaries,
            obstacles: vec![ObstacleShape::circle(
                DVec2::new(width / 3.0, height / 2.0),
                radius,
            )],
            ..Self::lid_driven_cavity(wp)
        }
    }

    /// x 方向网格间距
    #[inline]
    pub fn dx(&self) -> f64 {
        self.width / (self.wp - 1) as f64
    }

    /// y 方向网格间距
    #[inline]
    pub fn dy(&self) -> f64 {
        self.height / (self.hp - 1) as f64
    }

    /// 节点总数
    #[inline]
    pub fn cell_count(&self) -> usize {
        self.wp * self.hp
    }

    /// 节点 `(x, y)` 的物理坐标
    #[inline]
    pub fn node_position(&self, x: usize, y: usize) -> DVec2 {
        DVec2::new(x as f64 * self.dx(), y as f64 * self.dy())
    }

    /// 每帧对应的模拟时长
    #[inline]
    pub fn frame_duration(&self) -> f64 {
        self.dt * self.steps_per_frame as f64
    }

    /// 扩散系数
    #[inline]
    pub fn diffusion_coefficient(&self) -> f64 {
        self.tuning.diffusion.coefficient(self.rho, self.mu)
    }

    /// 从 JSON 文件加载并验证
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_json_str(&content)
    }

    /// 从 JSON 字符串解析并验证
    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        let params: SimulationParams =
            serde_json::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        params.validate()?;
        Ok(params)
    }

    /// 保存为 JSON 文件
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content =
            serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))?;
        std::fs::write(path, content).map_err(ConfigError::Io)?;
        Ok(())
    }

    /// 验证参数有效性
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("width", self.width)?;
        positive("height", self.height)?;
        positive("dt", self.dt)?;
        positive("rho", self.rho)?;
        positive("mu", self.mu)?;

        if self.wp < 2 {
            return Err(ConfigError::invalid("wp", self.wp, "至少为 2"));
        }
        if self.hp < 2 {
            return Err(ConfigError::invalid("hp", self.hp, "至少为 2"));
        }
        if self.steps_per_frame == 0 {
            return Err(ConfigError::invalid("steps_per_frame", 0, "至少为 1"));
        }
        if self.history_capacity < 2 || self.history_capacity % 2 != 0 {
            return Err(ConfigError::invalid(
                "history_capacity",
                self.history_capacity,
                "必须为不小于 2 的偶数",
            ));
        }
        if let Some(t) = self.auto_stop_time {
            positive("auto_stop_time", t)?;
        }

        for (edge, cond) in self.boundaries.iter() {
            if !cond.velocity_value.is_finite() {
                return Err(ConfigError::invalid(
                    format!("boundaries.{}.velocity_value", edge),
                    cond.velocity_value,
                    "必须为有限值",
                ));
            }
            if !cond.pressure_value.is_finite() {
                return Err(ConfigError::invalid(
                    format!("boundaries.{}.pressure_value", edge),
                    cond.pressure_value,
                    "必须为有限值",
                ));
            }
        }

        for (i, shape) in self.obstacles.iter().enumerate() {
            match shape {
                ObstacleShape::Circle { radius, .. } => {
                    positive_key(format!("obstacles[{}].radius", i), *radius)?;
                }
                ObstacleShape::Polygon { vertices } if vertices.len() < 3 => {
                    return Err(ConfigError::invalid(
                        format!("obstacles[{}].vertices", i),
                        vertices.len(),
                        "多边形至少需要 3 个顶点",
                    ));
                }
                _ => {}
            }
        }

        let tuning = &self.tuning;
        positive("tuning.relax_tolerance", tuning.relax_tolerance)?;
        positive("tuning.source_limit", tuning.source_limit)?;
        if tuning.pause_check_interval == 0 {
            return Err(ConfigError::invalid(
                "tuning.pause_check_interval",
                0,
                "至少为 1",
            ));
        }
        if tuning.max_sweeps == Some(0) {
            return Err(ConfigError::invalid("tuning.max_sweeps", 0, "至少为 1"));
        }

        Ok(())
    }
}

fn positive(key: &str, value: f64) -> Result<(), ConfigError> {
    positive_key(key.to_string(), value)
}

fn positive_key(key: String, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(key, value, "必须为正的有限值"))
    }
}
