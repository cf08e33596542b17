// crates/cf_config/src/lib.rs

//! CavityFlow Config Layer (Layer 2)
//!
//! 配置层，描述一次模拟运行的全部输入。
//!
//! # 模块概览
//!
//! - [`boundary`]: 计算域四条边的边界条件
//! - [`obstacle`]: 障碍物形状及其点包含判定
//! - [`tuning`]: 求解器调优参数（收敛容差、崩溃阈值、暂停检查间隔）
//! - [`params`]: `SimulationParams` 完整运行参数（JSON 加载/保存与验证）
//! - [`error`]: 配置错误类型
//!
//! # 层级架构
//!
//! ```text
//! Layer 5: cf_cli       ─> loads SimulationParams, drives the scheduler
//! Layer 4: cf_workflow  ─> SimulationScheduler, FrameHistory
//! Layer 3: cf_physics   ─> Topology, BoundaryEnforcer, Simulator
//! Layer 2: cf_config    ─> SimulationParams (本层)
//! Layer 1: cf_foundation
//! ```
//!
//! `SimulationParams` 由外部配置层一次性完整构造，构造 `Simulator` 之后不可变。

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod boundary;
pub mod error;
pub mod obstacle;
pub mod params;
pub mod tuning;

/// 层级标识
pub const LAYER: u8 = 2;

// 重导出核心类型
pub use boundary::{BoundaryCond, ConditionType, DomainBoundaries, Edge};
pub use error::ConfigError;
pub use obstacle::ObstacleShape;
pub use params::SimulationParams;
pub use tuning::{DiffusionModel, SolverTuning};
