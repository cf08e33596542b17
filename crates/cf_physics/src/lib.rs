// crates/cf_physics/src/lib.rs

//! 物理求解器模块
//!
//! 提供不可压缩二维流动的显式有限差分求解，包括：
//! - 帧数据 (frame) - 压力/速度快照与统计
//! - 拓扑分类 (topology) - 固体栅格化、内部单元判定、压力参考锚定
//! - 边界施加 (boundary) - 外边与障碍物邻接单元的速度/压力条件
//! - 引擎核心 (engine) - 源项、Jacobi 松弛、显式速度推进与崩溃检测
//!
//! # 数据流
//!
//! ```text
//! SimulationParams ─> Topology ─┬─> BoundaryEnforcer
//!                               └─> Simulator ─> SimFrame ─> (cf_workflow history)
//! ```
//!
//! 数值发散不以 `Err` 返回，而是让 [`Simulator`] 进入终止的 `Crashed` 状态，
//! 最后一个有效帧保持可读。

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod boundary;
pub mod engine;
pub mod frame;
pub mod topology;

// 重导出常用类型
pub use boundary::BoundaryEnforcer;
pub use engine::{
    CentralDifference, CrashReason, JacobiRelaxation, NeverPause, PauseSignal, ProjectionScheme,
    Simulator, StepOutcome, StepPhase, StepReport, Stencil,
};
pub use frame::{FrameStats, SimFrame};
pub use topology::Topology;
