// crates/cf_physics/src/engine/mod.rs

//! 压力投影引擎
//!
//! # 模块结构
//!
//! - `signal` - 协作式暂停信号
//! - `scheme` - 离散格式策略（源项与速度推进）
//! - `relaxation` - 压力泊松方程的 Jacobi 松弛
//! - `simulator` - 单步状态机与双缓冲帧
//!
//! # 时间步
//!
//! ```text
//! Fresh ──源项──> PoissonInProgress { sweeps } ──收敛──> 速度推进 ──> 边界 ──> 交换 ──> Fresh
//!                        │   ^
//!                        │   └── Suspended（检查点处收到暂停请求）
//!                        └──> Crashed（源项溢出 / 压力 NaN / 速度 NaN）
//! ```

pub mod relaxation;
pub mod scheme;
pub mod signal;
pub mod simulator;

// 重导出常用类型
pub use relaxation::JacobiRelaxation;
pub use scheme::{CentralDifference, ProjectionScheme, Stencil};
pub use signal::{NeverPause, PauseSignal};
pub use simulator::{CrashReason, Simulator, StepOutcome, StepPhase, StepReport};
