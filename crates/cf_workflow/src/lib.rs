// crates/cf_workflow/src/lib.rs

//! CavityFlow 工作流层 (Layer 4)
//!
//! 在独立工作线程上驱动 [`Simulator`](cf_physics::Simulator)，并把结果提供给任意数量的读取方。
//!
//! # 模块结构
//!
//! - [`history`]: 帧历史与抽稀
//! - [`events`]: 事件系统
//! - [`scheduler`]: 调度器与控制句柄
//! - [`error`]: 调度错误
//!
//! # 示例
//!
//! ```rust,no_run
//! use cf_config::SimulationParams;
//! use cf_physics::Simulator;
//! use cf_workflow::{SchedulerEvent, SimulationScheduler};
//!
//! let mut params = SimulationParams::lid_driven_cavity(33);
//! params.auto_stop_time = Some(0.5);
//!
//! let scheduler = SimulationScheduler::new(Simulator::new(params)?);
//! let events = scheduler.subscribe();
//! let handle = scheduler.spawn()?;
//!
//! for event in events.iter() {
//!     if matches!(event, SchedulerEvent::AutoStopped { .. } | SchedulerEvent::Crashed { .. }) {
//!         break;
//!     }
//! }
//! println!("{} frames archived", handle.history_len());
//! let _simulator = handle.stop()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod events;
pub mod history;
pub mod scheduler;

/// 层级标识
pub const LAYER: u8 = 4;

// 重导出核心类型
pub use error::SchedulerError;
pub use events::{
    ChannelListener, EventDispatcher, EventListener, FnListener, LoggingListener, SchedulerEvent,
};
pub use history::{ArchivedFrame, FrameHistory};
pub use scheduler::{Progress, SchedulerHandle, SchedulerState, SimulationScheduler};
