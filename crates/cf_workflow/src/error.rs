// crates/cf_workflow/src/error.rs

//! 调度错误
//!
//! 数值崩溃不属于此类错误，它通过 [`SchedulerState::Crashed`](crate::SchedulerState)
//! 和事件报告。

use cf_foundation::CfError;
use thiserror::Error;

/// 调度器错误
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// 底层错误
    #[error(transparent)]
    Core(#[from] CfError),

    /// 工作线程启动失败
    #[error("工作线程启动失败: {0}")]
    Spawn(#[source] std::io::Error),

    /// 工作线程已退出，命令无法送达
    #[error("工作线程已退出")]
    Disconnected,

    /// 工作线程 panic
    #[error("工作线程异常终止")]
    WorkerPanicked,
}

impl From<SchedulerError> for CfError {
    fn from(err: SchedulerError) -> Self {
        match err {
            SchedulerError::Core(inner) => inner,
            SchedulerError::Spawn(source) => CfError::io_with_source("工作线程启动失败", source),
            SchedulerError::Disconnected => CfError::ChannelSend {
                channel: "scheduler commands",
            },
            SchedulerError::WorkerPanicked => CfError::thread("工作线程异常终止"),
        }
    }
}
