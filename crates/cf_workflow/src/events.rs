// crates/cf_workflow/src/events.rs

//! 事件系统模块
//!
//! 调度器的状态变化和每个归档帧都以 [`SchedulerEvent`] 广播给所有监听器。
//! 事件中的帧是 `Arc<SimFrame>` 快照，监听器之间共享同一份数据。

use std::sync::Arc;

use cf_physics::{CrashReason, SimFrame};
use crossbeam_channel::{Receiver, Sender};
use parking_lot::RwLock;

/// 调度事件
#[derive(Debug, Clone)]
pub enum SchedulerEvent {
    /// 调度器已启动
    Started {
        /// 网格宽度
        wp: usize,
        /// 网格高度
        hp: usize,
        /// 起始模拟时间
        time: f64,
    },
    /// 帧已归档
    FrameArchived {
        /// 计算帧序号
        index: u64,
        /// 模拟时间
        time: f64,
        /// 快照
        frame: Arc<SimFrame>,
    },
    /// 历史已抽稀
    Decimated {
        /// 新的归档间隔
        stride: u64,
        /// 抽稀并追加后的条目数
        len: usize,
    },
    /// 已暂停
    Paused {
        /// 模拟时间
        time: f64,
    },
    /// 已恢复
    Resumed {
        /// 模拟时间
        time: f64,
    },
    /// 越过自动停止时间
    AutoStopped {
        /// 模拟时间
        time: f64,
    },
    /// 求解器崩溃
    Crashed {
        /// 最后有效帧的模拟时间
        time: f64,
        /// 崩溃原因
        reason: CrashReason,
    },
    /// 调度器已停止
    Stopped {
        /// 模拟时间
        time: f64,
        /// 已完成时间步数
        steps: u64,
    },
}

impl SchedulerEvent {
    /// 获取事件名称
    pub fn name(&self) -> &'static str {
        match self {
            Self::Started { .. } => "Started",
            Self::FrameArchived { .. } => "FrameArchived",
            Self::Decimated { .. } => "Decimated",
            Self::Paused { .. } => "Paused",
            Self::Resumed { .. } => "Resumed",
            Self::AutoStopped { .. } => "AutoStopped",
            Self::Crashed { .. } => "Crashed",
            Self::Stopped { .. } => "Stopped",
        }
    }

    /// 事件对应的模拟时间
    pub fn time(&self) -> f64 {
        match self {
            Self::Started { time, .. }
            | Self::FrameArchived { time, .. }
            | Self::Paused { time }
            | Self::Resumed { time }
            | Self::AutoStopped { time }
            | Self::Crashed { time, .. }
            | Self::Stopped { time, .. } => *time,
            Self::Decimated { .. } => f64::NAN,
        }
    }

    /// 工作线程是否因此停止推进（直到收到新命令）
    pub fn is_halt(&self) -> bool {
        matches!(
            self,
            Self::Paused { .. } | Self::AutoStopped { .. } | Self::Crashed { .. } | Self::Stopped { .. }
        )
    }
}

/// 事件监听器trait
pub trait EventListener: Send + Sync {
    /// 处理事件
    fn on_event(&self, event: &SchedulerEvent);

    /// 获取监听器名称 (用于调试)
    fn name(&self) -> &str {
        "anonymous"
    }
}

/// 函数式事件监听器
pub struct FnListener<F>
where
    F: Fn(&SchedulerEvent) + Send + Sync,
{
    name: String,
    handler: F,
}

impl<F> FnListener<F>
where
    F: Fn(&SchedulerEvent) + Send + Sync,
{
    /// 创建函数式监听器
    pub fn new(name: impl Into<String>, handler: F) -> Self {
        Self {
            name: name.into(),
            handler,
        }
    }
}

impl<F> EventListener for FnListener<F>
where
    F: Fn(&SchedulerEvent) + Send + Sync,
{
    fn on_event(&self, event: &SchedulerEvent) {
        (self.handler)(event);
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// 通道监听器
///
/// 把事件转发到无界通道。接收端被丢弃后事件直接丢弃。
pub struct ChannelListener {
    sender: Sender<SchedulerEvent>,
}

impl ChannelListener {
    /// 创建监听器及其接收端
    pub fn channel() -> (Self, Receiver<SchedulerEvent>) {
        let (sender, receiver) = crossbeam_channel::unbounded();
        (Self { sender }, receiver)
    }
}

impl EventListener for ChannelListener {
    fn on_event(&self, event: &SchedulerEvent) {
        let _ = self.sender.send(event.clone());
    }

    fn name(&self) -> &str {
        "ChannelListener"
    }
}

/// 日志事件监听器
pub struct LoggingListener {
    /// 日志前缀
    prefix: String,
    /// 是否记录每个归档帧
    verbose: bool,
}

impl LoggingListener {
    /// 创建日志监听器
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            verbose: false,
        }
    }

    /// 设置详细模式
    pub fn verbose(mut self) -> Self {
        self.verbose = true;
        self
    }
}

impl EventListener for LoggingListener {
    fn on_event(&self, event: &SchedulerEvent) {
        match event {
            SchedulerEvent::Started { wp, hp, time } => {
                tracing::info!("{}: started on {}x{} grid at t={:.4}", self.prefix, wp, hp, time);
            }
            SchedulerEvent::FrameArchived { index, time, frame } => {
                if self.verbose {
                    let stats = frame.stats();
                    tracing::info!(
                        "{}: frame {} at t={:.4} (max |u|={:.4e}, p in [{:.4e}, {:.4e}])",
                        self.prefix,
                        index,
                        time,
                        stats.max_speed,
                        stats.min_pressure,
                        stats.max_pressure
                    );
                } else {
                    tracing::debug!("{}: frame {} at t={:.4}", self.prefix, index, time);
                }
            }
            SchedulerEvent::Decimated { stride, len } => {
                tracing::debug!("{}: history decimated to {} entries, stride {}", self.prefix, len, stride);
            }
            SchedulerEvent::Paused { time } => {
                tracing::info!("{}: paused at t={:.4}", self.prefix, time);
            }
            SchedulerEvent::Resumed { time } => {
                tracing::info!("{}: resumed at t={:.4}", self.prefix, time);
            }
            SchedulerEvent::AutoStopped { time } => {
                tracing::info!("{}: auto-stop reached at t={:.4}", self.prefix, time);
            }
            SchedulerEvent::Crashed { time, reason } => {
                tracing::warn!("{}: crashed after t={:.4}: {}", self.prefix, time, reason);
            }
            SchedulerEvent::Stopped { time, steps } => {
                tracing::info!("{}: stopped at t={:.4} after {} steps", self.prefix, time, steps);
            }
        }
    }

    fn name(&self) -> &str {
        "LoggingListener"
    }
}

/// 事件分发器
#[derive(Default)]
pub struct EventDispatcher {
    listeners: RwLock<Vec<Arc<dyn EventListener>>>,
}

impl EventDispatcher {
    /// 创建新的事件分发器
    pub fn new() -> Self {
        Self {
            listeners: RwLock::new(Vec::new()),
        }
    }

    /// 添加监听器
    pub fn add_listener(&self, listener: Arc<dyn EventListener>) {
        let name = listener.name().to_string();
        self.listeners.write().push(listener);
        tracing::debug!("Added event listener: {}", name);
    }

    /// 添加函数式监听器
    pub fn add_fn_listener<F>(&self, name: impl Into<String>, handler: F)
    where
        F: Fn(&SchedulerEvent) + Send + Sync + 'static,
    {
        let listener = Arc::new(FnListener::new(name, handler));
        self.add_listener(listener);
    }

    /// 订阅事件，返回接收端
    pub fn subscribe(&self) -> Receiver<SchedulerEvent> {
        let (listener, receiver) = ChannelListener::channel();
        self.add_listener(Arc::new(listener));
        receiver
    }

    /// 分发事件
    pub fn emit(&self, event: SchedulerEvent) {
        let listeners = self.listeners.read();

        tracing::trace!("Emitting event: {}", event.name());

        for listener in listeners.iter() {
            listener.on_event(&event);
        }
    }

    /// 获取监听器数量
    pub fn listener_count(&self) -> usize {
        self.listeners.read().len()
    }
}

impl std::fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("listener_count", &self.listener_count())
            .finish()
    }
}
