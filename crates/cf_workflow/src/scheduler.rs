// crates/cf_workflow/src/scheduler.rs

//! 模拟调度器
//!
//! 求解器独占一个工作线程，读取方只通过 [`SchedulerHandle`] 交互：
//!
//! - 命令（暂停/恢复/停止）经 crossbeam 通道送入工作线程
//! - 暂停标志为电平触发的 `Arc<AtomicBool>`，求解器在松弛检查点轮询，
//!   长时间松弛也能及时让出；停止同样会置位该标志
//! - 帧历史和进度各自一把锁，从不嵌套；每次访问只持有一次
//! - 松弛检查点把进行中的扫描次数写入进度，运行期间即可读取
//! - 归档帧另以 [`SchedulerEvent::FrameArchived`] 广播
//!
//! 一个计算帧等于 `steps_per_frame` 个完成的时间步，初始帧作为第 0 帧归档。

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use cf_physics::{CentralDifference, PauseSignal, ProjectionScheme, Simulator, StepOutcome};
use crossbeam_channel::{Receiver, Sender};
use parking_lot::{Mutex, RwLock};

use crate::error::SchedulerError;
use crate::events::{EventDispatcher, EventListener, SchedulerEvent};
use crate::history::{ArchivedFrame, FrameHistory};

// ============================================================
// 状态
// ============================================================

/// 调度器状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchedulerState {
    /// 正在推进
    Running,
    /// 已暂停
    Paused,
    /// 越过自动停止时间后等待命令
    AutoStopped,
    /// 求解器崩溃（终止）
    Crashed,
    /// 已停止
    Stopped,
}

impl SchedulerState {
    /// 工作线程是否在推进
    pub fn is_running(self) -> bool {
        self == Self::Running
    }
}

impl fmt::Display for SchedulerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Running => "running",
            Self::Paused => "paused",
            Self::AutoStopped => "auto-stopped",
            Self::Crashed => "crashed",
            Self::Stopped => "stopped",
        };
        f.write_str(s)
    }
}

/// 进度快照
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Progress {
    /// 调度器状态
    pub state: SchedulerState,
    /// 最后完成帧的模拟时间
    pub sim_time: f64,
    /// 已完成时间步数
    pub completed_steps: u64,
    /// 已完成计算帧数（不含初始帧）
    pub completed_frames: u64,
    /// 当前时间步已完成的松弛扫描次数（最近一个检查点）
    pub sweeps_in_progress: u64,
    /// 最近一次松弛扫描的 L1 变化量
    pub last_residual: f64,
}

/// 工作线程命令
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Pause,
    Resume,
    Stop,
}

/// 工作线程与句柄共享的数据
struct Shared {
    history: RwLock<FrameHistory>,
    progress: Mutex<Progress>,
}

// ============================================================
// 构建器
// ============================================================

/// 调度器构建器
///
/// 在启动工作线程之前注册监听器，可以收到 `Started` 和第 0 帧事件。
pub struct SimulationScheduler<S: ProjectionScheme = CentralDifference> {
    simulator: Simulator<S>,
    events: Arc<EventDispatcher>,
    start_paused: bool,
}

impl<S: ProjectionScheme + 'static> SimulationScheduler<S> {
    /// 包装一个求解器
    pub fn new(simulator: Simulator<S>) -> Self {
        Self {
            simulator,
            events: Arc::new(EventDispatcher::new()),
            start_paused: false,
        }
    }

    /// 添加监听器
    pub fn with_listener(self, listener: Arc<dyn EventListener>) -> Self {
        self.events.add_listener(listener);
        self
    }

    /// 启动后保持暂停，直到 [`SchedulerHandle::resume`]
    pub fn start_paused(mut self) -> Self {
        self.start_paused = true;
        self
    }

    /// 订阅事件
    pub fn subscribe(&self) -> Receiver<SchedulerEvent> {
        self.events.subscribe()
    }

    /// 事件分发器
    pub fn events(&self) -> &Arc<EventDispatcher> {
        &self.events
    }

    /// 归档初始帧并启动工作线程
    pub fn spawn(self) -> Result<SchedulerHandle<S>, SchedulerError> {
        let Self {
            simulator,
            events,
            start_paused,
        } = self;
        let params = simulator.shared_params();

        let mut history = FrameHistory::new(params.history_capacity)?;
        let initial = simulator.snapshot();
        history.push(ArchivedFrame {
            index: 0,
            time: simulator.time(),
            frame: Arc::clone(&initial),
        });

        let state = if simulator.is_crashed() {
            SchedulerState::Crashed
        } else if start_paused {
            SchedulerState::Paused
        } else {
            SchedulerState::Running
        };
        let shared = Arc::new(Shared {
            history: RwLock::new(history),
            progress: Mutex::new(Progress {
                state,
                sim_time: simulator.time(),
                completed_steps: simulator.steps(),
                completed_frames: 0,
                sweeps_in_progress: simulator.sweeps_in_progress(),
                last_residual: simulator.last_residual(),
            }),
        });

        let (commands, inbox) = crossbeam_channel::unbounded();
        let pause_flag = Arc::new(AtomicBool::new(start_paused));

        events.emit(SchedulerEvent::Started {
            wp: params.wp,
            hp: params.hp,
            time: simulator.time(),
        });
        events.emit(SchedulerEvent::FrameArchived {
            index: 0,
            time: simulator.time(),
            frame: initial,
        });

        tracing::info!(
            wp = params.wp,
            hp = params.hp,
            steps_per_frame = params.steps_per_frame,
            history_capacity = params.history_capacity,
            auto_stop = ?params.auto_stop_time,
            "starting scheduler"
        );

        let worker = Worker {
            steps_per_frame: params.steps_per_frame.max(1) as u64,
            auto_stop_time: params.auto_stop_time,
            simulator,
            inbox,
            pause_flag: Arc::clone(&pause_flag),
            shared: Arc::clone(&shared),
            events: Arc::clone(&events),
            state,
            frame_index: 0,
            steps_in_frame: 0,
        };

        let join = thread::Builder::new()
            .name("cf-scheduler".into())
            .spawn(move || worker.run())
            .map_err(SchedulerError::Spawn)?;

        Ok(SchedulerHandle {
            commands,
            pause_flag,
            shared,
            events,
            worker: Some(join),
        })
    }
}

// ============================================================
// 句柄
// ============================================================

/// 调度器控制句柄
///
/// 丢弃句柄会停止并回收工作线程。
pub struct SchedulerHandle<S: ProjectionScheme = CentralDifference> {
    commands: Sender<Command>,
    pause_flag: Arc<AtomicBool>,
    shared: Arc<Shared>,
    events: Arc<EventDispatcher>,
    worker: Option<JoinHandle<Simulator<S>>>,
}

impl<S: ProjectionScheme> SchedulerHandle<S> {
    /// 已归档帧数
    pub fn history_len(&self) -> usize {
        self.shared.history.read().len()
    }

    /// 第 `i` 个归档帧
    pub fn frame(&self, i: usize) -> Option<ArchivedFrame> {
        self.shared.history.read().get(i).cloned()
    }

    /// 最新归档帧
    pub fn latest_frame(&self) -> Option<ArchivedFrame> {
        self.shared.history.read().latest().cloned()
    }

    /// 全部归档帧
    pub fn frames(&self) -> Vec<ArchivedFrame> {
        self.shared.history.read().iter().cloned().collect()
    }

    /// 当前归档间隔
    pub fn stride(&self) -> u64 {
        self.shared.history.read().stride()
    }

    /// 进度快照
    pub fn progress(&self) -> Progress {
        *self.shared.progress.lock()
    }

    /// 调度器状态
    pub fn state(&self) -> SchedulerState {
        self.shared.progress.lock().state
    }

    /// 最后完成帧的模拟时间
    pub fn sim_time(&self) -> f64 {
        self.shared.progress.lock().sim_time
    }

    /// 求解器是否已崩溃
    pub fn is_crashed(&self) -> bool {
        self.state() == SchedulerState::Crashed
    }

    /// 当前时间步已完成的松弛扫描次数
    ///
    /// 运行中按 `pause_check_interval` 更新，时间步完成后归零。
    pub fn sweeps_in_progress(&self) -> u64 {
        self.shared.progress.lock().sweeps_in_progress
    }

    /// 订阅事件
    pub fn subscribe(&self) -> Receiver<SchedulerEvent> {
        self.events.subscribe()
    }

    /// 事件分发器
    pub fn events(&self) -> &Arc<EventDispatcher> {
        &self.events
    }

    /// 请求暂停
    ///
    /// 立即置位暂停标志，工作线程在下一个松弛检查点或时间步之间让出。
    pub fn pause(&self) -> Result<(), SchedulerError> {
        self.pause_flag.store(true, Ordering::Release);
        self.send(Command::Pause)
    }

    /// 请求恢复，自动停止之后同样可以继续
    pub fn resume(&self) -> Result<(), SchedulerError> {
        self.pause_flag.store(false, Ordering::Release);
        self.send(Command::Resume)
    }

    /// 停止工作线程并取回求解器
    pub fn stop(mut self) -> Result<Simulator<S>, SchedulerError> {
        self.shutdown().ok_or(SchedulerError::Disconnected)?
    }

    fn send(&self, command: Command) -> Result<(), SchedulerError> {
        self.commands
            .send(command)
            .map_err(|_| SchedulerError::Disconnected)
    }

    fn shutdown(&mut self) -> Option<Result<Simulator<S>, SchedulerError>> {
        let worker = self.worker.take()?;
        self.pause_flag.store(true, Ordering::Release);
        // 工作线程已退出时发送失败，join 仍会返回
        let _ = self.commands.send(Command::Stop);
        Some(worker.join().map_err(|_| SchedulerError::WorkerPanicked))
    }
}

impl<S: ProjectionScheme> Drop for SchedulerHandle<S> {
    fn drop(&mut self) {
        if let Some(Err(err)) = self.shutdown() {
            tracing::error!("scheduler worker did not shut down cleanly: {}", err);
        }
    }
}

impl<S: ProjectionScheme> fmt::Debug for SchedulerHandle<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchedulerHandle")
            .field("progress", &self.progress())
            .field("history_len", &self.history_len())
            .finish()
    }
}

// ============================================================
// 工作线程
// ============================================================

enum Flow {
    Continue,
    Exit,
}

/// 工作线程交给求解器的信号：读暂停标志，检查点写进度
struct WorkerSignal<'a> {
    pause_flag: &'a AtomicBool,
    progress: &'a Mutex<Progress>,
}

impl PauseSignal for WorkerSignal<'_> {
    #[inline]
    fn pause_requested(&self) -> bool {
        self.pause_flag.load(Ordering::Acquire)
    }

    fn checkpoint(&self, sweeps: u64) {
        self.progress.lock().sweeps_in_progress = sweeps;
    }
}

struct Worker<S: ProjectionScheme> {
    simulator: Simulator<S>,
    inbox: Receiver<Command>,
    pause_flag: Arc<AtomicBool>,
    shared: Arc<Shared>,
    events: Arc<EventDispatcher>,
    steps_per_frame: u64,
    auto_stop_time: Option<f64>,
    state: SchedulerState,
    frame_index: u64,
    steps_in_frame: u64,
}

impl<S: ProjectionScheme> Worker<S> {
    fn run(mut self) -> Simulator<S> {
        loop {
            let flow = if self.state.is_running() {
                match self.drain_commands() {
                    Flow::Continue if self.state.is_running() => self.advance(),
                    flow => flow,
                }
            } else {
                self.wait_for_command()
            };
            if let Flow::Exit = flow {
                break;
            }
        }

        self.set_state(SchedulerState::Stopped);
        self.events.emit(SchedulerEvent::Stopped {
            time: self.simulator.time(),
            steps: self.simulator.steps(),
        });
        self.simulator
    }

    /// 非阻塞地处理所有待处理命令
    fn drain_commands(&mut self) -> Flow {
        while let Ok(command) = self.inbox.try_recv() {
            if let Flow::Exit = self.apply(command) {
                return Flow::Exit;
            }
        }
        Flow::Continue
    }

    /// 阻塞等待下一条命令；句柄丢失时退出
    fn wait_for_command(&mut self) -> Flow {
        match self.inbox.recv() {
            Ok(command) => self.apply(command),
            Err(_) => Flow::Exit,
        }
    }

    fn apply(&mut self, command: Command) -> Flow {
        match (command, self.state) {
            (Command::Stop, _) => return Flow::Exit,
            (Command::Pause, SchedulerState::Running) => {
                self.set_state(SchedulerState::Paused);
                self.events.emit(SchedulerEvent::Paused {
                    time: self.simulator.time(),
                });
            }
            (Command::Resume, SchedulerState::Paused | SchedulerState::AutoStopped) => {
                self.set_state(SchedulerState::Running);
                self.events.emit(SchedulerEvent::Resumed {
                    time: self.simulator.time(),
                });
            }
            (command, state) => {
                tracing::debug!(?command, %state, "command ignored");
            }
        }
        Flow::Continue
    }

    /// 推进至多一个时间步
    fn advance(&mut self) -> Flow {
        let previous_time = self.simulator.time();
        let signal = WorkerSignal {
            pause_flag: &self.pause_flag,
            progress: &self.shared.progress,
        };
        match self.simulator.step(&signal) {
            StepOutcome::Advanced(report) => {
                self.steps_in_frame += 1;
                let frame_done = self.steps_in_frame >= self.steps_per_frame;
                if frame_done {
                    self.steps_in_frame = 0;
                    self.frame_index += 1;
                }
                {
                    let mut progress = self.shared.progress.lock();
                    progress.sim_time = report.time;
                    progress.completed_steps = report.step;
                    progress.completed_frames = self.frame_index;
                    progress.sweeps_in_progress = 0;
                    progress.last_residual = report.residual;
                }
                if frame_done {
                    self.archive();
                }

                if let Some(limit) = self.auto_stop_time {
                    if previous_time < limit && report.time >= limit {
                        self.set_state(SchedulerState::AutoStopped);
                        self.events.emit(SchedulerEvent::AutoStopped { time: report.time });
                    }
                }
                Flow::Continue
            }
            StepOutcome::Suspended { sweeps } => {
                self.shared.progress.lock().sweeps_in_progress = sweeps;
                // 暂停标志只随命令一起置位，下一条命令必然到达
                self.wait_for_command()
            }
            StepOutcome::Crashed(reason) => {
                {
                    let mut progress = self.shared.progress.lock();
                    progress.state = SchedulerState::Crashed;
                    progress.sweeps_in_progress = 0;
                    progress.last_residual = self.simulator.last_residual();
                }
                self.state = SchedulerState::Crashed;
                self.events.emit(SchedulerEvent::Crashed {
                    time: self.simulator.time(),
                    reason,
                });
                Flow::Continue
            }
        }
    }

    /// 按历史间隔归档当前帧
    fn archive(&mut self) {
        let index = self.frame_index;
        if !self.shared.history.read().is_due(index) {
            return;
        }

        let frame = self.simulator.snapshot();
        let time = self.simulator.time();
        let (decimated, len) = {
            let mut history = self.shared.history.write();
            let decimated = history.push(ArchivedFrame {
                index,
                time,
                frame: Arc::clone(&frame),
            });
            (decimated, history.len())
        };

        if let Some(stride) = decimated {
            self.events.emit(SchedulerEvent::Decimated { stride, len });
        }
        self.events.emit(SchedulerEvent::FrameArchived { index, time, frame });
    }

    fn set_state(&mut self, state: SchedulerState) {
        self.state = state;
        self.shared.progress.lock().state = state;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_worker_signal_reports_checkpoint() {
        let flag = AtomicBool::new(false);
        let progress = Mutex::new(Progress {
            state: SchedulerState::Running,
            sim_time: 0.0,
            completed_steps: 0,
            completed_frames: 0,
            sweeps_in_progress: 0,
            last_residual: 0.0,
        });
        let signal = WorkerSignal {
            pause_flag: &flag,
            progress: &progress,
        };
        signal.checkpoint(30);
        assert_eq!(progress.lock().sweeps_in_progress, 30);
        assert!(!signal.pause_requested());
        flag.store(true, Ordering::Release);
        assert!(signal.pause_requested());
    }

    #[test]
    fn test_state_display() {
        assert_eq!(SchedulerState::AutoStopped.to_string(), "auto-stopped");
        assert!(SchedulerState::Running.is_running());
        assert!(!SchedulerState::Paused.is_running());
    }
}
