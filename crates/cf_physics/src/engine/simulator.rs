// crates/cf_physics/src/engine/simulator.rs

//! 求解器状态机
//!
//! [`Simulator::step`] 每次调用推进至多一个时间步：
//!
//! 1. `Fresh`：把当前帧复制到后备缓冲（压力热启动），计算活动单元源项，
//!    任一 `|S|` 超限或非有限即崩溃
//! 2. `PoissonInProgress`：Jacobi 松弛，每 `pause_check_interval` 次扫描
//!    报告一次扫描次数并检查暂停信号，收到请求时返回 `Suspended` 并保留部分结果
//! 3. 收敛后在后备缓冲中推进 `indep` 速度，施加边界，交换前后缓冲
//!
//! 崩溃是终止状态，`current` 保持为最后一个有效帧。

use std::fmt;
use std::mem;
use std::sync::Arc;

use cf_config::SimulationParams;
use cf_foundation::{ensure, CfError, CfResult, Grid, Point};

use super::relaxation::JacobiRelaxation;
use super::scheme::{CentralDifference, ProjectionScheme, Stencil};
use super::signal::PauseSignal;
use crate::boundary::BoundaryEnforcer;
use crate::frame::SimFrame;
use crate::topology::Topology;

// ============================================================
// 状态与结果
// ============================================================

/// 崩溃原因
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CrashReason {
    /// 源项超出上限或非有限
    SourceOverflow {
        /// x 坐标
        x: usize,
        /// y 坐标
        y: usize,
        /// 源项值
        value: f64,
    },
    /// 松弛变化量为 NaN
    PressureDiverged {
        /// 发生时的扫描次数
        sweeps: u64,
    },
    /// 新速度非有限
    VelocityDiverged {
        /// x 坐标
        x: usize,
        /// y 坐标
        y: usize,
    },
}

impl fmt::Display for CrashReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SourceOverflow { x, y, value } => {
                write!(f, "源项溢出: ({}, {}) 处 S = {:e}", x, y, value)
            }
            Self::PressureDiverged { sweeps } => write!(f, "压力松弛发散: 第 {} 次扫描", sweeps),
            Self::VelocityDiverged { x, y } => write!(f, "速度发散: ({}, {})", x, y),
        }
    }
}

/// 单步阶段
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StepPhase {
    /// 上一步已完成
    Fresh,
    /// 压力松弛被挂起
    PoissonInProgress {
        /// 已完成的扫描次数
        sweeps: u64,
    },
    /// 已崩溃（终止）
    Crashed(CrashReason),
}

/// 一个完成时间步的报告
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepReport {
    /// 步后模拟时间
    pub time: f64,
    /// 已完成步数
    pub step: u64,
    /// 本步扫描次数
    pub sweeps: u64,
    /// 最后一次扫描的 L1 变化量
    pub residual: f64,
    /// 是否在容差内收敛（否则因 `max_sweeps` 截断）
    pub converged: bool,
}

/// [`Simulator::step`] 的结果
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StepOutcome {
    /// 完成一个时间步
    Advanced(StepReport),
    /// 在检查点让出，下次调用从断点继续
    Suspended {
        /// 已完成的扫描次数
        sweeps: u64,
    },
    /// 已崩溃
    Crashed(CrashReason),
}

impl StepOutcome {
    /// 是否完成了时间步
    pub fn is_advanced(&self) -> bool {
        matches!(self, Self::Advanced(_))
    }
}

// ============================================================
// 求解器
// ============================================================

/// 压力投影求解器
#[derive(Debug, Clone)]
pub struct Simulator<S: ProjectionScheme = CentralDifference> {
    params: Arc<SimulationParams>,
    scheme: S,
    stencil: Stencil,
    topology: Topology,
    enforcer: BoundaryEnforcer,
    relaxation: JacobiRelaxation,
    /// 后备缓冲，松弛与速度推进都写在这里
    previous: SimFrame,
    /// 最后一个完成的帧
    current: SimFrame,
    /// 与 `relaxation.cells()` 对齐的源项
    source: Vec<f64>,
    scratch: Grid<f64>,
    phase: StepPhase,
    time: f64,
    steps: u64,
    last_residual: f64,
}

impl Simulator<CentralDifference> {
    /// 以中心差分格式创建，初始场为零
    pub fn new(params: impl Into<Arc<SimulationParams>>) -> CfResult<Self> {
        Self::with_scheme(params, CentralDifference)
    }
}

impl<S: ProjectionScheme> Simulator<S> {
    /// 以给定格式创建，初始场为零
    pub fn with_scheme(params: impl Into<Arc<SimulationParams>>, scheme: S) -> CfResult<Self> {
        let params = params.into();
        params.validate()?;

        let stencil = Stencil::from_params(&params);
        let topology = Topology::classify(&params);
        let enforcer = BoundaryEnforcer::new(&topology, params.boundaries);
        let relaxation = JacobiRelaxation::new(&topology, &stencil);

        let mut current = SimFrame::zeros(params.wp, params.hp);
        enforcer.enforce(&mut current);
        let previous = current.clone();
        let scratch = current.pressure.clone();

        tracing::info!(
            scheme = scheme.name(),
            wp = params.wp,
            hp = params.hp,
            indep = topology.indep_count(),
            active = relaxation.active_count(),
            regions = topology.region_count(),
            "simulator ready"
        );

        Ok(Self {
            source: Vec::with_capacity(relaxation.active_count()),
            params,
            scheme,
            stencil,
            topology,
            enforcer,
            relaxation,
            previous,
            current,
            scratch,
            phase: StepPhase::Fresh,
            time: 0.0,
            steps: 0,
            last_residual: 0.0,
        })
    }

    /// 替换初始场
    ///
    /// 尺寸必须与网格一致且全部为有限值。写入后立即施加边界条件，
    /// 挂起中的松弛被丢弃。
    pub fn with_initial_frame(mut self, frame: SimFrame) -> CfResult<Self> {
        CfError::check_dimensions(
            "initial frame",
            (self.params.wp, self.params.hp),
            frame.dimensions(),
        )?;
        ensure!(frame.is_finite(), CfError::invalid_input("初始帧包含非有限值"));

        self.current = frame;
        self.enforcer.enforce(&mut self.current);
        self.previous.copy_from(&self.current);
        self.scratch.copy_from(&self.current.pressure);
        if !matches!(self.phase, StepPhase::Crashed(_)) {
            self.phase = StepPhase::Fresh;
        }
        Ok(self)
    }

    // ========== 访问器 ==========

    /// 运行参数
    pub fn params(&self) -> &SimulationParams {
        &self.params
    }

    /// 共享的运行参数
    pub fn shared_params(&self) -> Arc<SimulationParams> {
        Arc::clone(&self.params)
    }

    /// 离散格式
    pub fn scheme(&self) -> &S {
        &self.scheme
    }

    /// 离散常数
    pub fn stencil(&self) -> &Stencil {
        &self.stencil
    }

    /// 拓扑分类
    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    /// 边界施加器
    pub fn enforcer(&self) -> &BoundaryEnforcer {
        &self.enforcer
    }

    /// 最后一个完成的帧
    pub fn current(&self) -> &SimFrame {
        &self.current
    }

    /// 最后一个完成帧的独立快照
    pub fn snapshot(&self) -> Arc<SimFrame> {
        Arc::new(self.current.clone())
    }

    /// 当前阶段
    pub fn phase(&self) -> StepPhase {
        self.phase
    }

    /// 模拟时间
    pub fn time(&self) -> f64 {
        self.time
    }

    /// 已完成步数
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// 是否已崩溃
    pub fn is_crashed(&self) -> bool {
        matches!(self.phase, StepPhase::Crashed(_))
    }

    /// 崩溃原因
    pub fn crash_reason(&self) -> Option<CrashReason> {
        match self.phase {
            StepPhase::Crashed(reason) => Some(reason),
            _ => None,
        }
    }

    /// 挂起中的松弛已完成的扫描次数
    pub fn sweeps_in_progress(&self) -> u64 {
        match self.phase {
            StepPhase::PoissonInProgress { sweeps } => sweeps,
            _ => 0,
        }
    }

    /// 最后一次扫描的 L1 变化量
    pub fn last_residual(&self) -> f64 {
        self.last_residual
    }

    /// 当前速度场在 `indep` 单元上的散度 L1 范数
    pub fn divergence_l1(&self) -> f64 {
        let velocity = &self.current.velocity;
        let (dx, dy) = (self.stencil.dx, self.stencil.dy);
        self.topology
            .indep()
            .iter_points()
            .filter(|(_, indep)| **indep)
            .map(|(p, _)| {
                let ux = (velocity[(p.x + 1, p.y)].x - velocity[(p.x - 1, p.y)].x) / (2.0 * dx);
                let vy = (velocity[(p.x, p.y + 1)].y - velocity[(p.x, p.y - 1)].y) / (2.0 * dy);
                (ux + vy).abs()
            })
            .sum()
    }

    // ========== 推进 ==========

    /// 推进至多一个时间步
    pub fn step<P: PauseSignal + ?Sized>(&mut self, pause: &P) -> StepOutcome {
        let mut sweeps = match self.phase {
            StepPhase::Crashed(reason) => return StepOutcome::Crashed(reason),
            StepPhase::PoissonInProgress { sweeps } => sweeps,
            StepPhase::Fresh => {
                if let Err(reason) = self.begin_step() {
                    return self.crash(reason);
                }
                0
            }
        };

        let tuning = &self.params.tuning;
        let threshold = tuning.convergence_threshold(self.params.wp, self.params.hp);
        let interval = tuning.pause_check_interval.max(1);
        let max_sweeps = tuning.max_sweeps;

        let converged = loop {
            let delta = self
                .relaxation
                .sweep(&self.previous.pressure, &self.source, &mut self.scratch);
            mem::swap(&mut self.previous.pressure, &mut self.scratch);
            sweeps += 1;
            self.last_residual = delta;

            if !delta.is_finite() {
                return self.crash(CrashReason::PressureDiverged { sweeps });
            }
            if delta < threshold {
                break true;
            }
            if max_sweeps.is_some_and(|max| sweeps >= max) {
                tracing::warn!(
                    step = self.steps + 1,
                    sweeps,
                    residual = delta,
                    "relaxation stopped at max_sweeps before converging"
                );
                break false;
            }
            if sweeps % interval != 0 {
                continue;
            }
            pause.checkpoint(sweeps);
            if pause.pause_requested() {
                self.phase = StepPhase::PoissonInProgress { sweeps };
                tracing::debug!(sweeps, "relaxation suspended");
                return StepOutcome::Suspended { sweeps };
            }
        };

        if let Err(reason) = self.advance_velocity() {
            return self.crash(reason);
        }

        self.enforcer.enforce(&mut self.previous);
        mem::swap(&mut self.previous, &mut self.current);
        self.time += self.params.dt;
        self.steps += 1;
        self.phase = StepPhase::Fresh;

        StepOutcome::Advanced(StepReport {
            time: self.time,
            step: self.steps,
            sweeps,
            residual: self.last_residual,
            converged,
        })
    }

    /// 复制当前帧到后备缓冲并计算源项
    fn begin_step(&mut self) -> Result<(), CrashReason> {
        self.previous.copy_from(&self.current);
        self.scratch.copy_from(&self.current.pressure);

        let limit = self.params.tuning.source_limit;
        let velocity = &self.current.velocity;
        let indep = self.topology.indep();

        self.source.clear();
        for cell in self.relaxation.cells() {
            let p = indep.point_of(cell);
            let s = self.scheme.source_term(velocity, p.x, p.y, &self.stencil);
            self.source.push(checked_source(s, limit, p)?);
        }
        // 锚点不参与松弛，但同样受源项上限约束
        for &p in self.topology.anchors() {
            let s = self.scheme.source_term(velocity, p.x, p.y, &self.stencil);
            checked_source(s, limit, p)?;
        }
        Ok(())
    }

    /// 在后备缓冲中推进 `indep` 单元速度
    fn advance_velocity(&mut self) -> Result<(), CrashReason> {
        let old = &self.current.velocity;
        let pressure = &self.previous.pressure;
        let out = &mut self.previous.velocity;
        for (p, &indep) in self.topology.indep().iter_points() {
            if !indep {
                continue;
            }
            let v = self
                .scheme
                .advance_velocity(old, pressure, p.x, p.y, &self.stencil);
            if !v.is_finite() {
                return Err(CrashReason::VelocityDiverged { x: p.x, y: p.y });
            }
            out[p] = v;
        }
        Ok(())
    }

    fn crash(&mut self, reason: CrashReason) -> StepOutcome {
        tracing::error!(time = self.time, step = self.steps, %reason, "simulation crashed");
        self.phase = StepPhase::Crashed(reason);
        StepOutcome::Crashed(reason)
    }
}

#[inline]
fn checked_source(s: f64, limit: f64, p: Point) -> Result<f64, CrashReason> {
    if s.is_finite() && s.abs() <= limit {
        Ok(s)
    } else {
        Err(CrashReason::SourceOverflow {
            x: p.x,
            y: p.y,
            value: s,
        })
    }
}
