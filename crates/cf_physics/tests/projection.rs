// crates/cf_physics/tests/projection.rs

//! 投影引擎集成测试

use std::cell::{Cell, RefCell};
use std::sync::atomic::AtomicBool;

use cf_config::{BoundaryCond, DomainBoundaries, ObstacleShape, SimulationParams};
use cf_foundation::Grid;
use cf_physics::{
    CentralDifference, CrashReason, NeverPause, PauseSignal, ProjectionScheme, SimFrame, Simulator,
    StepOutcome, StepReport, Stencil, Topology,
};
use glam::DVec2;

/// 第一次检查时请求暂停，之后不再请求
struct PauseOnce(Cell<bool>);

impl PauseOnce {
    fn new() -> Self {
        Self(Cell::new(true))
    }
}

impl PauseSignal for PauseOnce {
    fn pause_requested(&self) -> bool {
        self.0.replace(false)
    }
}

/// 记录每个检查点报告的扫描次数
#[derive(Default)]
struct CheckpointLog(RefCell<Vec<u64>>);

impl PauseSignal for CheckpointLog {
    fn pause_requested(&self) -> bool {
        false
    }

    fn checkpoint(&self, sweeps: u64) {
        self.0.borrow_mut().push(sweeps);
    }
}

/// 源项照常计算，速度推进恒为 NaN
struct NanVelocity;

impl ProjectionScheme for NanVelocity {
    fn name(&self) -> &'static str {
        "nan-velocity"
    }

    fn source_term(&self, velocity: &Grid<DVec2>, x: usize, y: usize, st: &Stencil) -> f64 {
        CentralDifference.source_term(velocity, x, y, st)
    }

    fn advance_velocity(
        &self,
        _velocity: &Grid<DVec2>,
        _pressure: &Grid<f64>,
        _x: usize,
        _y: usize,
        _st: &Stencil,
    ) -> DVec2 {
        DVec2::NAN
    }
}

/// 源项取 `f64::MAX`，松弛第二次扫描即溢出
struct SaturatedSource;

impl ProjectionScheme for SaturatedSource {
    fn name(&self) -> &'static str {
        "saturated-source"
    }

    fn source_term(&self, _velocity: &Grid<DVec2>, _x: usize, _y: usize, _st: &Stencil) -> f64 {
        f64::MAX
    }

    fn advance_velocity(
        &self,
        velocity: &Grid<DVec2>,
        pressure: &Grid<f64>,
        x: usize,
        y: usize,
        st: &Stencil,
    ) -> DVec2 {
        CentralDifference.advance_velocity(velocity, pressure, x, y, st)
    }
}

fn advanced(outcome: StepOutcome) -> StepReport {
    match outcome {
        StepOutcome::Advanced(report) => report,
        other => panic!("expected a completed step, got {:?}", other),
    }
}

fn closed_box(n: usize) -> SimulationParams {
    let mut params = SimulationParams::lid_driven_cavity(n);
    params.boundaries = DomainBoundaries::uniform(BoundaryCond::wall());
    params
}

/// 一步之后速度场非零的顶盖驱动方腔
fn warmed_cavity(n: usize, pause_check_interval: u64) -> Simulator {
    let mut params = SimulationParams::lid_driven_cavity(n);
    params.tuning.pause_check_interval = pause_check_interval;
    let mut sim = Simulator::new(params).unwrap();
    advanced(sim.step(&NeverPause));
    sim
}

// ============================================================
// 场景
// ============================================================

#[test]
fn four_by_four_still_box_stays_at_rest() {
    let mut params = closed_box(4);
    params.boundaries.top = BoundaryCond::wall().with_pressure(0.0);
    let mut sim = Simulator::new(params).unwrap();
    let before = sim.current().clone();

    let report = advanced(sim.step(&NeverPause));
    assert_eq!(report.step, 1);
    assert!(sim.current().pressure.iter().all(|&p| p == 0.0));
    assert_eq!(sim.current().velocity, before.velocity);
}

#[test]
fn rest_state_is_idempotent_with_obstacle() {
    let mut params = closed_box(12);
    params
        .obstacles
        .push(ObstacleShape::circle(DVec2::new(0.5, 0.5), 0.2));
    let mut sim = Simulator::new(params).unwrap();
    let initial = sim.current().clone();
    for _ in 0..5 {
        advanced(sim.step(&NeverPause));
    }
    assert_eq!(sim.current(), &initial);
    assert_eq!(sim.steps(), 5);
}

#[test]
fn boundaries_hold_exactly_after_steps() {
    let mut params = SimulationParams::lid_driven_cavity(16);
    params
        .obstacles
        .push(ObstacleShape::rectangle(DVec2::new(0.4, 0.2), DVec2::new(0.6, 0.4)));
    let mut sim = Simulator::new(params).unwrap();
    for _ in 0..10 {
        advanced(sim.step(&NeverPause));
    }

    let frame = sim.current();
    let topo = sim.topology();
    for x in 1..15 {
        assert_eq!(frame.velocity.get(x, 15), DVec2::X);
        assert_eq!(frame.pressure.get(x, 15), 0.0);
        assert_eq!(frame.velocity.get(x, 0), DVec2::ZERO);
        assert_eq!(frame.pressure.get(x, 0), frame.pressure.get(x, 1));
    }
    for y in 0..16 {
        assert_eq!(frame.velocity.get(0, y), DVec2::ZERO);
        assert_eq!(frame.velocity.get(15, y), DVec2::ZERO);
    }
    for y in 1..15 {
        assert_eq!(frame.pressure.get(0, y), frame.pressure.get(1, y));
        assert_eq!(frame.pressure.get(15, y), frame.pressure.get(14, y));
    }
    assert!(topo.solid_count() > 0);
    for y in 0..16 {
        for x in 0..16 {
            if topo.is_solid(x, y) {
                assert_eq!(frame.velocity.get(x, y), DVec2::ZERO);
                assert_eq!(frame.pressure.get(x, y), 0.0);
            }
        }
    }
}

#[test]
fn lid_drives_interior_flow() {
    let mut sim = Simulator::new(SimulationParams::lid_driven_cavity(17)).unwrap();
    for _ in 0..20 {
        advanced(sim.step(&NeverPause));
    }
    let frame = sim.current();
    assert!(frame.is_finite());
    // 顶盖下方向右，方腔下半部分速度仍很小
    assert!(frame.velocity.get(8, 15).x > 0.0);
    assert!(frame.velocity.get(8, 15).x > frame.velocity.get(8, 4).x.abs());
    assert!((sim.time() - 20.0 * 0.001).abs() < 1e-12);
}

#[test]
fn channel_flow_runs_without_crashing() {
    let params = SimulationParams::channel_with_cylinder(41, 21, 1.0, 0.1);
    let mut sim = Simulator::new(params).unwrap();
    assert!(sim.topology().is_complete());
    for _ in 0..10 {
        advanced(sim.step(&NeverPause));
    }
    assert!(!sim.is_crashed());
    let stats = sim.current().stats();
    assert!(stats.max_speed.is_finite());
    assert!(stats.max_speed >= 1.0);
}

// ============================================================
// 暂停确定性
// ============================================================

#[test]
fn pause_and_resume_matches_uninterrupted_step() {
    let base = warmed_cavity(17, 3);
    let mut straight = base.clone();
    let mut split = base;

    let expected = advanced(straight.step(&NeverPause));
    assert!(expected.sweeps > 3);

    let pause = PauseOnce::new();
    assert_eq!(split.step(&pause), StepOutcome::Suspended { sweeps: 3 });
    assert_eq!(split.sweeps_in_progress(), 3);
    assert_eq!(split.steps(), 1);

    let resumed = advanced(split.step(&NeverPause));
    assert_eq!(resumed, expected);
    assert_eq!(split.current(), straight.current());
}

#[test]
fn repeated_suspension_matches_uninterrupted_step() {
    let base = warmed_cavity(17, 5);
    let mut straight = base.clone();
    let mut split = base;

    let expected = advanced(straight.step(&NeverPause));

    let flag = AtomicBool::new(true);
    let mut suspensions = 0;
    let report = loop {
        match split.step(&flag) {
            StepOutcome::Suspended { sweeps } => {
                suspensions += 1;
                assert_eq!(sweeps, suspensions * 5);
            }
            StepOutcome::Advanced(report) => break report,
            StepOutcome::Crashed(reason) => panic!("crashed: {}", reason),
        }
    };
    assert!(suspensions > 0);
    assert_eq!(report, expected);
    assert_eq!(split.current(), straight.current());
}

#[test]
fn checkpoints_report_sweeps_at_each_interval() {
    let interval = 3;
    let mut sim = warmed_cavity(17, interval);
    let log = CheckpointLog::default();
    let report = advanced(sim.step(&log));
    assert!(report.converged);

    let seen = log.0.into_inner();
    // 收敛的那次扫描在检查点之前结束
    let expected: Vec<u64> = (1..report.sweeps).filter(|k| k % interval == 0).collect();
    assert_eq!(seen, expected);
}

#[test]
fn suspended_step_keeps_last_frame_visible() {
    let mut sim = warmed_cavity(17, 2);
    let before = sim.current().clone();
    assert!(matches!(sim.step(&PauseOnce::new()), StepOutcome::Suspended { .. }));
    assert_eq!(sim.current(), &before);
}

// ============================================================
// 崩溃
// ============================================================

#[test]
fn extreme_inflow_crashes_and_freezes_state() {
    let params = SimulationParams::channel_with_cylinder(21, 11, 1.0e6, 0.1);
    let mut sim = Simulator::new(params).unwrap();
    let before = sim.current().clone();

    let outcome = sim.step(&NeverPause);
    let reason = match outcome {
        StepOutcome::Crashed(reason) => reason,
        other => panic!("expected crash, got {:?}", other),
    };
    assert!(matches!(reason, CrashReason::SourceOverflow { .. }));
    assert!(sim.is_crashed());
    assert_eq!(sim.crash_reason(), Some(reason));

    for _ in 0..3 {
        assert_eq!(sim.step(&NeverPause), StepOutcome::Crashed(reason));
    }
    assert_eq!(sim.current(), &before);
    assert_eq!(sim.steps(), 0);
    assert_eq!(sim.time(), 0.0);
}

#[test]
fn nan_velocity_crashes_and_freezes_state() {
    let mut sim = Simulator::with_scheme(SimulationParams::lid_driven_cavity(9), NanVelocity).unwrap();
    let before = sim.current().clone();

    let reason = match sim.step(&NeverPause) {
        StepOutcome::Crashed(reason) => reason,
        other => panic!("expected crash, got {:?}", other),
    };
    assert!(matches!(reason, CrashReason::VelocityDiverged { .. }));
    assert_eq!(sim.crash_reason(), Some(reason));

    for _ in 0..3 {
        assert_eq!(sim.step(&NeverPause), StepOutcome::Crashed(reason));
    }
    assert_eq!(sim.current(), &before);
    assert!(sim.current().is_finite());
    assert_eq!(sim.steps(), 0);
    assert_eq!(sim.time(), 0.0);
}

#[test]
fn overflowing_relaxation_crashes_and_freezes_state() {
    let mut params = SimulationParams::lid_driven_cavity(9);
    params.tuning = params.tuning.with_source_limit(f64::MAX);
    let mut sim = Simulator::with_scheme(params, SaturatedSource).unwrap();
    let before = sim.current().clone();

    let reason = match sim.step(&NeverPause) {
        StepOutcome::Crashed(reason) => reason,
        other => panic!("expected crash, got {:?}", other),
    };
    match reason {
        CrashReason::PressureDiverged { sweeps } => assert!(sweeps >= 1),
        other => panic!("expected pressure divergence, got {:?}", other),
    }
    assert!(!sim.last_residual().is_finite());

    assert_eq!(sim.step(&NeverPause), StepOutcome::Crashed(reason));
    assert_eq!(sim.current(), &before);
    assert_eq!(sim.steps(), 0);
}

#[test]
fn source_limit_is_tunable() {
    let mut params = SimulationParams::lid_driven_cavity(17);
    params.tuning = params.tuning.with_source_limit(1.0);
    let mut sim = Simulator::new(params).unwrap();
    // 第一步源项恒为零
    advanced(sim.step(&NeverPause));
    let after_first = sim.current().clone();
    assert!(matches!(sim.step(&NeverPause), StepOutcome::Crashed(_)));
    assert_eq!(sim.current(), &after_first);
    assert_eq!(sim.steps(), 1);
}

// ============================================================
// 初始场与拓扑
// ============================================================

#[test]
fn initial_frame_feeds_first_step() {
    let params = closed_box(9);
    let mut frame = SimFrame::zeros(9, 9);
    for y in 0..9 {
        for x in 0..9 {
            let (fx, fy) = (x as f64 / 8.0, y as f64 / 8.0);
            frame.velocity.set(x, y, DVec2::new(fy - 0.5, 0.5 - fx) * 0.1);
        }
    }
    let mut sim = Simulator::new(params).unwrap().with_initial_frame(frame).unwrap();
    let start = sim.current().clone();
    advanced(sim.step(&NeverPause));
    assert_ne!(sim.current().velocity, start.velocity);
    assert!(sim.current().is_finite());
}

#[test]
fn classifier_is_complete_for_assorted_layouts() {
    let mut layouts = vec![
        SimulationParams::lid_driven_cavity(33),
        SimulationParams::channel_with_cylinder(61, 31, 1.0, 0.15),
        closed_box(20),
    ];

    let mut pocket = SimulationParams::lid_driven_cavity(41);
    pocket.obstacles.push(ObstacleShape::polygon(vec![
        DVec2::new(0.2, 0.2),
        DVec2::new(0.8, 0.2),
        DVec2::new(0.8, 0.8),
        DVec2::new(0.2, 0.8),
    ]));
    layouts.push(pocket);

    let mut scattered = closed_box(40);
    for i in 0..4 {
        for j in 0..4 {
            let c = DVec2::new(0.15 + 0.23 * i as f64, 0.15 + 0.23 * j as f64);
            scattered.obstacles.push(ObstacleShape::circle(c, 0.06));
        }
    }
    layouts.push(scattered);

    for params in &layouts {
        let topo = Topology::classify(params);
        assert!(topo.is_complete());
        assert!(topo.region_count() >= 1);
    }
}
