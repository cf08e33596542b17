// crates/cf_workflow/tests/scheduler.rs

//! 调度器集成测试

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use cf_config::SimulationParams;
use cf_physics::Simulator;
use cf_workflow::{LoggingListener, SchedulerEvent, SchedulerState, SimulationScheduler};
use crossbeam_channel::Receiver;

const TIMEOUT: Duration = Duration::from_secs(30);

/// 等待第一个满足条件的事件
fn wait_for<F>(events: &Receiver<SchedulerEvent>, mut pred: F) -> SchedulerEvent
where
    F: FnMut(&SchedulerEvent) -> bool,
{
    loop {
        match events.recv_timeout(TIMEOUT) {
            Ok(event) if pred(&event) => return event,
            Ok(_) => continue,
            Err(err) => panic!("no matching scheduler event: {}", err),
        }
    }
}

fn cavity(n: usize) -> SimulationParams {
    let mut params = SimulationParams::lid_driven_cavity(n);
    params.steps_per_frame = 1;
    params
}

#[test]
fn history_decimates_while_running() {
    let mut params = cavity(9);
    params.history_capacity = 4;
    params.auto_stop_time = Some(0.0105);

    let scheduler = SimulationScheduler::new(Simulator::new(params).unwrap());
    let events = scheduler.subscribe();
    let handle = scheduler.spawn().unwrap();

    let mut strides = Vec::new();
    wait_for(&events, |e| {
        if let SchedulerEvent::Decimated { stride, .. } = e {
            strides.push(*stride);
        }
        matches!(e, SchedulerEvent::AutoStopped { .. })
    });
    assert_eq!(strides, vec![2, 4]);
    assert_eq!(handle.state(), SchedulerState::AutoStopped);

    let progress = handle.progress();
    assert_eq!(progress.completed_steps, 11);
    assert_eq!(progress.completed_frames, 11);

    assert_eq!(handle.stride(), 4);
    let frames = handle.frames();
    let indices: Vec<u64> = frames.iter().map(|f| f.index).collect();
    assert_eq!(indices, vec![0, 4, 8]);
    for pair in frames.windows(2) {
        assert!((pair[1].time - pair[0].time - 0.004).abs() < 1e-9);
    }
    assert_eq!(handle.history_len(), 3);
    assert_eq!(handle.latest_frame().map(|f| f.index), Some(8));

    let simulator = handle.stop().unwrap();
    assert_eq!(simulator.steps(), 11);
}

#[test]
fn initial_frame_is_entry_zero() {
    let scheduler = SimulationScheduler::new(Simulator::new(cavity(9)).unwrap()).start_paused();
    let events = scheduler.subscribe();
    let handle = scheduler.spawn().unwrap();

    assert_eq!(handle.history_len(), 1);
    let first = handle.frame(0).unwrap();
    assert_eq!(first.index, 0);
    assert_eq!(first.time, 0.0);
    assert!(handle.frame(1).is_none());

    match events.try_recv() {
        Ok(SchedulerEvent::Started { wp, hp, .. }) => assert_eq!((wp, hp), (9, 9)),
        other => panic!("unexpected: {:?}", other),
    }
    match events.try_recv() {
        Ok(SchedulerEvent::FrameArchived { index, frame, .. }) => {
            assert_eq!(index, 0);
            assert!(Arc::ptr_eq(&frame, &first.frame));
        }
        other => panic!("unexpected: {:?}", other),
    }

    // 启动即暂停，不会推进
    thread::sleep(Duration::from_millis(50));
    assert_eq!(handle.state(), SchedulerState::Paused);
    assert_eq!(handle.sim_time(), 0.0);
    assert_eq!(handle.history_len(), 1);

    handle.resume().unwrap();
    wait_for(&events, |e| {
        matches!(e, SchedulerEvent::FrameArchived { index, .. } if *index >= 2)
    });
    assert!(handle.sim_time() > 0.0);
    handle.stop().unwrap();
}

#[test]
fn pause_resume_and_stop() {
    let scheduler = SimulationScheduler::new(Simulator::new(cavity(33)).unwrap())
        .with_listener(Arc::new(LoggingListener::new("test")));
    let events = scheduler.subscribe();
    let handle = scheduler.spawn().unwrap();

    wait_for(&events, |e| {
        matches!(e, SchedulerEvent::FrameArchived { index, .. } if *index >= 2)
    });

    handle.pause().unwrap();
    wait_for(&events, |e| matches!(e, SchedulerEvent::Paused { .. }));
    assert_eq!(handle.state(), SchedulerState::Paused);

    let paused = handle.progress();
    let paused_len = handle.history_len();
    thread::sleep(Duration::from_millis(100));
    assert_eq!(handle.progress().completed_steps, paused.completed_steps);
    assert_eq!(handle.history_len(), paused_len);

    handle.resume().unwrap();
    wait_for(&events, |e| matches!(e, SchedulerEvent::Resumed { .. }));
    let target = paused.completed_frames + 2;
    wait_for(&events, |e| {
        matches!(e, SchedulerEvent::FrameArchived { index, .. } if *index >= target)
    });

    let simulator = handle.stop().unwrap();
    assert!(simulator.steps() >= target);
    assert!(!simulator.is_crashed());

    let stopped = wait_for(&events, |e| matches!(e, SchedulerEvent::Stopped { .. }));
    if let SchedulerEvent::Stopped { steps, .. } = stopped {
        assert_eq!(steps, simulator.steps());
    }
}

#[test]
fn stop_interrupts_long_relaxation() {
    let mut params = cavity(129);
    params.tuning.pause_check_interval = 10;
    let scheduler = SimulationScheduler::new(Simulator::new(params).unwrap());
    let events = scheduler.subscribe();
    let handle = scheduler.spawn().unwrap();

    wait_for(&events, |e| {
        matches!(e, SchedulerEvent::FrameArchived { index, .. } if *index >= 1)
    });
    let simulator = handle.stop().unwrap();
    assert!(simulator.steps() >= 1);
    assert!(simulator.current().is_finite());
}

#[test]
fn sweep_count_is_visible_while_running() {
    let mut params = cavity(129);
    params.tuning.pause_check_interval = 10;
    let handle = SimulationScheduler::new(Simulator::new(params).unwrap())
        .spawn()
        .unwrap();

    let deadline = Instant::now() + TIMEOUT;
    let mut observed = None;
    while Instant::now() < deadline {
        let progress = handle.progress();
        if progress.state == SchedulerState::Running && progress.sweeps_in_progress > 0 {
            observed = Some(progress.sweeps_in_progress);
            break;
        }
        thread::sleep(Duration::from_millis(1));
    }

    let sweeps = observed.expect("sweep count never reported while running");
    assert_eq!(sweeps % 10, 0);
    assert_eq!(handle.state(), SchedulerState::Running);
    assert_eq!(handle.sweeps_in_progress() % 10, 0);
    handle.stop().unwrap();
}

#[test]
fn crash_is_reported_and_terminal() {
    let params = SimulationParams::channel_with_cylinder(21, 11, 1.0e6, 0.1);
    let scheduler = SimulationScheduler::new(Simulator::new(params).unwrap());
    let events = scheduler.subscribe();
    let handle = scheduler.spawn().unwrap();

    wait_for(&events, |e| matches!(e, SchedulerEvent::Crashed { .. }));
    assert!(handle.is_crashed());
    assert_eq!(handle.history_len(), 1);
    assert_eq!(handle.sim_time(), 0.0);

    // 崩溃后恢复无效
    handle.resume().unwrap();
    thread::sleep(Duration::from_millis(50));
    assert!(handle.is_crashed());
    assert_eq!(handle.progress().completed_steps, 0);

    let simulator = handle.stop().unwrap();
    assert!(simulator.is_crashed());
}

#[test]
fn resume_continues_past_auto_stop() {
    let mut params = cavity(9);
    params.auto_stop_time = Some(0.0045);
    let scheduler = SimulationScheduler::new(Simulator::new(params).unwrap());
    let events = scheduler.subscribe();
    let handle = scheduler.spawn().unwrap();

    wait_for(&events, |e| matches!(e, SchedulerEvent::AutoStopped { .. }));
    let stopped_at = handle.sim_time();
    assert!(stopped_at >= 0.0045 && stopped_at < 0.0056);
    assert_eq!(handle.progress().completed_steps, 5);

    handle.resume().unwrap();
    let mut more_auto_stops = 0;
    wait_for(&events, |e| {
        if matches!(e, SchedulerEvent::AutoStopped { .. }) {
            more_auto_stops += 1;
        }
        matches!(e, SchedulerEvent::FrameArchived { time, .. } if *time > 0.009)
    });
    assert_eq!(handle.state(), SchedulerState::Running);

    handle.stop().unwrap();
    more_auto_stops += events
        .try_iter()
        .filter(|e| matches!(e, SchedulerEvent::AutoStopped { .. }))
        .count();
    assert_eq!(more_auto_stops, 0);
}

#[test]
fn concurrent_readers_see_monotonic_history() {
    let mut params = cavity(17);
    params.history_capacity = 8;
    params.auto_stop_time = Some(0.06);
    let scheduler = SimulationScheduler::new(Simulator::new(params).unwrap());
    let events = scheduler.subscribe();
    let handle = scheduler.spawn().unwrap();

    thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| {
                for _ in 0..200 {
                    let frames = handle.frames();
                    assert!(!frames.is_empty());
                    assert_eq!(frames[0].index, 0);
                    for pair in frames.windows(2) {
                        assert!(pair[1].time > pair[0].time);
                        assert!(pair[1].index > pair[0].index);
                    }
                    if let Some(latest) = handle.latest_frame() {
                        assert!(latest.frame.is_finite());
                    }
                    thread::sleep(Duration::from_millis(1));
                }
            });
        }
    });

    wait_for(&events, |e| matches!(e, SchedulerEvent::AutoStopped { .. }));
    let frames = handle.frames();
    assert!(frames.len() <= 8);
    let spacing = frames[1].time - frames[0].time;
    for pair in frames.windows(2) {
        assert!((pair[1].time - pair[0].time - spacing).abs() < 1e-9);
    }
    handle.stop().unwrap();
}
