//! Integration tests for routing, monitoring and shutdown through the
//! `StationManager` on a simulated board.
//!
//! Each test drives the real executor with real timers; timings come from
//! `fast_config` so a full open cycle takes a few hundred milliseconds.

use futures_lite::future::block_on;

use petfeeder::adapters::sim::SimBoard;
use petfeeder::app::events::FeederEvent;
use petfeeder::config::StationId;
use petfeeder::error::{ConfigError, Error, HardwareError};
use petfeeder::feeder::{Executor, MonitorExit, Rejection, StationManager, StationPhase};

use crate::mock_hw::{SharedSink, closed_exits, count_events, fast_config, rig, settle};

const S1: StationId = StationId(1);
const S2: StationId = StationId(2);
const S3: StationId = StationId(3);

// ── Routing ───────────────────────────────────────────────────

#[test]
fn detections_route_to_assigned_stations() {
    let executor = Executor::new();
    block_on(executor.run(async {
        let (manager, bays, sink) = rig(&executor, &fast_config());
        bays[0].sensor.set_input(true);
        bays[1].sensor.set_input(true);

        assert_eq!(manager.station_for("Whiskers"), Some(S1));
        assert!(manager.route_detection("whiskers"));
        assert!(manager.route_detection("TOM"));

        assert!(bays[0].servo.output_high());
        assert!(bays[1].servo.output_high());
        assert!(!bays[2].servo.output_high());
        assert_eq!(manager.active_monitors(), 2);
        assert!(manager.is_monitoring(S1));
        assert!(manager.is_monitoring(S2));
        assert!(!manager.is_monitoring(S3));
        assert_eq!(
            count_events(&sink, |e| matches!(e, FeederEvent::Opened { .. })),
            2
        );

        manager.close_all().await;
    }));
}

#[test]
fn second_detection_while_busy_is_dropped() {
    let executor = Executor::new();
    block_on(executor.run(async {
        let (manager, bays, sink) = rig(&executor, &fast_config());
        bays[0].sensor.set_input(true);

        assert!(manager.route_detection("whiskers"));
        settle(10).await;
        assert!(!manager.route_detection("whiskers"));

        // One open command, one monitor, one rejection.
        assert_eq!(bays[0].servo.digital_writes(true), 1);
        assert_eq!(manager.active_monitors(), 1);
        assert!(sink.borrow().events.contains(&FeederEvent::Rejected {
            station: S1,
            subject: "whiskers".into(),
            reason: Rejection::Busy,
        }));

        manager.close_all().await;
    }));
}

#[test]
fn unknown_subject_is_reported_and_ignored() {
    let executor = Executor::new();
    block_on(executor.run(async {
        let (manager, bays, sink) = rig(&executor, &fast_config());

        assert!(!manager.route_detection("garfield"));
        assert!(bays.iter().all(|b| !b.servo.output_high()));
        assert_eq!(manager.active_monitors(), 0);
        assert!(sink.borrow().events.contains(&FeederEvent::UnknownSubject {
            subject: "garfield".into(),
        }));
    }));
}

#[test]
fn assignment_to_missing_station_fails_construction() {
    let executor = Executor::new();
    let mut config = fast_config();
    config.assign("felix", StationId(7));
    let result = StationManager::new(
        &executor,
        SimBoard::new(),
        &config,
        SharedSink::default(),
    );
    assert!(matches!(
        result.err(),
        Some(ConfigError::UnknownStation { station: StationId(7), .. })
    ));
}

#[test]
fn missing_pin_aborts_setup() {
    let executor = Executor::new();
    let manager = StationManager::new(
        &executor,
        SimBoard::with_pins(&["18", "23"]),
        &fast_config(),
        SharedSink::default(),
    )
    .unwrap();
    assert_eq!(
        manager.setup(),
        Err(HardwareError::PinNotFound("19".into()))
    );
}

#[test]
fn start_reports_setup_failure_as_hardware_error() {
    let executor = Executor::new();
    let result = StationManager::start(
        &executor,
        SimBoard::with_pins(&["18"]),
        &fast_config(),
        SharedSink::default(),
    );
    assert!(matches!(
        result.err(),
        Some(Error::Hardware(HardwareError::PinNotFound(pin))) if pin == "23"
    ));
}

#[test]
fn open_failure_leaves_station_idle() {
    let executor = Executor::new();
    block_on(executor.run(async {
        let (manager, bays, sink) = rig(&executor, &fast_config());
        bays[0].servo.fail_writes(true);

        assert!(!manager.route_detection("whiskers"));
        let station = manager.station(S1).unwrap();
        assert_eq!(station.phase(), StationPhase::Idle);
        assert!(!manager.is_monitoring(S1));
        assert_eq!(
            count_events(&sink, |e| matches!(e, FeederEvent::OpenFailed { station: S1, .. })),
            1
        );

        // Hardware recovers; the next detection opens normally.
        bays[0].servo.fail_writes(false);
        assert!(manager.route_detection("whiskers"));
        manager.close_all().await;
    }));
}

// ── Monitoring ────────────────────────────────────────────────

#[test]
fn gate_closes_after_subject_departs() {
    let executor = Executor::new();
    block_on(executor.run(async {
        let (manager, bays, sink) = rig(&executor, &fast_config());
        bays[0].sensor.set_input(true);

        assert!(manager.route_detection("whiskers"));
        settle(40).await;
        assert!(manager.station(S1).unwrap().is_busy());
        assert!(bays[0].servo.output_high());

        bays[0].sensor.set_input(false);
        settle(120).await;

        let station = manager.station(S1).unwrap();
        assert!(!station.is_busy());
        assert!(!station.gate_is_open());
        assert!(!bays[0].servo.output_high());
        assert_eq!(closed_exits(&sink, S1), vec![MonitorExit::Departed]);
        assert_eq!(manager.active_monitors(), 0);
    }));
}

#[test]
fn brief_absence_within_grace_keeps_gate_open() {
    let executor = Executor::new();
    block_on(executor.run(async {
        let (manager, bays, sink) = rig(&executor, &fast_config());
        bays[0].sensor.set_input(true);
        assert!(manager.route_detection("whiskers"));
        settle(10).await;

        // Empty for a single read, back before the grace period ends.
        bays[0].sensor.script_inputs(&[false, true]);
        settle(60).await;

        assert!(manager.station(S1).unwrap().is_busy());
        assert!(closed_exits(&sink, S1).is_empty());
        manager.close_all().await;
    }));
}

#[test]
fn gate_closes_on_timeout_while_subject_stays() {
    let executor = Executor::new();
    block_on(executor.run(async {
        let (manager, bays, sink) = rig(&executor, &fast_config());
        bays[0].sensor.set_input(true);

        assert!(manager.route_detection("whiskers"));
        settle(350).await;

        assert!(!manager.station(S1).unwrap().is_busy());
        assert!(!bays[0].servo.output_high());
        assert_eq!(closed_exits(&sink, S1), vec![MonitorExit::Timeout]);

        // Subject is still there; a fresh detection reopens.
        assert!(manager.route_detection("whiskers"));
        manager.close_all().await;
    }));
}

#[test]
fn sensor_fault_closes_gate() {
    let executor = Executor::new();
    block_on(executor.run(async {
        let (manager, bays, sink) = rig(&executor, &fast_config());
        bays[0].sensor.set_input(true);
        assert!(manager.route_detection("whiskers"));
        settle(10).await;

        bays[0].sensor.fail_reads(true);
        settle(30).await;

        assert!(!manager.station(S1).unwrap().is_busy());
        assert!(!bays[0].servo.output_high());
        assert_eq!(
            closed_exits(&sink, S1),
            vec![MonitorExit::Fault(HardwareError::ReadFailed("23".into()))]
        );
    }));
}

#[test]
fn close_failure_still_releases_station() {
    let executor = Executor::new();
    block_on(executor.run(async {
        let (manager, bays, _sink) = rig(&executor, &fast_config());
        bays[0].sensor.set_input(true);
        assert!(manager.route_detection("whiskers"));
        settle(10).await;

        bays[0].servo.fail_writes(true);
        bays[0].sensor.set_input(false);
        settle(120).await;

        // The close command failed but the station is free again.
        assert!(!manager.station(S1).unwrap().is_busy());
        assert_eq!(manager.active_monitors(), 0);

        bays[0].servo.fail_writes(false);
        bays[0].sensor.set_input(true);
        assert!(manager.route_detection("whiskers"));
        manager.close_all().await;
    }));
}

#[test]
fn stations_cycle_independently() {
    let executor = Executor::new();
    block_on(executor.run(async {
        let (manager, bays, sink) = rig(&executor, &fast_config());
        bays[0].sensor.set_input(true);
        bays[1].sensor.set_input(true);
        assert!(manager.route_detection("whiskers"));
        assert!(manager.route_detection("tom"));
        settle(20).await;

        bays[1].sensor.set_input(false);
        settle(120).await;

        assert!(manager.station(S1).unwrap().is_busy());
        assert!(!manager.station(S2).unwrap().is_busy());
        assert_eq!(closed_exits(&sink, S2), vec![MonitorExit::Departed]);
        assert!(closed_exits(&sink, S1).is_empty());
        manager.close_all().await;
    }));
}

// ── Shutdown ──────────────────────────────────────────────────

#[test]
fn close_all_cancels_and_joins_every_monitor() {
    let executor = Executor::new();
    block_on(executor.run(async {
        let (manager, bays, sink) = rig(&executor, &fast_config());
        bays[0].sensor.set_input(true);
        bays[1].sensor.set_input(true);
        assert!(manager.route_detection("whiskers"));
        assert!(manager.route_detection("tom"));
        settle(10).await;

        manager.close_all().await;

        assert_eq!(manager.active_monitors(), 0);
        for station in manager.stations() {
            assert_eq!(station.phase(), StationPhase::Idle);
            assert!(!station.gate_is_open());
        }
        assert!(bays.iter().all(|b| !b.servo.output_high()));
        assert_eq!(closed_exits(&sink, S1), vec![MonitorExit::Cancelled]);
        assert_eq!(closed_exits(&sink, S2), vec![MonitorExit::Cancelled]);
        assert_eq!(
            sink.borrow().events.last(),
            Some(&FeederEvent::Shutdown { stations: 3 })
        );
    }));
}

#[test]
fn close_all_during_departure_grace_is_a_cancel() {
    let executor = Executor::new();
    block_on(executor.run(async {
        let (manager, bays, sink) = rig(&executor, &fast_config());
        assert!(manager.route_detection("whiskers"));
        // Bay reads empty from the start: the monitor is now in its grace sleep.
        settle(10).await;

        manager.close_all().await;
        assert_eq!(closed_exits(&sink, S1), vec![MonitorExit::Cancelled]);
        assert!(!bays[0].servo.output_high());
    }));
}

#[test]
fn close_all_is_idempotent() {
    let executor = Executor::new();
    block_on(executor.run(async {
        let (manager, bays, sink) = rig(&executor, &fast_config());

        // Nothing open.
        manager.close_all().await;
        manager.close_all().await;
        assert_eq!(
            count_events(&sink, |e| matches!(e, FeederEvent::Shutdown { .. })),
            2
        );
        assert!(bays.iter().all(|b| !b.servo.output_high()));

        // Something open, then closed twice.
        bays[0].sensor.set_input(true);
        assert!(manager.route_detection("whiskers"));
        manager.close_all().await;
        manager.close_all().await;
        assert_eq!(closed_exits(&sink, S1), vec![MonitorExit::Cancelled]);
        assert_eq!(manager.active_monitors(), 0);
    }));
}

#[test]
fn close_all_tolerates_servo_faults() {
    let executor = Executor::new();
    block_on(executor.run(async {
        let (manager, bays, _sink) = rig(&executor, &fast_config());
        bays[0].sensor.set_input(true);
        assert!(manager.route_detection("whiskers"));
        for bay in &bays {
            bay.servo.fail_writes(true);
        }

        manager.close_all().await;
        for station in manager.stations() {
            assert!(!station.is_busy());
        }
    }));
}

#[test]
fn setup_reports_ready() {
    let executor = Executor::new();
    let (_manager, _bays, sink) = rig(&executor, &fast_config());
    assert_eq!(sink.borrow().events, vec![FeederEvent::Ready { stations: 3 }]);
}
