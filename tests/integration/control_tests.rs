//! Integration tests for the classify → route pipeline.

use core::cell::Cell;

use futures_lite::future::block_on;

use petfeeder::adapters::sim::ScriptedVision;
use petfeeder::app::classifier::SubjectClassifier;
use petfeeder::app::control::{ControlLoop, FrameOutcome};
use petfeeder::app::events::FeederEvent;
use petfeeder::app::ports::VisionError;
use petfeeder::config::StationId;
use petfeeder::feeder::Executor;

use crate::mock_hw::{count_events, fast_config, rig};

#[test]
fn frames_are_filtered_then_routed() {
    let executor = Executor::new();
    block_on(executor.run(async {
        let config = fast_config();
        let (manager, bays, sink) = rig(&executor, &config);
        bays[0].sensor.set_input(true);

        let mut vision = ScriptedVision::new();
        vision
            .push_detection("Whiskers", 0.92)
            .push_detection("others", 0.99)
            .push_detection("tom", 0.5)
            .push_error(VisionError::Unavailable)
            .push_empty()
            .push_detection("whiskers", 0.95);
        let classifier = SubjectClassifier::new(vision, config.confidence_threshold);
        let mut control = ControlLoop::new(&manager, classifier, &config);

        assert_eq!(
            control.process_frame(),
            FrameOutcome::Routed {
                subject: "Whiskers".into(),
                opened: true
            }
        );
        assert_eq!(control.process_frame(), FrameOutcome::Ignored);
        assert_eq!(control.process_frame(), FrameOutcome::NoDetection);
        assert_eq!(control.process_frame(), FrameOutcome::NoDetection);
        assert_eq!(control.process_frame(), FrameOutcome::NoDetection);
        // Station 1 is still serving the first visit.
        assert_eq!(
            control.process_frame(),
            FrameOutcome::Routed {
                subject: "whiskers".into(),
                opened: false
            }
        );

        // Low-confidence `tom` never reached the manager.
        assert!(!manager.station(StationId(2)).unwrap().is_busy());
        assert_eq!(
            count_events(&sink, |e| matches!(e, FeederEvent::Opened { .. })),
            1
        );
        manager.close_all().await;
    }));
}

#[test]
fn reserved_label_never_opens_anything() {
    let executor = Executor::new();
    block_on(executor.run(async {
        let mut config = fast_config();
        // Even if someone assigns it, the reserved label is filtered first.
        config.assign("others", StationId(3));
        let (manager, bays, _sink) = rig(&executor, &config);

        let mut vision = ScriptedVision::new();
        vision.push_detection("Others", 1.0);
        let classifier = SubjectClassifier::new(vision, config.confidence_threshold);
        let mut control = ControlLoop::new(&manager, classifier, &config);

        assert_eq!(control.process_frame(), FrameOutcome::Ignored);
        assert!(!bays[2].servo.output_high());
    }));
}

#[test]
fn run_stops_when_asked_and_shutdown_closes_gates() {
    let executor = Executor::new();
    block_on(executor.run(async {
        let config = fast_config();
        let (manager, bays, sink) = rig(&executor, &config);
        bays[0].sensor.set_input(true);
        bays[1].sensor.set_input(true);

        let vision = ScriptedVision::from_json(
            r#"[null, {"label": "whiskers", "confidence": 0.9}, {"label": "tom", "confidence": 0.8}]"#,
        )
        .unwrap();
        let classifier = SubjectClassifier::new(vision, config.confidence_threshold);
        let mut control = ControlLoop::new(&manager, classifier, &config);

        let cycles = Cell::new(0);
        control
            .run(|| {
                cycles.set(cycles.get() + 1);
                cycles.get() > 5
            })
            .await;

        assert!(manager.station(StationId(1)).unwrap().is_busy());
        assert!(manager.station(StationId(2)).unwrap().is_busy());

        manager.close_all().await;
        assert!(bays.iter().all(|b| !b.servo.output_high()));
        assert_eq!(
            count_events(&sink, |e| matches!(e, FeederEvent::Closed { .. })),
            2
        );
    }));
}
