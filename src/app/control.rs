//! Control loop — the composition root's periodic driver.
//!
//! Every `classification_interval` it asks the classifier who is at the
//! camera and, for a confident non-reserved label, hands the subject to
//! the [`StationManager`].  It holds no state of its own beyond the
//! classifier.

use core::time::Duration;

use async_io_mini::Timer;
use log::info;

use crate::config::FeederConfig;
use crate::feeder::StationManager;

use super::classifier::SubjectClassifier;
use super::ports::{Board, EventSink, VisionPort};

/// What happened to one camera frame.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameOutcome {
    /// No subject at or above the confidence threshold.
    NoDetection,
    /// The reserved catch-all label; never routed.
    Ignored,
    /// Routed to the manager; `opened` is its verdict.
    Routed { subject: String, opened: bool },
}

pub struct ControlLoop<'m, 'e, B: Board, S, V> {
    manager: &'m StationManager<'e, B, S>,
    classifier: SubjectClassifier<V>,
    interval: Duration,
    ignored_label: String,
}

impl<'m, 'e, B, S, V> ControlLoop<'m, 'e, B, S, V>
where
    B: Board,
    B::Pin: 'static,
    S: EventSink + 'static,
    V: VisionPort,
{
    pub fn new(
        manager: &'m StationManager<'e, B, S>,
        classifier: SubjectClassifier<V>,
        config: &FeederConfig,
    ) -> Self {
        Self {
            manager,
            classifier,
            interval: config.classification_interval(),
            ignored_label: config.ignored_label.to_lowercase(),
        }
    }

    /// Classify one frame and route it if warranted.
    pub fn process_frame(&mut self) -> FrameOutcome {
        let classification = self.classifier.classify();
        let Some(subject) = classification.subject else {
            return FrameOutcome::NoDetection;
        };
        if subject.to_lowercase() == self.ignored_label {
            return FrameOutcome::Ignored;
        }

        info!(
            "Subject detected: {} (confidence: {:.2})",
            subject, classification.confidence
        );
        let opened = self.manager.route_detection(&subject);
        FrameOutcome::Routed { subject, opened }
    }

    /// Process frames on a fixed cadence until `should_stop` returns true.
    /// The stop predicate is checked once per cycle.
    pub async fn run(&mut self, mut should_stop: impl FnMut() -> bool) {
        while !should_stop() {
            self.process_frame();
            Timer::after(self.interval).await;
        }
        info!("Control loop stopped");
    }
}
