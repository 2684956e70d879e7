//! Confidence-gated subject classification.
//!
//! Wraps a raw [`VisionPort`] and turns its answer into the
//! `(subject, confidence)` pair the control loop consumes.  Never fails:
//! a vision error becomes `(None, 0.0)`.

use log::{debug, error};

use super::ports::VisionPort;

/// What the control loop sees for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    /// Set only when confidence reached the threshold.
    pub subject: Option<String>,
    pub confidence: f32,
}

impl Classification {
    fn none(confidence: f32) -> Self {
        Self {
            subject: None,
            confidence,
        }
    }
}

pub struct SubjectClassifier<V> {
    vision: V,
    threshold: f32,
}

impl<V: VisionPort> SubjectClassifier<V> {
    pub fn new(vision: V, threshold: f32) -> Self {
        Self { vision, threshold }
    }

    pub fn classify(&mut self) -> Classification {
        let top = match self.vision.top_classification() {
            Ok(Some(top)) => top,
            Ok(None) => {
                debug!("No classifications returned");
                return Classification::none(0.0);
            }
            Err(e) => {
                error!("Error during classification: {}", e);
                return Classification::none(0.0);
            }
        };

        debug!("Classification: {} (confidence: {:.2})", top.label, top.confidence);
        if top.confidence < self.threshold {
            debug!(
                "Confidence below threshold: {:.2} < {:.2}",
                top.confidence, self.threshold
            );
            return Classification::none(top.confidence);
        }
        Classification {
            subject: Some(top.label),
            confidence: top.confidence,
        }
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }
}
