//! Hand-detector side of the controller.
//!
//! The public interface is [`DetectorResult`] delivered over a `mpsc`
//! channel.  Consumers don't need to know whether results came from a real
//! camera pipeline or a simulator.

use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use crate::landmark::{DetectorResult, Landmark};

// ════════════════════════════════════════════════════════════════════════════
// DetectorConfig
// ════════════════════════════════════════════════════════════════════════════

/// Options handed to the hand detector when it is configured.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DetectorConfig {
    /// The controller tracks exactly one hand.
    pub max_hands:                usize,
    pub model_complexity:         u8,
    pub min_detection_confidence: f32,
    pub min_tracking_confidence:  f32,
    /// Requested camera resolution (width, height).
    pub camera_size:              (u32, u32),
}

impl Default for DetectorConfig {
    fn default() -> Self {
        DetectorConfig {
            max_hands:                1,
            model_complexity:         1,
            min_detection_confidence: 0.7,
            min_tracking_confidence:  0.6,
            camera_size:              (1280, 720),
        }
    }
}

impl DetectorConfig {
    /// Keep at most `max_hands` hands whose score clears the detection
    /// confidence, in detector order.
    pub fn filter_hands<I>(&self, scored: I) -> DetectorResult
    where
        I: IntoIterator<Item = (f32, Vec<Landmark>)>,
    {
        let hands = scored.into_iter()
            .filter(|(score, _)| *score >= self.min_detection_confidence)
            .map(|(_, lms)| lms)
            .take(self.max_hands)
            .collect();
        DetectorResult { hands }
    }

    /// One-line description of every option, for startup logs.
    pub fn summary(&self) -> String {
        let (w, h) = self.camera_size;
        format!(
            "camera {}x{}, max hands {}, model complexity {}, confidence {:.1}/{:.1}",
            w, h, self.max_hands, self.model_complexity,
            self.min_detection_confidence, self.min_tracking_confidence
        )
    }
}

// ════════════════════════════════════════════════════════════════════════════
// LandmarkSource trait
// ════════════════════════════════════════════════════════════════════════════

/// Anything that can deliver [`DetectorResult`]s over a channel.
///
/// Implementations send one result per processed camera frame, empty when
/// no hand was found, and return once the receiver hangs up.
pub trait LandmarkSource: Send + 'static {
    fn run(self: Box<Self>, tx: Sender<DetectorResult>);
}

/// Spawn a landmark source on its own thread and return the receiving end.
pub fn spawn_landmark_source<S: LandmarkSource>(source: S) -> Receiver<DetectorResult> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || Box::new(source).run(tx));
    rx
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
