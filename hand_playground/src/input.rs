//! Landmark sources for the playground.
//!
//! * [`SimLandmarkSource`]: the window's mouse stands in for a hand.  The
//!   thumb tip follows the pointer, holding the left button pinches the index
//!   tip onto it, and a pointer outside the window means no hand.
//! * [`JsonLinesSource`]: one JSON object per line from an external
//!   hand-landmark process (e.g. a MediaPipe script piping into stdin).
//!
//! Both run on their own thread via [`spawn_landmark_source`] and only ever
//! produce [`DetectorResult`]s.
//!
//! [`spawn_landmark_source`]: pinch_grab::source::spawn_landmark_source

use std::io::{BufRead, BufReader, Stdin};
use std::sync::mpsc::{Receiver, Sender};

use glam::Vec2;
use serde::Deserialize;

use pinch_grab::source::{DetectorConfig, LandmarkSource};
use pinch_grab::{Canvas, DetectorResult, Landmark};

// ════════════════════════════════════════════════════════════════════════════
// SimLandmarkSource: mouse simulation
// ════════════════════════════════════════════════════════════════════════════

/// Raw input from the simulation window.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SimInput {
    /// Pointer inside the canvas, in canvas pixels.
    Hand { point: Vec2, canvas: Canvas, pinched: bool },
    NoHand,
    Quit,
}

/// Screen-space offsets of an open right hand from its thumb tip, in landmark
/// order.
const OPEN_HAND: [(f32, f32); 21] = [
    ( 60.0, 110.0),                                                   // wrist
    ( 40.0,  90.0), ( 25.0,  65.0), ( 12.0,  30.0), (  0.0,   0.0),   // thumb
    ( 80.0,  40.0), ( 85.0,  10.0), ( 88.0, -12.0), ( 90.0, -30.0),   // index
    (100.0,  45.0), (108.0,  10.0), (112.0, -15.0), (115.0, -35.0),   // middle
    (118.0,  55.0), (128.0,  25.0), (133.0,   5.0), (136.0, -12.0),   // ring
    (133.0,  70.0), (145.0,  50.0), (151.0,  36.0), (156.0,  22.0),   // pinky
];

/// Index finger joints (PIP, DIP, tip) curled onto the thumb.
const PINCHED_INDEX: [(f32, f32); 3] = [(50.0, 12.0), (24.0, 2.0), (8.0, -4.0)];

/// Landmarks a detector would report for a hand whose thumb tip sits at
/// `point` on `canvas`.
pub fn synthetic_hand(point: Vec2, canvas: Canvas, pinched: bool) -> Vec<Landmark> {
    let mut offsets = OPEN_HAND;
    if pinched {
        offsets[6..9].copy_from_slice(&PINCHED_INDEX);
    }
    offsets.iter()
        .map(|&(dx, dy)| {
            let s = point + Vec2::new(dx, dy);
            // Undo the front-camera mirror.
            Landmark::new(1.0 - s.x / canvas.width, s.y / canvas.height)
        })
        .collect()
}

/// Landmark source driven by [`SimInput`] events from the visualizer.
pub struct SimLandmarkSource {
    pub rx: Receiver<SimInput>,
}

impl SimLandmarkSource {
    pub fn new(rx: Receiver<SimInput>) -> Self { SimLandmarkSource { rx } }
}

impl LandmarkSource for SimLandmarkSource {
    fn run(self: Box<Self>, tx: Sender<DetectorResult>) {
        for input in self.rx {
            let result = match input {
                SimInput::Hand { point, canvas, pinched } =>
                    DetectorResult { hands: vec![synthetic_hand(point, canvas, pinched)] },
                SimInput::NoHand => DetectorResult::empty(),
                SimInput::Quit   => return,
            };
            if tx.send(result).is_err() { return; }
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// JsonLinesSource: external detector process
// ════════════════════════════════════════════════════════════════════════════

#[derive(Deserialize, Debug)]
struct LandmarkJson {
    x: f32,
    y: f32,
}

#[derive(Deserialize, Debug)]
struct HandJson {
    #[serde(default = "full_confidence")]
    score:     f32,
    landmarks: Vec<LandmarkJson>,
}

#[derive(Deserialize, Debug)]
struct FrameJson {
    #[serde(default)]
    hands: Vec<HandJson>,
    #[serde(default)]
    error: Option<String>,
}

fn full_confidence() -> f32 { 1.0 }

/// Reads detector frames such as
///
/// ```text
/// {"hands":[{"score":0.93,"landmarks":[{"x":0.41,"y":0.52},…]}]}
/// {"hands":[]}
/// {"error":"camera unavailable"}
/// ```
///
/// one per line.  Hands are filtered through the [`DetectorConfig`].
/// Malformed lines are logged and skipped; an `error` frame counts as a
/// frame without hands.
pub struct JsonLinesSource<R> {
    reader: R,
    config: DetectorConfig,
}

impl<R: BufRead + Send + 'static> JsonLinesSource<R> {
    pub fn new(reader: R, config: DetectorConfig) -> Self {
        JsonLinesSource { reader, config }
    }

    pub fn parse_line(&self, line: &str) -> Option<DetectorResult> {
        parse_frame(&self.config, line)
    }
}

fn parse_frame(config: &DetectorConfig, line: &str) -> Option<DetectorResult> {
    let line = line.trim();
    if line.is_empty() { return None; }

    let frame: FrameJson = match serde_json::from_str(line) {
        Ok(f)  => f,
        Err(e) => {
            log::warn!("unreadable detector line ({}): {}", e, line);
            return None;
        }
    };
    if let Some(error) = frame.error {
        log::warn!("detector error: {}", error);
        return Some(DetectorResult::empty());
    }

    let scored = frame.hands.into_iter().map(|hand| {
        let lms = hand.landmarks.iter().map(|lm| Landmark::new(lm.x, lm.y)).collect();
        (hand.score, lms)
    });
    Some(config.filter_hands(scored))
}

impl JsonLinesSource<BufReader<Stdin>> {
    pub fn stdin(config: DetectorConfig) -> Self {
        JsonLinesSource::new(BufReader::new(std::io::stdin()), config)
    }
}

impl<R: BufRead + Send + 'static> LandmarkSource for JsonLinesSource<R> {
    fn run(self: Box<Self>, tx: Sender<DetectorResult>) {
        let JsonLinesSource { reader, config } = *self;
        for line in reader.lines() {
            let line = match line {
                Ok(l)  => l,
                Err(e) => {
                    log::error!("detector stream read failed: {}", e);
                    return;
                }
            };
            if let Some(result) = parse_frame(&config, &line) {
                if tx.send(result).is_err() { return; }
            }
        }
        log::info!("detector stream closed");
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
