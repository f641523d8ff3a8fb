//! Hand landmarks and the screen-space projection the rest of the pipeline
//! consumes.
//!
//! Detector coordinates are normalised to the video frame and come from a
//! front-facing camera, so every projected point is mirrored on x.

use glam::Vec2;
use thiserror::Error;

/// Number of keypoints in one tracked hand.
pub const LANDMARK_COUNT: usize = 21;

/// Landmark indices (MediaPipe hand model).
pub mod index {
    pub const WRIST:             usize = 0;
    pub const THUMB_CMC:         usize = 1;
    pub const THUMB_MCP:         usize = 2;
    pub const THUMB_IP:          usize = 3;
    pub const THUMB_TIP:         usize = 4;
    pub const INDEX_FINGER_MCP:  usize = 5;
    pub const INDEX_FINGER_PIP:  usize = 6;
    pub const INDEX_FINGER_DIP:  usize = 7;
    pub const INDEX_FINGER_TIP:  usize = 8;
    pub const MIDDLE_FINGER_MCP: usize = 9;
    pub const MIDDLE_FINGER_PIP: usize = 10;
    pub const MIDDLE_FINGER_DIP: usize = 11;
    pub const MIDDLE_FINGER_TIP: usize = 12;
    pub const RING_FINGER_MCP:   usize = 13;
    pub const RING_FINGER_PIP:   usize = 14;
    pub const RING_FINGER_DIP:   usize = 15;
    pub const RING_FINGER_TIP:   usize = 16;
    pub const PINKY_MCP:         usize = 17;
    pub const PINKY_PIP:         usize = 18;
    pub const PINKY_DIP:         usize = 19;
    pub const PINKY_TIP:         usize = 20;
}

// ════════════════════════════════════════════════════════════════════════════
// Landmark / LandmarkSample
// ════════════════════════════════════════════════════════════════════════════

/// One keypoint, normalised to the input video frame (0.0–1.0 on both axes).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
}

impl Landmark {
    pub const fn new(x: f32, y: f32) -> Self { Landmark { x, y } }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SampleError {
    #[error("expected {expected} landmarks, got {got}")]
    WrongLength { expected: usize, got: usize },
}

/// All 21 keypoints of one hand in one detector frame.
#[derive(Clone, Debug, PartialEq)]
pub struct LandmarkSample {
    points: [Landmark; LANDMARK_COUNT],
}

impl LandmarkSample {
    pub fn new(points: [Landmark; LANDMARK_COUNT]) -> Self {
        LandmarkSample { points }
    }

    pub fn get(&self, idx: usize) -> Option<Landmark> {
        self.points.get(idx).copied()
    }

    pub fn thumb_tip(&self) -> Landmark { self.points[index::THUMB_TIP] }
    pub fn index_tip(&self) -> Landmark { self.points[index::INDEX_FINGER_TIP] }

    pub fn points(&self) -> &[Landmark; LANDMARK_COUNT] { &self.points }
}

impl TryFrom<&[Landmark]> for LandmarkSample {
    type Error = SampleError;

    fn try_from(slice: &[Landmark]) -> Result<Self, Self::Error> {
        let points: [Landmark; LANDMARK_COUNT] = slice.try_into()
            .map_err(|_| SampleError::WrongLength {
                expected: LANDMARK_COUNT,
                got:      slice.len(),
            })?;
        Ok(LandmarkSample { points })
    }
}

/// What the detector reports for one processed camera frame.
///
/// `hands` is empty when nothing was detected.  Each hand is the raw
/// landmark list; validation happens in the session's frame pump.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DetectorResult {
    pub hands: Vec<Vec<Landmark>>,
}

impl DetectorResult {
    pub fn empty() -> Self { DetectorResult::default() }

    pub fn single(sample: &LandmarkSample) -> Self {
        DetectorResult { hands: vec![sample.points().to_vec()] }
    }

    pub fn first_hand(&self) -> Option<&[Landmark]> {
        self.hands.first().map(Vec::as_slice)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Canvas / HandPose (normalizer)
// ════════════════════════════════════════════════════════════════════════════

/// Screen-space drawing surface the cursor lives on.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Canvas {
    pub width:  f32,
    pub height: f32,
}

impl Canvas {
    pub const fn new(width: f32, height: f32) -> Self { Canvas { width, height } }

    pub fn center(&self) -> Vec2 { Vec2::new(self.width / 2.0, self.height / 2.0) }

    /// Mirrored projection of a normalised landmark onto the canvas.
    pub fn project(&self, lm: Landmark) -> Vec2 {
        Vec2::new((1.0 - lm.x) * self.width, lm.y * self.height)
    }
}

impl Default for Canvas {
    fn default() -> Self { Canvas::new(1280.0, 720.0) }
}

/// Screen-space reading of one hand.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HandPose {
    /// Thumb tip; drives the cursor.
    pub cursor:         Vec2,
    /// Index tip; the other end of the pinch.
    pub pinch_ref:      Vec2,
    pub pinch_distance: f32,
}

pub fn normalize(sample: &LandmarkSample, canvas: Canvas) -> HandPose {
    let cursor    = canvas.project(sample.thumb_tip());
    let pinch_ref = canvas.project(sample.index_tip());
    HandPose {
        cursor,
        pinch_ref,
        pinch_distance: cursor.distance(pinch_ref),
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
