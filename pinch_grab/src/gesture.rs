//! Pinch debouncing: continuous pinch distance in, discrete grab edges out.
//!
//! The level is a plain threshold comparison with no hysteresis band, so a
//! distance hovering right at the threshold produces alternating edges.
//! Consumers only ever see edges, never levels.

/// Default pinch threshold in screen-space units.
pub const DEFAULT_PINCH_THRESHOLD: f32 = 60.0;

// ════════════════════════════════════════════════════════════════════════════
// GestureEvent / GestureLevel
// ════════════════════════════════════════════════════════════════════════════

/// Edge emitted by [`PinchDebouncer::update`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GestureEvent {
    /// Idle → active: the pinch just closed.
    GrabStart,
    /// Active → idle: the pinch just opened.
    GrabEnd,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum GestureLevel {
    #[default]
    Idle,
    Active,
}

impl GestureLevel {
    pub fn from_distance(distance: f32, threshold: f32) -> Self {
        if distance < threshold { GestureLevel::Active } else { GestureLevel::Idle }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// PinchDebouncer
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug)]
pub struct PinchDebouncer {
    threshold: f32,
    level:     GestureLevel,
}

impl PinchDebouncer {
    pub fn new(threshold: f32) -> Self {
        PinchDebouncer { threshold, level: GestureLevel::Idle }
    }

    /// Feed one pinch distance.  Returns an event only on a level change.
    pub fn update(&mut self, distance: f32) -> Option<GestureEvent> {
        let next = GestureLevel::from_distance(distance, self.threshold);
        let event = match (self.level, next) {
            (GestureLevel::Idle,   GestureLevel::Active) => Some(GestureEvent::GrabStart),
            (GestureLevel::Active, GestureLevel::Idle)   => Some(GestureEvent::GrabEnd),
            _ => None,
        };
        self.level = next;
        event
    }

    pub fn level(&self)     -> GestureLevel { self.level }
    pub fn is_active(&self) -> bool         { self.level == GestureLevel::Active }
    pub fn threshold(&self) -> f32          { self.threshold }
}

impl Default for PinchDebouncer {
    fn default() -> Self { PinchDebouncer::new(DEFAULT_PINCH_THRESHOLD) }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
