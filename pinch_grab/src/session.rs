//! One tracking session: the cursor body, its state, the pinch debouncer and
//! the attachment, driven from two independent callbacks.
//!
//! * [`Session::on_detection`] runs once per detector result.  Its order is
//!   fixed: stale-target check, hand validation, cursor move, debounce, then
//!   selection / link changes for the edge of this frame.
//! * [`Session::on_tick`] runs once per simulation step and only damps the
//!   cursor velocity.
//!
//! Neither callback blocks and neither assumes anything about how often the
//! other one runs.

use glam::Vec2;

use crate::attachment::{AttachmentManager, LinkParams};
use crate::damping::{CursorDamping, DEFAULT_DECAY};
use crate::error::ControllerError;
use crate::gesture::{GestureEvent, PinchDebouncer, DEFAULT_PINCH_THRESHOLD};
use crate::landmark::{normalize, Canvas, DetectorResult, HandPose, LandmarkSample};
use crate::selector::{select_nearest, DEFAULT_CAPTURE_RADIUS};
use crate::world::{BodyDesc, BodyHandle, BodyOptions, PhysicsWorld};

// ════════════════════════════════════════════════════════════════════════════
// Configuration
// ════════════════════════════════════════════════════════════════════════════

/// The cursor body created at session start.
#[derive(Clone, Debug, PartialEq)]
pub struct CursorBodyConfig {
    pub radius: f32,
    pub mass:   f32,
    /// ARGB fill, indigo by default.
    pub fill:   u32,
}

impl Default for CursorBodyConfig {
    fn default() -> Self {
        CursorBodyConfig { radius: 16.0, mass: 50.0, fill: 0xE56366F1 }
    }
}

impl CursorBodyConfig {
    /// A non-colliding, non-rotating circle that never collides with other
    /// group −1 bodies.
    pub fn body_desc(&self, center: Vec2) -> BodyDesc {
        BodyDesc::circle(center, self.radius, BodyOptions {
            is_sensor:       true,
            fixed_rotation:  true,
            collision_group: -1,
            mass:            Some(self.mass),
            label:           Some("hand".to_string()),
            fill:            Some(self.fill),
            ..BodyOptions::default()
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SessionConfig {
    pub canvas:          Canvas,
    /// Pinch distance below which the gesture is active.
    pub pinch_threshold: f32,
    /// Grab reach around the cursor.
    pub capture_radius:  f32,
    /// Per-tick cursor velocity multiplier.
    pub damping_decay:   f32,
    pub link:            LinkParams,
    pub cursor:          CursorBodyConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            canvas:          Canvas::default(),
            pinch_threshold: DEFAULT_PINCH_THRESHOLD,
            capture_radius:  DEFAULT_CAPTURE_RADIUS,
            damping_decay:   DEFAULT_DECAY,
            link:            LinkParams::default(),
            cursor:          CursorBodyConfig::default(),
        }
    }
}

impl SessionConfig {
    pub fn with_canvas(canvas: Canvas) -> Self {
        SessionConfig { canvas, ..SessionConfig::default() }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// CursorState / FrameOutcome
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CursorState {
    pub position:    Vec2,
    pub velocity:    Vec2,
    pub is_grabbing: bool,
}

/// What one [`Session::on_detection`] call did.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameOutcome {
    /// `None` when the frame carried no usable hand.
    pub pose:    Option<HandPose>,
    pub event:   Option<GestureEvent>,
    /// Body linked on this frame's grab edge.
    pub grabbed: Option<BodyHandle>,
    /// Target dropped because it left the world.
    pub dropped: Option<BodyHandle>,
}

// ════════════════════════════════════════════════════════════════════════════
// Session
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug)]
pub struct Session {
    config:      SessionConfig,
    cursor_body: BodyHandle,
    cursor:      CursorState,
    debouncer:   PinchDebouncer,
    attachment:  AttachmentManager,
    damping:     CursorDamping,
}

impl Session {
    /// Create the cursor body at the canvas centre and start tracking.
    pub fn start<W: PhysicsWorld + ?Sized>(
        world:  &mut W,
        config: SessionConfig,
    ) -> Result<Self, ControllerError> {
        let center = config.canvas.center();
        let cursor_body = world.create_body(config.cursor.body_desc(center))?;
        log::info!(
            "tracking session started: cursor {:?} at ({:.0}, {:.0}), threshold={} radius={}",
            cursor_body, center.x, center.y, config.pinch_threshold, config.capture_radius
        );

        Ok(Session {
            cursor_body,
            cursor: CursorState {
                position:    center,
                velocity:    Vec2::ZERO,
                is_grabbing: false,
            },
            debouncer:  PinchDebouncer::new(config.pinch_threshold),
            attachment: AttachmentManager::new(config.link),
            damping:    CursorDamping::new(config.damping_decay),
            config,
        })
    }

    // ── detector callback ────────────────────────────────────────────────

    /// Process one detector result.
    ///
    /// A result without a usable hand changes nothing except the stale-target
    /// check and the retry of a link the engine refused to remove; in
    /// particular it never ends a grab.
    pub fn on_detection<W: PhysicsWorld + ?Sized>(
        &mut self,
        world:  &mut W,
        result: &DetectorResult,
    ) -> Result<FrameOutcome, ControllerError> {
        if let Err(e) = self.attachment.flush_pending(world) {
            log::warn!("leftover grab link still in the world: {}", e);
        }
        let mut outcome = FrameOutcome {
            dropped: self.attachment.validate(world)?,
            ..FrameOutcome::default()
        };

        let Some(hand) = result.first_hand() else {
            return Ok(outcome);
        };
        let sample = match LandmarkSample::try_from(hand) {
            Ok(s)  => s,
            Err(e) => {
                log::debug!("skipping detector frame: {}", e);
                return Ok(outcome);
            }
        };

        let pose = normalize(&sample, self.config.canvas);
        world.set_position(self.cursor_body, pose.cursor)?;
        self.cursor.position = pose.cursor;
        outcome.pose = Some(pose);

        outcome.event = self.debouncer.update(pose.pinch_distance);
        match outcome.event {
            Some(GestureEvent::GrabStart) => outcome.grabbed = self.grab_start(world)?,
            Some(GestureEvent::GrabEnd)   => self.grab_end(world)?,
            None => {}
        }
        Ok(outcome)
    }

    fn grab_start<W: PhysicsWorld + ?Sized>(
        &mut self,
        world: &mut W,
    ) -> Result<Option<BodyHandle>, ControllerError> {
        self.cursor.is_grabbing = true;

        let bodies = world.bodies();
        let target = select_nearest(
            self.cursor.position,
            self.config.capture_radius,
            self.cursor_body,
            &bodies,
        );
        let Some(target) = target else {
            log::debug!(
                "grab at ({:.0}, {:.0}): nothing within {}",
                self.cursor.position.x, self.cursor.position.y, self.config.capture_radius
            );
            return Ok(None);
        };

        self.attachment.attach(world, self.cursor_body, target)?;
        Ok(Some(target))
    }

    fn grab_end<W: PhysicsWorld + ?Sized>(&mut self, world: &mut W) -> Result<(), ControllerError> {
        self.cursor.is_grabbing = false;
        self.attachment.release(world)?;
        log::debug!("grab ended");
        Ok(())
    }

    // ── simulation callback ──────────────────────────────────────────────

    /// Damp the cursor body's velocity.  Call once per simulation step.
    pub fn on_tick<W: PhysicsWorld + ?Sized>(&mut self, world: &mut W) -> Result<(), ControllerError> {
        self.cursor.velocity = self.damping.apply(world, self.cursor_body)?;
        Ok(())
    }

    // ── lifecycle ────────────────────────────────────────────────────────

    /// Canvas size changed; later frames project onto the new size.
    pub fn set_canvas(&mut self, canvas: Canvas) {
        self.config.canvas = canvas;
    }

    /// Release any attachment, including a link left over from a refused
    /// release, and remove the cursor body.
    ///
    /// Every step is attempted; the first error is returned.
    pub fn shutdown<W: PhysicsWorld + ?Sized>(mut self, world: &mut W) -> Result<(), ControllerError> {
        self.cursor.is_grabbing = false;
        if let Err(e) = self.attachment.release(world) {
            log::debug!("release on shutdown refused ({}), retrying once", e);
        }
        let flushed = self.attachment.flush_pending(world);
        let removed = world.remove_body(self.cursor_body);
        log::info!("tracking session shut down");
        flushed?;
        removed?;
        Ok(())
    }

    // ── accessors ────────────────────────────────────────────────────────

    pub fn cursor(&self)      -> &CursorState       { &self.cursor }
    pub fn cursor_body(&self) -> BodyHandle         { self.cursor_body }
    pub fn attachment(&self)  -> &AttachmentManager { &self.attachment }
    pub fn config(&self)      -> &SessionConfig     { &self.config }
    pub fn is_grabbing(&self) -> bool               { self.cursor.is_grabbing }
    pub fn grabbed(&self)     -> Option<BodyHandle> { self.attachment.target() }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmark::{index, Landmark, LANDMARK_COUNT};
    use crate::testing::FakeWorld;
    use crate::world::WorldError;

    const W: f32 = 1000.0;
    const H: f32 = 1000.0;

    /// A hand whose thumb tip lands on screen point `(sx, sy)`, pinched or
    /// open (index tip 200 px to the right).
    fn hand_at(sx: f32, sy: f32, pinched: bool) -> DetectorResult {
        let thumb = Landmark::new(1.0 - sx / W, sy / H);
        let gap   = if pinched { 0.0 } else { 200.0 };
        let index_tip = Landmark::new(1.0 - (sx + gap) / W, sy / H);
        let mut pts = [Landmark::new(0.5, 0.5); LANDMARK_COUNT];
        pts[index::THUMB_TIP]        = thumb;
        pts[index::INDEX_FINGER_TIP] = index_tip;
        DetectorResult { hands: vec![pts.to_vec()] }
    }

    fn start(world: &mut FakeWorld) -> Session {
        Session::start(world, SessionConfig::with_canvas(Canvas::new(W, H))).unwrap()
    }

    fn assert_invariants(s: &Session, w: &FakeWorld) {
        assert!(w.links.len() <= 1, "more than one link alive");
        if !s.is_grabbing() {
            assert!(!s.attachment().is_attached(), "detached gesture kept a link");
        }
        if let Some(t) = s.grabbed() {
            assert!(w.contains_body(t), "attachment references a removed body");
        }
    }

    #[test]
    fn cursor_starts_at_canvas_center() {
        let mut w = FakeWorld::new();
        let s = start(&mut w);
        assert_eq!(s.cursor().position, Vec2::new(500.0, 500.0));
        assert_eq!(w.position(s.cursor_body()), Vec2::new(500.0, 500.0));
        assert!(!s.is_grabbing());
    }

    #[test]
    fn cursor_body_is_a_sensor_circle() {
        let mut w = FakeWorld::new();
        let s = start(&mut w);
        let opts = &w.bodies[&s.cursor_body()].desc.options;
        assert!(opts.is_sensor);
        assert!(opts.fixed_rotation);
        assert_eq!(opts.collision_group, -1);
        assert_eq!(opts.mass, Some(50.0));
    }

    #[test]
    fn frame_moves_cursor_with_mirror() {
        let mut w = FakeWorld::new();
        let mut s = start(&mut w);
        let mut pts = [Landmark::new(0.5, 0.5); LANDMARK_COUNT];
        pts[index::THUMB_TIP] = Landmark::new(0.3, 0.4);
        s.on_detection(&mut w, &DetectorResult { hands: vec![pts.to_vec()] }).unwrap();

        let p = s.cursor().position;
        assert!((p.x - 700.0).abs() < 1e-3);
        assert!((p.y - 400.0).abs() < 1e-3);
        assert_eq!(w.position(s.cursor_body()), p);
    }

    #[test]
    fn empty_frame_changes_nothing() {
        let mut w = FakeWorld::new();
        let mut s = start(&mut w);
        w.add_ball(300.0, 300.0);
        s.on_detection(&mut w, &hand_at(300.0, 300.0, true)).unwrap();
        assert!(s.is_grabbing());
        let before = *s.cursor();

        let out = s.on_detection(&mut w, &DetectorResult::empty()).unwrap();
        assert_eq!(out, FrameOutcome::default());
        assert_eq!(*s.cursor(), before);
        assert!(s.attachment().is_attached());
    }

    #[test]
    fn malformed_hand_is_skipped() {
        let mut w = FakeWorld::new();
        let mut s = start(&mut w);
        let bad = DetectorResult { hands: vec![vec![Landmark::new(0.0, 0.0); 4]] };
        let out = s.on_detection(&mut w, &bad).unwrap();
        assert!(out.pose.is_none());
        assert_eq!(s.cursor().position, Vec2::new(500.0, 500.0));
    }

    #[test]
    fn grab_selects_the_closest_body() {
        let mut w = FakeWorld::new();
        let mut s = start(&mut w);
        let _far  = w.add_ball(579.0, 500.0);
        let near  = w.add_ball(500.0, 530.0);
        let _mid  = w.add_ball(445.0, 500.0);

        let out = s.on_detection(&mut w, &hand_at(500.0, 500.0, true)).unwrap();
        assert_eq!(out.event, Some(GestureEvent::GrabStart));
        assert_eq!(out.grabbed, Some(near));
        assert_eq!(s.grabbed(), Some(near));
        assert_eq!(w.links_created, 1);
    }

    #[test]
    fn selection_uses_this_frames_position() {
        let mut w = FakeWorld::new();
        let mut s = start(&mut w);
        let ball = w.add_ball(100.0, 100.0);
        // Cursor is still at the centre; the grab frame itself moves it.
        let out = s.on_detection(&mut w, &hand_at(110.0, 100.0, true)).unwrap();
        assert_eq!(out.grabbed, Some(ball));
    }

    #[test]
    fn grab_miss_is_gesture_active_without_link() {
        let mut w = FakeWorld::new();
        let mut s = start(&mut w);
        w.add_ball(600.0, 500.0);
        w.add_wall(500.0, 510.0);

        let out = s.on_detection(&mut w, &hand_at(500.0, 500.0, true)).unwrap();
        assert_eq!(out.event, Some(GestureEvent::GrabStart));
        assert_eq!(out.grabbed, None);
        assert!(s.is_grabbing());
        assert!(!s.attachment().is_attached());
        assert!(w.links.is_empty());

        let out = s.on_detection(&mut w, &hand_at(500.0, 500.0, false)).unwrap();
        assert_eq!(out.event, Some(GestureEvent::GrabEnd));
        assert!(!s.is_grabbing());
        assert!(w.link_removals.is_empty());
    }

    #[test]
    fn release_on_open_same_frame() {
        let mut w = FakeWorld::new();
        let mut s = start(&mut w);
        w.add_ball(500.0, 500.0);
        s.on_detection(&mut w, &hand_at(500.0, 500.0, true)).unwrap();
        assert_eq!(w.links.len(), 1);

        s.on_detection(&mut w, &hand_at(520.0, 500.0, false)).unwrap();
        assert!(w.links.is_empty());
        assert!(!s.attachment().is_attached());
        assert!(!s.is_grabbing());
    }

    #[test]
    fn sustained_pinch_creates_one_link() {
        let mut w = FakeWorld::new();
        let mut s = start(&mut w);
        w.add_ball(500.0, 500.0);
        for i in 0..10 {
            s.on_detection(&mut w, &hand_at(500.0 + i as f32, 500.0, true)).unwrap();
        }
        assert_eq!(w.links_created, 1);
    }

    #[test]
    fn invariants_hold_over_a_mixed_sequence() {
        let mut w = FakeWorld::new();
        let mut s = start(&mut w);
        w.add_ball(200.0, 200.0);
        w.add_ball(800.0, 800.0);

        let frames = [
            hand_at(200.0, 200.0, true),
            DetectorResult::empty(),
            hand_at(250.0, 200.0, true),
            hand_at(250.0, 200.0, false),
            hand_at(500.0, 500.0, true),
            hand_at(790.0, 790.0, false),
            hand_at(790.0, 790.0, true),
            DetectorResult::empty(),
            DetectorResult::empty(),
            hand_at(790.0, 790.0, false),
            hand_at(790.0, 790.0, false),
        ];
        for f in &frames {
            s.on_detection(&mut w, f).unwrap();
            assert_invariants(&s, &w);
            s.on_tick(&mut w).unwrap();
        }
        assert_eq!(w.links_created, 2);
    }

    #[test]
    fn stale_target_recovered_once() {
        let mut w = FakeWorld::new();
        let mut s = start(&mut w);
        let ball = w.add_ball(500.0, 500.0);
        s.on_detection(&mut w, &hand_at(500.0, 500.0, true)).unwrap();
        let link = s.attachment().link().unwrap();

        w.remove_body(ball).unwrap();
        let out = s.on_detection(&mut w, &hand_at(505.0, 500.0, true)).unwrap();
        assert_eq!(out.dropped, Some(ball));
        assert!(!s.attachment().is_attached());
        assert!(s.is_grabbing());
        assert_invariants(&s, &w);

        s.on_detection(&mut w, &hand_at(505.0, 500.0, false)).unwrap();
        s.on_detection(&mut w, &DetectorResult::empty()).unwrap();
        assert_eq!(w.link_removals, vec![link]);
    }

    #[test]
    fn stale_check_runs_on_handless_frames() {
        let mut w = FakeWorld::new();
        let mut s = start(&mut w);
        let ball = w.add_ball(500.0, 500.0);
        s.on_detection(&mut w, &hand_at(500.0, 500.0, true)).unwrap();
        w.remove_body(ball).unwrap();

        let out = s.on_detection(&mut w, &DetectorResult::empty()).unwrap();
        assert_eq!(out.dropped, Some(ball));
        assert_eq!(w.link_removals.len(), 1);
    }

    #[test]
    fn refused_link_leaves_a_valid_state() {
        let mut w = FakeWorld::new();
        let mut s = start(&mut w);
        w.add_ball(500.0, 500.0);
        w.reject_links = true;

        let err = s.on_detection(&mut w, &hand_at(500.0, 500.0, true)).unwrap_err();
        assert!(matches!(err, ControllerError::World(WorldError::Rejected(_))));
        assert!(s.is_grabbing());
        assert!(!s.attachment().is_attached());
        assert_invariants(&s, &w);

        let out = s.on_detection(&mut w, &hand_at(500.0, 500.0, false)).unwrap();
        assert_eq!(out.event, Some(GestureEvent::GrabEnd));
        assert!(w.link_removals.is_empty());
    }

    #[test]
    fn refused_move_skips_the_gesture() {
        let mut w = FakeWorld::new();
        let mut s = start(&mut w);
        w.reject_moves = true;

        assert!(s.on_detection(&mut w, &hand_at(100.0, 100.0, true)).is_err());
        assert_eq!(s.cursor().position, Vec2::new(500.0, 500.0));
        assert!(!s.is_grabbing());
    }

    #[test]
    fn tick_damps_cursor_velocity() {
        let mut w = FakeWorld::new();
        let mut s = start(&mut w);
        w.set_velocity(s.cursor_body(), Vec2::new(100.0, 100.0)).unwrap();
        let mut last = f32::MAX;
        for _ in 0..10 {
            s.on_tick(&mut w).unwrap();
            let speed = s.cursor().velocity.length();
            assert!(speed < last);
            last = speed;
        }
        assert!(last < 1.0);
    }

    #[test]
    fn ticks_and_frames_interleave_freely() {
        let mut w = FakeWorld::new();
        let mut s = start(&mut w);
        w.add_ball(500.0, 500.0);
        for _ in 0..7 { s.on_tick(&mut w).unwrap(); }
        s.on_detection(&mut w, &hand_at(500.0, 500.0, true)).unwrap();
        s.on_detection(&mut w, &hand_at(500.0, 500.0, true)).unwrap();
        s.on_tick(&mut w).unwrap();
        assert!(s.attachment().is_attached());
    }

    #[test]
    fn resize_changes_projection() {
        let mut w = FakeWorld::new();
        let mut s = start(&mut w);
        s.set_canvas(Canvas::new(2000.0, 1000.0));
        let mut pts = [Landmark::new(0.5, 0.5); LANDMARK_COUNT];
        pts[index::THUMB_TIP] = Landmark::new(0.25, 0.5);
        s.on_detection(&mut w, &DetectorResult { hands: vec![pts.to_vec()] }).unwrap();
        assert!((s.cursor().position.x - 1500.0).abs() < 1e-3);
    }

    #[test]
    fn shutdown_releases_link_and_cursor() {
        let mut w = FakeWorld::new();
        let mut s = start(&mut w);
        let ball = w.add_ball(500.0, 500.0);
        s.on_detection(&mut w, &hand_at(500.0, 500.0, true)).unwrap();
        let cursor = s.cursor_body();

        s.shutdown(&mut w).unwrap();
        assert!(w.links.is_empty());
        assert!(!w.contains_body(cursor));
        assert!(w.contains_body(ball));
    }

    #[test]
    fn refused_release_is_retried_on_later_frames() {
        let mut w = FakeWorld::new();
        let mut s = start(&mut w);
        w.add_ball(500.0, 500.0);
        s.on_detection(&mut w, &hand_at(500.0, 500.0, true)).unwrap();
        assert_eq!(w.links.len(), 1);

        w.reject_unlinks = true;
        assert!(s.on_detection(&mut w, &hand_at(500.0, 500.0, false)).is_err());
        assert!(!s.is_grabbing());
        assert!(!s.attachment().is_attached());
        assert_eq!(w.links.len(), 1);

        // Still refused: the frame goes through and the link stays parked.
        s.on_detection(&mut w, &hand_at(500.0, 500.0, false)).unwrap();
        assert!(s.attachment().pending().is_some());

        w.reject_unlinks = false;
        s.on_detection(&mut w, &hand_at(500.0, 500.0, false)).unwrap();
        assert!(w.links.is_empty());
        assert_eq!(s.attachment().pending(), None);
    }

    #[test]
    fn shutdown_retries_a_refused_release() {
        let mut w = FakeWorld::new();
        let mut s = start(&mut w);
        w.add_ball(500.0, 500.0);
        s.on_detection(&mut w, &hand_at(500.0, 500.0, true)).unwrap();
        w.reject_unlinks = true;
        assert!(s.on_detection(&mut w, &hand_at(500.0, 500.0, false)).is_err());
        let cursor = s.cursor_body();

        w.reject_unlinks = false;
        s.shutdown(&mut w).unwrap();
        assert!(w.links.is_empty());
        assert!(!w.contains_body(cursor));
    }

    #[test]
    fn shutdown_reports_a_link_the_engine_keeps() {
        let mut w = FakeWorld::new();
        let mut s = start(&mut w);
        w.add_ball(500.0, 500.0);
        s.on_detection(&mut w, &hand_at(500.0, 500.0, true)).unwrap();
        let cursor = s.cursor_body();

        w.reject_unlinks = true;
        let err = s.shutdown(&mut w).unwrap_err();
        assert!(matches!(err, ControllerError::World(WorldError::Rejected(_))));
        assert!(!w.contains_body(cursor));
    }
}
