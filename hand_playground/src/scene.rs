//! Playground setup: walls, the cursor session, scene-specific bodies and the
//! render hooks that decorate each frame.
//!
//! [`Playground::init`] is the entry point.  It builds the world in a fixed
//! order: boundary walls, the default random shapes (only when no setup
//! callback is given), the tracking session and its cursor body, and last
//! the setup callback itself.

use glam::Vec2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use pinch_grab::world::{BodyDesc, BodyHandle, BodyOptions, PhysicsWorld, WorldError};
use pinch_grab::{Canvas, ControllerError, DetectorResult, FrameOutcome, Landmark, Session, SessionConfig};

use crate::error::PlaygroundError;
use crate::sandbox::Engine;
use crate::visualizer::Frame;

/// Thickness of the static walls around the canvas.
pub const WALL_THICKNESS: f32 = 100.0;

// ════════════════════════════════════════════════════════════════════════════
// Render hooks
// ════════════════════════════════════════════════════════════════════════════

/// Drawing that runs after the bodies and the cursor indicator are drawn.
pub trait RenderHook {
    fn after_render(&mut self, frame: &mut Frame<'_>, engine: &Engine);
}

/// Writes `1, 2, 3, …` at the centre of each listed body, in list order,
/// with glyphs sized to half the body's height.
#[derive(Clone, Debug)]
pub struct NumberedBodies {
    bodies: Vec<BodyHandle>,
    color:  u32,
}

impl NumberedBodies {
    pub fn new(bodies: Vec<BodyHandle>) -> Self {
        NumberedBodies { bodies, color: 0xFF000000 }
    }

    pub fn bodies(&self) -> &[BodyHandle] { &self.bodies }
}

impl RenderHook for NumberedBodies {
    fn after_render(&mut self, frame: &mut Frame<'_>, engine: &Engine) {
        for (i, handle) in self.bodies.iter().enumerate() {
            // Removed bodies just lose their number.
            let Some(body) = engine.body(*handle) else { continue };
            let (min, max) = body.bounds();
            let glyph_h = (max.y - min.y) / 2.0;
            let scale = ((glyph_h / 5.0).round() as usize).max(1);
            frame.label_centered(&(i + 1).to_string(), body.position, scale, self.color);
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Scene builders
// ════════════════════════════════════════════════════════════════════════════

/// Four static walls hugging the canvas from outside.
pub fn add_walls<W: PhysicsWorld + ?Sized>(
    world:  &mut W,
    canvas: Canvas,
) -> Result<[BodyHandle; 4], WorldError> {
    let (w, h, t) = (canvas.width, canvas.height, WALL_THICKNESS);
    let wall = || BodyOptions { is_static: true, ..BodyOptions::default() };
    Ok([
        world.create_body(BodyDesc::rectangle(Vec2::new(w / 2.0, -t / 2.0),    w, t, wall()))?,
        world.create_body(BodyDesc::rectangle(Vec2::new(w / 2.0, h + t / 2.0), w, t, wall()))?,
        world.create_body(BodyDesc::rectangle(Vec2::new(-t / 2.0, h / 2.0),    t, h, wall()))?,
        world.create_body(BodyDesc::rectangle(Vec2::new(w + t / 2.0, h / 2.0), t, h, wall()))?,
    ])
}

/// Drop `count` random circles and boxes inside the canvas, keeping a 60 px
/// margin.  `scale` multiplies every size.
pub fn spawn_random<W, R>(
    world:  &mut W,
    canvas: Canvas,
    rng:    &mut R,
    count:  usize,
    scale:  f32,
) -> Result<Vec<BodyHandle>, WorldError>
where
    W: PhysicsWorld + ?Sized,
    R: Rng + ?Sized,
{
    let span_x = (canvas.width  - 120.0).max(0.0);
    let span_y = (canvas.height - 120.0).max(0.0);
    let mut out = Vec::with_capacity(count);

    for _ in 0..count {
        let pos = Vec2::new(60.0 + rng.gen::<f32>() * span_x, 60.0 + rng.gen::<f32>() * span_y);
        let desc = if rng.gen::<f32>() < 0.5 {
            let r = (12.0 + rng.gen::<f32>() * 30.0) * scale;
            BodyDesc::circle(pos, r, BodyOptions {
                restitution: 0.6,
                friction:    0.1,
                ..BodyOptions::default()
            })
        } else {
            let w = (30.0 + rng.gen::<f32>() * 60.0) * scale;
            let h = (20.0 + rng.gen::<f32>() * 50.0) * scale;
            BodyDesc::rectangle(pos, w, h, BodyOptions {
                restitution: 0.4,
                friction:    0.2,
                ..BodyOptions::default()
            })
        };
        out.push(world.create_body(desc)?);
    }
    log::debug!("spawned {} random bodies (scale {})", count, scale);
    Ok(out)
}

/// A row of `count` square blocks across the upper half of the canvas,
/// numbered left to right by a [`NumberedBodies`] hook.
pub fn numbered_blocks(ctx: &mut SetupContext<'_>, count: usize) -> Result<Vec<BodyHandle>, WorldError> {
    const PALETTE: [u32; 5] = [0xFFFDE68A, 0xFFA7F3D0, 0xFFBFDBFE, 0xFFFBCFE8, 0xFFDDD6FE];

    let slot = ctx.canvas.width / (count.max(1) as f32 + 1.0);
    let size = (slot * 0.7).clamp(24.0, 90.0);
    let mut blocks = Vec::with_capacity(count);
    for i in 0..count {
        let pos = Vec2::new(slot * (i as f32 + 1.0), ctx.canvas.height / 3.0);
        let desc = BodyDesc::rectangle(pos, size, size, BodyOptions {
            restitution: 0.3,
            friction:    0.3,
            fill:        Some(PALETTE[i % PALETTE.len()]),
            label:       Some(format!("block-{}", i + 1)),
            ..BodyOptions::default()
        });
        blocks.push(ctx.engine.create_body(desc)?);
    }
    ctx.render_hooks.push(Box::new(NumberedBodies::new(blocks.clone())));
    Ok(blocks)
}

// ════════════════════════════════════════════════════════════════════════════
// SetupContext
// ════════════════════════════════════════════════════════════════════════════

/// What a scene setup callback gets to work with.
pub struct SetupContext<'a> {
    pub canvas:       Canvas,
    pub engine:       &'a mut Engine,
    pub render_hooks: &'a mut Vec<Box<dyn RenderHook>>,
    pub cursor_body:  BodyHandle,
    rng:              &'a mut StdRng,
}

impl SetupContext<'_> {
    pub fn spawn_random(&mut self, count: usize, scale: f32) -> Result<Vec<BodyHandle>, WorldError> {
        spawn_random(&mut *self.engine, self.canvas, &mut *self.rng, count, scale)
    }
}

pub type SetupFn<'f> = &'f mut dyn FnMut(&mut SetupContext<'_>) -> Result<(), WorldError>;

// ════════════════════════════════════════════════════════════════════════════
// Playground
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug, PartialEq)]
pub struct PlaygroundConfig {
    pub session: SessionConfig,
    /// Fixed seed for the random spawner; `None` seeds from the OS.
    pub seed:    Option<u64>,
    pub gravity: Vec2,
}

impl Default for PlaygroundConfig {
    fn default() -> Self {
        PlaygroundConfig {
            session: SessionConfig::default(),
            seed:    None,
            gravity: crate::sandbox::DEFAULT_GRAVITY,
        }
    }
}

pub struct Playground {
    canvas_id:      String,
    engine:         Engine,
    session:        Session,
    render_hooks:   Vec<Box<dyn RenderHook>>,
    last_landmarks: Vec<Landmark>,
}

impl Playground {
    /// Build the world and start tracking.
    pub fn init(
        canvas_id: &str,
        config:    PlaygroundConfig,
        setup:     Option<SetupFn<'_>>,
    ) -> Result<Self, PlaygroundError> {
        let canvas = config.session.canvas;
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None       => StdRng::from_entropy(),
        };
        let mut engine = Engine::with_gravity(config.gravity);
        let mut render_hooks: Vec<Box<dyn RenderHook>> = Vec::new();

        add_walls(&mut engine, canvas)?;
        if setup.is_none() {
            spawn_random(&mut engine, canvas, &mut rng, 26, 2.0)?;
        }

        let session = Session::start(&mut engine, config.session)?;

        if let Some(setup) = setup {
            let mut ctx = SetupContext {
                canvas,
                engine:       &mut engine,
                render_hooks: &mut render_hooks,
                cursor_body:  session.cursor_body(),
                rng:          &mut rng,
            };
            setup(&mut ctx)?;
        }

        log::info!(
            "playground '{}' ready: {}x{} canvas, {} bodies, {} render hooks",
            canvas_id, canvas.width, canvas.height,
            engine.iter_bodies().count(), render_hooks.len()
        );

        Ok(Playground {
            canvas_id: canvas_id.to_string(),
            engine,
            session,
            render_hooks,
            last_landmarks: Vec::new(),
        })
    }

    // ── callbacks ────────────────────────────────────────────────────────

    pub fn on_detection(&mut self, result: &DetectorResult) -> Result<FrameOutcome, ControllerError> {
        self.last_landmarks = result.first_hand().map(<[Landmark]>::to_vec).unwrap_or_default();
        let outcome = self.session.on_detection(&mut self.engine, result)?;
        if let Some(target) = outcome.grabbed {
            log::debug!("grabbed {:?}", target);
        }
        Ok(outcome)
    }

    /// One simulation step: cursor damping first, then the engine update.
    pub fn step(&mut self, dt: f32) -> Result<(), ControllerError> {
        self.session.on_tick(&mut self.engine)?;
        self.engine.step(dt);
        Ok(())
    }

    pub fn resize(&mut self, canvas: Canvas) {
        log::info!("canvas resized to {}x{}", canvas.width, canvas.height);
        self.session.set_canvas(canvas);
    }

    pub fn run_render_hooks(&mut self, frame: &mut Frame<'_>) {
        for hook in self.render_hooks.iter_mut() {
            hook.after_render(frame, &self.engine);
        }
    }

    /// Release any grab and remove the cursor body, handing the world back
    /// together with the teardown result.
    pub fn shutdown(self) -> (Engine, Result<(), ControllerError>) {
        let Playground { mut engine, session, .. } = self;
        let result = session.shutdown(&mut engine);
        (engine, result)
    }

    // ── accessors ────────────────────────────────────────────────────────

    pub fn canvas_id(&self)      -> &str        { &self.canvas_id }
    pub fn canvas(&self)         -> Canvas      { self.session.config().canvas }
    pub fn engine(&self)         -> &Engine     { &self.engine }
    pub fn engine_mut(&mut self) -> &mut Engine { &mut self.engine }
    pub fn session(&self)        -> &Session    { &self.session }
    pub fn cursor_body(&self)    -> BodyHandle  { self.session.cursor_body() }
    /// Landmarks of the hand seen in the latest detector result, if any.
    pub fn last_landmarks(&self) -> &[Landmark] { &self.last_landmarks }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use pinch_grab::landmark::{index, LANDMARK_COUNT};

    fn config(seed: u64) -> PlaygroundConfig {
        PlaygroundConfig {
            session: SessionConfig::with_canvas(Canvas::new(1000.0, 800.0)),
            seed:    Some(seed),
            gravity: Vec2::ZERO,
        }
    }

    fn empty_scene(_: &mut SetupContext<'_>) -> Result<(), WorldError> { Ok(()) }

    fn hand_at(canvas: Canvas, sx: f32, sy: f32, pinched: bool) -> DetectorResult {
        let thumb = Landmark::new(1.0 - sx / canvas.width, sy / canvas.height);
        let gap = if pinched { 10.0 } else { 120.0 };
        let tip = Landmark::new(1.0 - (sx + gap) / canvas.width, sy / canvas.height);
        let mut pts = vec![Landmark::new(0.5, 0.9); LANDMARK_COUNT];
        pts[index::THUMB_TIP] = thumb;
        pts[index::INDEX_FINGER_TIP] = tip;
        DetectorResult { hands: vec![pts] }
    }

    #[test]
    fn default_scene_has_walls_shapes_and_cursor() {
        let pg = Playground::init("world", config(7), None).unwrap();
        // 4 walls + 26 shapes + cursor
        assert_eq!(pg.engine().iter_bodies().count(), 31);
        let statics = pg.engine().iter_bodies().filter(|b| b.is_static()).count();
        assert_eq!(statics, 4);
        assert!(pg.engine().body(pg.cursor_body()).is_some());
    }

    #[test]
    fn setup_replaces_random_shapes() {
        let mut calls = 0;
        let mut setup = |ctx: &mut SetupContext<'_>| -> Result<(), WorldError> {
            calls += 1;
            assert!(ctx.engine.body(ctx.cursor_body).is_some());
            ctx.spawn_random(3, 1.0).map(|_| ())
        };
        let pg = Playground::init("world", config(7), Some(&mut setup)).unwrap();
        assert_eq!(calls, 1);
        assert_eq!(pg.engine().iter_bodies().count(), 4 + 1 + 3);
    }

    #[test]
    fn walls_sit_just_outside_the_canvas() {
        let mut e = Engine::new();
        let walls = add_walls(&mut e, Canvas::new(1000.0, 800.0)).unwrap();
        let floor = e.body(walls[1]).unwrap();
        let (min, _) = floor.bounds();
        assert!((min.y - 800.0).abs() < 1e-3);
        let left = e.body(walls[2]).unwrap();
        let (_, max) = left.bounds();
        assert!(max.x.abs() < 1e-3);
    }

    #[test]
    fn spawn_random_stays_inside_the_margin() {
        let mut e = Engine::new();
        let mut rng = StdRng::seed_from_u64(3);
        let canvas = Canvas::new(640.0, 480.0);
        let handles = spawn_random(&mut e, canvas, &mut rng, 50, 1.0).unwrap();
        assert_eq!(handles.len(), 50);
        for h in handles {
            let p = e.body(h).unwrap().position;
            assert!(p.x >= 60.0 && p.x <= 580.0, "x={}", p.x);
            assert!(p.y >= 60.0 && p.y <= 420.0, "y={}", p.y);
        }
    }

    #[test]
    fn same_seed_same_scene() {
        let a = Playground::init("a", config(11), None).unwrap();
        let b = Playground::init("b", config(11), None).unwrap();
        let pa: Vec<_> = a.engine().iter_bodies().map(|x| x.position).collect();
        let pb: Vec<_> = b.engine().iter_bodies().map(|x| x.position).collect();
        assert_eq!(pa, pb);
    }

    #[test]
    fn numbered_blocks_registers_a_hook() {
        let mut blocks = Vec::new();
        let mut setup = |ctx: &mut SetupContext<'_>| -> Result<(), WorldError> {
            blocks = numbered_blocks(ctx, 5)?;
            assert_eq!(ctx.render_hooks.len(), 1);
            Ok(())
        };
        let pg = Playground::init("math", config(1), Some(&mut setup)).unwrap();
        assert_eq!(blocks.len(), 5);
        assert!(blocks.iter().all(|b| pg.engine().body(*b).is_some()));
    }

    #[test]
    fn numbered_hook_draws_on_each_block() {
        let mut e = Engine::with_gravity(Vec2::ZERO);
        let opts = BodyOptions::default();
        let a = e.create_body(BodyDesc::rectangle(Vec2::new(20.0, 20.0), 30.0, 30.0, opts.clone())).unwrap();
        let b = e.create_body(BodyDesc::rectangle(Vec2::new(70.0, 20.0), 30.0, 30.0, opts)).unwrap();
        let mut hook = NumberedBodies::new(vec![a, b]);

        let mut buf = vec![0xFFFFFFFF; 100 * 40];
        let mut frame = Frame::new(&mut buf, 100, 40);
        hook.after_render(&mut frame, &e);

        let inked = |x0: usize, x1: usize| (x0..x1).any(|x| (0..40).any(|y| buf[y * 100 + x] == 0xFF000000));
        assert!(inked(5, 35));
        assert!(inked(55, 85));
    }

    #[test]
    fn detection_moves_cursor_and_remembers_landmarks() {
        let mut pg = Playground::init("world", config(5), Some(&mut empty_scene)).unwrap();
        let canvas = pg.canvas();
        pg.on_detection(&hand_at(canvas, 300.0, 200.0, false)).unwrap();
        let pos = pg.engine().body(pg.cursor_body()).unwrap().position;
        assert!(pos.abs_diff_eq(Vec2::new(300.0, 200.0), 1e-2));
        assert_eq!(pg.last_landmarks().len(), LANDMARK_COUNT);

        pg.on_detection(&DetectorResult::empty()).unwrap();
        assert!(pg.last_landmarks().is_empty());
    }

    #[test]
    fn pinch_drags_a_body_through_the_engine() {
        let mut setup = |ctx: &mut SetupContext<'_>| -> Result<(), WorldError> {
            ctx.engine.create_body(BodyDesc::circle(Vec2::new(320.0, 200.0), 15.0, BodyOptions::default()))?;
            Ok(())
        };
        let mut pg = Playground::init("world", config(5), Some(&mut setup)).unwrap();
        let canvas = pg.canvas();

        pg.on_detection(&hand_at(canvas, 300.0, 200.0, false)).unwrap();
        let out = pg.on_detection(&hand_at(canvas, 300.0, 200.0, true)).unwrap();
        let target = out.grabbed.unwrap();
        assert_eq!(pg.engine().links().len(), 1);

        for _ in 0..10 {
            pg.on_detection(&hand_at(canvas, 600.0, 400.0, true)).unwrap();
            pg.step(1.0 / 60.0).unwrap();
        }
        let p = pg.engine().body(target).unwrap().position;
        assert!(p.distance(Vec2::new(600.0, 400.0)) < 100.0, "target at {:?}", p);

        pg.on_detection(&hand_at(canvas, 600.0, 400.0, false)).unwrap();
        assert!(pg.engine().links().is_empty());
    }

    #[test]
    fn resize_changes_projection() {
        let mut pg = Playground::init("world", config(5), Some(&mut empty_scene)).unwrap();
        pg.resize(Canvas::new(500.0, 400.0));
        assert_eq!(pg.canvas(), Canvas::new(500.0, 400.0));
        let mut pts = vec![Landmark::new(0.5, 0.5); LANDMARK_COUNT];
        pts[index::THUMB_TIP] = Landmark::new(0.2, 0.5);
        pg.on_detection(&DetectorResult { hands: vec![pts] }).unwrap();
        let pos = pg.session().cursor().position;
        assert!(pos.abs_diff_eq(Vec2::new(400.0, 200.0), 1e-3));
    }

    #[test]
    fn shutdown_releases_the_grab_and_removes_cursor() {
        let mut setup = |ctx: &mut SetupContext<'_>| -> Result<(), WorldError> {
            ctx.engine.create_body(BodyDesc::circle(Vec2::new(320.0, 200.0), 15.0, BodyOptions::default()))?;
            Ok(())
        };
        let mut pg = Playground::init("world", config(5), Some(&mut setup)).unwrap();
        let canvas = pg.canvas();
        let cursor = pg.cursor_body();
        let target = pg.on_detection(&hand_at(canvas, 300.0, 200.0, true)).unwrap().grabbed.unwrap();
        assert_eq!(pg.engine().links().len(), 1);

        let (engine, result) = pg.shutdown();
        result.unwrap();
        assert!(engine.links().is_empty());
        assert!(!engine.contains_body(cursor));
        assert!(engine.contains_body(target));
    }
}
