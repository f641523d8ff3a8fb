//! Application wiring: configuration, the detector thread, the window and
//! the main loop.
//!
//! The loop interleaves two independent cadences.  Detector results are
//! drained from their channel without blocking and pumped through the
//! session as they arrive; physics ticks come from a fixed-step accumulator
//! driven by wall-clock time.  Neither waits for the other.

use std::sync::mpsc::{self, TryRecvError};
use std::time::Instant;

use pinch_grab::source::{spawn_landmark_source, DetectorConfig};
use pinch_grab::world::WorldError;
use pinch_grab::{AttachmentState, Canvas, Session, SessionConfig};

use crate::error::PlaygroundError;
use crate::input::{JsonLinesSource, SimLandmarkSource};
use crate::sandbox::{Engine, Runner, DEFAULT_GRAVITY};
use crate::scene::{numbered_blocks, Playground, PlaygroundConfig, SetupContext};
use crate::visualizer::Visualizer;

// ════════════════════════════════════════════════════════════════════════════
// AppConfig
// ════════════════════════════════════════════════════════════════════════════

/// Where landmark results come from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceKind {
    /// Mouse-driven hand inside the window.
    Simulated,
    /// JSON lines from an external detector on stdin.
    JsonLines,
}

/// What populates the world besides walls and cursor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Scene {
    /// 26 random shapes at double size.
    Random,
    /// A numbered row of blocks.
    NumberedBlocks,
}

/// Number of blocks in [`Scene::NumberedBlocks`].
const BLOCK_COUNT: usize = 10;

#[derive(Clone, Debug, PartialEq)]
pub struct AppConfig {
    /// Window title and log name of the canvas.
    pub canvas_id: String,
    pub width:     usize,
    pub height:    usize,
    pub session:   SessionConfig,
    pub detector:  DetectorConfig,
    pub source:    SourceKind,
    pub scene:     Scene,
    /// Physics steps per second.
    pub tick_hz:   u32,
    pub seed:      Option<u64>,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            canvas_id: "hand-playground".to_string(),
            width:     1280,
            height:    720,
            session:   SessionConfig::default(),
            detector:  DetectorConfig::default(),
            source:    SourceKind::Simulated,
            scene:     Scene::Random,
            tick_hz:   60,
            seed:      None,
        }
    }
}

impl AppConfig {
    /// Build from command-line flags (program name already stripped).
    ///
    /// `--stdin`, `--blocks`, `--size WxH`, `--threshold N`, `--radius N`,
    /// `--seed N`.
    pub fn from_args<I>(args: I) -> Result<Self, PlaygroundError>
    where
        I: IntoIterator<Item = String>,
    {
        let mut cfg = AppConfig::default();
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            let mut value = |flag: &str| {
                args.next().ok_or_else(|| PlaygroundError::Args(format!("{} needs a value", flag)))
            };
            match arg.as_str() {
                "--stdin"     => cfg.source = SourceKind::JsonLines,
                "--blocks"    => cfg.scene  = Scene::NumberedBlocks,
                "--size"      => {
                    let v = value("--size")?;
                    let (w, h) = parse_size(&v)?;
                    cfg.width  = w;
                    cfg.height = h;
                }
                "--threshold" => cfg.session.pinch_threshold = parse_num("--threshold", &value("--threshold")?)?,
                "--radius"    => cfg.session.capture_radius  = parse_num("--radius", &value("--radius")?)?,
                "--seed"      => cfg.seed = Some(parse_num("--seed", &value("--seed")?)?),
                other => return Err(PlaygroundError::Args(format!("unknown flag {}", other))),
            }
        }
        cfg.session.canvas = Canvas::new(cfg.width as f32, cfg.height as f32);
        Ok(cfg)
    }

    fn playground_config(&self) -> PlaygroundConfig {
        PlaygroundConfig {
            session: self.session.clone(),
            seed:    self.seed,
            gravity: DEFAULT_GRAVITY,
        }
    }
}

fn parse_size(v: &str) -> Result<(usize, usize), PlaygroundError> {
    let bad = || PlaygroundError::Args(format!("--size expects WxH, got {}", v));
    let (w, h) = v.split_once(['x', 'X']).ok_or_else(bad)?;
    let w: usize = w.trim().parse().map_err(|_| bad())?;
    let h: usize = h.trim().parse().map_err(|_| bad())?;
    if w < 160 || h < 120 {
        return Err(PlaygroundError::Args(format!("--size {} is too small", v)));
    }
    Ok((w, h))
}

fn parse_num<T: std::str::FromStr>(flag: &str, v: &str) -> Result<T, PlaygroundError> {
    v.trim().parse().map_err(|_| PlaygroundError::Args(format!("{} expects a number, got {}", flag, v)))
}

// ════════════════════════════════════════════════════════════════════════════
// Status line
// ════════════════════════════════════════════════════════════════════════════

/// One-line summary of the session for the status bar.
pub fn status_line(session: &Session, hand_visible: bool) -> String {
    let c = session.cursor();
    let hand = if hand_visible { "hand" } else { "no hand" };
    let grab = match session.attachment().state() {
        AttachmentState::Attached { target, .. } => format!("holding #{}", target.0),
        AttachmentState::Detached if c.is_grabbing => "pinch, nothing in reach".to_string(),
        AttachmentState::Detached => "open".to_string(),
    };
    format!("{}  cursor ({:.0}, {:.0})  {}   q: quit", hand, c.position.x, c.position.y, grab)
}

// ════════════════════════════════════════════════════════════════════════════
// run(): the main application loop
// ════════════════════════════════════════════════════════════════════════════

fn build_playground(cfg: &AppConfig) -> Result<Playground, PlaygroundError> {
    let pcfg = cfg.playground_config();
    match cfg.scene {
        Scene::Random => Playground::init(&cfg.canvas_id, pcfg, None),
        Scene::NumberedBlocks => {
            let mut setup = |ctx: &mut SetupContext<'_>| -> Result<(), WorldError> {
                numbered_blocks(ctx, BLOCK_COUNT).map(|_| ())
            };
            Playground::init(&cfg.canvas_id, pcfg, Some(&mut setup))
        }
    }
}

/// Run the playground until the window closes or the detector stream ends.
pub fn run(cfg: AppConfig) -> Result<(), PlaygroundError> {
    // ── Landmark source ───────────────────────────────────────────────────
    let (detections, sim_tx) = match cfg.source {
        SourceKind::Simulated => {
            let (sim_tx, sim_rx) = mpsc::channel();
            (spawn_landmark_source(SimLandmarkSource::new(sim_rx)), Some(sim_tx))
        }
        SourceKind::JsonLines => {
            log::info!("reading detector frames from stdin ({})", cfg.detector.summary());
            (spawn_landmark_source(JsonLinesSource::stdin(cfg.detector)), None)
        }
    };

    // ── Window and world ──────────────────────────────────────────────────
    let mut vis = Visualizer::new(&cfg.canvas_id, cfg.width, cfg.height, sim_tx)?;
    let mut pg = build_playground(&cfg)?;
    let mut runner = Runner::new(cfg.tick_hz);
    let mut last = Instant::now();
    let mut outcome = Ok(());

    // ── Main loop ─────────────────────────────────────────────────────────
    'frames: while vis.is_open() {
        if !vis.poll_input() { break; }
        if let Some(canvas) = vis.poll_resize() {
            pg.resize(canvas);
        }

        loop {
            match detections.try_recv() {
                Ok(result) => {
                    if let Err(e) = pg.on_detection(&result) {
                        log::warn!("detector frame dropped: {}", e);
                    }
                }
                Err(TryRecvError::Empty)        => break,
                Err(TryRecvError::Disconnected) => {
                    log::info!("landmark source finished");
                    break 'frames;
                }
            }
        }

        let now = Instant::now();
        for _ in 0..runner.ticks(now - last) {
            if let Err(e) = pg.step(runner.step_secs()) {
                log::warn!("simulation tick failed: {}", e);
            }
        }
        last = now;

        let status = status_line(pg.session(), !pg.last_landmarks().is_empty());
        if let Err(e) = vis.render(&mut pg, &status) {
            outcome = Err(e);
            break;
        }
    }

    close(pg, outcome).1
}

/// Tear the session down however the loop ended.  An error from the loop
/// itself takes precedence over a teardown error.
fn close(pg: Playground, outcome: Result<(), PlaygroundError>) -> (Engine, Result<(), PlaygroundError>) {
    let (engine, teardown) = pg.shutdown();
    let result = match (outcome, teardown) {
        (Err(e), Err(t)) => {
            log::warn!("session teardown after failure: {}", t);
            Err(e)
        }
        (Err(e), Ok(()))   => Err(e),
        (Ok(()), teardown) => teardown.map_err(PlaygroundError::from),
    };
    (engine, result)
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
