//! Software-rendered visualizer using `minifb`.
//!
//! Draw order per frame:
//!
//! ```text
//!   background
//!   links                (thin grey lines)
//!   bodies               (walls, shapes, cursor body)
//!   landmark overlay     (21 dots of the last detected hand)
//!   cursor indicator     (pink while grabbing, indigo otherwise)
//!   render hooks         (scene decorations, e.g. block numbers)
//!   status bar
//! ```

use std::sync::mpsc::Sender;

use glam::Vec2;
use minifb::{Key, KeyRepeat, MouseButton, MouseMode, Window, WindowOptions};

use pinch_grab::world::Shape;
use pinch_grab::Canvas;

use crate::error::PlaygroundError;
use crate::input::SimInput;
use crate::scene::Playground;

// ════════════════════════════════════════════════════════════════════════════
// Colours
// ════════════════════════════════════════════════════════════════════════════

pub const BG_COLOR:          u32 = 0xFF0F172A;
/// rgba(236, 72, 153, 0.9)
pub const GRAB_COLOR:        u32 = 0xE5EC4899;
/// rgba(99, 102, 241, 0.9)
pub const IDLE_COLOR:        u32 = 0xE56366F1;
const WALL_COLOR:            u32 = 0xFF334155;
const LINK_COLOR:            u32 = 0xFFCBD5E1;
const LANDMARK_COLOR:        u32 = 0xB322D3EE;
const STATUS_BG:             u32 = 0xCC0F3460;
const STATUS_FG:             u32 = 0xFFEEEEEE;
const BODY_PALETTE: [u32; 6] = [
    0xFFF59E0B, 0xFF10B981, 0xFF3B82F6, 0xFFEF4444, 0xFF8B5CF6, 0xFF14B8A6,
];

pub const INDICATOR_RADIUS:  f32   = 12.0;
const LANDMARK_RADIUS:       f32   = 3.0;
const STATUS_H:              usize = 22;

// ════════════════════════════════════════════════════════════════════════════
// Frame: drawing primitives over an ARGB buffer
// ════════════════════════════════════════════════════════════════════════════

/// A borrowed ARGB pixel buffer.  All primitives clip to the buffer and
/// alpha-blend colours whose alpha byte is below `0xFF`.
pub struct Frame<'a> {
    buf:    &'a mut [u32],
    width:  usize,
    height: usize,
}

impl<'a> Frame<'a> {
    pub fn new(buf: &'a mut [u32], width: usize, height: usize) -> Self {
        debug_assert_eq!(buf.len(), width * height);
        Frame { buf, width, height }
    }

    pub fn width(&self)  -> usize { self.width }
    pub fn height(&self) -> usize { self.height }

    pub fn clear(&mut self, color: u32) { self.buf.fill(color); }

    pub fn pixel(&self, x: usize, y: usize) -> Option<u32> {
        (x < self.width && y < self.height).then(|| self.buf[y * self.width + x])
    }

    pub fn put(&mut self, x: i32, y: i32, color: u32) {
        if x < 0 || y < 0 { return; }
        let (x, y) = (x as usize, y as usize);
        if x >= self.width || y >= self.height { return; }
        let dst = &mut self.buf[y * self.width + x];
        *dst = over(*dst, color);
    }

    /// Fill the pixels whose centres fall inside `[min, max)`.
    pub fn fill_rect(&mut self, min: Vec2, max: Vec2, color: u32) {
        let x0 = min.x.round().max(0.0) as usize;
        let y0 = min.y.round().max(0.0) as usize;
        let x1 = (max.x.round().max(0.0) as usize).min(self.width);
        let y1 = (max.y.round().max(0.0) as usize).min(self.height);
        for y in y0..y1 {
            for x in x0..x1 {
                let dst = &mut self.buf[y * self.width + x];
                *dst = over(*dst, color);
            }
        }
    }

    pub fn fill_circle(&mut self, center: Vec2, radius: f32, color: u32) {
        let r2 = radius * radius;
        let y0 = (center.y - radius).floor() as i32;
        let y1 = (center.y + radius).ceil()  as i32;
        let x0 = (center.x - radius).floor() as i32;
        let x1 = (center.x + radius).ceil()  as i32;
        for y in y0..=y1 {
            for x in x0..=x1 {
                let d = Vec2::new(x as f32 + 0.5, y as f32 + 0.5) - center;
                if d.length_squared() <= r2 {
                    self.put(x, y, color);
                }
            }
        }
    }

    pub fn line(&mut self, a: Vec2, b: Vec2, color: u32) {
        let steps = (b - a).abs().max_element().ceil().max(1.0) as i32;
        for i in 0..=steps {
            let p = a.lerp(b, i as f32 / steps as f32);
            self.put(p.x.floor() as i32, p.y.floor() as i32, color);
        }
    }

    /// 3×5 bitmap text, each glyph cell `scale` pixels square.
    pub fn label(&mut self, text: &str, x: i32, y: i32, scale: usize, color: u32) {
        let s = scale.max(1) as i32;
        let mut cx = x;
        for ch in text.chars() {
            for (row, bits) in char_glyph(ch).iter().enumerate() {
                for col in 0..3i32 {
                    if bits & (1 << (2 - col)) == 0 { continue; }
                    for dy in 0..s {
                        for dx in 0..s {
                            self.put(cx + col * s + dx, y + row as i32 * s + dy, color);
                        }
                    }
                }
            }
            cx += 4 * s;
            if cx >= self.width as i32 { break; }
        }
    }

    pub fn label_centered(&mut self, text: &str, center: Vec2, scale: usize, color: u32) {
        let (w, h) = label_size(text, scale);
        let x = (center.x - w as f32 / 2.0).round() as i32;
        let y = (center.y - h as f32 / 2.0).round() as i32;
        self.label(text, x, y, scale, color);
    }
}

/// Pixel size of `text` drawn with [`Frame::label`].
pub fn label_size(text: &str, scale: usize) -> (usize, usize) {
    let s = scale.max(1);
    let n = text.chars().count();
    ((n * 4).saturating_sub(1) * s, 5 * s)
}

// ════════════════════════════════════════════════════════════════════════════
// Scene drawing
// ════════════════════════════════════════════════════════════════════════════

/// Draw one complete frame of the playground.
pub fn draw_playground(frame: &mut Frame<'_>, pg: &mut Playground, status: &str) {
    frame.clear(BG_COLOR);

    let engine = pg.engine();
    for link in engine.links() {
        let a = engine.body(link.desc.body_a);
        let b = engine.body(link.desc.body_b);
        if let (Some(a), Some(b)) = (a, b) {
            frame.line(a.position + link.desc.anchor_a, b.position + link.desc.anchor_b, LINK_COLOR);
        }
    }

    for body in engine.iter_bodies() {
        let color = match body.options.fill {
            Some(c)                   => c,
            None if body.is_static()  => WALL_COLOR,
            None => BODY_PALETTE[(body.handle.0 as usize) % BODY_PALETTE.len()],
        };
        match body.shape {
            Shape::Circle { radius } => frame.fill_circle(body.position, radius, color),
            Shape::Rectangle { .. }  => {
                let (min, max) = body.bounds();
                frame.fill_rect(min, max, color);
            }
        }
    }

    let canvas = pg.canvas();
    for lm in pg.last_landmarks() {
        frame.fill_circle(canvas.project(*lm), LANDMARK_RADIUS, LANDMARK_COLOR);
    }

    let cursor = pg.session().cursor();
    let indicator = if cursor.is_grabbing { GRAB_COLOR } else { IDLE_COLOR };
    frame.fill_circle(cursor.position, INDICATOR_RADIUS, indicator);

    pg.run_render_hooks(frame);

    let (w, h) = (frame.width() as f32, frame.height() as f32);
    frame.fill_rect(Vec2::new(0.0, h - STATUS_H as f32), Vec2::new(w, h), STATUS_BG);
    frame.label(status, 8, frame.height() as i32 - STATUS_H as i32 + 6, 2, STATUS_FG);
}

// ════════════════════════════════════════════════════════════════════════════
// Visualizer: the window
// ════════════════════════════════════════════════════════════════════════════

pub struct Visualizer {
    window: Window,
    buf:    Vec<u32>,
    width:  usize,
    height: usize,
    /// Present only when the mouse stands in for the hand.
    sim_tx: Option<Sender<SimInput>>,
}

impl Visualizer {
    pub fn new(
        title:  &str,
        width:  usize,
        height: usize,
        sim_tx: Option<Sender<SimInput>>,
    ) -> Result<Self, PlaygroundError> {
        let mut window = Window::new(
            title,
            width, height,
            WindowOptions {
                resize: true,
                ..WindowOptions::default()
            },
        ).map_err(|e| PlaygroundError::Window(e.to_string()))?;

        window.limit_update_rate(Some(std::time::Duration::from_millis(16))); // ~60fps

        Ok(Visualizer {
            window,
            buf: vec![BG_COLOR; width * height],
            width,
            height,
            sim_tx,
        })
    }

    pub fn is_open(&self) -> bool { self.window.is_open() }

    pub fn canvas(&self) -> Canvas { Canvas::new(self.width as f32, self.height as f32) }

    /// Forward the pointer to the simulated detector.  Returns false when the
    /// window should close.
    pub fn poll_input(&mut self) -> bool {
        if !self.window.is_open() { return false; }

        let quit = self.window.is_key_pressed(Key::Q, KeyRepeat::No)
                || self.window.is_key_pressed(Key::Escape, KeyRepeat::No);

        let Some(tx) = &self.sim_tx else { return !quit };

        if quit {
            forward(tx, SimInput::Quit);
            return false;
        }

        let input = match self.window.get_mouse_pos(MouseMode::Discard) {
            Some((x, y)) => SimInput::Hand {
                point:   Vec2::new(x, y),
                canvas:  Canvas::new(self.width as f32, self.height as f32),
                pinched: self.window.get_mouse_down(MouseButton::Left),
            },
            None => SimInput::NoHand,
        };
        forward(tx, input)
    }

    /// New canvas size if the window was resized since the last call.
    pub fn poll_resize(&mut self) -> Option<Canvas> {
        let (w, h) = self.window.get_size();
        if (w, h) == (self.width, self.height) || w == 0 || h == 0 {
            return None;
        }
        self.width  = w;
        self.height = h;
        self.buf.resize(w * h, BG_COLOR);
        Some(self.canvas())
    }

    pub fn render(&mut self, pg: &mut Playground, status: &str) -> Result<(), PlaygroundError> {
        {
            let mut frame = Frame::new(&mut self.buf, self.width, self.height);
            draw_playground(&mut frame, pg, status);
        }
        self.window
            .update_with_buffer(&self.buf, self.width, self.height)
            .map_err(|e| PlaygroundError::Window(e.to_string()))
    }
}

/// Hand one input to the simulated detector.  False once its thread is gone.
fn forward(tx: &Sender<SimInput>, input: SimInput) -> bool {
    match tx.send(input) {
        Ok(()) => true,
        Err(_) => {
            log::debug!("simulated detector has stopped, dropping {:?}", input);
            false
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Minimal 3×5 bitmap font
// ────────────────────────────────────────────────────────────────────────────

fn char_glyph(c: char) -> [u8; 5] {
    match c {
        '0' => [0b111, 0b101, 0b101, 0b101, 0b111],
        '1' => [0b010, 0b110, 0b010, 0b010, 0b111],
        '2' => [0b111, 0b001, 0b111, 0b100, 0b111],
        '3' => [0b111, 0b001, 0b111, 0b001, 0b111],
        '4' => [0b101, 0b101, 0b111, 0b001, 0b001],
        '5' => [0b111, 0b100, 0b111, 0b001, 0b111],
        '6' => [0b111, 0b100, 0b111, 0b101, 0b111],
        '7' => [0b111, 0b001, 0b001, 0b001, 0b001],
        '8' => [0b111, 0b101, 0b111, 0b101, 0b111],
        '9' => [0b111, 0b101, 0b111, 0b001, 0b111],
        'a' | 'A' => [0b111, 0b101, 0b111, 0b101, 0b101],
        'b' | 'B' => [0b110, 0b101, 0b110, 0b101, 0b110],
        'c' | 'C' => [0b111, 0b100, 0b100, 0b100, 0b111],
        'd' | 'D' => [0b110, 0b101, 0b101, 0b101, 0b110],
        'e' | 'E' => [0b111, 0b100, 0b111, 0b100, 0b111],
        'f' | 'F' => [0b111, 0b100, 0b111, 0b100, 0b100],
        'g' | 'G' => [0b111, 0b100, 0b101, 0b101, 0b111],
        'h' | 'H' => [0b101, 0b101, 0b111, 0b101, 0b101],
        'i' | 'I' => [0b111, 0b010, 0b010, 0b010, 0b111],
        'j' | 'J' => [0b001, 0b001, 0b001, 0b101, 0b111],
        'k' | 'K' => [0b101, 0b101, 0b110, 0b101, 0b101],
        'l' | 'L' => [0b100, 0b100, 0b100, 0b100, 0b111],
        'm' | 'M' => [0b101, 0b111, 0b101, 0b101, 0b101],
        'n' | 'N' => [0b111, 0b101, 0b101, 0b101, 0b101],
        'o' | 'O' => [0b111, 0b101, 0b101, 0b101, 0b111],
        'p' | 'P' => [0b111, 0b101, 0b111, 0b100, 0b100],
        'q' | 'Q' => [0b111, 0b101, 0b101, 0b111, 0b001],
        'r' | 'R' => [0b110, 0b101, 0b110, 0b101, 0b101],
        's' | 'S' => [0b111, 0b100, 0b111, 0b001, 0b111],
        't' | 'T' => [0b111, 0b010, 0b010, 0b010, 0b010],
        'u' | 'U' => [0b101, 0b101, 0b101, 0b101, 0b111],
        'v' | 'V' => [0b101, 0b101, 0b101, 0b010, 0b010],
        'w' | 'W' => [0b101, 0b101, 0b101, 0b111, 0b101],
        'x' | 'X' => [0b101, 0b101, 0b010, 0b101, 0b101],
        'y' | 'Y' => [0b101, 0b101, 0b111, 0b010, 0b010],
        'z' | 'Z' => [0b111, 0b001, 0b010, 0b100, 0b111],
        '#' => [0b101, 0b111, 0b101, 0b111, 0b101],
        '(' => [0b001, 0b010, 0b010, 0b010, 0b001],
        ')' => [0b100, 0b010, 0b010, 0b010, 0b100],
        '/' => [0b001, 0b001, 0b010, 0b100, 0b100],
        '-' => [0b000, 0b000, 0b111, 0b000, 0b000],
        '.' => [0b000, 0b000, 0b000, 0b000, 0b010],
        ',' => [0b000, 0b000, 0b000, 0b010, 0b100],
        ':' => [0b000, 0b010, 0b000, 0b010, 0b000],
        '=' => [0b000, 0b111, 0b000, 0b111, 0b000],
        ' ' => [0b000, 0b000, 0b000, 0b000, 0b000],
        _   => [0b000, 0b000, 0b010, 0b000, 0b000], // fallback dot
    }
}

/// Composite ARGB `src` over opaque `dst`.
fn over(dst: u32, src: u32) -> u32 {
    match src >> 24 {
        0xFF => src,
        0    => dst,
        a    => blend(dst, src, a as f32 / 255.0),
    }
}

/// Alpha-blend two ARGB colors. `t` = 0.0 → all `a`, `t` = 1.0 → all `b`.
fn blend(a: u32, b: u32, t: f32) -> u32 {
    let t = t.clamp(0.0, 1.0);
    let lerp = |ca: u32, cb: u32| (ca as f32 * (1.0 - t) + cb as f32 * t).round() as u32;
    let ar = (a >> 16) & 0xFF; let br = (b >> 16) & 0xFF;
    let ag = (a >>  8) & 0xFF; let bg = (b >>  8) & 0xFF;
    let ab =  a        & 0xFF; let bb =  b        & 0xFF;
    0xFF000000 | (lerp(ar, br) << 16) | (lerp(ag, bg) << 8) | lerp(ab, bb)
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
