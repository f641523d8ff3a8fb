//! Nearest-target selection on a grab edge.

use glam::Vec2;

use crate::world::{BodyHandle, BodySnapshot};

/// Default capture radius in screen-space units.
pub const DEFAULT_CAPTURE_RADIUS: f32 = 80.0;

/// Pick the body closest to `point`, strictly inside `radius`.
///
/// `exclude` (the cursor body) and static bodies are never candidates.
/// Equidistant candidates resolve to the first one in `bodies`, so the
/// outcome follows whatever order the engine enumerates its bodies in.
pub fn select_nearest(
    point:   Vec2,
    radius:  f32,
    exclude: BodyHandle,
    bodies:  &[BodySnapshot],
) -> Option<BodyHandle> {
    let mut best: Option<(BodyHandle, f32)> = None;

    for body in bodies {
        if body.handle == exclude || body.is_static { continue; }
        let d = body.position.distance(point);
        if d >= radius { continue; }
        match best {
            Some((_, best_d)) if d >= best_d => {}
            _ => best = Some((body.handle, d)),
        }
    }

    best.map(|(handle, _)| handle)
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
