//! Per-tick velocity decay for the cursor body.
//!
//! The cursor position is overwritten from landmarks, but the engine still
//! feeds it velocity through the grab link.  Scaling that velocity down
//! every tick keeps the body from drifting away from the hand between
//! detector frames.

use glam::Vec2;

use crate::world::{BodyHandle, PhysicsWorld, WorldError};

/// Default per-tick velocity multiplier.
pub const DEFAULT_DECAY: f32 = 0.2;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CursorDamping {
    pub decay: f32,
}

impl CursorDamping {
    pub fn new(decay: f32) -> Self {
        CursorDamping { decay: decay.clamp(0.0, 1.0) }
    }

    pub fn damp(&self, velocity: Vec2) -> Vec2 {
        velocity * self.decay
    }

    /// Damp `body`'s velocity in place and return the new value.
    pub fn apply<W: PhysicsWorld + ?Sized>(
        &self,
        world: &mut W,
        body:  BodyHandle,
    ) -> Result<Vec2, WorldError> {
        let damped = self.damp(world.velocity(body)?);
        world.set_velocity(body, damped)?;
        Ok(damped)
    }
}

impl Default for CursorDamping {
    fn default() -> Self { CursorDamping::new(DEFAULT_DECAY) }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
