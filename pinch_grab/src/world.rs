//! Capability interface to the physics engine.
//!
//! The controller never integrates, collides or renders anything itself.  It
//! asks the engine to create a cursor body, move it, read and write its
//! velocity, enumerate bodies and create / remove one link at a time.

use glam::Vec2;
use thiserror::Error;

// ════════════════════════════════════════════════════════════════════════════
// Handles
// ════════════════════════════════════════════════════════════════════════════

/// Opaque id of a body owned by the engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyHandle(pub u64);

/// Opaque id of a link (distance constraint) owned by the engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LinkHandle(pub u64);

#[derive(Debug, Error, Clone, PartialEq)]
pub enum WorldError {
    #[error("body {0:?} is not in the world")]
    UnknownBody(BodyHandle),
    #[error("link {0:?} is not in the world")]
    UnknownLink(LinkHandle),
    #[error("world rejected the operation: {0}")]
    Rejected(String),
}

// ════════════════════════════════════════════════════════════════════════════
// Body / link descriptions
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Shape {
    Circle    { radius: f32 },
    Rectangle { width: f32, height: f32 },
}

/// Physical and cosmetic options for a new body.
#[derive(Clone, Debug, PartialEq)]
pub struct BodyOptions {
    pub is_static:       bool,
    /// Sensors report overlaps but never receive collision response.
    pub is_sensor:       bool,
    pub restitution:     f32,
    pub friction:        f32,
    /// Explicit mass; `None` lets the engine derive it from the area.
    pub mass:            Option<f32>,
    /// Infinite rotational inertia.
    pub fixed_rotation:  bool,
    /// Bodies sharing the same negative group never collide with each other.
    pub collision_group: i32,
    pub label:           Option<String>,
    /// ARGB fill colour; `None` lets the renderer choose.
    pub fill:            Option<u32>,
}

impl Default for BodyOptions {
    fn default() -> Self {
        BodyOptions {
            is_static:       false,
            is_sensor:       false,
            restitution:     0.0,
            friction:        0.1,
            mass:            None,
            fixed_rotation:  false,
            collision_group: 0,
            label:           None,
            fill:            None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct BodyDesc {
    pub position: Vec2,
    pub shape:    Shape,
    pub options:  BodyOptions,
}

impl BodyDesc {
    pub fn circle(center: Vec2, radius: f32, options: BodyOptions) -> Self {
        BodyDesc { position: center, shape: Shape::Circle { radius }, options }
    }

    pub fn rectangle(center: Vec2, width: f32, height: f32, options: BodyOptions) -> Self {
        BodyDesc { position: center, shape: Shape::Rectangle { width, height }, options }
    }
}

/// A spring-like link between two bodies.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LinkDesc {
    pub body_a:    BodyHandle,
    pub body_b:    BodyHandle,
    /// Attachment points in each body's local frame.
    pub anchor_a:  Vec2,
    pub anchor_b:  Vec2,
    pub stiffness: f32,
    pub damping:   f32,
}

/// Read-only view of a body, as returned by [`PhysicsWorld::bodies`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BodySnapshot {
    pub handle:    BodyHandle,
    pub position:  Vec2,
    pub velocity:  Vec2,
    pub is_static: bool,
}

// ════════════════════════════════════════════════════════════════════════════
// PhysicsWorld
// ════════════════════════════════════════════════════════════════════════════

/// What the controller needs from a physics engine.
pub trait PhysicsWorld {
    /// Create a body and add it to the world.
    fn create_body(&mut self, desc: BodyDesc) -> Result<BodyHandle, WorldError>;

    /// Remove a body.  Links touching it may be dropped by the engine.
    fn remove_body(&mut self, body: BodyHandle) -> Result<(), WorldError>;

    fn contains_body(&self, body: BodyHandle) -> bool;

    /// Every body currently in the world, in the engine's own order.
    fn bodies(&self) -> Vec<BodySnapshot>;

    fn set_position(&mut self, body: BodyHandle, position: Vec2) -> Result<(), WorldError>;

    fn velocity(&self, body: BodyHandle) -> Result<Vec2, WorldError>;

    fn set_velocity(&mut self, body: BodyHandle, velocity: Vec2) -> Result<(), WorldError>;

    /// Create a link and add it to the world.
    fn create_link(&mut self, desc: LinkDesc) -> Result<LinkHandle, WorldError>;

    fn remove_link(&mut self, link: LinkHandle) -> Result<(), WorldError>;
}
