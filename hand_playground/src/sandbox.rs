//! The playground's physics world: [`PhysicsWorld`] on top of rapier2d.
//!
//! Bodies are circles and axis-aligned rectangles in canvas pixels, with
//! gravity pointing down the screen.  Rotations are locked so the renderer
//! can draw every rectangle axis-aligned.  Links are rapier spring joints
//! whose rest length is the anchor distance at creation time.

use std::time::Duration;

use glam::Vec2;
use rapier2d::prelude::*;

use pinch_grab::world::{
    BodyDesc, BodyHandle, BodyOptions, BodySnapshot, LinkDesc, LinkHandle, PhysicsWorld, Shape,
    WorldError,
};

/// Screen-space gravity in px/s².
pub const DEFAULT_GRAVITY: Vec2 = Vec2::new(0.0, 980.0);
/// Mass per px² when a body has no explicit mass.
const DENSITY:      f32 = 0.001;
/// Canvas pixels per physics metre, for rapier's internal tolerances.
const PIXELS_PER_M: f32 = 100.0;
/// Spring rate in 1/s² per unit of link stiffness.  Stiffness 1.0 closes
/// the length error within about one 60 Hz step.
const SPRING_RATE:  f32 = 3600.0;

fn to_vector(v: Vec2) -> Vector<Real> { vector![v.x, v.y] }
fn to_vec2(v: &Vector<Real>) -> Vec2 { Vec2::new(v.x, v.y) }

/// Bodies sharing a negative group never collide with each other; everything
/// else collides.  Negative groups map onto bits 2..=32.
fn interaction_groups(group: i32) -> InteractionGroups {
    if group >= 0 {
        return InteractionGroups::new(Group::GROUP_1, Group::ALL);
    }
    let bit = Group::from_bits_truncate(1u32 << (1 + (group.unsigned_abs() - 1) % 31));
    InteractionGroups::new(bit, Group::ALL.difference(bit))
}

// ════════════════════════════════════════════════════════════════════════════
// Body / Link
// ════════════════════════════════════════════════════════════════════════════

/// Bookkeeping for one body; rapier owns its motion.
struct Entry {
    handle:  BodyHandle,
    rb:      RigidBodyHandle,
    shape:   Shape,
    options: BodyOptions,
}

/// A body as seen by the renderer and the tests.
#[derive(Clone, Debug, PartialEq)]
pub struct Body {
    pub handle:   BodyHandle,
    pub shape:    Shape,
    pub position: Vec2,
    pub velocity: Vec2,
    pub options:  BodyOptions,
}

impl Body {
    pub fn is_static(&self) -> bool { self.options.is_static }

    pub fn half_extents(&self) -> Vec2 {
        match self.shape {
            Shape::Circle { radius }           => Vec2::splat(radius),
            Shape::Rectangle { width, height } => Vec2::new(width / 2.0, height / 2.0),
        }
    }

    /// Axis-aligned bounds as (min, max).
    pub fn bounds(&self) -> (Vec2, Vec2) {
        let h = self.half_extents();
        (self.position - h, self.position + h)
    }
}

#[derive(Clone, Debug)]
pub struct Link {
    pub handle: LinkHandle,
    pub desc:   LinkDesc,
    /// Rest length, captured from the anchor distance at creation.
    pub length: f32,
    joint:      ImpulseJointHandle,
}

// ════════════════════════════════════════════════════════════════════════════
// Engine
// ════════════════════════════════════════════════════════════════════════════

pub struct Engine {
    gravity:          Vector<Real>,
    params:           IntegrationParameters,
    pipeline:         PhysicsPipeline,
    islands:          IslandManager,
    broad_phase:      BroadPhaseBvh,
    narrow_phase:     NarrowPhase,
    rigid_bodies:     RigidBodySet,
    colliders:        ColliderSet,
    impulse_joints:   ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver:       CCDSolver,
    /// Insertion order, which is also the order of [`PhysicsWorld::bodies`].
    entries:          Vec<Entry>,
    links:            Vec<Link>,
    next_id:          u64,
}

impl Default for Engine {
    fn default() -> Self { Engine::new() }
}

impl Engine {
    pub fn new() -> Self { Engine::with_gravity(DEFAULT_GRAVITY) }

    pub fn with_gravity(gravity: Vec2) -> Self {
        let mut params = IntegrationParameters::default();
        params.length_unit = PIXELS_PER_M;
        Engine {
            gravity:          to_vector(gravity),
            params,
            pipeline:         PhysicsPipeline::new(),
            islands:          IslandManager::new(),
            broad_phase:      BroadPhaseBvh::new(),
            narrow_phase:     NarrowPhase::new(),
            rigid_bodies:     RigidBodySet::new(),
            colliders:        ColliderSet::new(),
            impulse_joints:   ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver:       CCDSolver::new(),
            entries:          Vec::new(),
            links:            Vec::new(),
            next_id:          0,
        }
    }

    pub fn gravity(&self) -> Vec2 { to_vec2(&self.gravity) }

    pub fn body(&self, handle: BodyHandle) -> Option<Body> {
        self.entries.iter().find(|e| e.handle == handle).and_then(|e| self.view(e))
    }

    pub fn iter_bodies(&self) -> impl Iterator<Item = Body> + '_ {
        self.entries.iter().filter_map(|e| self.view(e))
    }

    pub fn links(&self) -> &[Link] { &self.links }

    fn view(&self, entry: &Entry) -> Option<Body> {
        let rb = self.rigid_bodies.get(entry.rb)?;
        Some(Body {
            handle:   entry.handle,
            shape:    entry.shape,
            position: to_vec2(rb.translation()),
            velocity: to_vec2(rb.linvel()),
            options:  entry.options.clone(),
        })
    }

    fn rb_handle(&self, handle: BodyHandle) -> Result<RigidBodyHandle, WorldError> {
        self.entries.iter()
            .find(|e| e.handle == handle)
            .map(|e| e.rb)
            .ok_or(WorldError::UnknownBody(handle))
    }

    fn rigid_body(&self, handle: BodyHandle) -> Result<&RigidBody, WorldError> {
        let rb = self.rb_handle(handle)?;
        self.rigid_bodies.get(rb).ok_or(WorldError::UnknownBody(handle))
    }

    fn rigid_body_mut(&mut self, handle: BodyHandle) -> Result<&mut RigidBody, WorldError> {
        let rb = self.rb_handle(handle)?;
        self.rigid_bodies.get_mut(rb).ok_or(WorldError::UnknownBody(handle))
    }

    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    /// Advance the simulation by `dt` seconds.
    pub fn step(&mut self, dt: f32) {
        if dt <= 0.0 { return; }
        self.params.dt = dt;
        self.pipeline.step(
            &self.gravity,
            &self.params,
            &mut self.islands,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            &(),
            &(),
        );
    }
}

// ════════════════════════════════════════════════════════════════════════════
// PhysicsWorld
// ════════════════════════════════════════════════════════════════════════════

impl PhysicsWorld for Engine {
    fn create_body(&mut self, desc: BodyDesc) -> Result<BodyHandle, WorldError> {
        let (collider, area) = match desc.shape {
            Shape::Circle { radius } if radius > 0.0 =>
                (ColliderBuilder::ball(radius), std::f32::consts::PI * radius * radius),
            Shape::Rectangle { width, height } if width > 0.0 && height > 0.0 =>
                (ColliderBuilder::cuboid(width / 2.0, height / 2.0), width * height),
            shape => return Err(WorldError::Rejected(format!("degenerate shape {:?}", shape))),
        };
        let o = &desc.options;

        let builder = if o.is_static {
            RigidBodyBuilder::fixed()
        } else {
            RigidBodyBuilder::dynamic()
                .additional_mass(o.mass.unwrap_or(area * DENSITY).max(1e-6))
        };
        let rb = self.rigid_bodies.insert(
            builder
                .translation(to_vector(desc.position))
                .lock_rotations()
                .build(),
        );

        // Mass lives on the body so sensors weigh the same as solid shapes.
        let collider = collider
            .density(0.0)
            .sensor(o.is_sensor)
            .restitution(o.restitution)
            .restitution_combine_rule(CoefficientCombineRule::Max)
            .friction(o.friction)
            .collision_groups(interaction_groups(o.collision_group))
            .build();
        self.colliders.insert_with_parent(collider, rb, &mut self.rigid_bodies);

        let handle = BodyHandle(self.next_id());
        self.entries.push(Entry { handle, rb, shape: desc.shape, options: desc.options });
        Ok(handle)
    }

    fn remove_body(&mut self, body: BodyHandle) -> Result<(), WorldError> {
        let idx = self.entries.iter().position(|e| e.handle == body)
            .ok_or(WorldError::UnknownBody(body))?;
        let entry = self.entries.remove(idx);
        // Removes the body's colliders and every joint attached to it.
        self.rigid_bodies.remove(
            entry.rb,
            &mut self.islands,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            true,
        );
        self.links.retain(|l| l.desc.body_a != body && l.desc.body_b != body);
        Ok(())
    }

    fn contains_body(&self, body: BodyHandle) -> bool {
        self.entries.iter().any(|e| e.handle == body)
    }

    fn bodies(&self) -> Vec<BodySnapshot> {
        self.iter_bodies().map(|b| BodySnapshot {
            handle:    b.handle,
            position:  b.position,
            velocity:  b.velocity,
            is_static: b.is_static(),
        }).collect()
    }

    fn set_position(&mut self, body: BodyHandle, position: Vec2) -> Result<(), WorldError> {
        self.rigid_body_mut(body)?.set_translation(to_vector(position), true);
        Ok(())
    }

    fn velocity(&self, body: BodyHandle) -> Result<Vec2, WorldError> {
        self.rigid_body(body).map(|rb| to_vec2(rb.linvel()))
    }

    fn set_velocity(&mut self, body: BodyHandle, velocity: Vec2) -> Result<(), WorldError> {
        self.rigid_body_mut(body)?.set_linvel(to_vector(velocity), true);
        Ok(())
    }

    fn create_link(&mut self, desc: LinkDesc) -> Result<LinkHandle, WorldError> {
        let a = self.rigid_body(desc.body_a)?;
        let b = self.rigid_body(desc.body_b)?;
        if desc.body_a == desc.body_b {
            return Err(WorldError::Rejected("link endpoints are the same body".into()));
        }
        let length = (to_vec2(b.translation()) + desc.anchor_b)
            .distance(to_vec2(a.translation()) + desc.anchor_a);
        let rb_a = self.rb_handle(desc.body_a)?;
        let rb_b = self.rb_handle(desc.body_b)?;

        let stiffness = desc.stiffness.max(0.0) * SPRING_RATE;
        let damping   = 2.0 * stiffness.sqrt() * desc.damping.max(0.0);
        let spring = SpringJointBuilder::new(length, stiffness, damping)
            .spring_model(MotorModel::AccelerationBased)
            .local_anchor1(point![desc.anchor_a.x, desc.anchor_a.y])
            .local_anchor2(point![desc.anchor_b.x, desc.anchor_b.y])
            .build();
        let joint = self.impulse_joints.insert(rb_a, rb_b, spring, true);

        let handle = LinkHandle(self.next_id());
        self.links.push(Link { handle, desc, length, joint });
        Ok(handle)
    }

    fn remove_link(&mut self, link: LinkHandle) -> Result<(), WorldError> {
        let idx = self.links.iter().position(|l| l.handle == link)
            .ok_or(WorldError::UnknownLink(link))?;
        let removed = self.links.remove(idx);
        self.impulse_joints.remove(removed.joint, true);
        Ok(())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Runner: fixed-step accumulator
// ════════════════════════════════════════════════════════════════════════════

/// Turns wall-clock time into a whole number of fixed simulation steps.
#[derive(Clone, Debug)]
pub struct Runner {
    step:        Duration,
    accumulator: Duration,
    max_ticks:   u32,
}

impl Runner {
    pub fn new(tick_hz: u32) -> Self {
        Runner {
            step:        Duration::from_secs(1) / tick_hz.max(1),
            accumulator: Duration::ZERO,
            max_ticks:   5,
        }
    }

    pub fn step(&self)      -> Duration { self.step }
    pub fn step_secs(&self) -> f32      { self.step.as_secs_f32() }

    /// Number of steps owed for `elapsed`.  Backlog beyond `max_ticks` is
    /// dropped so a stalled window doesn't cause a burst of catch-up steps.
    pub fn ticks(&mut self, elapsed: Duration) -> u32 {
        self.accumulator += elapsed;
        let mut n = 0;
        while self.accumulator >= self.step && n < self.max_ticks {
            self.accumulator -= self.step;
            n += 1;
        }
        if n == self.max_ticks {
            self.accumulator = Duration::ZERO;
        }
        n
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
