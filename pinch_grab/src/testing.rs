//! Recording in-memory world used by the unit tests.

use std::collections::BTreeMap;

use glam::Vec2;

use crate::world::{
    BodyDesc, BodyHandle, BodySnapshot, LinkDesc, LinkHandle, PhysicsWorld, WorldError,
};

#[derive(Clone, Debug)]
pub struct FakeBody {
    pub desc:     BodyDesc,
    pub position: Vec2,
    pub velocity: Vec2,
}

#[derive(Debug, Default)]
pub struct FakeWorld {
    pub bodies:         BTreeMap<BodyHandle, FakeBody>,
    pub links:          BTreeMap<LinkHandle, LinkDesc>,
    pub links_created:  usize,
    pub link_removals:  Vec<LinkHandle>,
    /// Next `create_link` call fails.
    pub reject_links:   bool,
    /// Every `remove_link` call fails while set.
    pub reject_unlinks: bool,
    /// Every `set_position` call fails.
    pub reject_moves:   bool,
    /// Removing a body also drops links that touch it.
    pub cascade_links:  bool,
    next_id:            u64,
}

impl FakeWorld {
    pub fn new() -> Self { FakeWorld::default() }

    /// Add a dynamic circle and return its handle.
    pub fn add_ball(&mut self, x: f32, y: f32) -> BodyHandle {
        self.create_body(BodyDesc::circle(Vec2::new(x, y), 10.0, Default::default()))
            .unwrap()
    }

    pub fn add_wall(&mut self, x: f32, y: f32) -> BodyHandle {
        let options = crate::world::BodyOptions { is_static: true, ..Default::default() };
        self.create_body(BodyDesc::rectangle(Vec2::new(x, y), 10.0, 10.0, options))
            .unwrap()
    }

    pub fn position(&self, body: BodyHandle) -> Vec2 {
        self.bodies[&body].position
    }

    fn next(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

impl PhysicsWorld for FakeWorld {
    fn create_body(&mut self, desc: BodyDesc) -> Result<BodyHandle, WorldError> {
        let handle = BodyHandle(self.next());
        let position = desc.position;
        self.bodies.insert(handle, FakeBody { desc, position, velocity: Vec2::ZERO });
        Ok(handle)
    }

    fn remove_body(&mut self, body: BodyHandle) -> Result<(), WorldError> {
        self.bodies.remove(&body).ok_or(WorldError::UnknownBody(body))?;
        if self.cascade_links {
            self.links.retain(|_, l| l.body_a != body && l.body_b != body);
        }
        Ok(())
    }

    fn contains_body(&self, body: BodyHandle) -> bool {
        self.bodies.contains_key(&body)
    }

    fn bodies(&self) -> Vec<BodySnapshot> {
        self.bodies.iter().map(|(h, b)| BodySnapshot {
            handle:    *h,
            position:  b.position,
            velocity:  b.velocity,
            is_static: b.desc.options.is_static,
        }).collect()
    }

    fn set_position(&mut self, body: BodyHandle, position: Vec2) -> Result<(), WorldError> {
        if self.reject_moves {
            return Err(WorldError::Rejected("moves disabled".into()));
        }
        let b = self.bodies.get_mut(&body).ok_or(WorldError::UnknownBody(body))?;
        b.position = position;
        Ok(())
    }

    fn velocity(&self, body: BodyHandle) -> Result<Vec2, WorldError> {
        self.bodies.get(&body).map(|b| b.velocity).ok_or(WorldError::UnknownBody(body))
    }

    fn set_velocity(&mut self, body: BodyHandle, velocity: Vec2) -> Result<(), WorldError> {
        let b = self.bodies.get_mut(&body).ok_or(WorldError::UnknownBody(body))?;
        b.velocity = velocity;
        Ok(())
    }

    fn create_link(&mut self, desc: LinkDesc) -> Result<LinkHandle, WorldError> {
        if self.reject_links {
            self.reject_links = false;
            return Err(WorldError::Rejected("link refused".into()));
        }
        if !self.contains_body(desc.body_a) { return Err(WorldError::UnknownBody(desc.body_a)); }
        if !self.contains_body(desc.body_b) { return Err(WorldError::UnknownBody(desc.body_b)); }
        let handle = LinkHandle(self.next());
        self.links.insert(handle, desc);
        self.links_created += 1;
        Ok(handle)
    }

    fn remove_link(&mut self, link: LinkHandle) -> Result<(), WorldError> {
        self.link_removals.push(link);
        if self.reject_unlinks {
            return Err(WorldError::Rejected("unlink refused".into()));
        }
        self.links.remove(&link).map(|_| ()).ok_or(WorldError::UnknownLink(link))
    }
}
