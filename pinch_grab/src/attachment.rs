//! Lifecycle of the single link between the cursor and a grabbed body.
//!
//! Two states, `Detached` and `Attached`.  The link handle lives inside the
//! `Attached` variant, so there is never a link without a target or a target
//! without a link, and at most one of each.

use glam::Vec2;

use crate::world::{BodyHandle, LinkDesc, LinkHandle, PhysicsWorld, WorldError};

// ════════════════════════════════════════════════════════════════════════════
// LinkParams
// ════════════════════════════════════════════════════════════════════════════

/// Spring parameters for the grab link.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LinkParams {
    /// Fraction of the length error the engine corrects per step (0.0–1.0).
    pub stiffness: f32,
    pub damping:   f32,
}

impl Default for LinkParams {
    fn default() -> Self {
        LinkParams { stiffness: 0.8, damping: 0.4 }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// AttachmentState / AttachmentManager
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AttachmentState {
    #[default]
    Detached,
    Attached { target: BodyHandle, link: LinkHandle },
}

#[derive(Debug, Default)]
pub struct AttachmentManager {
    state:   AttachmentState,
    params:  LinkParams,
    /// A link the engine refused to remove; retried by [`flush_pending`].
    ///
    /// [`flush_pending`]: AttachmentManager::flush_pending
    pending: Option<LinkHandle>,
}

impl AttachmentManager {
    pub fn new(params: LinkParams) -> Self {
        AttachmentManager { state: AttachmentState::Detached, params, pending: None }
    }

    /// Link `cursor` to `target` with zero-length anchors at both origins.
    ///
    /// An existing link is released first.  If the engine refuses the new
    /// link the manager stays `Detached` and the error is returned.
    pub fn attach<W: PhysicsWorld + ?Sized>(
        &mut self,
        world:  &mut W,
        cursor: BodyHandle,
        target: BodyHandle,
    ) -> Result<LinkHandle, WorldError> {
        if self.is_attached() {
            log::warn!("attach while already attached, releasing the old link first");
            self.release(world)?;
        }

        let link = world.create_link(LinkDesc {
            body_a:    cursor,
            body_b:    target,
            anchor_a:  Vec2::ZERO,
            anchor_b:  Vec2::ZERO,
            stiffness: self.params.stiffness,
            damping:   self.params.damping,
        })?;

        self.state = AttachmentState::Attached { target, link };
        log::info!("grabbed {:?} via {:?}", target, link);
        Ok(link)
    }

    /// Remove the link, if any, and return the target that was held.
    ///
    /// The manager is `Detached` afterwards even when the engine reports an
    /// error; the link is then parked for [`flush_pending`].  A link the
    /// engine already dropped counts as released.
    ///
    /// [`flush_pending`]: AttachmentManager::flush_pending
    pub fn release<W: PhysicsWorld + ?Sized>(
        &mut self,
        world: &mut W,
    ) -> Result<Option<BodyHandle>, WorldError> {
        let (target, link) = match std::mem::take(&mut self.state) {
            AttachmentState::Detached                 => return Ok(None),
            AttachmentState::Attached { target, link } => (target, link),
        };

        match world.remove_link(link) {
            Ok(()) | Err(WorldError::UnknownLink(_)) => {
                log::info!("released {:?}", target);
                Ok(Some(target))
            }
            Err(e) => {
                log::warn!("engine kept {:?} on release ({}), will retry", link, e);
                self.pending = Some(link);
                Err(e)
            }
        }
    }

    /// Retry removing a link an earlier [`release`] could not remove.
    ///
    /// The link stays parked while the engine keeps refusing.
    ///
    /// [`release`]: AttachmentManager::release
    pub fn flush_pending<W: PhysicsWorld + ?Sized>(&mut self, world: &mut W) -> Result<(), WorldError> {
        let Some(link) = self.pending else { return Ok(()) };
        match world.remove_link(link) {
            Ok(()) | Err(WorldError::UnknownLink(_)) => {
                log::info!("removed leftover {:?}", link);
                self.pending = None;
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Drop the attachment if its target has left the world.
    ///
    /// Returns the stale target when a release happened.
    pub fn validate<W: PhysicsWorld + ?Sized>(
        &mut self,
        world: &mut W,
    ) -> Result<Option<BodyHandle>, WorldError> {
        match self.state {
            AttachmentState::Attached { target, .. } if !world.contains_body(target) => {
                log::warn!("grab target {:?} vanished from the world, detaching", target);
                self.release(world)
            }
            _ => Ok(None),
        }
    }

    pub fn state(&self)       -> AttachmentState    { self.state }
    pub fn params(&self)      -> LinkParams         { self.params }
    pub fn is_attached(&self) -> bool               { self.target().is_some() }
    /// Link still waiting for removal after a refused release.
    pub fn pending(&self)     -> Option<LinkHandle> { self.pending }

    pub fn target(&self) -> Option<BodyHandle> {
        match self.state {
            AttachmentState::Attached { target, .. } => Some(target),
            AttachmentState::Detached                => None,
        }
    }

    pub fn link(&self) -> Option<LinkHandle> {
        match self.state {
            AttachmentState::Attached { link, .. } => Some(link),
            AttachmentState::Detached              => None,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
