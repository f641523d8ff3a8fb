use thiserror::Error;

use crate::world::WorldError;

/// Failures the controller cannot absorb on its own.
///
/// Expected control flow (no hand, missed grab, stale target) never shows
/// up here.  When one of these is returned the session is still in a
/// consistent state and can keep receiving frames and ticks.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ControllerError {
    #[error("physics world: {0}")]
    World(#[from] WorldError),

    #[error("session already shut down")]
    ShutDown,
}
