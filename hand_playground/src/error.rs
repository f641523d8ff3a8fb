use pinch_grab::{ControllerError, WorldError};
use thiserror::Error;

/// Everything that can stop the playground from starting or running.
#[derive(Debug, Error)]
pub enum PlaygroundError {
    #[error(transparent)]
    Controller(#[from] ControllerError),
    #[error(transparent)]
    World(#[from] WorldError),
    #[error("window: {0}")]
    Window(String),
    #[error("bad argument: {0}")]
    Args(String),
}
