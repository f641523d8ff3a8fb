//! # pinch_grab
//!
//! Gesture-to-physics interaction controller.  A tracked hand drives a single
//! cursor body in a physics world; pinching thumb and index finger together
//! grabs the nearest body with a spring-like link, opening the pinch lets go.
//!
//! ## Pipeline
//!
//! | Stage | Module | Cadence |
//! |---|---|---|
//! | Landmarks → cursor point + pinch distance | [`landmark`] | per detector frame |
//! | Pinch distance → `GrabStart` / `GrabEnd` edges | [`gesture`] | per detector frame |
//! | Nearest body inside the capture radius | [`selector`] | on `GrabStart` |
//! | Link lifecycle (create / release / stale check) | [`attachment`] | on edges, every frame |
//! | Cursor velocity decay | [`damping`] | per simulation tick |
//! | Ordering of all of the above | [`session`] | both |
//!
//! The physics engine is reached only through the [`world::PhysicsWorld`]
//! trait and the hand detector only through [`source::LandmarkSource`], so
//! the controller runs unchanged against any engine or detector.
//!
//! ## Example
//!
//! ```ignore
//! let mut session = Session::start(&mut world, SessionConfig::default())?;
//! // detector callback
//! session.on_detection(&mut world, &result)?;
//! // simulation tick
//! session.on_tick(&mut world)?;
//! // teardown
//! session.shutdown(&mut world)?;
//! ```

pub mod landmark;
pub mod gesture;
pub mod selector;
pub mod world;
pub mod attachment;
pub mod damping;
pub mod source;
pub mod session;
pub mod error;

#[cfg(test)]
pub(crate) mod testing;

pub use glam::Vec2;

pub use attachment::{AttachmentManager, AttachmentState, LinkParams};
pub use error::ControllerError;
pub use gesture::{GestureEvent, GestureLevel, PinchDebouncer};
pub use landmark::{Canvas, DetectorResult, HandPose, Landmark, LandmarkSample};
pub use session::{CursorBodyConfig, CursorState, FrameOutcome, Session, SessionConfig};
pub use world::{BodyDesc, BodyHandle, BodySnapshot, LinkDesc, LinkHandle, PhysicsWorld, WorldError};
