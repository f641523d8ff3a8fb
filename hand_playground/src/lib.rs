//! # hand_playground
//!
//! A window full of physics bodies that a tracked hand can pick up.  The
//! controller logic lives in `pinch_grab`; this crate supplies everything
//! around it: a rapier2d world, scene setup, landmark sources and a
//! `minifb` renderer.
//!
//! ## Landmark sources
//!
//! * (default) **Mouse simulation**: the pointer is the thumb tip, holding the
//!   left button pinches.
//! * `--stdin` **External detector**: one JSON frame per line on stdin, e.g.
//!   from a MediaPipe Hands script.
//!
//! ### Controls
//!
//! | Input | Effect |
//! |---|---|
//! | Move pointer | Move the cursor |
//! | Hold left button | Pinch: grab the nearest body within reach |
//! | Release left button | Let go |
//! | Pointer leaves window | No hand: cursor stays, grab is kept |
//! | `Q` / `Esc` | Quit |
//!
//! ### Flags
//!
//! | Flag | Meaning |
//! |---|---|
//! | `--blocks` | Numbered block row instead of random shapes |
//! | `--size WxH` | Canvas size (default 1280x720) |
//! | `--threshold N` | Pinch threshold in px (default 60) |
//! | `--radius N` | Capture radius in px (default 80) |
//! | `--seed N` | Deterministic random scene |

pub mod sandbox;
pub mod scene;
pub mod input;
pub mod visualizer;
pub mod app;
pub mod error;

pub use error::PlaygroundError;
