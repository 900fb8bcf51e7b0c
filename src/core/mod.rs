//! Montage Engine Core
//!
//! Core assembly engine module.
//! Handles media pairing, effect vocabulary, timeline construction, effect
//! chain compilation, encoder selection, and render plan emission.

pub mod effects;
pub mod encoder;
pub mod media;
pub mod pipeline;
pub mod probe;
pub mod render;
pub mod timeline;

// Re-export common types
mod types;
pub use types::*;

mod error;
pub use error::*;
