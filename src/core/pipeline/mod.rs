//! Effect Chain Compilation Module
//!
//! Primitive operations, the per-clip pipeline, and the compiler that
//! enforces the fixed stage order.

mod compiler;
mod ops;

pub use compiler::{compile_clip, compile_clips};
pub use ops::{ClipPipeline, PrimitiveOp, Stage, TimedOp};
