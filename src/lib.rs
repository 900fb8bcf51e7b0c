//! Automontage Core Library
//!
//! Core engine of an automated montage builder. Given a folder of numbered
//! media files, it pairs visuals with their audio tracks, builds a per-channel
//! timeline of clips with effect chains, compiles those chains into an ordered
//! primitive pipeline, picks a working encoder, and emits an immutable render
//! plan for FFmpeg.
//!
//! The library never touches pixels itself; the `core::render::invoke`
//! boundary translates a finished plan into FFmpeg invocations and supervises
//! the external process.

pub mod core;
pub mod logging;

pub use crate::core::{MontageError, MontageResult, SkippedItem};
