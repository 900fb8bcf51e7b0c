//! Media Discovery Module
//!
//! Classifies media files by extension, pairs visuals with audio tracks by
//! their four-digit key, and scans project folders.

mod models;
mod resolver;

pub use models::{MediaKind, MediaPair, VisualKind};
pub use resolver::{resolve_pairs, scan_directory, ResolveReport};
