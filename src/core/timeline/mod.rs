//! Timeline Module
//!
//! Channel/clip models and the builder that turns media pairs into a
//! synchronized clip list.

mod builder;
mod models;

pub use builder::{ClipOverride, TimelineBuilder, TimelineReport};
pub use models::{Channel, ChannelSettings, Clip, VisualPlayback};
