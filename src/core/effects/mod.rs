//! Effect Vocabulary Module
//!
//! Closed effect model with constructor-time validation, easing curves, and
//! the built-in channel presets.

mod easing;
mod models;
mod preset;

pub use easing::Easing;
pub use models::{
    AudioEffect, BlendMode, EffectSpec, FadeSpec, MotionEffect, MotionKind, OverlayPlacement,
    OverlaySpec, ShortfallMode, StylizedEffect, StylizedKind, TransitionKind, TransitionSpec,
    BASS_MAX_DB, BASS_MIN_DB, FADE_MAX_SEC, FADE_MIN_SEC, PITCH_MAX_SEMITONES,
    PITCH_MIN_SEMITONES, STYLIZED_MAX_SEC, STYLIZED_MIN_SEC, TRANSITION_FLOOR_SEC,
    TRANSITION_MAX_SEC, TRANSITION_MIN_SEC,
};
pub use preset::EffectPreset;
