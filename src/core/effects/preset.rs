//! Effect Presets
//!
//! Named channel looks: each preset carries a motion cycle, a transition
//! cycle, optional boundary fades, and a default audio chain. Cycles are
//! consumed round-robin by clip index so a rebuild of the same inputs always
//! lands on the same assignment.

use serde::{Deserialize, Serialize};

use crate::core::TimeSec;

use super::models::{
    AudioEffect, FadeSpec, MotionEffect, StylizedEffect, StylizedKind, TransitionKind,
    TransitionSpec,
};

/// A reusable per-channel effect configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectPreset {
    pub name: String,
    /// Motion assigned round-robin per clip; empty means static framing
    pub motion_cycle: Vec<MotionEffect>,
    /// Stylized effects applied to every clip
    pub stylized: Vec<StylizedEffect>,
    /// Transition kinds assigned round-robin per clip edge
    pub transition_cycle: Vec<TransitionKind>,
    /// Authored duration for every transition in the cycle
    pub transition_duration_sec: TimeSec,
    /// Fade from black on the first clip
    pub fade_in: Option<FadeSpec>,
    /// Fade to black on the last clip
    pub fade_out: Option<FadeSpec>,
    /// Audio chain applied to every clip with audio
    pub audio: Vec<AudioEffect>,
}

impl EffectPreset {
    /// Balanced long-form look: slow push/pull motion, gentle crossfades.
    pub fn youtube() -> Self {
        Self {
            name: "youtube".to_string(),
            motion_cycle: vec![
                MotionEffect::zoom_in(),
                MotionEffect::zoom_out(),
                MotionEffect::pan_left_to_right(),
            ],
            stylized: Vec::new(),
            transition_cycle: vec![TransitionKind::Fade, TransitionKind::Dissolve],
            transition_duration_sec: 1.0,
            fade_in: Some(FadeSpec { duration_sec: 1.0 }),
            fade_out: Some(FadeSpec { duration_sec: 1.5 }),
            audio: Vec::new(),
        }
    }

    /// Fast vertical look: aggressive zooms, punchy bursts, hard cuts kept
    /// short.
    pub fn shorts() -> Self {
        Self {
            name: "shorts".to_string(),
            motion_cycle: vec![MotionEffect::zoom_in(), MotionEffect::parallax_drift()],
            stylized: vec![StylizedEffect {
                kind: StylizedKind::ZoomBurst,
                intensity: 0.7,
                duration_sec: 0.5,
                window: None,
            }],
            transition_cycle: vec![TransitionKind::Zoom, TransitionKind::Slide],
            transition_duration_sec: 0.3,
            fade_in: None,
            fade_out: None,
            audio: vec![AudioEffect::BassBoost { gain_db: 6.0 }],
        }
    }

    /// Square-friendly look with soft motion and quick dissolves.
    pub fn instagram() -> Self {
        Self {
            name: "instagram".to_string(),
            motion_cycle: vec![MotionEffect::zoom_in(), MotionEffect::rotate_drift()],
            stylized: vec![StylizedEffect {
                kind: StylizedKind::Pulse,
                intensity: 0.4,
                duration_sec: 0.8,
                window: None,
            }],
            transition_cycle: vec![TransitionKind::Dissolve],
            transition_duration_sec: 0.6,
            fade_in: Some(FadeSpec { duration_sec: 0.5 }),
            fade_out: Some(FadeSpec { duration_sec: 0.5 }),
            audio: Vec::new(),
        }
    }

    /// Slow cinematic look: long drifts, long fades, warm audio.
    pub fn cinematic() -> Self {
        Self {
            name: "cinematic".to_string(),
            motion_cycle: vec![
                MotionEffect::parallax_drift(),
                MotionEffect::zoom_out(),
                MotionEffect::rotate_drift(),
            ],
            stylized: Vec::new(),
            transition_cycle: vec![TransitionKind::Fade],
            transition_duration_sec: 2.0,
            fade_in: Some(FadeSpec { duration_sec: 2.0 }),
            fade_out: Some(FadeSpec { duration_sec: 3.0 }),
            audio: vec![AudioEffect::Vintage],
        }
    }

    /// Looks up a built-in preset by name.
    pub fn by_name(name: &str) -> Option<Self> {
        match name {
            "youtube" => Some(Self::youtube()),
            "shorts" => Some(Self::shorts()),
            "instagram" => Some(Self::instagram()),
            "cinematic" => Some(Self::cinematic()),
            _ => None,
        }
    }

    /// All built-in preset names
    pub fn builtin_names() -> &'static [&'static str] {
        &["youtube", "shorts", "instagram", "cinematic"]
    }

    /// Motion effect for the clip at `index`, cycling round-robin.
    pub fn motion_for_clip(&self, index: usize) -> Option<MotionEffect> {
        if self.motion_cycle.is_empty() {
            return None;
        }
        Some(self.motion_cycle[index % self.motion_cycle.len()].clone())
    }

    /// Transition for the edge after the clip at `index`, cycling round-robin.
    pub fn transition_for_edge(&self, index: usize) -> Option<TransitionSpec> {
        if self.transition_cycle.is_empty() {
            return None;
        }
        let kind = self.transition_cycle[index % self.transition_cycle.len()];
        Some(TransitionSpec {
            kind,
            duration_sec: self.transition_duration_sec,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
