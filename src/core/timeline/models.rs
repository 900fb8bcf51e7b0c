//! Timeline Model Definitions
//!
//! Channel configuration and the resolved clip: one clip per media pair,
//! with its effect chain and fully resolved duration.

use serde::{Deserialize, Serialize};

use crate::core::effects::{
    AudioEffect, EffectPreset, FadeSpec, MotionEffect, OverlaySpec, StylizedEffect,
    TransitionSpec,
};
use crate::core::encoder::{CodecFamily, QualityTier};
use crate::core::media::{MediaPair, VisualKind};
use crate::core::{ChannelId, ClipId, Ratio, Resolution, TimeSec};

/// Duration match tolerance between a video source and its target slot
const DURATION_EPSILON_SEC: TimeSec = 0.001;

// =============================================================================
// Channel Settings
// =============================================================================

/// Output and pacing configuration for one channel
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChannelSettings {
    pub resolution: Resolution,
    pub fps: Ratio,
    /// Target video bitrate; `None` selects CRF mode from the quality tier
    pub video_bitrate_kbps: Option<u32>,
    pub audio_bitrate_kbps: u32,
    pub codec_family: CodecFamily,
    pub quality: QualityTier,
    /// Slot length for a still image with no paired audio
    pub still_duration_sec: TimeSec,
}

impl Default for ChannelSettings {
    fn default() -> Self {
        Self {
            resolution: Resolution::default(),
            fps: Ratio::default(),
            video_bitrate_kbps: None,
            audio_bitrate_kbps: 192,
            codec_family: CodecFamily::default(),
            quality: QualityTier::default(),
            still_duration_sec: 5.0,
        }
    }
}

// =============================================================================
// Clip
// =============================================================================

/// How the visual source fills its slot duration
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisualPlayback {
    /// Still image held for the slot duration
    Still,
    /// Video plays exactly once (native length matches the slot)
    Once,
    /// Video shorter than the slot loops
    Loop,
    /// Video longer than the slot is trimmed from the start
    Trim,
}

/// One timeline entry: a media pair with its resolved duration and the
/// effect chain the builder assigned to it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Clip {
    pub id: ClipId,
    pub pair: MediaPair,
    /// Resolved slot duration: audio length when audio is paired, otherwise
    /// the channel's still default (or the video's own length)
    pub duration_sec: TimeSec,
    pub motion: Vec<MotionEffect>,
    pub stylized: Vec<StylizedEffect>,
    pub overlays: Vec<OverlaySpec>,
    pub audio_effects: Vec<AudioEffect>,
    pub transition_in: Option<TransitionSpec>,
    pub transition_out: Option<TransitionSpec>,
    pub fade_in: Option<FadeSpec>,
    pub fade_out: Option<FadeSpec>,
}

impl Clip {
    pub fn new(pair: MediaPair, duration_sec: TimeSec) -> Self {
        Self {
            id: ulid::Ulid::new().to_string(),
            pair,
            duration_sec,
            motion: Vec::new(),
            stylized: Vec::new(),
            overlays: Vec::new(),
            audio_effects: Vec::new(),
            transition_in: None,
            transition_out: None,
            fade_in: None,
            fade_out: None,
        }
    }

    /// Resolves how the visual source covers the slot
    pub fn visual_playback(&self) -> VisualPlayback {
        if self.pair.visual_kind == VisualKind::Still {
            return VisualPlayback::Still;
        }
        match self.pair.visual_duration_sec {
            None => VisualPlayback::Once,
            Some(native) => {
                if (native - self.duration_sec).abs() <= DURATION_EPSILON_SEC {
                    VisualPlayback::Once
                } else if native < self.duration_sec {
                    VisualPlayback::Loop
                } else {
                    VisualPlayback::Trim
                }
            }
        }
    }
}

// =============================================================================
// Channel
// =============================================================================

/// A channel owns its clips exclusively; two channels never share clip state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Channel {
    pub id: ChannelId,
    pub name: String,
    pub settings: ChannelSettings,
    pub preset: EffectPreset,
    pub clips: Vec<Clip>,
}

impl Channel {
    pub fn new(name: impl Into<String>, settings: ChannelSettings, preset: EffectPreset) -> Self {
        Self {
            id: ulid::Ulid::new().to_string(),
            name: name.into(),
            settings,
            preset,
            clips: Vec::new(),
        }
    }

    /// Sum of clip slot durations
    pub fn total_duration(&self) -> TimeSec {
        self.clips.iter().map(|c| c.duration_sec).sum()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::PairKey;
    use std::path::PathBuf;

    fn video_pair(native: Option<f64>) -> MediaPair {
        let mut pair = MediaPair::new(
            PairKey(1),
            PathBuf::from("0001_clip.mp4"),
            VisualKind::Video,
        );
        if let Some(d) = native {
            pair = pair.with_visual_duration(d);
        }
        pair
    }

    #[test]
    fn test_still_playback() {
        let pair = MediaPair::new(
            PairKey(1),
            PathBuf::from("0001_photo.jpg"),
            VisualKind::Still,
        );
        let clip = Clip::new(pair, 5.0);
        assert_eq!(clip.visual_playback(), VisualPlayback::Still);
    }

    #[test]
    fn test_video_playback_loop_once_trim() {
        // Shorter than the slot: loop
        let clip = Clip::new(video_pair(Some(3.0)), 10.0);
        assert_eq!(clip.visual_playback(), VisualPlayback::Loop);

        // Longer than the slot: trim
        let clip = Clip::new(video_pair(Some(20.0)), 10.0);
        assert_eq!(clip.visual_playback(), VisualPlayback::Trim);

        // Equal within tolerance: play once
        let clip = Clip::new(video_pair(Some(10.0005)), 10.0);
        assert_eq!(clip.visual_playback(), VisualPlayback::Once);
    }

    #[test]
    fn test_channel_total_duration() {
        let mut channel = Channel::new(
            "main",
            ChannelSettings::default(),
            EffectPreset::youtube(),
        );
        channel.clips.push(Clip::new(video_pair(Some(4.0)), 4.0));
        channel.clips.push(Clip::new(video_pair(Some(6.5)), 6.5));
        assert!((channel.total_duration() - 10.5).abs() < 1e-9);
    }

    #[test]
    fn test_settings_deserialize_with_defaults() {
        let settings: ChannelSettings = serde_json::from_str(r#"{}"#).unwrap();
        assert_eq!(settings.still_duration_sec, 5.0);
        assert_eq!(settings.audio_bitrate_kbps, 192);

        let settings: ChannelSettings =
            serde_json::from_str(r#"{"stillDurationSec": 3.5}"#).unwrap();
        assert_eq!(settings.still_duration_sec, 3.5);
    }
}
