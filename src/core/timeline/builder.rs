//! Timeline Builder
//!
//! Turns resolved media pairs into an ordered clip list: resolves every slot
//! duration (audio-led, still default otherwise), applies the channel preset
//! with per-clip overrides, and assigns transitions round-robin along the
//! clip edges, shortening or dropping any transition its clips cannot carry.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::effects::{EffectPreset, EffectSpec, TransitionSpec};
use crate::core::media::MediaPair;
use crate::core::{MontageError, MontageResult, PairKey, SkippedItem, TimeSec};

use super::models::{Channel, ChannelSettings, Clip};

/// Per-clip effect override, keyed by pair key. A non-empty category replaces
/// the preset's assignment for that category; absent categories keep the
/// preset behavior.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClipOverride {
    pub effects: Vec<EffectSpec>,
}

impl ClipOverride {
    pub fn new(effects: Vec<EffectSpec>) -> Self {
        Self { effects }
    }
}

/// Build output: accepted clips in key order plus the skip report
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineReport {
    pub clips: Vec<Clip>,
    pub skipped: Vec<SkippedItem>,
}

impl TimelineReport {
    /// Sum of accepted clip durations
    pub fn total_duration(&self) -> TimeSec {
        self.clips.iter().map(|c| c.duration_sec).sum()
    }
}

/// Validated override effects split back into their categories
#[derive(Default)]
struct PartitionedOverride {
    motion: Vec<crate::core::effects::MotionEffect>,
    stylized: Vec<crate::core::effects::StylizedEffect>,
    overlays: Vec<crate::core::effects::OverlaySpec>,
    audio: Vec<crate::core::effects::AudioEffect>,
    transition: Option<TransitionSpec>,
    fade: Option<crate::core::effects::FadeSpec>,
}

impl PartitionedOverride {
    fn from_override(spec: &ClipOverride) -> MontageResult<Self> {
        let mut out = Self::default();
        for effect in &spec.effects {
            effect.validate()?;
            match effect {
                EffectSpec::Motion(m) => out.motion.push(m.clone()),
                EffectSpec::Stylized(s) => out.stylized.push(s.clone()),
                EffectSpec::Overlay(o) => out.overlays.push(o.clone()),
                EffectSpec::Audio(a) => out.audio.push(a.clone()),
                EffectSpec::Transition(t) => out.transition = Some(*t),
                EffectSpec::Fade(f) => out.fade = Some(*f),
            }
        }
        Ok(out)
    }
}

/// Builds clip timelines for one channel configuration
pub struct TimelineBuilder {
    settings: ChannelSettings,
    preset: EffectPreset,
}

impl TimelineBuilder {
    pub fn new(settings: ChannelSettings, preset: EffectPreset) -> Self {
        Self { settings, preset }
    }

    /// Builds the clip list from resolved pairs. Pairs that cannot be placed
    /// (unprobed audio, invalid overrides) are reported and skipped; the
    /// remaining clips are unaffected.
    pub fn build(
        &self,
        pairs: Vec<MediaPair>,
        overrides: &BTreeMap<PairKey, ClipOverride>,
    ) -> TimelineReport {
        let mut clips: Vec<Clip> = Vec::with_capacity(pairs.len());
        let mut edge_overrides: Vec<Option<TransitionSpec>> = Vec::with_capacity(pairs.len());
        let mut skipped = Vec::new();

        for pair in pairs {
            let key = pair.key;
            let partitioned = match overrides.get(&key) {
                Some(o) => match PartitionedOverride::from_override(o) {
                    Ok(p) => p,
                    Err(err) => {
                        debug!("Skipping pair {}: {}", key, err);
                        skipped.push(SkippedItem::new(key.to_string(), &err));
                        continue;
                    }
                },
                None => PartitionedOverride::default(),
            };

            let duration_sec = match self.resolve_duration(&pair) {
                Ok(d) => d,
                Err(err) => {
                    debug!("Skipping pair {}: {}", key, err);
                    skipped.push(SkippedItem::new(key.to_string(), &err));
                    continue;
                }
            };

            let index = clips.len();
            let mut clip = Clip::new(pair, duration_sec);

            clip.motion = if partitioned.motion.is_empty() {
                self.preset.motion_for_clip(index).into_iter().collect()
            } else {
                partitioned.motion
            };
            clip.stylized = if partitioned.stylized.is_empty() {
                self.preset.stylized.clone()
            } else {
                partitioned.stylized
            };
            clip.overlays = partitioned.overlays;
            clip.audio_effects = if partitioned.audio.is_empty() {
                self.preset.audio.clone()
            } else {
                partitioned.audio
            };
            clip.fade_in = partitioned.fade;

            edge_overrides.push(partitioned.transition);
            clips.push(clip);
        }

        self.assign_transitions(&mut clips, &edge_overrides);
        self.assign_boundary_fades(&mut clips);

        TimelineReport { clips, skipped }
    }

    /// Builds a complete channel in one step.
    pub fn build_channel(
        &self,
        name: impl Into<String>,
        pairs: Vec<MediaPair>,
        overrides: &BTreeMap<PairKey, ClipOverride>,
    ) -> (Channel, Vec<SkippedItem>) {
        let report = self.build(pairs, overrides);
        let mut channel = Channel::new(name, self.settings.clone(), self.preset.clone());
        channel.clips = report.clips;
        (channel, report.skipped)
    }

    /// Audio length rules the slot; without audio every pair takes the
    /// channel default, and a video loops or trims to fill it.
    fn resolve_duration(&self, pair: &MediaPair) -> MontageResult<TimeSec> {
        if let Some(audio_path) = &pair.audio_path {
            let duration = pair.audio_duration_sec.ok_or(MontageError::MissingDuration {
                path: audio_path.display().to_string(),
            })?;
            if duration <= 0.0 {
                return Err(MontageError::MissingDuration {
                    path: audio_path.display().to_string(),
                });
            }
            return Ok(duration);
        }
        Ok(self.settings.still_duration_sec)
    }

    /// Assigns one transition per clip edge, shared by both sides. A
    /// transition the adjacent clips cannot carry is shortened to fit, down
    /// to the floor, and dropped past it.
    fn assign_transitions(&self, clips: &mut [Clip], edge_overrides: &[Option<TransitionSpec>]) {
        if clips.len() < 2 {
            return;
        }
        for i in 0..clips.len() - 1 {
            let base = edge_overrides[i].or_else(|| self.preset.transition_for_edge(i));
            let Some(spec) = base else { continue };

            let available = clips[i].duration_sec.min(clips[i + 1].duration_sec);
            match spec.fitted_to(available) {
                Some(fitted) => {
                    if fitted.duration_sec < spec.duration_sec {
                        debug!(
                            "Transition at edge {} shortened from {:.2}s to {:.2}s",
                            i, spec.duration_sec, fitted.duration_sec
                        );
                    }
                    clips[i].transition_out = Some(fitted);
                    clips[i + 1].transition_in = Some(fitted);
                }
                None => {
                    debug!("Transition at edge {} dropped: clip too short", i);
                }
            }
        }
    }

    /// First clip fades in from black, last fades out, when the preset says
    /// so and no override already claimed the boundary.
    fn assign_boundary_fades(&self, clips: &mut [Clip]) {
        if let Some(first) = clips.first_mut() {
            if first.fade_in.is_none() {
                first.fade_in = self.preset.fade_in;
            }
        }
        if let Some(last) = clips.last_mut() {
            last.fade_out = self.preset.fade_out;
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::effects::{
        AudioEffect, MotionEffect, MotionKind, TransitionKind,
    };
    use crate::core::media::VisualKind;
    use crate::core::timeline::VisualPlayback;
    use crate::core::Resolution;
    use std::path::PathBuf;

    fn still_with_audio(key: u16, audio_sec: f64) -> MediaPair {
        MediaPair::new(
            PairKey(key),
            PathBuf::from(format!("{:04}_visual.jpg", key)),
            VisualKind::Still,
        )
        .with_audio(PathBuf::from(format!("{:04}_voice.mp3", key)))
        .with_audio_duration(audio_sec)
    }

    fn silent_still(key: u16) -> MediaPair {
        MediaPair::new(
            PairKey(key),
            PathBuf::from(format!("{:04}_visual.jpg", key)),
            VisualKind::Still,
        )
    }

    fn builder() -> TimelineBuilder {
        TimelineBuilder::new(ChannelSettings::default(), EffectPreset::youtube())
    }

    #[test]
    fn test_durations_audio_led_with_still_default() {
        // Mixed folder: two narrated stills and one silent one
        let report = builder().build(
            vec![
                still_with_audio(1, 3.2),
                silent_still(2),
                still_with_audio(3, 4.0),
            ],
            &BTreeMap::new(),
        );

        assert_eq!(report.clips.len(), 3);
        assert_eq!(report.clips[0].duration_sec, 3.2);
        assert_eq!(report.clips[1].duration_sec, 5.0); // channel default
        assert_eq!(report.clips[2].duration_sec, 4.0);
        assert!((report.total_duration() - 12.2).abs() < 1e-9);
        assert!(report.skipped.is_empty());
    }

    #[test]
    fn test_unprobed_audio_skips_only_that_clip() {
        let unprobed = MediaPair::new(
            PairKey(2),
            PathBuf::from("0002_visual.jpg"),
            VisualKind::Still,
        )
        .with_audio(PathBuf::from("0002_voice.mp3"));

        let report = builder().build(
            vec![still_with_audio(1, 3.0), unprobed, still_with_audio(3, 2.0)],
            &BTreeMap::new(),
        );

        assert_eq!(report.clips.len(), 2);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].subject, "0002");
        assert!(report.skipped[0].reason.contains("never probed"));
    }

    #[test]
    fn test_silent_video_takes_default_and_trims() {
        let video = MediaPair::new(
            PairKey(1),
            PathBuf::from("0001_broll.mp4"),
            VisualKind::Video,
        )
        .with_visual_duration(7.5);

        // No audio: the channel default rules, not the native length
        let report = builder().build(vec![video], &BTreeMap::new());
        assert_eq!(report.clips[0].duration_sec, 5.0);
        assert_eq!(report.clips[0].visual_playback(), VisualPlayback::Trim);
    }

    #[test]
    fn test_silent_short_video_takes_default_and_loops() {
        let video = MediaPair::new(
            PairKey(1),
            PathBuf::from("0001_broll.mp4"),
            VisualKind::Video,
        )
        .with_visual_duration(2.0);

        let report = builder().build(vec![video], &BTreeMap::new());
        assert_eq!(report.clips[0].duration_sec, 5.0);
        assert_eq!(report.clips[0].visual_playback(), VisualPlayback::Loop);
    }

    #[test]
    fn test_transitions_shared_per_edge_and_cycled() {
        let report = builder().build(
            (1..=4).map(|k| still_with_audio(k, 6.0)).collect(),
            &BTreeMap::new(),
        );

        let clips = &report.clips;
        for i in 0..3 {
            let out = clips[i].transition_out.unwrap();
            let inc = clips[i + 1].transition_in.unwrap();
            assert_eq!(out, inc);
        }
        // youtube cycle: fade, dissolve, fade, ...
        assert_eq!(clips[0].transition_out.unwrap().kind, TransitionKind::Fade);
        assert_eq!(
            clips[1].transition_out.unwrap().kind,
            TransitionKind::Dissolve
        );
        assert_eq!(clips[2].transition_out.unwrap().kind, TransitionKind::Fade);

        // Boundary clips never get an outer transition
        assert!(clips[0].transition_in.is_none());
        assert!(clips[3].transition_out.is_none());
    }

    #[test]
    fn test_transition_shortened_for_short_clip() {
        // youtube authors 1.0s transitions; a 0.5s neighbor squeezes them
        let report = builder().build(
            vec![still_with_audio(1, 6.0), still_with_audio(2, 0.5)],
            &BTreeMap::new(),
        );

        let fitted = report.clips[0].transition_out.unwrap();
        assert_eq!(fitted.duration_sec, 0.5);
    }

    #[test]
    fn test_transition_dropped_below_floor() {
        let report = builder().build(
            vec![still_with_audio(1, 6.0), still_with_audio(2, 0.2)],
            &BTreeMap::new(),
        );

        assert!(report.clips[0].transition_out.is_none());
        assert!(report.clips[1].transition_in.is_none());
        // Both clips themselves survive
        assert_eq!(report.clips.len(), 2);
    }

    #[test]
    fn test_boundary_fades_from_preset() {
        let report = builder().build(
            vec![still_with_audio(1, 6.0), still_with_audio(2, 6.0)],
            &BTreeMap::new(),
        );

        assert!(report.clips[0].fade_in.is_some());
        assert!(report.clips[0].fade_out.is_none());
        assert!(report.clips[1].fade_out.is_some());
    }

    #[test]
    fn test_override_replaces_preset_categories() {
        let mut overrides = BTreeMap::new();
        overrides.insert(
            PairKey(1),
            ClipOverride::new(vec![
                EffectSpec::Motion(MotionEffect::rotate_drift()),
                EffectSpec::Audio(AudioEffect::Telephone),
            ]),
        );

        let report = builder().build(
            vec![still_with_audio(1, 6.0), still_with_audio(2, 6.0)],
            &overrides,
        );

        // Overridden categories replaced
        assert_eq!(report.clips[0].motion.len(), 1);
        assert_eq!(report.clips[0].motion[0].kind, MotionKind::Rotate);
        assert_eq!(report.clips[0].audio_effects, vec![AudioEffect::Telephone]);
        // Untouched clip keeps the preset cycle
        assert_eq!(report.clips[1].motion[0].kind, MotionKind::ZoomOut);
    }

    #[test]
    fn test_invalid_override_skips_clip_with_named_field() {
        let mut overrides = BTreeMap::new();
        overrides.insert(
            PairKey(1),
            ClipOverride::new(vec![EffectSpec::Stylized(
                crate::core::effects::StylizedEffect {
                    kind: crate::core::effects::StylizedKind::Pulse,
                    intensity: 2.0,
                    duration_sec: 1.0,
                    window: None,
                },
            )]),
        );

        let report = builder().build(
            vec![still_with_audio(1, 6.0), still_with_audio(2, 6.0)],
            &overrides,
        );

        assert_eq!(report.clips.len(), 1);
        assert_eq!(report.skipped.len(), 1);
        assert!(report.skipped[0].reason.contains("intensity"));
    }

    #[test]
    fn test_rebuild_is_idempotent_in_structure() {
        let pairs = || (1..=3).map(|k| still_with_audio(k, 4.0)).collect::<Vec<_>>();
        let a = builder().build(pairs(), &BTreeMap::new());
        let b = builder().build(pairs(), &BTreeMap::new());

        assert_eq!(a.clips.len(), b.clips.len());
        for (x, y) in a.clips.iter().zip(&b.clips) {
            // Ids are fresh ULIDs; everything else must match
            assert_eq!(x.duration_sec, y.duration_sec);
            assert_eq!(x.motion, y.motion);
            assert_eq!(x.transition_out, y.transition_out);
            assert_eq!(x.fade_in, y.fade_in);
        }
    }

    #[test]
    fn test_build_channel_carries_settings() {
        let settings = ChannelSettings {
            resolution: Resolution::new(1080, 1920),
            ..Default::default()
        };
        let builder = TimelineBuilder::new(settings.clone(), EffectPreset::shorts());
        let (channel, skipped) =
            builder.build_channel("shorts-feed", vec![still_with_audio(1, 3.0)], &BTreeMap::new());

        assert_eq!(channel.name, "shorts-feed");
        assert_eq!(channel.settings, settings);
        assert_eq!(channel.clips.len(), 1);
        assert!(skipped.is_empty());
    }
}
