//! Effect Model Definitions
//!
//! The closed effect vocabulary: motion, stylized, transition, overlay, fade,
//! and audio effects. Every parameter is validated at construction against a
//! closed range; no free-form effect strings exist anywhere in the model.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::core::{MontageError, MontageResult, NormRect, TimeRange, TimeSec};

use super::easing::Easing;

// =============================================================================
// Bounds
// =============================================================================

/// Transition duration as authored
pub const TRANSITION_MIN_SEC: TimeSec = 0.1;
pub const TRANSITION_MAX_SEC: TimeSec = 5.0;

/// Shortening floor: a transition squeezed below this is dropped entirely
pub const TRANSITION_FLOOR_SEC: TimeSec = 0.25;

pub const FADE_MIN_SEC: TimeSec = 0.1;
pub const FADE_MAX_SEC: TimeSec = 5.0;

pub const STYLIZED_MIN_SEC: TimeSec = 0.1;
pub const STYLIZED_MAX_SEC: TimeSec = 30.0;

pub const PITCH_MIN_SEMITONES: f64 = -12.0;
pub const PITCH_MAX_SEMITONES: f64 = 12.0;

pub const BASS_MIN_DB: f64 = 0.0;
pub const BASS_MAX_DB: f64 = 20.0;

fn check_range(field: &'static str, value: f64, min: f64, max: f64) -> MontageResult<()> {
    if !value.is_finite() || value < min || value > max {
        return Err(MontageError::InvalidEffectParameter {
            field,
            value,
            min,
            max,
        });
    }
    Ok(())
}

fn check_rect(field: &'static str, rect: &NormRect) -> MontageResult<()> {
    let checks = [
        (rect.x, 0.0, 1.0),
        (rect.y, 0.0, 1.0),
        (rect.width, 0.01, 1.0),
        (rect.height, 0.01, 1.0),
        (rect.x + rect.width, 0.0, 1.0 + 1e-9),
        (rect.y + rect.height, 0.0, 1.0 + 1e-9),
    ];
    for (value, min, max) in checks {
        if !value.is_finite() || value < min || value > max {
            return Err(MontageError::InvalidEffectParameter {
                field,
                value,
                min,
                max,
            });
        }
    }
    Ok(())
}

// =============================================================================
// Motion Effects
// =============================================================================

/// Frame motion variants (Ken Burns family)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MotionKind {
    ZoomIn,
    ZoomOut,
    Pan,
    Rotate,
    Parallax,
}

/// A continuous framing motion from `start_rect` to `end_rect` over the
/// active window (the whole clip unless overridden).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MotionEffect {
    pub kind: MotionKind,
    pub start_rect: NormRect,
    pub end_rect: NormRect,
    pub easing: Easing,
    /// Active window within the clip; `None` spans the whole clip
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window: Option<TimeRange>,
}

impl MotionEffect {
    pub fn new(
        kind: MotionKind,
        start_rect: NormRect,
        end_rect: NormRect,
        easing: Easing,
    ) -> MontageResult<Self> {
        check_rect("start_rect", &start_rect)?;
        check_rect("end_rect", &end_rect)?;
        Ok(Self {
            kind,
            start_rect,
            end_rect,
            easing,
            window: None,
        })
    }

    pub fn with_window(mut self, window: TimeRange) -> Self {
        self.window = Some(window);
        self
    }

    /// Slow push from full frame to a centered 80% crop
    pub fn zoom_in() -> Self {
        Self {
            kind: MotionKind::ZoomIn,
            start_rect: NormRect::full(),
            end_rect: NormRect::centered(0.8),
            easing: Easing::Ease,
            window: None,
        }
    }

    /// Pull back from a centered 80% crop to full frame
    pub fn zoom_out() -> Self {
        Self {
            kind: MotionKind::ZoomOut,
            start_rect: NormRect::centered(0.8),
            end_rect: NormRect::full(),
            easing: Easing::Ease,
            window: None,
        }
    }

    /// Lateral drift across a zoomed frame, left to right
    pub fn pan_left_to_right() -> Self {
        Self {
            kind: MotionKind::Pan,
            start_rect: NormRect::new(0.0, 0.1, 0.8, 0.8),
            end_rect: NormRect::new(0.2, 0.1, 0.8, 0.8),
            easing: Easing::EaseInOut,
            window: None,
        }
    }

    /// Subtle rotation drift around a slight zoom
    pub fn rotate_drift() -> Self {
        Self {
            kind: MotionKind::Rotate,
            start_rect: NormRect::centered(0.9),
            end_rect: NormRect::centered(0.85),
            easing: Easing::Ease,
            window: None,
        }
    }

    /// Depth-suggesting diagonal drift
    pub fn parallax_drift() -> Self {
        Self {
            kind: MotionKind::Parallax,
            start_rect: NormRect::new(0.0, 0.0, 0.85, 0.85),
            end_rect: NormRect::new(0.15, 0.15, 0.85, 0.85),
            easing: Easing::EaseOut,
            window: None,
        }
    }
}

// =============================================================================
// Stylized Effects
// =============================================================================

/// Short punchy treatments applied to a sub-window of a clip
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StylizedKind {
    ZoomBurst,
    Pulse,
    Shake,
    Glitch,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StylizedEffect {
    pub kind: StylizedKind,
    /// Strength, `0.0..=1.0`
    pub intensity: f64,
    /// Active length of the burst
    pub duration_sec: TimeSec,
    /// Placement within the clip; `None` anchors at the clip start
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window: Option<TimeRange>,
}

impl StylizedEffect {
    pub fn new(kind: StylizedKind, intensity: f64, duration_sec: TimeSec) -> MontageResult<Self> {
        check_range("intensity", intensity, 0.0, 1.0)?;
        check_range("duration_sec", duration_sec, STYLIZED_MIN_SEC, STYLIZED_MAX_SEC)?;
        Ok(Self {
            kind,
            intensity,
            duration_sec,
            window: None,
        })
    }

    pub fn with_window(mut self, window: TimeRange) -> Self {
        self.window = Some(window);
        self
    }
}

// =============================================================================
// Transitions
// =============================================================================

/// Cross-clip transition variants (xfade family)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionKind {
    Fade,
    Dissolve,
    Zoom,
    Slide,
}

impl TransitionKind {
    /// FFmpeg `xfade` transition name
    pub fn xfade_name(&self) -> &'static str {
        match self {
            TransitionKind::Fade => "fade",
            TransitionKind::Dissolve => "dissolve",
            TransitionKind::Zoom => "zoomin",
            TransitionKind::Slide => "slideleft",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionSpec {
    pub kind: TransitionKind,
    pub duration_sec: TimeSec,
}

impl TransitionSpec {
    pub fn new(kind: TransitionKind, duration_sec: TimeSec) -> MontageResult<Self> {
        check_range(
            "transition.duration_sec",
            duration_sec,
            TRANSITION_MIN_SEC,
            TRANSITION_MAX_SEC,
        )?;
        Ok(Self { kind, duration_sec })
    }

    /// Shortens the transition to fit the available clip time, down to the
    /// floor. Returns `None` when the transition cannot fit at all.
    pub fn fitted_to(&self, available_sec: TimeSec) -> Option<TransitionSpec> {
        let duration_sec = self.duration_sec.min(available_sec);
        if duration_sec + 1e-9 < TRANSITION_FLOOR_SEC {
            return None;
        }
        Some(Self {
            kind: self.kind,
            duration_sec,
        })
    }
}

// =============================================================================
// Fades
// =============================================================================

/// Fade from/to black at a clip boundary
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FadeSpec {
    pub duration_sec: TimeSec,
}

impl FadeSpec {
    pub fn new(duration_sec: TimeSec) -> MontageResult<Self> {
        check_range("fade.duration_sec", duration_sec, FADE_MIN_SEC, FADE_MAX_SEC)?;
        Ok(Self { duration_sec })
    }
}

// =============================================================================
// Overlays
// =============================================================================

/// Blend mode for overlay compositing
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlendMode {
    Screen,
    Overlay,
    Multiply,
    Addition,
}

impl BlendMode {
    /// FFmpeg `blend` filter mode name
    pub fn ffmpeg_name(&self) -> &'static str {
        match self {
            BlendMode::Screen => "screen",
            BlendMode::Overlay => "overlay",
            BlendMode::Multiply => "multiply",
            BlendMode::Addition => "addition",
        }
    }
}

/// Where an overlay sits on the output frame
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlayPlacement {
    #[default]
    Center,
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl OverlayPlacement {
    /// `overlay` filter `x:y` position expression
    pub fn position_expr(&self) -> &'static str {
        match self {
            OverlayPlacement::Center => "(W-w)/2:(H-h)/2",
            OverlayPlacement::TopLeft => "10:10",
            OverlayPlacement::TopRight => "W-w-10:10",
            OverlayPlacement::BottomLeft => "10:H-h-10",
            OverlayPlacement::BottomRight => "W-w-10:H-h-10",
        }
    }
}

/// What to do when the overlay asset is shorter than its active window
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShortfallMode {
    /// Hold the asset's last frame for the remainder
    #[default]
    HoldLast,
    /// Loop the asset
    Loop,
}

/// A secondary asset composited over the clip. An asset longer than the
/// active window is trimmed; a shorter one follows its shortfall mode.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlaySpec {
    pub asset_path: PathBuf,
    pub blend: BlendMode,
    /// `0.0..=1.0`
    pub opacity: f64,
    pub placement: OverlayPlacement,
    pub shortfall: ShortfallMode,
    /// Active window within the clip; `None` spans the whole clip
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window: Option<TimeRange>,
}

impl OverlaySpec {
    pub fn new(asset_path: PathBuf, blend: BlendMode, opacity: f64) -> MontageResult<Self> {
        check_range("opacity", opacity, 0.0, 1.0)?;
        Ok(Self {
            asset_path,
            blend,
            opacity,
            placement: OverlayPlacement::default(),
            shortfall: ShortfallMode::default(),
            window: None,
        })
    }

    pub fn with_placement(mut self, placement: OverlayPlacement) -> Self {
        self.placement = placement;
        self
    }

    pub fn with_shortfall(mut self, shortfall: ShortfallMode) -> Self {
        self.shortfall = shortfall;
        self
    }

    pub fn with_window(mut self, window: TimeRange) -> Self {
        self.window = Some(window);
        self
    }
}

// =============================================================================
// Audio Effects
// =============================================================================

/// Voice/audio treatments. Parameterized variants validate their parameters;
/// the rest map to fixed filter recipes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AudioEffect {
    PitchShift { semitones: f64 },
    BassBoost { gain_db: f64 },
    Reverb,
    Echo,
    Chorus,
    Telephone,
    Underwater,
    Radio,
    Vintage,
}

impl AudioEffect {
    pub fn pitch_shift(semitones: f64) -> MontageResult<Self> {
        check_range("semitones", semitones, PITCH_MIN_SEMITONES, PITCH_MAX_SEMITONES)?;
        Ok(Self::PitchShift { semitones })
    }

    pub fn bass_boost(gain_db: f64) -> MontageResult<Self> {
        check_range("gain_db", gain_db, BASS_MIN_DB, BASS_MAX_DB)?;
        Ok(Self::BassBoost { gain_db })
    }

    /// Re-checks parameterized variants (deserialized values bypass the
    /// constructors).
    pub fn validate(&self) -> MontageResult<()> {
        match self {
            AudioEffect::PitchShift { semitones } => check_range(
                "semitones",
                *semitones,
                PITCH_MIN_SEMITONES,
                PITCH_MAX_SEMITONES,
            ),
            AudioEffect::BassBoost { gain_db } => {
                check_range("gain_db", *gain_db, BASS_MIN_DB, BASS_MAX_DB)
            }
            _ => Ok(()),
        }
    }
}

// =============================================================================
// Effect Spec
// =============================================================================

/// The closed effect union accepted from configuration and per-clip
/// overrides. Anything outside these variants simply cannot be expressed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum EffectSpec {
    Motion(MotionEffect),
    Stylized(StylizedEffect),
    Transition(TransitionSpec),
    Overlay(OverlaySpec),
    Fade(FadeSpec),
    Audio(AudioEffect),
}

impl EffectSpec {
    /// Validates the contained effect's parameters against its closed ranges.
    pub fn validate(&self) -> MontageResult<()> {
        match self {
            EffectSpec::Motion(m) => {
                check_rect("start_rect", &m.start_rect)?;
                check_rect("end_rect", &m.end_rect)
            }
            EffectSpec::Stylized(s) => {
                check_range("intensity", s.intensity, 0.0, 1.0)?;
                check_range(
                    "duration_sec",
                    s.duration_sec,
                    STYLIZED_MIN_SEC,
                    STYLIZED_MAX_SEC,
                )
            }
            EffectSpec::Transition(t) => check_range(
                "transition.duration_sec",
                t.duration_sec,
                TRANSITION_MIN_SEC,
                TRANSITION_MAX_SEC,
            ),
            EffectSpec::Overlay(o) => check_range("opacity", o.opacity, 0.0, 1.0),
            EffectSpec::Fade(f) => {
                check_range("fade.duration_sec", f.duration_sec, FADE_MIN_SEC, FADE_MAX_SEC)
            }
            EffectSpec::Audio(a) => a.validate(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    // ========================================================================
    // Parameter Validation Tests
    // ========================================================================

    #[test]
    fn test_motion_rejects_out_of_bounds_rect() {
        let bad = NormRect::new(0.5, 0.0, 0.8, 0.5);
        let err = MotionEffect::new(MotionKind::Pan, bad, NormRect::full(), Easing::Linear)
            .unwrap_err();
        match err {
            MontageError::InvalidEffectParameter { field, .. } => {
                assert_eq!(field, "start_rect");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_rect_error_names_the_violated_bound() {
        // Degenerate width fails its own lower bound, not the generic 0..1
        let sliver = NormRect::new(0.0, 0.0, 0.005, 0.5);
        let err = MotionEffect::new(MotionKind::Pan, sliver, NormRect::full(), Easing::Linear)
            .unwrap_err();
        match err {
            MontageError::InvalidEffectParameter { value, min, max, .. } => {
                assert_eq!(value, 0.005);
                assert_eq!(min, 0.01);
                assert_eq!(max, 1.0);
            }
            other => panic!("unexpected error: {other}"),
        }

        // An overhanging rect fails the x+width check with its real limit
        let overhang = NormRect::new(0.5, 0.0, 0.8, 0.5);
        let err = MotionEffect::new(MotionKind::Pan, overhang, NormRect::full(), Easing::Linear)
            .unwrap_err();
        match err {
            MontageError::InvalidEffectParameter { value, max, .. } => {
                assert!((value - 1.3).abs() < 1e-9);
                assert!(max > 1.0);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_motion_convenience_constructors_are_valid() {
        for m in [
            MotionEffect::zoom_in(),
            MotionEffect::zoom_out(),
            MotionEffect::pan_left_to_right(),
            MotionEffect::rotate_drift(),
            MotionEffect::parallax_drift(),
        ] {
            assert!(EffectSpec::Motion(m).validate().is_ok());
        }
    }

    #[test]
    fn test_stylized_intensity_bounds() {
        assert!(StylizedEffect::new(StylizedKind::Pulse, 0.5, 1.0).is_ok());
        let err = StylizedEffect::new(StylizedKind::Pulse, 1.2, 1.0).unwrap_err();
        match err {
            MontageError::InvalidEffectParameter {
                field, value, min, max,
            } => {
                assert_eq!(field, "intensity");
                assert_eq!(value, 1.2);
                assert_eq!((min, max), (0.0, 1.0));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_stylized_rejects_nan() {
        assert!(StylizedEffect::new(StylizedKind::Shake, f64::NAN, 1.0).is_err());
    }

    #[test]
    fn test_transition_duration_bounds() {
        assert!(TransitionSpec::new(TransitionKind::Fade, 1.0).is_ok());
        assert!(TransitionSpec::new(TransitionKind::Fade, 0.05).is_err());
        assert!(TransitionSpec::new(TransitionKind::Fade, 6.0).is_err());
    }

    #[test]
    fn test_transition_fitting() {
        let t = TransitionSpec::new(TransitionKind::Dissolve, 1.0).unwrap();

        // Fits unchanged
        assert_eq!(t.fitted_to(3.0).unwrap().duration_sec, 1.0);
        // Shortened to available time
        assert_eq!(t.fitted_to(0.5).unwrap().duration_sec, 0.5);
        // Exactly at the floor survives
        assert_eq!(t.fitted_to(0.25).unwrap().duration_sec, 0.25);
        // Below the floor is dropped
        assert!(t.fitted_to(0.2).is_none());
    }

    #[test]
    fn test_audio_pitch_bounds() {
        assert!(AudioEffect::pitch_shift(3.0).is_ok());
        assert!(AudioEffect::pitch_shift(-12.0).is_ok());
        assert!(AudioEffect::pitch_shift(12.5).is_err());
    }

    #[test]
    fn test_overlay_opacity_bounds() {
        assert!(OverlaySpec::new("glow.mp4".into(), BlendMode::Screen, 0.4).is_ok());
        assert!(OverlaySpec::new("glow.mp4".into(), BlendMode::Screen, 1.1).is_err());
    }

    // ========================================================================
    // Serialization Tests
    // ========================================================================

    #[test]
    fn test_effect_spec_tagged_serialization() {
        let spec = EffectSpec::Transition(
            TransitionSpec::new(TransitionKind::Zoom, 0.8).unwrap(),
        );
        let json = serde_json::to_value(&spec).unwrap();
        assert_eq!(json["effect"], "transition");
        assert_eq!(json["kind"], "zoom");
        assert_eq!(json["durationSec"], 0.8);

        let back: EffectSpec = serde_json::from_value(json).unwrap();
        assert_eq!(back, spec);
    }

    #[test]
    fn test_effect_spec_rejects_unknown_kind() {
        let json = r#"{"effect": "lens_flare", "intensity": 0.5}"#;
        assert!(serde_json::from_str::<EffectSpec>(json).is_err());
    }

    #[test]
    fn test_deserialized_values_still_validated() {
        let json = r#"{"effect": "audio", "type": "pitch_shift", "semitones": 40.0}"#;
        let spec: EffectSpec = serde_json::from_str(json).unwrap();
        assert!(spec.validate().is_err());
    }
}
