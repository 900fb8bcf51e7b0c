//! Primitive Operations
//!
//! The compiled form of a clip's effect chain: primitive operations grouped
//! into five fixed stages. Stage order is a property of the pipeline, not of
//! the authoring order; the compiler always emits geometry first and the
//! audio tail last.

use serde::{Deserialize, Serialize};

use crate::core::effects::{
    AudioEffect, BlendMode, Easing, MotionKind, OverlayPlacement, ShortfallMode, StylizedKind,
    TransitionKind,
};
use crate::core::timeline::VisualPlayback;
use crate::core::{ClipId, MontageError, MontageResult, NormRect, TimeRange, TimeSec};

use std::path::PathBuf;

/// Fixed pipeline stages, in execution order
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Geometry,
    Stylize,
    Overlay,
    ColorTransition,
    Audio,
}

impl Stage {
    /// All stages in execution order
    pub const ORDER: [Stage; 5] = [
        Stage::Geometry,
        Stage::Stylize,
        Stage::Overlay,
        Stage::ColorTransition,
        Stage::Audio,
    ];

    pub fn index(&self) -> usize {
        match self {
            Stage::Geometry => 0,
            Stage::Stylize => 1,
            Stage::Overlay => 2,
            Stage::ColorTransition => 3,
            Stage::Audio => 4,
        }
    }
}

/// One primitive operation. Every variant belongs to exactly one stage.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum PrimitiveOp {
    /// Animated framing from `start_rect` to `end_rect`
    Frame {
        kind: MotionKind,
        start_rect: NormRect,
        end_rect: NormRect,
        easing: Easing,
    },
    /// Short stylized treatment
    Stylize { kind: StylizedKind, intensity: f64 },
    /// Secondary asset composited over the frame
    Composite {
        asset_path: PathBuf,
        blend: BlendMode,
        opacity: f64,
        placement: OverlayPlacement,
        shortfall: ShortfallMode,
    },
    /// Incoming edge transition
    TransitionIn { kind: TransitionKind },
    /// Outgoing edge transition
    TransitionOut { kind: TransitionKind },
    /// Fade from black
    FadeIn,
    /// Fade to black
    FadeOut,
    /// User-ordered audio treatment
    Voice { effect: AudioEffect },
    /// EBU R128 loudness normalization (always present on audible clips)
    Normalize,
    /// Peak limiter (always the final audio op)
    Limit,
}

impl PrimitiveOp {
    /// The stage this operation executes in
    pub fn stage(&self) -> Stage {
        match self {
            PrimitiveOp::Frame { .. } => Stage::Geometry,
            PrimitiveOp::Stylize { .. } => Stage::Stylize,
            PrimitiveOp::Composite { .. } => Stage::Overlay,
            PrimitiveOp::TransitionIn { .. }
            | PrimitiveOp::TransitionOut { .. }
            | PrimitiveOp::FadeIn
            | PrimitiveOp::FadeOut => Stage::ColorTransition,
            PrimitiveOp::Voice { .. } | PrimitiveOp::Normalize | PrimitiveOp::Limit => {
                Stage::Audio
            }
        }
    }
}

/// A primitive op with its resolved active range within the clip
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimedOp {
    pub op: PrimitiveOp,
    pub range: TimeRange,
}

/// The fully compiled pipeline for one clip. Ops are ordered by stage, and
/// within the audio stage the normalize/limit tail is always last.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClipPipeline {
    pub clip_id: ClipId,
    pub duration_sec: TimeSec,
    pub playback: VisualPlayback,
    pub ops: Vec<TimedOp>,
}

impl ClipPipeline {
    /// Ops belonging to one stage, in emission order
    pub fn ops_in_stage(&self, stage: Stage) -> impl Iterator<Item = &TimedOp> {
        self.ops.iter().filter(move |t| t.op.stage() == stage)
    }

    /// Structural invariants every compiled pipeline satisfies:
    /// stage order is non-decreasing, every range lies within the clip,
    /// stylize ranges sum to at most the clip duration, and audible clips
    /// end with the normalize/limit tail.
    pub fn validate(&self) -> MontageResult<()> {
        let mut last_stage = 0usize;
        let mut stylize_total = 0.0;
        for timed in &self.ops {
            let stage = timed.op.stage().index();
            if stage < last_stage {
                return Err(MontageError::Internal(format!(
                    "pipeline for clip {} is not stage-ordered",
                    self.clip_id
                )));
            }
            last_stage = stage;

            if !timed.range.fits_within(self.duration_sec + 1e-9) {
                return Err(MontageError::TimelineOverflow {
                    clip_id: self.clip_id.clone(),
                    span_sec: timed.range.end_sec,
                    duration_sec: self.duration_sec,
                });
            }
            if timed.op.stage() == Stage::Stylize {
                stylize_total += timed.range.duration();
            }
        }
        if stylize_total > self.duration_sec + 1e-9 {
            return Err(MontageError::TimelineOverflow {
                clip_id: self.clip_id.clone(),
                span_sec: stylize_total,
                duration_sec: self.duration_sec,
            });
        }

        let audio: Vec<_> = self.ops_in_stage(Stage::Audio).collect();
        if !audio.is_empty() {
            let n = audio.len();
            let tail_ok = n >= 2
                && matches!(audio[n - 2].op, PrimitiveOp::Normalize)
                && matches!(audio[n - 1].op, PrimitiveOp::Limit);
            if !tail_ok {
                return Err(MontageError::Internal(format!(
                    "pipeline for clip {} is missing the normalize/limit tail",
                    self.clip_id
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_order_is_fixed() {
        let indices: Vec<_> = Stage::ORDER.iter().map(|s| s.index()).collect();
        assert_eq!(indices, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_op_stage_mapping() {
        assert_eq!(PrimitiveOp::FadeIn.stage(), Stage::ColorTransition);
        assert_eq!(PrimitiveOp::Normalize.stage(), Stage::Audio);
        assert_eq!(
            PrimitiveOp::Stylize {
                kind: StylizedKind::Pulse,
                intensity: 0.5
            }
            .stage(),
            Stage::Stylize
        );
    }

    #[test]
    fn test_validate_rejects_out_of_order_stages() {
        let pipeline = ClipPipeline {
            clip_id: "clip".to_string(),
            duration_sec: 10.0,
            playback: VisualPlayback::Still,
            ops: vec![
                TimedOp {
                    op: PrimitiveOp::FadeIn,
                    range: TimeRange::new(0.0, 1.0),
                },
                TimedOp {
                    op: PrimitiveOp::Frame {
                        kind: MotionKind::ZoomIn,
                        start_rect: NormRect::full(),
                        end_rect: NormRect::centered(0.8),
                        easing: Easing::Ease,
                    },
                    range: TimeRange::new(0.0, 10.0),
                },
            ],
        };
        assert!(pipeline.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_range_past_clip_end() {
        let pipeline = ClipPipeline {
            clip_id: "clip".to_string(),
            duration_sec: 5.0,
            playback: VisualPlayback::Still,
            ops: vec![TimedOp {
                op: PrimitiveOp::FadeOut,
                range: TimeRange::new(4.0, 6.0),
            }],
        };
        match pipeline.validate().unwrap_err() {
            MontageError::TimelineOverflow { span_sec, .. } => assert_eq!(span_sec, 6.0),
            other => panic!("unexpected error: {other}"),
        }
    }
}
