//! Effect Chain Compiler
//!
//! Compiles a clip's authored effects into the fixed five-stage primitive
//! pipeline. Out-of-range windows reject the clip; overlay windows are the
//! one stated exception and clamp to the clip instead. The audio stage keeps
//! the user's ordering and always closes with normalize/limit.

use tracing::debug;

use crate::core::timeline::Clip;
use crate::core::{MontageError, MontageResult, SkippedItem, TimeRange, TimeSec};

use super::ops::{ClipPipeline, PrimitiveOp, TimedOp};

/// Compiles every clip of a channel. A clip that fails to compile is
/// reported and dropped; the rest are unaffected.
pub fn compile_clips(clips: &[Clip]) -> (Vec<ClipPipeline>, Vec<SkippedItem>) {
    let mut pipelines = Vec::with_capacity(clips.len());
    let mut skipped = Vec::new();
    for clip in clips {
        match compile_clip(clip) {
            Ok(pipeline) => pipelines.push(pipeline),
            Err(err) => {
                debug!("Skipping clip {}: {}", clip.pair.key, err);
                skipped.push(SkippedItem::new(clip.pair.key.to_string(), &err));
            }
        }
    }
    (pipelines, skipped)
}

/// Compiles one clip into its stage-ordered pipeline.
pub fn compile_clip(clip: &Clip) -> MontageResult<ClipPipeline> {
    let duration = clip.duration_sec;
    let mut ops = Vec::new();

    compile_geometry(clip, duration, &mut ops)?;
    compile_stylize(clip, duration, &mut ops)?;
    compile_overlays(clip, duration, &mut ops);
    compile_color_transition(clip, duration, &mut ops);
    compile_audio(clip, duration, &mut ops);

    let pipeline = ClipPipeline {
        clip_id: clip.id.clone(),
        duration_sec: duration,
        playback: clip.visual_playback(),
        ops,
    };
    pipeline.validate()?;
    Ok(pipeline)
}

/// Motion effects span the whole clip unless windowed. Windows may overlap
/// (compound motion) but must lie inside the clip.
fn compile_geometry(clip: &Clip, duration: TimeSec, ops: &mut Vec<TimedOp>) -> MontageResult<()> {
    for motion in &clip.motion {
        let range = match motion.window {
            Some(window) => {
                if !window.fits_within(duration) {
                    return Err(MontageError::TimelineOverflow {
                        clip_id: clip.id.clone(),
                        span_sec: window.end_sec,
                        duration_sec: duration,
                    });
                }
                window
            }
            None => TimeRange::new(0.0, duration),
        };
        ops.push(TimedOp {
            op: PrimitiveOp::Frame {
                kind: motion.kind,
                start_rect: motion.start_rect,
                end_rect: motion.end_rect,
                easing: motion.easing,
            },
            range,
        });
    }
    Ok(())
}

/// Stylized bursts pack from the clip start unless windowed. Their combined
/// active time may not exceed the clip.
fn compile_stylize(clip: &Clip, duration: TimeSec, ops: &mut Vec<TimedOp>) -> MontageResult<()> {
    let mut cursor: TimeSec = 0.0;
    let mut total: TimeSec = 0.0;
    for effect in &clip.stylized {
        let range = match effect.window {
            Some(window) => {
                if !window.fits_within(duration) {
                    return Err(MontageError::TimelineOverflow {
                        clip_id: clip.id.clone(),
                        span_sec: window.end_sec,
                        duration_sec: duration,
                    });
                }
                window
            }
            None => {
                let end = cursor + effect.duration_sec;
                if end > duration + 1e-9 {
                    return Err(MontageError::TimelineOverflow {
                        clip_id: clip.id.clone(),
                        span_sec: end,
                        duration_sec: duration,
                    });
                }
                let range = TimeRange::new(cursor, end);
                cursor = end;
                range
            }
        };
        total += range.duration();
        if total > duration + 1e-9 {
            return Err(MontageError::TimelineOverflow {
                clip_id: clip.id.clone(),
                span_sec: total,
                duration_sec: duration,
            });
        }
        ops.push(TimedOp {
            op: PrimitiveOp::Stylize {
                kind: effect.kind,
                intensity: effect.intensity,
            },
            range,
        });
    }
    Ok(())
}

/// Overlay windows clamp to the clip rather than rejecting it; an overlay
/// left with no active time is dropped.
fn compile_overlays(clip: &Clip, duration: TimeSec, ops: &mut Vec<TimedOp>) {
    for overlay in &clip.overlays {
        let base = overlay
            .window
            .unwrap_or_else(|| TimeRange::new(0.0, duration));
        let Some(range) = base.clamp_to(duration) else {
            debug!(
                "Overlay '{}' on clip {} has no active time after clamping, dropped",
                overlay.asset_path.display(),
                clip.pair.key
            );
            continue;
        };
        if range != base {
            debug!(
                "Overlay '{}' on clip {} clamped to {:.2}..{:.2}",
                overlay.asset_path.display(),
                clip.pair.key,
                range.start_sec,
                range.end_sec
            );
        }
        ops.push(TimedOp {
            op: PrimitiveOp::Composite {
                asset_path: overlay.asset_path.clone(),
                blend: overlay.blend,
                opacity: overlay.opacity,
                placement: overlay.placement,
                shortfall: overlay.shortfall,
            },
            range,
        });
    }
}

/// Edge transitions hug the clip boundaries; boundary fades come after them
/// so the final frames always respect the fade.
fn compile_color_transition(clip: &Clip, duration: TimeSec, ops: &mut Vec<TimedOp>) {
    if let Some(t) = clip.transition_in {
        let end = t.duration_sec.min(duration);
        ops.push(TimedOp {
            op: PrimitiveOp::TransitionIn { kind: t.kind },
            range: TimeRange::new(0.0, end),
        });
    }
    if let Some(t) = clip.transition_out {
        let start = (duration - t.duration_sec).max(0.0);
        ops.push(TimedOp {
            op: PrimitiveOp::TransitionOut { kind: t.kind },
            range: TimeRange::new(start, duration),
        });
    }
    if let Some(f) = clip.fade_in {
        let end = f.duration_sec.min(duration);
        ops.push(TimedOp {
            op: PrimitiveOp::FadeIn,
            range: TimeRange::new(0.0, end),
        });
    }
    if let Some(f) = clip.fade_out {
        let start = (duration - f.duration_sec).max(0.0);
        ops.push(TimedOp {
            op: PrimitiveOp::FadeOut,
            range: TimeRange::new(start, duration),
        });
    }
}

/// Audio ops exist only for audible clips: the user chain in authored order,
/// then normalize, then limit, unconditionally in that order.
fn compile_audio(clip: &Clip, duration: TimeSec, ops: &mut Vec<TimedOp>) {
    if clip.pair.is_silent() {
        return;
    }
    let full = TimeRange::new(0.0, duration);
    for effect in &clip.audio_effects {
        ops.push(TimedOp {
            op: PrimitiveOp::Voice {
                effect: effect.clone(),
            },
            range: full,
        });
    }
    ops.push(TimedOp {
        op: PrimitiveOp::Normalize,
        range: full,
    });
    ops.push(TimedOp {
        op: PrimitiveOp::Limit,
        range: full,
    });
}

// ============================================================================
// Tests
// ============================================================================
