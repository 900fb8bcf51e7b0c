//! FFmpeg Filter Rendering
//!
//! Translates compiled primitive operations into FFmpeg filter strings. This
//! is the only place in the crate where filter syntax exists; the pipeline
//! model itself never carries free-form filter text.
//!
//! Edge transitions are realized as complementary fades at the clip
//! boundaries, since clips render as independent segments and are joined by
//! stream concat afterwards.

use crate::core::effects::{AudioEffect, Easing, StylizedKind};
use crate::core::pipeline::{ClipPipeline, PrimitiveOp, Stage, TimedOp};
use crate::core::{NormRect, TimeRange};

use super::plan::OutputParams;

/// Builds the full `-vf` chain for one clip: normalize the source to the
/// output geometry, then the stage-ordered visual ops, then pixel format.
pub fn video_filtergraph(pipeline: &ClipPipeline, output: &OutputParams) -> String {
    let (body, tail) = video_filter_stages(pipeline, output);
    format!("{body},{tail}")
}

/// The visual chain split at the compositing seam: everything that runs
/// before overlays (geometry and stylize), and the boundary fades plus
/// output conversion that must run after them so a fade always governs the
/// final frame.
pub fn video_filter_stages(pipeline: &ClipPipeline, output: &OutputParams) -> (String, String) {
    let width = output.resolution.width;
    let height = output.resolution.height;
    let fps = output.fps.as_f64();

    let mut body = vec![
        // Cover the output frame, then center-crop the overshoot
        format!("scale={width}:{height}:force_original_aspect_ratio=increase"),
        format!("crop={width}:{height}"),
        "setsar=1".to_string(),
    ];

    for timed in pipeline.ops_in_stage(Stage::Geometry) {
        if let PrimitiveOp::Frame {
            start_rect,
            end_rect,
            easing,
            ..
        } = &timed.op
        {
            body.push(motion_filter(
                start_rect, end_rect, *easing, &timed.range, width, height, fps,
            ));
        }
    }

    for timed in pipeline.ops_in_stage(Stage::Stylize) {
        if let PrimitiveOp::Stylize { kind, intensity } = &timed.op {
            body.push(stylize_filter(*kind, *intensity, &timed.range));
        }
    }

    let mut tail = Vec::new();
    for timed in pipeline.ops_in_stage(Stage::ColorTransition) {
        tail.push(boundary_filter(timed));
    }
    tail.push(format!("fps={fps}"));
    tail.push(format!("format={}", output.pixel_format));

    (body.join(","), tail.join(","))
}

/// Builds the `-af` chain for one clip, or `None` for silent clips.
pub fn audio_filtergraph(pipeline: &ClipPipeline) -> Option<String> {
    let filters: Vec<String> = pipeline
        .ops_in_stage(Stage::Audio)
        .map(|timed| match &timed.op {
            PrimitiveOp::Voice { effect } => audio_filter(effect),
            PrimitiveOp::Normalize => "loudnorm=I=-16:TP=-1.5:LRA=11".to_string(),
            PrimitiveOp::Limit => "alimiter=limit=0.95".to_string(),
            _ => String::new(),
        })
        .filter(|f| !f.is_empty())
        .collect();
    if filters.is_empty() {
        None
    } else {
        Some(filters.join(","))
    }
}

/// Ken Burns style framing as a `zoompan` over the op's active range.
fn motion_filter(
    start: &NormRect,
    end: &NormRect,
    easing: Easing,
    range: &TimeRange,
    width: u32,
    height: u32,
    fps: f64,
) -> String {
    let frames = (range.duration() * fps).ceil().max(1.0) as u64;
    let progress = format!("on/{frames}");
    let eased = easing.expression(&progress);

    let z0 = start.zoom();
    let z1 = end.zoom();
    let zoom = format!("{z0:.4}+({z1:.4}-{z0:.4})*{eased}");
    // Pan follows the rect origin, scaled to source pixels
    let x = format!(
        "iw*({x0:.4}+({x1:.4}-{x0:.4})*{eased})",
        x0 = start.x,
        x1 = end.x
    );
    let y = format!(
        "ih*({y0:.4}+({y1:.4}-{y0:.4})*{eased})",
        y0 = start.y,
        y1 = end.y
    );

    format!(
        "zoompan=z='{zoom}':x='{x}':y='{y}':d={frames}:s={width}x{height}:fps={fps}"
    )
}

/// Stylized bursts as timeline-enabled color/noise treatments.
fn stylize_filter(kind: StylizedKind, intensity: f64, range: &TimeRange) -> String {
    let enable = format!(
        "enable='between(t,{:.3},{:.3})'",
        range.start_sec, range.end_sec
    );
    match kind {
        StylizedKind::ZoomBurst => {
            format!("eq=contrast={:.3}:{enable}", 1.0 + 0.3 * intensity)
        }
        StylizedKind::Pulse => {
            format!("eq=saturation={:.3}:{enable}", 1.0 + 0.5 * intensity)
        }
        StylizedKind::Shake => {
            format!("noise=alls={}:allf=t:{enable}", (intensity * 20.0) as u32)
        }
        StylizedKind::Glitch => {
            format!("hue=h={:.1}:{enable}", 90.0 * intensity)
        }
    }
}

/// Boundary ops (transitions and fades) as `fade` filters.
fn boundary_filter(timed: &TimedOp) -> String {
    let start = timed.range.start_sec;
    let duration = timed.range.duration();
    match &timed.op {
        PrimitiveOp::TransitionIn { .. } | PrimitiveOp::FadeIn => {
            format!("fade=t=in:st={start:.3}:d={duration:.3}")
        }
        _ => format!("fade=t=out:st={start:.3}:d={duration:.3}"),
    }
}

/// One audio effect as its FFmpeg filter recipe.
fn audio_filter(effect: &AudioEffect) -> String {
    match effect {
        AudioEffect::PitchShift { semitones } => {
            let factor = 2f64.powf(semitones / 12.0);
            format!(
                "asetrate=48000*{factor:.6},aresample=48000,atempo={:.6}",
                1.0 / factor
            )
        }
        AudioEffect::BassBoost { gain_db } => format!("bass=g={gain_db:.1}:f=110"),
        AudioEffect::Reverb => "aecho=0.8:0.9:40|50|70:0.4|0.3|0.2".to_string(),
        AudioEffect::Echo => "aecho=0.8:0.9:500|1000:0.3|0.2".to_string(),
        AudioEffect::Chorus => {
            "chorus=0.5:0.9:50|60|40:0.4|0.32|0.3:0.25|0.4|0.3:2|2.3|1.3".to_string()
        }
        AudioEffect::Telephone => "highpass=f=300,lowpass=f=3400".to_string(),
        AudioEffect::Underwater => "lowpass=f=500,aecho=0.8:0.9:1000:0.3".to_string(),
        AudioEffect::Radio => {
            "highpass=f=200,lowpass=f=4000,acompressor=threshold=0.1:ratio=4".to_string()
        }
        AudioEffect::Vintage => "highpass=f=100,lowpass=f=8000,aecho=0.8:0.88:60:0.4".to_string(),
    }
}

/// Encoder and muxing arguments shared by every clip of a plan.
pub fn codec_args(output: &OutputParams, encoder: &crate::core::encoder::EncoderProfile) -> Vec<String> {
    let mut args = vec!["-c:v".to_string(), encoder.encoder_name().to_string()];

    let preset = match encoder.vendor {
        crate::core::encoder::HwVendor::Nvidia => output.quality.nvenc_preset(),
        _ => output.quality.software_preset(),
    };
    args.push("-preset".to_string());
    args.push(preset.to_string());

    if let Some(bitrate) = output.video_bitrate_kbps {
        args.push("-b:v".to_string());
        args.push(format!("{bitrate}k"));
    } else {
        let flag = match encoder.vendor {
            crate::core::encoder::HwVendor::Nvidia => "-cq",
            _ => "-crf",
        };
        args.push(flag.to_string());
        args.push(output.quality.crf().to_string());
    }

    args.push("-c:a".to_string());
    args.push("aac".to_string());
    args.push("-b:a".to_string());
    args.push(format!("{}k", output.audio_bitrate_kbps));

    args
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::encoder::{CodecFamily, EncoderProfile, HwVendor, QualityTier};
    use crate::core::timeline::VisualPlayback;
    use crate::core::{Ratio, Resolution};

    fn output() -> OutputParams {
        OutputParams {
            resolution: Resolution::new(1920, 1080),
            fps: Ratio::new(30, 1),
            video_bitrate_kbps: None,
            audio_bitrate_kbps: 192,
            quality: QualityTier::Standard,
            pixel_format: "yuv420p".to_string(),
            container: "mp4".to_string(),
        }
    }

    fn pipeline_with(ops: Vec<TimedOp>) -> ClipPipeline {
        ClipPipeline {
            clip_id: "clip".to_string(),
            duration_sec: 5.0,
            playback: VisualPlayback::Still,
            ops,
        }
    }

    #[test]
    fn test_video_filtergraph_base_chain() {
        let graph = video_filtergraph(&pipeline_with(Vec::new()), &output());
        assert!(graph.starts_with("scale=1920:1080:force_original_aspect_ratio=increase"));
        assert!(graph.contains("crop=1920:1080"));
        assert!(graph.ends_with("format=yuv420p"));
    }

    #[test]
    fn test_motion_renders_zoompan() {
        let op = TimedOp {
            op: PrimitiveOp::Frame {
                kind: crate::core::effects::MotionKind::ZoomIn,
                start_rect: NormRect::full(),
                end_rect: NormRect::centered(0.8),
                easing: Easing::Linear,
            },
            range: TimeRange::new(0.0, 5.0),
        };
        let graph = video_filtergraph(&pipeline_with(vec![op]), &output());
        assert!(graph.contains("zoompan=z='1.0000+(1.2500-1.0000)*on/150'"));
        assert!(graph.contains("d=150"));
        assert!(graph.contains("s=1920x1080"));
    }

    #[test]
    fn test_stylize_is_time_windowed() {
        let op = TimedOp {
            op: PrimitiveOp::Stylize {
                kind: StylizedKind::Pulse,
                intensity: 0.4,
            },
            range: TimeRange::new(1.0, 2.0),
        };
        let graph = video_filtergraph(&pipeline_with(vec![op]), &output());
        assert!(graph.contains("eq=saturation=1.200"));
        assert!(graph.contains("enable='between(t,1.000,2.000)'"));
    }

    #[test]
    fn test_filter_stages_keep_fades_in_the_tail() {
        let ops = vec![
            TimedOp {
                op: PrimitiveOp::Stylize {
                    kind: StylizedKind::Pulse,
                    intensity: 0.4,
                },
                range: TimeRange::new(0.0, 1.0),
            },
            TimedOp {
                op: PrimitiveOp::FadeIn,
                range: TimeRange::new(0.0, 1.0),
            },
        ];
        let (body, tail) = video_filter_stages(&pipeline_with(ops), &output());
        assert!(body.contains("eq=saturation"));
        assert!(!body.contains("fade="));
        assert!(tail.starts_with("fade=t=in"));
        assert!(tail.ends_with("format=yuv420p"));
    }

    #[test]
    fn test_boundary_fades() {
        let ops = vec![
            TimedOp {
                op: PrimitiveOp::TransitionIn {
                    kind: crate::core::effects::TransitionKind::Dissolve,
                },
                range: TimeRange::new(0.0, 1.0),
            },
            TimedOp {
                op: PrimitiveOp::FadeOut,
                range: TimeRange::new(3.5, 5.0),
            },
        ];
        let graph = video_filtergraph(&pipeline_with(ops), &output());
        assert!(graph.contains("fade=t=in:st=0.000:d=1.000"));
        assert!(graph.contains("fade=t=out:st=3.500:d=1.500"));
    }

    #[test]
    fn test_audio_filtergraph_order() {
        let full = TimeRange::new(0.0, 5.0);
        let ops = vec![
            TimedOp {
                op: PrimitiveOp::Voice {
                    effect: AudioEffect::Telephone,
                },
                range: full,
            },
            TimedOp {
                op: PrimitiveOp::Normalize,
                range: full,
            },
            TimedOp {
                op: PrimitiveOp::Limit,
                range: full,
            },
        ];
        let graph = audio_filtergraph(&pipeline_with(ops)).unwrap();
        let loudnorm_pos = graph.find("loudnorm").unwrap();
        let limiter_pos = graph.find("alimiter").unwrap();
        let telephone_pos = graph.find("highpass").unwrap();
        assert!(telephone_pos < loudnorm_pos);
        assert!(loudnorm_pos < limiter_pos);
    }

    #[test]
    fn test_silent_pipeline_has_no_audio_graph() {
        assert!(audio_filtergraph(&pipeline_with(Vec::new())).is_none());
    }

    #[test]
    fn test_pitch_shift_recipe() {
        let filter = audio_filter(&AudioEffect::PitchShift { semitones: 12.0 });
        assert!(filter.contains("asetrate=48000*2.000000"));
        assert!(filter.contains("atempo=0.500000"));
    }

    #[test]
    fn test_codec_args_software_crf() {
        let encoder = EncoderProfile {
            family: CodecFamily::H264,
            vendor: HwVendor::None,
            rank: 3,
        };
        let args = codec_args(&output(), &encoder);
        assert!(args.contains(&"libx264".to_string()));
        assert!(args.contains(&"-crf".to_string()));
        assert!(args.contains(&"23".to_string()));
        assert!(args.contains(&"medium".to_string()));
    }

    #[test]
    fn test_codec_args_nvenc_uses_cq_and_p_presets() {
        let encoder = EncoderProfile {
            family: CodecFamily::H264,
            vendor: HwVendor::Nvidia,
            rank: 0,
        };
        let args = codec_args(&output(), &encoder);
        assert!(args.contains(&"h264_nvenc".to_string()));
        assert!(args.contains(&"-cq".to_string()));
        assert!(args.contains(&"p4".to_string()));
    }

    #[test]
    fn test_codec_args_bitrate_mode() {
        let mut out = output();
        out.video_bitrate_kbps = Some(8000);
        let encoder = EncoderProfile {
            family: CodecFamily::H264,
            vendor: HwVendor::None,
            rank: 3,
        };
        let args = codec_args(&out, &encoder);
        assert!(args.contains(&"-b:v".to_string()));
        assert!(args.contains(&"8000k".to_string()));
        assert!(!args.contains(&"-crf".to_string()));
    }
}
