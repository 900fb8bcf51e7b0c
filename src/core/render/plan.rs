//! Render Plan
//!
//! The immutable hand-off to the external engine: every clip fully compiled,
//! every parameter resolved, the encoder chosen. Emission is best-effort —
//! clips that fail to compile are reported in the plan instead of aborting
//! it.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::core::encoder::{
    select_encoder, EncoderAvailability, EncoderProfile, QualityTier,
};
use crate::core::pipeline::{compile_clips, ClipPipeline};
use crate::core::timeline::Channel;
use crate::core::{ChannelId, PairKey, PlanId, Ratio, Resolution, SkippedItem, TimeSec};

/// Global output parameters shared by every clip in a plan
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputParams {
    pub resolution: Resolution,
    pub fps: Ratio,
    /// `None` selects CRF mode from the quality tier
    pub video_bitrate_kbps: Option<u32>,
    pub audio_bitrate_kbps: u32,
    pub quality: QualityTier,
    pub pixel_format: String,
    pub container: String,
}

/// One clip of the plan: its compiled pipeline plus the source paths the
/// invocation layer feeds to FFmpeg.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClipPlan {
    pub pair_key: PairKey,
    pub visual_path: PathBuf,
    pub audio_path: Option<PathBuf>,
    pub pipeline: ClipPipeline,
}

/// An immutable render plan. Once emitted it is never modified; a changed
/// channel produces a new plan.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderPlan {
    pub id: PlanId,
    pub channel_id: ChannelId,
    pub channel_name: String,
    pub created_at: String,
    pub clips: Vec<ClipPlan>,
    pub encoder: EncoderProfile,
    pub output: OutputParams,
    /// Everything excluded on the way here, resolver and builder skips
    /// included when the caller carries them forward
    pub skipped: Vec<SkippedItem>,
}

impl RenderPlan {
    /// Sum of planned clip durations
    pub fn total_duration(&self) -> TimeSec {
        self.clips.iter().map(|c| c.pipeline.duration_sec).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }
}

/// Emits a render plan for a channel.
///
/// Compiles every clip, selects the encoder from the availability set, and
/// snapshots the channel's output parameters. `prior_skips` lets the caller
/// carry resolver/builder reports into the plan so one report covers the
/// whole run.
pub fn emit_plan(
    channel: &Channel,
    available: &[EncoderAvailability],
    prior_skips: Vec<SkippedItem>,
) -> RenderPlan {
    let (pipelines, compile_skips) = compile_clips(&channel.clips);

    let mut clips = Vec::with_capacity(pipelines.len());
    for pipeline in pipelines {
        // Every pipeline originates from one of the channel's clips
        let Some(clip) = channel.clips.iter().find(|c| c.id == pipeline.clip_id) else {
            continue;
        };
        clips.push(ClipPlan {
            pair_key: clip.pair.key,
            visual_path: clip.pair.visual_path.clone(),
            audio_path: clip.pair.audio_path.clone(),
            pipeline,
        });
    }

    let mut skipped = prior_skips;
    skipped.extend(compile_skips);

    let encoder = select_encoder(channel.settings.codec_family, available);
    let plan = RenderPlan {
        id: ulid::Ulid::new().to_string(),
        channel_id: channel.id.clone(),
        channel_name: channel.name.clone(),
        created_at: chrono::Utc::now().to_rfc3339(),
        clips,
        encoder,
        output: OutputParams {
            resolution: channel.settings.resolution,
            fps: channel.settings.fps,
            video_bitrate_kbps: channel.settings.video_bitrate_kbps,
            audio_bitrate_kbps: channel.settings.audio_bitrate_kbps,
            quality: channel.settings.quality,
            pixel_format: "yuv420p".to_string(),
            container: "mp4".to_string(),
        },
        skipped,
    };
    info!(
        "Emitted plan {} for channel '{}': {} clips, {} skipped, encoder {}",
        plan.id,
        plan.channel_name,
        plan.clips.len(),
        plan.skipped.len(),
        plan.encoder.encoder_name()
    );
    plan
}

// ============================================================================
// Tests
// ============================================================================
