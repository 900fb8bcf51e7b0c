//! FFmpeg Invocation Layer
//!
//! The thin boundary between a finished plan and the external engine: builds
//! the per-clip FFmpeg command lines, renders each clip to a segment,
//! concatenates the segments, and supervises the processes. Every job owns a
//! cancellation handle; cancelling one job never touches another.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::Command;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::core::effects::ShortfallMode;
use crate::core::pipeline::{PrimitiveOp, Stage};
use crate::core::timeline::VisualPlayback;
use crate::core::{ChannelId, JobId, MontageError, MontageResult, PlanId};

use super::filters::{audio_filtergraph, codec_args, video_filter_stages, video_filtergraph};
use super::plan::{ClipPlan, RenderPlan};

// =============================================================================
// Command Construction
// =============================================================================

/// Builds the complete FFmpeg argv for one clip segment.
///
/// Input order is fixed: visual first, overlay assets next, audio last, so
/// stream indices in the filtergraph are predictable.
pub fn clip_command(plan: &RenderPlan, clip: &ClipPlan, segment_path: &Path) -> Vec<String> {
    let mut args: Vec<String> = vec![
        "-y".into(),
        "-hide_banner".into(),
        "-loglevel".into(),
        "error".into(),
        "-nostats".into(),
    ];

    // Visual input with its playback flags
    match clip.pipeline.playback {
        VisualPlayback::Still => {
            args.push("-loop".into());
            args.push("1".into());
        }
        VisualPlayback::Loop => {
            args.push("-stream_loop".into());
            args.push("-1".into());
        }
        VisualPlayback::Once | VisualPlayback::Trim => {}
    }
    args.push("-i".into());
    args.push(clip.visual_path.display().to_string());

    // Overlay inputs, in op order
    let overlays: Vec<_> = clip.pipeline.ops_in_stage(Stage::Overlay).collect();
    for timed in &overlays {
        if let PrimitiveOp::Composite {
            asset_path,
            shortfall,
            ..
        } = &timed.op
        {
            if *shortfall == ShortfallMode::Loop {
                args.push("-stream_loop".into());
                args.push("-1".into());
            }
            args.push("-i".into());
            args.push(asset_path.display().to_string());
        }
    }

    let audio_index = 1 + overlays.len();
    if let Some(audio) = &clip.audio_path {
        args.push("-i".into());
        args.push(audio.display().to_string());
    }

    // Slot length caps the output; a too-long source is trimmed from the start
    args.push("-t".into());
    args.push(format!("{:.3}", clip.pipeline.duration_sec));

    let af = audio_filtergraph(&clip.pipeline);

    if overlays.is_empty() {
        args.push("-vf".into());
        args.push(video_filtergraph(&clip.pipeline, &plan.output));
        if let Some(af) = af {
            args.push("-af".into());
            args.push(af);
        }
    } else {
        // Overlays need extra inputs, so the whole graph goes complex. The
        // boundary fades come after the blend chain: a fade always governs
        // the composited frame.
        let (body, tail) = video_filter_stages(&clip.pipeline, &plan.output);
        let mut graph = format!("[0:v]{body}[v0]");
        let width = plan.output.resolution.width;
        let height = plan.output.resolution.height;
        for (i, timed) in overlays.iter().enumerate() {
            if let PrimitiveOp::Composite {
                blend,
                opacity,
                shortfall,
                ..
            } = &timed.op
            {
                // A held asset clones its last frame to cover the window
                let pad = match shortfall {
                    ShortfallMode::HoldLast => ",tpad=stop_mode=clone:stop=-1",
                    ShortfallMode::Loop => "",
                };
                graph.push_str(&format!(
                    ";[{input}:v]scale={width}:{height},setsar=1{pad}[ov{i}];[v{i}][ov{i}]blend=all_mode={mode}:all_opacity={opacity:.2}:enable='between(t,{a:.3},{b:.3})'[v{next}]",
                    input = 1 + i,
                    mode = blend.ffmpeg_name(),
                    a = timed.range.start_sec,
                    b = timed.range.end_sec,
                    next = i + 1,
                ));
            }
        }
        graph.push_str(&format!(";[v{}]{tail}[vout]", overlays.len()));
        if let Some(af) = af {
            graph.push_str(&format!(";[{audio_index}:a]{af}[aout]"));
            args.push("-filter_complex".into());
            args.push(graph);
            args.push("-map".into());
            args.push("[vout]".into());
            args.push("-map".into());
            args.push("[aout]".into());
        } else {
            args.push("-filter_complex".into());
            args.push(graph);
            args.push("-map".into());
            args.push("[vout]".into());
        }
    }

    args.push("-r".into());
    args.push(format!("{}", plan.output.fps.as_f64()));
    args.extend(codec_args(&plan.output, &plan.encoder));
    args.push("-movflags".into());
    args.push("+faststart".into());
    args.push(segment_path.display().to_string());
    args
}

// =============================================================================
// Cancellation
// =============================================================================

/// Cancels one render job. Cloneable; firing it is idempotent.
#[derive(Clone, Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }
}

/// Receiver side observed by the running job
pub type CancelToken = watch::Receiver<bool>;

/// Creates a connected cancel handle/token pair.
pub fn cancellation() -> (CancelHandle, CancelToken) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle { tx }, rx)
}

/// Terminal outcome of a render job
#[derive(Debug, PartialEq, Eq)]
pub enum RenderStatus {
    Completed(PathBuf),
    Cancelled,
}

// =============================================================================
// Plan Execution
// =============================================================================

/// Renders a plan to `output_path`: one FFmpeg pass per clip into `workdir`,
/// then a stream-copy concat. Checks the cancel token between steps and
/// kills the active process when it fires.
pub async fn run_plan(
    ffmpeg: &Path,
    plan: &RenderPlan,
    workdir: &Path,
    output_path: &Path,
    mut cancel: CancelToken,
) -> MontageResult<RenderStatus> {
    if plan.is_empty() {
        return Err(MontageError::ExternalEngine {
            channel_id: plan.channel_id.clone(),
            stage: "plan".to_string(),
            message: "plan contains no clips".to_string(),
        });
    }

    tokio::fs::create_dir_all(workdir).await?;

    let mut segments = Vec::with_capacity(plan.clips.len());
    for (i, clip) in plan.clips.iter().enumerate() {
        if *cancel.borrow() {
            info!("Render of plan {} cancelled before clip {}", plan.id, i);
            return Ok(RenderStatus::Cancelled);
        }
        let segment = workdir.join(format!("clip_{i:04}.mp4"));
        let args = clip_command(plan, clip, &segment);
        debug!("Rendering clip {} of plan {}", clip.pair_key, plan.id);
        let stage = format!("clip {}", clip.pair_key);
        if !run_ffmpeg(ffmpeg, &args, &plan.channel_id, &stage, &mut cancel).await? {
            return Ok(RenderStatus::Cancelled);
        }
        segments.push(segment);
    }

    if *cancel.borrow() {
        return Ok(RenderStatus::Cancelled);
    }

    // Segments share codec parameters, so the join is a stream copy
    let list_path = workdir.join("segments.txt");
    let mut list = String::new();
    for segment in &segments {
        list.push_str(&format!(
            "file '{}'\n",
            segment.display().to_string().replace('\'', "'\\''")
        ));
    }
    tokio::fs::write(&list_path, list).await?;

    let concat_args: Vec<String> = vec![
        "-y".into(),
        "-hide_banner".into(),
        "-loglevel".into(),
        "error".into(),
        "-nostats".into(),
        "-f".into(),
        "concat".into(),
        "-safe".into(),
        "0".into(),
        "-i".into(),
        list_path.display().to_string(),
        "-c".into(),
        "copy".into(),
        output_path.display().to_string(),
    ];
    if !run_ffmpeg(ffmpeg, &concat_args, &plan.channel_id, "concat", &mut cancel).await? {
        return Ok(RenderStatus::Cancelled);
    }

    info!("Plan {} rendered to {}", plan.id, output_path.display());
    Ok(RenderStatus::Completed(output_path.to_path_buf()))
}

/// Runs one FFmpeg invocation under the cancel token. Returns `false` when
/// the token fired and the process was killed.
async fn run_ffmpeg(
    ffmpeg: &Path,
    args: &[String],
    channel_id: &ChannelId,
    stage: &str,
    cancel: &mut CancelToken,
) -> MontageResult<bool> {
    let child = Command::new(ffmpeg)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()?;

    tokio::select! {
        // wait_with_output drains stderr while waiting, so a chatty process
        // never fills the pipe and stalls
        output = child.wait_with_output() => {
            let output = output?;
            if output.status.success() {
                return Ok(true);
            }
            let message = String::from_utf8_lossy(&output.stderr).trim().to_string();
            warn!("FFmpeg failed at stage '{}': {}", stage, message);
            Err(MontageError::ExternalEngine {
                channel_id: channel_id.clone(),
                stage: stage.to_string(),
                message: if message.is_empty() {
                    format!("exited with {}", output.status)
                } else {
                    message
                },
            })
        }
        _ = cancel.changed() => {
            // Dropping the wait future drops the child, and kill_on_drop
            // takes the process down with it
            info!("FFmpeg killed at stage '{}' after cancellation", stage);
            Ok(false)
        }
    }
}

// =============================================================================
// Render Job
// =============================================================================

/// A supervised render of one plan. Jobs are independent: each carries its
/// own cancel handle and task.
pub struct RenderJob {
    pub id: JobId,
    pub plan_id: PlanId,
    pub channel_id: ChannelId,
    handle: CancelHandle,
    task: tokio::task::JoinHandle<MontageResult<RenderStatus>>,
}

impl RenderJob {
    /// Spawns the render on the current runtime.
    pub fn spawn(
        ffmpeg: PathBuf,
        plan: RenderPlan,
        workdir: PathBuf,
        output_path: PathBuf,
    ) -> Self {
        let id = ulid::Ulid::new().to_string();
        let plan_id = plan.id.clone();
        let channel_id = plan.channel_id.clone();
        let (handle, token) = cancellation();
        let task = tokio::spawn(async move {
            run_plan(&ffmpeg, &plan, &workdir, &output_path, token).await
        });
        info!("Spawned render job {} for plan {}", id, plan_id);
        Self {
            id,
            plan_id,
            channel_id,
            handle,
            task,
        }
    }

    /// Requests cancellation; the job settles to `Cancelled` shortly after.
    pub fn cancel(&self) {
        self.handle.cancel();
    }

    /// Waits for the job to finish.
    pub async fn wait(self) -> MontageResult<RenderStatus> {
        self.task
            .await
            .map_err(|e| MontageError::Internal(format!("render task panicked: {e}")))?
    }
}

// ============================================================================
// Tests
// ============================================================================
