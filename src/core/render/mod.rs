//! Render Module
//!
//! Plan emission and the FFmpeg invocation layer: immutable render plans,
//! filter rendering, command construction, and supervised render jobs with
//! per-job cancellation.

mod filters;
mod invoke;
mod plan;

pub use filters::{audio_filtergraph, codec_args, video_filtergraph};
pub use invoke::{
    cancellation, clip_command, run_plan, CancelHandle, CancelToken, RenderJob, RenderStatus,
};
pub use plan::{emit_plan, ClipPlan, OutputParams, RenderPlan};
