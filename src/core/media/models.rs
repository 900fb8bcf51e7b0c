//! Media Model Definitions
//!
//! File classification tables and the resolved visual/audio pair.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::{PairKey, TimeSec};

// =============================================================================
// Extension Tables
// =============================================================================

/// Still image extensions (lowercase, no dot)
pub const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "bmp", "webp", "tiff", "tif", "gif",
];

/// Video extensions
pub const VIDEO_EXTENSIONS: &[&str] = &[
    "mp4", "mov", "avi", "mkv", "webm", "m4v", "wmv", "flv", "mts", "m2ts",
];

/// Audio extensions
pub const AUDIO_EXTENSIONS: &[&str] = &[
    "mp3", "wav", "aac", "m4a", "ogg", "flac", "wma", "opus",
];

// =============================================================================
// Classification
// =============================================================================

/// Broad media class derived from the file extension
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
    Audio,
}

impl MediaKind {
    /// Classifies a path by extension; `None` for unrecognized files.
    pub fn classify(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            Some(MediaKind::Image)
        } else if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
            Some(MediaKind::Video)
        } else if AUDIO_EXTENSIONS.contains(&ext.as_str()) {
            Some(MediaKind::Audio)
        } else {
            None
        }
    }
}

/// Visual source class. Stills get a synthetic duration; videos carry their
/// own native length.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VisualKind {
    Still,
    Video,
}

// =============================================================================
// Media Pair
// =============================================================================

/// A visual file matched with its optional audio track by shared pair key.
/// Immutable after resolution; probe results are attached with the `with_*`
/// builders before timeline construction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaPair {
    pub key: PairKey,
    pub visual_path: PathBuf,
    pub visual_kind: VisualKind,
    /// Paired audio track, if any. A pair without audio renders silent.
    pub audio_path: Option<PathBuf>,
    /// Probed audio duration in seconds
    pub audio_duration_sec: Option<TimeSec>,
    /// Probed native video duration (None for stills)
    pub visual_duration_sec: Option<TimeSec>,
}

impl MediaPair {
    pub fn new(key: PairKey, visual_path: PathBuf, visual_kind: VisualKind) -> Self {
        Self {
            key,
            visual_path,
            visual_kind,
            audio_path: None,
            audio_duration_sec: None,
            visual_duration_sec: None,
        }
    }

    pub fn with_audio(mut self, path: PathBuf) -> Self {
        self.audio_path = Some(path);
        self
    }

    pub fn with_audio_duration(mut self, duration_sec: TimeSec) -> Self {
        self.audio_duration_sec = Some(duration_sec);
        self
    }

    pub fn with_visual_duration(mut self, duration_sec: TimeSec) -> Self {
        self.visual_duration_sec = Some(duration_sec);
        self
    }

    /// True when no audio track was paired
    pub fn is_silent(&self) -> bool {
        self.audio_path.is_none()
    }
}
