//! Error Definitions
//!
//! Single crate-wide error enum plus the per-item skip report used by
//! best-effort operations (pair resolution, plan emission).

use serde::Serialize;
use thiserror::Error;

use super::{ChannelId, ClipId, PairKey, TimeSec};

/// Montage engine error types
#[derive(Error, Debug)]
pub enum MontageError {
    // =========================================================================
    // Pairing Errors
    // =========================================================================
    #[error("Pairing conflict for key {key}: kept '{kept}', dropped '{dropped}'")]
    PairingConflict {
        key: PairKey,
        kept: String,
        dropped: String,
    },

    #[error("Orphan audio for key {key}: '{path}' has no visual counterpart")]
    OrphanAudio { key: PairKey, path: String },

    #[error("Missing duration for '{path}': audio track was never probed")]
    MissingDuration { path: String },

    // =========================================================================
    // Effect Errors
    // =========================================================================
    #[error("Invalid effect parameter '{field}': {value} outside [{min}, {max}]")]
    InvalidEffectParameter {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error(
        "Timeline overflow in clip {clip_id}: effects span {span_sec:.3}s but clip lasts {duration_sec:.3}s"
    )]
    TimelineOverflow {
        clip_id: ClipId,
        span_sec: TimeSec,
        duration_sec: TimeSec,
    },

    // =========================================================================
    // External Engine Errors
    // =========================================================================
    #[error("External engine failed for channel {channel_id} at stage '{stage}': {message}")]
    ExternalEngine {
        channel_id: ChannelId,
        stage: String,
        message: String,
    },

    #[error("Probe failed: {0}")]
    Probe(String),

    #[error("Binary not found: {0}")]
    BinaryNotFound(String),

    // =========================================================================
    // General Errors
    // =========================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Montage engine result type
pub type MontageResult<T> = Result<T, MontageError>;

// =============================================================================
// Skip Reports
// =============================================================================

/// One item excluded from a best-effort operation, with the human-readable
/// reason. Collected alongside the successful output rather than aborting it.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedItem {
    /// What was skipped (a path, a pair key, a clip id)
    pub subject: String,
    /// Rendered error message
    pub reason: String,
}

impl SkippedItem {
    pub fn new(subject: impl Into<String>, error: &MontageError) -> Self {
        Self {
            subject: subject.into(),
            reason: error.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_names_field_and_bounds() {
        let err = MontageError::InvalidEffectParameter {
            field: "intensity",
            value: 1.5,
            min: 0.0,
            max: 1.0,
        };
        let msg = err.to_string();
        assert!(msg.contains("intensity"));
        assert!(msg.contains("1.5"));
        assert!(msg.contains("[0, 1]"));
    }

    #[test]
    fn test_skipped_item_carries_reason() {
        let err = MontageError::OrphanAudio {
            key: PairKey(3),
            path: "0003_voice.mp3".to_string(),
        };
        let item = SkippedItem::new("0003", &err);
        assert_eq!(item.subject, "0003");
        assert!(item.reason.contains("no visual counterpart"));
    }
}
