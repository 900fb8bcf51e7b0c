//! Core Type Definitions
//!
//! Fundamental types shared by every module: identifiers, time values,
//! frame geometry, and the numeric pair key used to match media files.

use serde::{Deserialize, Serialize};
use tracing::warn;

// =============================================================================
// ID Types
// =============================================================================

/// Clip unique identifier (ULID)
pub type ClipId = String;

/// Channel unique identifier (ULID)
pub type ChannelId = String;

/// Render plan unique identifier (ULID)
pub type PlanId = String;

/// Render job unique identifier (ULID)
pub type JobId = String;

// =============================================================================
// Time Types
// =============================================================================

/// Time in seconds (floating point)
pub type TimeSec = f64;

/// Ratio (for fps, aspect ratio, etc.)
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Ratio {
    /// Numerator
    pub num: i32,
    /// Denominator
    pub den: i32,
}

impl Ratio {
    /// Creates a new ratio with validation
    pub fn new(num: i32, den: i32) -> Self {
        if den == 0 {
            warn!("Ratio created with zero denominator, defaulting to 1");
            return Self { num, den: 1 };
        }
        Self { num, den }
    }

    /// Converts to floating point value
    pub fn as_f64(&self) -> f64 {
        if self.den == 0 {
            return 0.0;
        }
        self.num as f64 / self.den as f64
    }
}

impl Default for Ratio {
    fn default() -> Self {
        Self { num: 30, den: 1 } // Default 30fps
    }
}

impl std::fmt::Display for Ratio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.den == 1 {
            write!(f, "{}", self.num)
        } else {
            write!(f, "{}/{}", self.num, self.den)
        }
    }
}

// =============================================================================
// Time Range
// =============================================================================

/// Time range within a clip (seconds from clip start)
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeRange {
    pub start_sec: TimeSec,
    pub end_sec: TimeSec,
}

impl TimeRange {
    pub fn new(start_sec: TimeSec, end_sec: TimeSec) -> Self {
        if start_sec > end_sec {
            warn!(
                "TimeRange created with start > end ({} > {}), swapping",
                start_sec, end_sec
            );
            return Self {
                start_sec: end_sec,
                end_sec: start_sec,
            };
        }
        Self { start_sec, end_sec }
    }

    /// Returns duration in seconds
    pub fn duration(&self) -> TimeSec {
        self.end_sec - self.start_sec
    }

    /// Checks if a given time is within range
    pub fn contains(&self, time: TimeSec) -> bool {
        time >= self.start_sec && time <= self.end_sec
    }

    /// Checks if two ranges overlap
    pub fn overlaps(&self, other: &TimeRange) -> bool {
        self.start_sec < other.end_sec && self.end_sec > other.start_sec
    }

    /// Intersects this range with `[0, limit]`, returning `None` when nothing
    /// remains.
    pub fn clamp_to(&self, limit: TimeSec) -> Option<TimeRange> {
        let start = self.start_sec.max(0.0);
        let end = self.end_sec.min(limit);
        if start >= end {
            return None;
        }
        Some(TimeRange {
            start_sec: start,
            end_sec: end,
        })
    }

    /// True when the range lies entirely inside `[0, limit]`.
    pub fn fits_within(&self, limit: TimeSec) -> bool {
        self.start_sec >= 0.0 && self.end_sec <= limit
    }
}

// =============================================================================
// Spatial Types
// =============================================================================

/// Output frame size in pixels
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Width/height as a floating point aspect ratio
    pub fn aspect(&self) -> f64 {
        if self.height == 0 {
            return 0.0;
        }
        self.width as f64 / self.height as f64
    }

    /// FFmpeg `-s` style string, e.g. `1920x1080`
    pub fn to_dimension_arg(&self) -> String {
        format!("{}x{}", self.width, self.height)
    }
}

impl Default for Resolution {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
        }
    }
}

/// Normalized framing rectangle (all fields in `0.0..=1.0`, relative to the
/// source frame). Used as the start/end window of motion effects.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct NormRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl NormRect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// The whole frame
    pub fn full() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: 1.0,
            height: 1.0,
        }
    }

    /// Centered rectangle covering `scale` of each dimension
    pub fn centered(scale: f64) -> Self {
        let scale = scale.clamp(0.0, 1.0);
        let offset = (1.0 - scale) / 2.0;
        Self {
            x: offset,
            y: offset,
            width: scale,
            height: scale,
        }
    }

    /// True when every edge lies inside the unit square
    pub fn is_normalized(&self) -> bool {
        self.x >= 0.0
            && self.y >= 0.0
            && self.width > 0.0
            && self.height > 0.0
            && self.x + self.width <= 1.0 + 1e-9
            && self.y + self.height <= 1.0 + 1e-9
    }

    /// Zoom factor implied by this rect (1.0 = whole frame)
    pub fn zoom(&self) -> f64 {
        if self.width <= 0.0 {
            return 1.0;
        }
        1.0 / self.width
    }
}

impl Default for NormRect {
    fn default() -> Self {
        Self::full()
    }
}

// =============================================================================
// Pair Key
// =============================================================================

/// Four-digit numeric prefix that pairs a visual file with its audio file
/// (`0001_intro.jpg` + `0001_voiceover.mp3`).
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct PairKey(pub u16);

impl PairKey {
    /// Parses the leading four ASCII digits of a file name.
    pub fn from_file_name(name: &str) -> Option<Self> {
        let digits = name.get(0..4)?;
        if !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        digits.parse().ok().map(PairKey)
    }
}

impl std::fmt::Display for PairKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}", self.0)
    }
}

// ============================================================================
// Tests
// ============================================================================
