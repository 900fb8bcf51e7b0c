//! External Tool Probing
//!
//! Everything that talks to the host system before a plan exists: locating
//! the FFmpeg/FFprobe binaries, asking FFmpeg which encoders it was built
//! with, and measuring media durations. Probes run synchronously; plan
//! construction itself never spawns a process.

use std::path::{Path, PathBuf};
use std::process::Command;

use regex::Regex;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::core::encoder::{CodecFamily, EncoderAvailability, FallbackChain};
use crate::core::media::MediaPair;
use crate::core::{MontageError, MontageResult, SkippedItem, TimeSec};

// =============================================================================
// Binary Discovery
// =============================================================================

/// Locates the FFmpeg binary on PATH or in common install locations.
pub fn find_ffmpeg() -> MontageResult<PathBuf> {
    find_binary("ffmpeg")
}

/// Locates the FFprobe binary on PATH or in common install locations.
pub fn find_ffprobe() -> MontageResult<PathBuf> {
    find_binary("ffprobe")
}

fn find_binary(name: &str) -> MontageResult<PathBuf> {
    let exe = if cfg!(windows) {
        format!("{name}.exe")
    } else {
        name.to_string()
    };

    let finder = if cfg!(windows) { "where" } else { "which" };
    if let Ok(output) = Command::new(finder).arg(&exe).output() {
        if output.status.success() {
            let stdout = String::from_utf8_lossy(&output.stdout);
            if let Some(line) = stdout.lines().next() {
                let trimmed = line.trim();
                if !trimmed.is_empty() {
                    debug!("Found {} at {}", name, trimmed);
                    return Ok(PathBuf::from(trimmed));
                }
            }
        }
    }

    const COMMON_DIRS: &[&str] = &[
        "/usr/bin",
        "/usr/local/bin",
        "/opt/homebrew/bin",
        "C:\\ffmpeg\\bin",
    ];
    for dir in COMMON_DIRS {
        let candidate = Path::new(dir).join(&exe);
        if candidate.exists() {
            debug!("Found {} at {}", name, candidate.display());
            return Ok(candidate);
        }
    }

    Err(MontageError::BinaryNotFound(name.to_string()))
}

// =============================================================================
// Encoder Availability
// =============================================================================

/// Asks FFmpeg which hardware encoders it was built with.
///
/// The returned set feeds `select_encoder`; an empty set is a valid answer
/// (selection then falls through to software).
pub fn probe_available_encoders(ffmpeg: &Path) -> MontageResult<Vec<EncoderAvailability>> {
    let output = Command::new(ffmpeg)
        .args(["-hide_banner", "-encoders"])
        .output()?;
    if !output.status.success() {
        return Err(MontageError::Probe(format!(
            "ffmpeg -encoders exited with {}",
            output.status
        )));
    }
    Ok(parse_encoders_output(&String::from_utf8_lossy(
        &output.stdout,
    )))
}

fn parse_encoders_output(text: &str) -> Vec<EncoderAvailability> {
    let mut found = Vec::new();
    for family in [CodecFamily::H264, CodecFamily::Hevc] {
        for profile in FallbackChain::for_family(family).profiles() {
            if profile.is_software() {
                continue;
            }
            let name = profile.encoder_name();
            // Encoder listing rows look like ` V....D h264_nvenc  NVIDIA ...`
            let present = text
                .lines()
                .any(|line| line.split_whitespace().nth(1) == Some(name));
            if present {
                found.push(EncoderAvailability {
                    family,
                    vendor: profile.vendor,
                });
            }
        }
    }
    found
}

// =============================================================================
// Duration Probing
// =============================================================================

#[derive(Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

#[derive(Deserialize)]
struct ProbeOutput {
    format: Option<ProbeFormat>,
}

/// Measures a media file's duration in seconds.
///
/// Primary path is FFprobe's JSON output; when the container reports no
/// format duration the human-readable `Duration:` banner is parsed as a
/// fallback.
pub fn probe_duration(ffprobe: &Path, media: &Path) -> MontageResult<TimeSec> {
    let output = Command::new(ffprobe)
        .args(["-v", "error", "-print_format", "json", "-show_format"])
        .arg(media)
        .output()?;
    if output.status.success() {
        if let Some(duration) = parse_duration_json(&String::from_utf8_lossy(&output.stdout))? {
            return Ok(duration);
        }
    }

    // Fallback: the banner FFprobe prints without -v error
    let output = Command::new(ffprobe).arg(media).output()?;
    let stderr = String::from_utf8_lossy(&output.stderr);
    if let Some(duration) = parse_duration_banner(&stderr)? {
        return Ok(duration);
    }

    Err(MontageError::Probe(format!(
        "no duration reported for '{}'",
        media.display()
    )))
}

fn parse_duration_json(text: &str) -> MontageResult<Option<TimeSec>> {
    let parsed: ProbeOutput = serde_json::from_str(text)?;
    let duration = parsed
        .format
        .and_then(|f| f.duration)
        .and_then(|d| d.parse::<f64>().ok())
        .filter(|d| *d > 0.0);
    Ok(duration)
}

fn parse_duration_banner(text: &str) -> MontageResult<Option<TimeSec>> {
    let re = Regex::new(r"Duration:\s*(\d+):(\d{2}):(\d{2}(?:\.\d+)?)")
        .map_err(|e| MontageError::Internal(e.to_string()))?;
    let Some(caps) = re.captures(text) else {
        return Ok(None);
    };
    let hours: f64 = caps[1].parse().unwrap_or(0.0);
    let minutes: f64 = caps[2].parse().unwrap_or(0.0);
    let seconds: f64 = caps[3].parse().unwrap_or(0.0);
    Ok(Some(hours * 3600.0 + minutes * 60.0 + seconds))
}

/// Probes durations for every pair: audio length (mandatory where audio
/// exists) and native video length (best effort). Pairs whose audio cannot
/// be measured are dropped and reported.
pub fn attach_durations(
    ffprobe: &Path,
    pairs: Vec<MediaPair>,
) -> (Vec<MediaPair>, Vec<SkippedItem>) {
    let mut out = Vec::with_capacity(pairs.len());
    let mut skipped = Vec::new();

    for mut pair in pairs {
        if let Some(audio_path) = pair.audio_path.clone() {
            if pair.audio_duration_sec.is_none() {
                match probe_duration(ffprobe, &audio_path) {
                    Ok(d) => pair = pair.with_audio_duration(d),
                    Err(err) => {
                        warn!("Dropping pair {}: {}", pair.key, err);
                        skipped.push(SkippedItem::new(pair.key.to_string(), &err));
                        continue;
                    }
                }
            }
        }
        if pair.visual_kind == crate::core::media::VisualKind::Video
            && pair.visual_duration_sec.is_none()
        {
            let visual_path = pair.visual_path.clone();
            match probe_duration(ffprobe, &visual_path) {
                Ok(d) => pair = pair.with_visual_duration(d),
                Err(err) => {
                    // A video without a known native length still plays once
                    warn!("Could not probe '{}': {}", pair.visual_path.display(), err);
                }
            }
        }
        out.push(pair);
    }

    (out, skipped)
}

// ============================================================================
// Tests
// ============================================================================
