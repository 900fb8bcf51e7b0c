//! Media Pair Resolver
//!
//! Groups discovered files by their four-digit key, matching each visual with
//! at most one audio track. Resolution is order-independent: duplicate keys
//! are settled by a deterministic tie-break and every discarded file is
//! reported rather than silently dropped.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::core::{MontageError, MontageResult, PairKey, SkippedItem};

use super::models::{MediaKind, MediaPair, VisualKind};

/// Output of pair resolution: pairs sorted by ascending key plus the report
/// of everything that did not make it in.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveReport {
    pub pairs: Vec<MediaPair>,
    pub skipped: Vec<SkippedItem>,
}

impl ResolveReport {
    /// Pairs that carry an audio track
    pub fn paired_count(&self) -> usize {
        self.pairs.iter().filter(|p| !p.is_silent()).count()
    }
}

#[derive(Default)]
struct KeySlot {
    visual: Option<(PathBuf, VisualKind)>,
    audio: Option<PathBuf>,
}

/// Resolves a set of file paths into media pairs.
///
/// Files without a four-digit prefix or with an unrecognized extension are
/// ignored. When two files compete for the same slot the lexicographically
/// smallest path wins and the loser is reported as a pairing conflict. Audio
/// files whose key has no visual are reported as orphans.
pub fn resolve_pairs(paths: &[PathBuf]) -> ResolveReport {
    let mut slots: BTreeMap<PairKey, KeySlot> = BTreeMap::new();
    let mut skipped = Vec::new();

    // Sort up front so slot filling (and therefore tie-breaking) does not
    // depend on discovery order.
    let mut sorted: Vec<&PathBuf> = paths.iter().collect();
    sorted.sort();

    for path in sorted {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            debug!("Ignoring path with non-UTF8 file name: {}", path.display());
            continue;
        };
        let Some(key) = PairKey::from_file_name(name) else {
            debug!("Ignoring file without four-digit prefix: {}", name);
            continue;
        };
        let Some(kind) = MediaKind::classify(path) else {
            debug!("Ignoring unrecognized extension: {}", name);
            continue;
        };

        let slot = slots.entry(key).or_default();
        match kind {
            MediaKind::Image | MediaKind::Video => {
                let visual_kind = match kind {
                    MediaKind::Image => VisualKind::Still,
                    _ => VisualKind::Video,
                };
                match &slot.visual {
                    None => slot.visual = Some((path.clone(), visual_kind)),
                    Some((kept, _)) => {
                        // Inputs are sorted, so the existing occupant is the
                        // lexicographically smaller path.
                        let err = MontageError::PairingConflict {
                            key,
                            kept: kept.display().to_string(),
                            dropped: path.display().to_string(),
                        };
                        warn!("{}", err);
                        skipped.push(SkippedItem::new(path.display().to_string(), &err));
                    }
                }
            }
            MediaKind::Audio => match &slot.audio {
                None => slot.audio = Some(path.clone()),
                Some(kept) => {
                    let err = MontageError::PairingConflict {
                        key,
                        kept: kept.display().to_string(),
                        dropped: path.display().to_string(),
                    };
                    warn!("{}", err);
                    skipped.push(SkippedItem::new(path.display().to_string(), &err));
                }
            },
        }
    }

    let mut pairs = Vec::with_capacity(slots.len());
    for (key, slot) in slots {
        match slot.visual {
            Some((visual_path, visual_kind)) => {
                let mut pair = MediaPair::new(key, visual_path, visual_kind);
                if let Some(audio) = slot.audio {
                    pair = pair.with_audio(audio);
                }
                pairs.push(pair);
            }
            None => {
                if let Some(audio) = slot.audio {
                    let err = MontageError::OrphanAudio {
                        key,
                        path: audio.display().to_string(),
                    };
                    warn!("{}", err);
                    skipped.push(SkippedItem::new(key.to_string(), &err));
                }
            }
        }
    }

    ResolveReport { pairs, skipped }
}

/// Scans a project folder (non-recursive) and resolves its files into pairs.
pub fn scan_directory(dir: &Path) -> MontageResult<ResolveReport> {
    let mut paths = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|e| MontageError::Internal(e.to_string()))?;
        if entry.file_type().is_file() {
            paths.push(entry.into_path());
        }
    }
    debug!("Scanned {} files in {}", paths.len(), dir.display());
    Ok(resolve_pairs(&paths))
}

// ============================================================================
// Tests
// ============================================================================
