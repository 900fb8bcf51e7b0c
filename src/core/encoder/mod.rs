//! Encoder Selection Module
//!
//! Deterministic encoder choice: for a requested codec family, walk the
//! hardware fallback chain (NVIDIA, then AMD, then Intel) and settle on the
//! software encoder when no hardware entry is available. Selection is a pure
//! function of the availability set; it never fails.

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Output codec family
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodecFamily {
    #[default]
    H264,
    Hevc,
}

impl CodecFamily {
    /// Software FFmpeg encoder name
    pub fn software_encoder(&self) -> &'static str {
        match self {
            CodecFamily::H264 => "libx264",
            CodecFamily::Hevc => "libx265",
        }
    }
}

/// Hardware encoder vendor. `None` is the software rung of the chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HwVendor {
    Nvidia,
    Amd,
    Intel,
    None,
}

impl HwVendor {
    /// Fallback chain order, best first, software last
    pub const PRIORITY: [HwVendor; 4] = [
        HwVendor::Nvidia,
        HwVendor::Amd,
        HwVendor::Intel,
        HwVendor::None,
    ];
}

impl std::fmt::Display for HwVendor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HwVendor::Nvidia => write!(f, "NVIDIA"),
            HwVendor::Amd => write!(f, "AMD"),
            HwVendor::Intel => write!(f, "Intel"),
            HwVendor::None => write!(f, "software"),
        }
    }
}

/// Quality/speed tier for the final encode
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityTier {
    /// Fast preview-grade output
    Draft,
    #[default]
    Standard,
    /// Slow, high-quality output
    High,
}

impl QualityTier {
    /// CRF value for software encoders (lower = better)
    pub fn crf(&self) -> u8 {
        match self {
            QualityTier::Draft => 28,
            QualityTier::Standard => 23,
            QualityTier::High => 18,
        }
    }

    /// x264/x265 preset string
    pub fn software_preset(&self) -> &'static str {
        match self {
            QualityTier::Draft => "veryfast",
            QualityTier::Standard => "medium",
            QualityTier::High => "slow",
        }
    }

    /// NVENC preset string
    pub fn nvenc_preset(&self) -> &'static str {
        match self {
            QualityTier::Draft => "p2",
            QualityTier::Standard => "p4",
            QualityTier::High => "p6",
        }
    }
}

/// One usable encoder reported by the availability probe
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncoderAvailability {
    pub family: CodecFamily,
    pub vendor: HwVendor,
}

/// A concrete, selected encoder
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncoderProfile {
    pub family: CodecFamily,
    pub vendor: HwVendor,
    /// Position in the fallback chain (0 = best)
    pub rank: u8,
}

impl EncoderProfile {
    /// FFmpeg encoder name for this profile
    pub fn encoder_name(&self) -> &'static str {
        match (self.family, self.vendor) {
            (CodecFamily::H264, HwVendor::Nvidia) => "h264_nvenc",
            (CodecFamily::H264, HwVendor::Amd) => "h264_amf",
            (CodecFamily::H264, HwVendor::Intel) => "h264_qsv",
            (CodecFamily::Hevc, HwVendor::Nvidia) => "hevc_nvenc",
            (CodecFamily::Hevc, HwVendor::Amd) => "hevc_amf",
            (CodecFamily::Hevc, HwVendor::Intel) => "hevc_qsv",
            (family, HwVendor::None) => family.software_encoder(),
        }
    }

    /// True when this is the software rung
    pub fn is_software(&self) -> bool {
        self.vendor == HwVendor::None
    }
}

/// Ordered fallback chain for one codec family
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FallbackChain {
    profiles: Vec<EncoderProfile>,
}

impl FallbackChain {
    /// Builds the chain for a family: hardware vendors by priority, software
    /// last. The software rung is always present.
    pub fn for_family(family: CodecFamily) -> Self {
        let profiles = HwVendor::PRIORITY
            .iter()
            .enumerate()
            .map(|(rank, &vendor)| EncoderProfile {
                family,
                vendor,
                rank: rank as u8,
            })
            .collect();
        Self { profiles }
    }

    pub fn profiles(&self) -> &[EncoderProfile] {
        &self.profiles
    }
}

/// Selects the best available encoder for a codec family.
///
/// Walks the family's fallback chain and returns the first profile whose
/// vendor appears in `available`. The software rung needs no availability
/// entry, so selection always succeeds.
pub fn select_encoder(family: CodecFamily, available: &[EncoderAvailability]) -> EncoderProfile {
    let chain = FallbackChain::for_family(family);
    for profile in chain.profiles() {
        if profile.is_software() {
            debug!("Encoder selection fell through to {}", profile.encoder_name());
            return *profile;
        }
        let present = available
            .iter()
            .any(|a| a.family == family && a.vendor == profile.vendor);
        if present {
            debug!("Selected encoder {}", profile.encoder_name());
            return *profile;
        }
    }
    // The chain always ends in software; unreachable, but keep it total.
    EncoderProfile {
        family,
        vendor: HwVendor::None,
        rank: (HwVendor::PRIORITY.len() - 1) as u8,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn avail(entries: &[(CodecFamily, HwVendor)]) -> Vec<EncoderAvailability> {
        entries
            .iter()
            .map(|&(family, vendor)| EncoderAvailability { family, vendor })
            .collect()
    }

    #[test]
    fn test_chain_ends_in_software() {
        for family in [CodecFamily::H264, CodecFamily::Hevc] {
            let chain = FallbackChain::for_family(family);
            let last = chain.profiles().last().unwrap();
            assert!(last.is_software());
            assert_eq!(chain.profiles().len(), 4);
        }
    }

    #[test]
    fn test_selects_highest_priority_vendor() {
        let available = avail(&[
            (CodecFamily::H264, HwVendor::Intel),
            (CodecFamily::H264, HwVendor::Nvidia),
        ]);
        let profile = select_encoder(CodecFamily::H264, &available);
        assert_eq!(profile.vendor, HwVendor::Nvidia);
        assert_eq!(profile.encoder_name(), "h264_nvenc");
        assert_eq!(profile.rank, 0);
    }

    #[test]
    fn test_falls_back_within_chain() {
        let available = avail(&[(CodecFamily::H264, HwVendor::Amd)]);
        let profile = select_encoder(CodecFamily::H264, &available);
        assert_eq!(profile.encoder_name(), "h264_amf");
        assert_eq!(profile.rank, 1);
    }

    #[test]
    fn test_empty_availability_selects_software() {
        let profile = select_encoder(CodecFamily::H264, &[]);
        assert!(profile.is_software());
        assert_eq!(profile.encoder_name(), "libx264");

        let profile = select_encoder(CodecFamily::Hevc, &[]);
        assert_eq!(profile.encoder_name(), "libx265");
    }

    #[test]
    fn test_availability_is_per_family() {
        // An HEVC-only NVENC entry must not satisfy an H.264 request
        let available = avail(&[(CodecFamily::Hevc, HwVendor::Nvidia)]);
        let profile = select_encoder(CodecFamily::H264, &available);
        assert!(profile.is_software());
    }

    #[test]
    fn test_selection_is_deterministic() {
        let available = avail(&[
            (CodecFamily::H264, HwVendor::Amd),
            (CodecFamily::H264, HwVendor::Intel),
        ]);
        let a = select_encoder(CodecFamily::H264, &available);
        let b = select_encoder(CodecFamily::H264, &available);
        assert_eq!(a, b);
    }
}
