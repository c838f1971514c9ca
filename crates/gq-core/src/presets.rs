use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ResolveError;

/// Aspect ratio class selectable on the request form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AspectRatio {
    #[default]
    Portrait,
    Landscape,
    Square,
}

impl AspectRatio {
    /// Value used on the wire and in the form
    pub fn id(&self) -> &'static str {
        match self {
            Self::Portrait => "portrait",
            Self::Landscape => "landscape",
            Self::Square => "square",
        }
    }

    /// Pixel dimensions as `(width, height)`
    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            Self::Portrait => (512, 768),
            Self::Landscape => (768, 512),
            Self::Square => (512, 512),
        }
    }

    pub fn all() -> [AspectRatio; 3] {
        [Self::Portrait, Self::Landscape, Self::Square]
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for AspectRatio {
    type Err = ResolveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .into_iter()
            .find(|aspect| aspect.id() == s)
            .ok_or_else(|| ResolveError::UnknownAspectRatio(s.to_string()))
    }
}

/// Symbolic quality preset, expanded into concrete backend parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityTier {
    #[default]
    Low,
    Medium,
    High,
}

impl QualityTier {
    pub fn id(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    pub fn preset(&self) -> TierPreset {
        match self {
            Self::Low => TierPreset { steps: 6, hires: None },
            Self::Medium => TierPreset { steps: 12, hires: None },
            Self::High => TierPreset {
                steps: 24,
                hires: Some(HiresFix::default()),
            },
        }
    }

    /// Next tier up, saturating at `High`. Backs the "upscale this result" action.
    pub fn bumped(&self) -> Self {
        match self {
            Self::Low => Self::Medium,
            Self::Medium | Self::High => Self::High,
        }
    }

    pub fn all() -> [QualityTier; 3] {
        [Self::Low, Self::Medium, Self::High]
    }
}

impl fmt::Display for QualityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for QualityTier {
    type Err = ResolveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .into_iter()
            .find(|tier| tier.id() == s)
            .ok_or_else(|| ResolveError::UnknownTier(s.to_string()))
    }
}

/// Concrete parameter bundle for a quality tier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierPreset {
    pub steps: u32,
    pub hires: Option<HiresFix>,
}

/// Two-pass "high-resolution fix" sub-parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HiresFix {
    pub scale: f32,
    pub upscaler: String,
    pub second_pass_steps: u32,
    pub denoising_strength: f32,
}

impl Default for HiresFix {
    fn default() -> Self {
        Self {
            scale: 2.0,
            upscaler: "Latent".to_string(),
            second_pass_steps: 12,
            denoising_strength: 0.6,
        }
    }
}
