use serde::{Deserialize, Serialize};

use crate::presets::{AspectRatio, QualityTier};

/// Seed literal meaning "draw a fresh random seed at enqueue time"
pub const RANDOM_SEED: &str = "-1";

/// Symbolic, user-editable description of a generation job.
///
/// Requests are plain values: two requests with equal fields are the same
/// request, no matter when or where they were built.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    pub prompt: String,
    pub negative_prompt: String,
    pub aspect_ratio: AspectRatio,
    pub quality: QualityTier,
    /// Literal seed as typed; [`RANDOM_SEED`] asks for a random one
    pub seed: String,
}

impl Default for Request {
    fn default() -> Self {
        Self {
            prompt: "high quality".to_string(),
            negative_prompt: "nsfw, text, low quality".to_string(),
            aspect_ratio: AspectRatio::Portrait,
            quality: QualityTier::Low,
            seed: RANDOM_SEED.to_string(),
        }
    }
}

impl Request {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Self::default()
        }
    }

    pub fn with(mut self, field: RequestField) -> Self {
        self.set(field);
        self
    }

    pub fn set(&mut self, field: RequestField) {
        match field {
            RequestField::Prompt(prompt) => self.prompt = prompt,
            RequestField::NegativePrompt(negative) => self.negative_prompt = negative,
            RequestField::AspectRatio(aspect) => self.aspect_ratio = aspect,
            RequestField::Quality(quality) => self.quality = quality,
            RequestField::Seed(seed) => self.seed = seed,
        }
    }

    pub fn get(&self, kind: FieldKind) -> RequestField {
        match kind {
            FieldKind::Prompt => RequestField::Prompt(self.prompt.clone()),
            FieldKind::NegativePrompt => RequestField::NegativePrompt(self.negative_prompt.clone()),
            FieldKind::AspectRatio => RequestField::AspectRatio(self.aspect_ratio),
            FieldKind::Quality => RequestField::Quality(self.quality),
            FieldKind::Seed => RequestField::Seed(self.seed.clone()),
        }
    }

    pub fn has_random_seed(&self) -> bool {
        self.seed == RANDOM_SEED
    }
}

/// One request option together with its new value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestField {
    Prompt(String),
    NegativePrompt(String),
    AspectRatio(AspectRatio),
    Quality(QualityTier),
    Seed(String),
}

impl RequestField {
    /// Override that forces a new random seed on the derived job
    pub fn fresh_seed() -> Self {
        Self::Seed(RANDOM_SEED.to_string())
    }

    pub fn kind(&self) -> FieldKind {
        match self {
            Self::Prompt(_) => FieldKind::Prompt,
            Self::NegativePrompt(_) => FieldKind::NegativePrompt,
            Self::AspectRatio(_) => FieldKind::AspectRatio,
            Self::Quality(_) => FieldKind::Quality,
            Self::Seed(_) => FieldKind::Seed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Prompt,
    NegativePrompt,
    AspectRatio,
    Quality,
    Seed,
}

/// The not-yet-submitted request behind the form.
///
/// Edits here never touch the queue; submitting hands a copy of
/// [`Draft::request`] to the scheduler.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Draft {
    request: Request,
}

impl Draft {
    pub fn new(request: Request) -> Self {
        Self { request }
    }

    pub fn request(&self) -> &Request {
        &self.request
    }

    pub fn set_option(&mut self, field: RequestField) {
        self.request.set(field);
    }

    /// Copy a single option from an existing request ("eyedropper")
    pub fn copy_option(&mut self, from: &Request, kind: FieldKind) {
        self.request.set(from.get(kind));
    }

    /// Copy every option from an existing request
    pub fn copy_from(&mut self, from: &Request) {
        self.request = from.clone();
    }

    /// Whether the draft differs from `other` in the given option
    pub fn differs(&self, other: &Request, kind: FieldKind) -> bool {
        self.request.get(kind) != other.get(kind)
    }
}
