pub mod error;
pub mod prompts;
pub mod request;
pub mod resolver;
mod presets;

pub use error::ResolveError;
pub use presets::{AspectRatio, HiresFix, QualityTier, TierPreset};
pub use request::{Draft, FieldKind, Request, RequestField, RANDOM_SEED};
pub use resolver::{
    compute_fingerprint, resolve_parameters, resolve_seed, validate_seed, Fingerprint,
    GenerationParams,
};
