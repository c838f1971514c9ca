//! Pure functions that turn a symbolic [`Request`] into what the backend needs.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{ResolveError, Result};
use crate::presets::{AspectRatio, HiresFix, QualityTier};
use crate::request::Request;

/// Exclusive upper bound for randomly drawn seeds
pub const SEED_RANGE: i64 = 1_000_000;

/// Key used to spot duplicate submissions.
///
/// Built from the literal request fields, including the literal seed, so a
/// `"-1"` request never matches one carrying the number a previous job
/// resolved to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint {
    prompt: String,
    negative_prompt: String,
    aspect_ratio: AspectRatio,
    quality: QualityTier,
    seed: String,
}

pub fn compute_fingerprint(request: &Request) -> Fingerprint {
    Fingerprint {
        prompt: request.prompt.clone(),
        negative_prompt: request.negative_prompt.clone(),
        aspect_ratio: request.aspect_ratio,
        quality: request.quality,
        seed: request.seed.clone(),
    }
}

/// Check a seed literal without drawing anything
pub fn validate_seed(literal: &str) -> Result<()> {
    match literal.parse::<i64>() {
        Ok(value) if value >= -1 => Ok(()),
        _ => Err(ResolveError::InvalidSeed(literal.to_string())),
    }
}

pub fn resolve_seed(literal: &str) -> Result<i64> {
    resolve_seed_with(literal, &mut rand::rng())
}

/// Same as [`resolve_seed`] with a caller-supplied randomness source
pub fn resolve_seed_with<R: Rng>(literal: &str, rng: &mut R) -> Result<i64> {
    match literal.parse::<i64>() {
        Ok(-1) => Ok(rng.random_range(0..SEED_RANGE)),
        Ok(value) if value >= 0 => Ok(value),
        _ => Err(ResolveError::InvalidSeed(literal.to_string())),
    }
}

/// Concrete parameters for a single backend call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    pub prompt: String,
    pub negative_prompt: String,
    pub width: u32,
    pub height: u32,
    pub steps: u32,
    pub seed: i64,
    pub hires: Option<HiresFix>,
}

pub fn resolve_parameters(request: &Request, resolved_seed: i64) -> GenerationParams {
    let (width, height) = request.aspect_ratio.dimensions();
    let preset = request.quality.preset();

    GenerationParams {
        prompt: request.prompt.clone(),
        negative_prompt: request.negative_prompt.clone(),
        width,
        height,
        steps: preset.steps,
        seed: resolved_seed,
        hires: preset.hires,
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::request::RequestField;

    #[test]
    fn test_fingerprint_equal_for_equal_requests() {
        let a = Request::new("a");
        let b = Request::new("a");
        assert_eq!(compute_fingerprint(&a), compute_fingerprint(&b));
    }

    #[test]
    fn test_fingerprint_covers_every_field() {
        let base = Request::new("a");
        let variants = [
            RequestField::Prompt("b".into()),
            RequestField::NegativePrompt("blurry".into()),
            RequestField::AspectRatio(AspectRatio::Square),
            RequestField::Quality(QualityTier::High),
            RequestField::Seed("7".into()),
        ];
        for field in variants {
            let changed = base.clone().with(field.clone());
            assert_ne!(
                compute_fingerprint(&base),
                compute_fingerprint(&changed),
                "{field:?} should change the fingerprint"
            );
        }
    }

    #[test]
    fn test_fingerprint_detached_from_later_mutation() {
        let mut request = Request::new("a");
        let fingerprint = compute_fingerprint(&request);
        request.prompt.push_str(" cat");
        assert_eq!(fingerprint, compute_fingerprint(&Request::new("a")));
        assert_ne!(fingerprint, compute_fingerprint(&request));
    }

    #[test]
    fn test_literal_seed_used_unchanged() {
        assert_eq!(resolve_seed("42"), Ok(42));
        assert_eq!(resolve_seed("0"), Ok(0));
    }

    #[test]
    fn test_random_seed_in_range() {
        for _ in 0..100 {
            let seed = resolve_seed("-1").unwrap();
            assert!((0..SEED_RANGE).contains(&seed));
        }
    }

    #[test]
    fn test_random_seeds_are_independent() {
        let draws: Vec<i64> = (0..8).map(|_| resolve_seed("-1").unwrap()).collect();
        assert!(draws.windows(2).any(|pair| pair[0] != pair[1]));
    }

    #[test]
    fn test_random_seed_uses_supplied_rng() {
        let mut a = StdRng::seed_from_u64(9);
        let mut b = StdRng::seed_from_u64(9);
        assert_eq!(
            resolve_seed_with("-1", &mut a),
            resolve_seed_with("-1", &mut b)
        );
    }

    #[test]
    fn test_invalid_seeds_rejected() {
        for literal in ["", "abc", "-2", "1.5", "0x10", " 4"] {
            assert_eq!(
                resolve_seed(literal),
                Err(ResolveError::InvalidSeed(literal.to_string())),
                "{literal:?}"
            );
            assert!(validate_seed(literal).is_err());
        }
        assert!(validate_seed("-1").is_ok());
        assert!(validate_seed("123").is_ok());
    }

    #[test]
    fn test_seed_literal_grammar() {
        let mut rng = StdRng::seed_from_u64(3);
        // Anything that parses to -1 is the random sentinel.
        let drawn = resolve_seed_with("-01", &mut rng).unwrap();
        assert!((0..SEED_RANGE).contains(&drawn));
        assert!(validate_seed("-01").is_ok());

        // A leading plus is an ordinary integer.
        assert_eq!(resolve_seed("+5"), Ok(5));
        assert!(validate_seed("+5").is_ok());
        assert_eq!(resolve_seed("007"), Ok(7));
    }

    #[test]
    fn test_parameters_for_high_landscape() {
        let request = Request::new("a")
            .with(RequestField::AspectRatio(AspectRatio::Landscape))
            .with(RequestField::Quality(QualityTier::High));
        let params = resolve_parameters(&request, 5);
        assert_eq!((params.width, params.height), (768, 512));
        assert_eq!(params.steps, 24);
        assert_eq!(params.seed, 5);
        assert_eq!(params.hires, Some(HiresFix::default()));
    }

    #[test]
    fn test_parameters_for_low_portrait() {
        let params = resolve_parameters(&Request::new("a"), 1);
        assert_eq!((params.width, params.height), (512, 768));
        assert_eq!(params.steps, 6);
        assert!(params.hires.is_none());
        assert_eq!(params.negative_prompt, "nsfw, text, low quality");
    }
}
