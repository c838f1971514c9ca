use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use gq_core::GenerationParams;
use serde::{Deserialize, Serialize};

use crate::artifact::Artifact;
use crate::error::BackendError;

/// Body of `POST /sdapi/v1/txt2img`
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Txt2ImgRequest<'a> {
    pub prompt: &'a str,
    pub negative_prompt: &'a str,
    pub width: u32,
    pub height: u32,
    pub steps: u32,
    pub seed: i64,
    pub enable_hr: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hr_scale: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hr_upscaler: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hr_second_pass_steps: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub denoising_strength: Option<f32>,
}

impl<'a> From<&'a GenerationParams> for Txt2ImgRequest<'a> {
    fn from(params: &'a GenerationParams) -> Self {
        let hires = params.hires.as_ref();
        Self {
            prompt: &params.prompt,
            negative_prompt: &params.negative_prompt,
            width: params.width,
            height: params.height,
            steps: params.steps,
            seed: params.seed,
            enable_hr: hires.is_some(),
            hr_scale: hires.map(|h| h.scale),
            hr_upscaler: hires.map(|h| h.upscaler.as_str()),
            hr_second_pass_steps: hires.map(|h| h.second_pass_steps),
            denoising_strength: hires.map(|h| h.denoising_strength),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Txt2ImgResponse {
    #[serde(default)]
    pub images: Option<Vec<String>>,
    #[serde(default)]
    pub info: Option<String>,
}

impl Txt2ImgResponse {
    pub fn parse(body: &str) -> Result<Self, BackendError> {
        serde_json::from_str(body)
            .map_err(|e| BackendError::MalformedResponse(format!("invalid JSON: {}", e)))
    }

    /// Decode the first image; the rest (if any) are ignored
    pub fn into_artifact(self) -> Result<Artifact, BackendError> {
        let encoded = self
            .images
            .and_then(|images| images.into_iter().next())
            .ok_or_else(|| BackendError::MalformedResponse("no image in response".into()))?;

        // Some proxies return a data URL instead of bare base64.
        let encoded = match encoded.split_once("base64,") {
            Some((_, data)) => data,
            None => encoded.as_str(),
        };

        let bytes = STANDARD
            .decode(encoded.trim())
            .map_err(|e| BackendError::MalformedResponse(format!("invalid base64 image: {}", e)))?;

        if bytes.is_empty() {
            return Err(BackendError::MalformedResponse("empty image".into()));
        }

        Ok(Artifact::new(bytes))
    }
}
