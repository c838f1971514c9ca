mod schemas;
mod sdwebui;

use async_trait::async_trait;
use gq_core::GenerationParams;

use crate::artifact::Artifact;
use crate::error::BackendError;

pub use sdwebui::SdWebUiBackend;

/// An image generator that handles one request at a time.
///
/// Transport errors, non-success responses and payloads without an image
/// all come back as [`BackendError`]; the scheduler treats them alike.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn generate(&self, params: &GenerationParams) -> Result<Artifact, BackendError>;

    /// Ask the backend to stop whatever it is doing. Advisory only.
    async fn interrupt(&self) -> Result<(), BackendError> {
        Ok(())
    }
}
