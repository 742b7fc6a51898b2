use async_trait::async_trait;

use crate::domain::storyboard::AssetRef;
use crate::ports::PortError;

#[derive(Debug, Clone)]
pub struct GeneratedImage {
    pub asset: AssetRef,
    pub cost: f64,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ImageGenPort: Send + Sync {
    /// Generate one image from a prompt, optionally conditioned on a
    /// reference image.
    async fn generate_image(
        &self,
        prompt: &str,
        reference: Option<AssetRef>,
    ) -> Result<GeneratedImage, PortError>;
}
