use async_trait::async_trait;

use crate::domain::storyboard::AssetRef;
use crate::ports::PortError;

#[derive(Debug, Clone)]
pub struct GeneratedChunk {
    pub media: AssetRef,
    /// Trailing frame of the chunk, seed for the next continuation. `None`
    /// when the backend could not extract one.
    pub last_frame: Option<AssetRef>,
    pub cost: f64,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChunkGenPort: Send + Sync {
    /// Generate one video chunk. `seed: None` selects text-to-video mode,
    /// which every backend must support.
    async fn generate_chunk(
        &self,
        prompt: &str,
        seed: Option<AssetRef>,
        duration_secs: f64,
    ) -> Result<GeneratedChunk, PortError>;
}
