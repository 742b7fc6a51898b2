use async_trait::async_trait;

use crate::domain::storyboard::AssetRef;
use crate::ports::PortError;

#[derive(Debug, Clone)]
pub struct StitchedMedia {
    pub media: AssetRef,
    pub measured_duration: f64,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StitchPort: Send + Sync {
    /// Concatenate ordered chunk media into one continuous artifact,
    /// trimming `overlap_secs` from every chunk after the first.
    async fn stitch(
        &self,
        chunks: Vec<AssetRef>,
        overlap_secs: f64,
    ) -> Result<StitchedMedia, PortError>;
}
