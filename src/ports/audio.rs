use async_trait::async_trait;

use crate::domain::spec::AudioIntent;
use crate::domain::storyboard::AssetRef;
use crate::ports::PortError;

#[derive(Debug, Clone)]
pub struct RefinedMedia {
    pub media: AssetRef,
    pub cost: f64,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AudioRefinePort: Send + Sync {
    /// Add audio to the stitched video per the spec's intent. `Ok(None)`
    /// signals "not applicable" for backends whose video already carries
    /// audio.
    async fn refine(
        &self,
        video: &AssetRef,
        intent: &AudioIntent,
    ) -> Result<Option<RefinedMedia>, PortError>;
}
