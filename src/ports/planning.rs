use async_trait::async_trait;

use crate::domain::spec::VideoSpec;
use crate::domain::storyboard::AssetRef;
use crate::ports::PortError;

#[derive(Debug, Clone)]
pub struct PlannedSpec {
    pub spec: VideoSpec,
    pub cost: f64,
}

/// Planning inference: prompt (plus optional uploaded assets) to a frozen
/// VideoSpec. Treated as an opaque call; the orchestrator applies the
/// timeout and validates the returned spec.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PlanningPort: Send + Sync {
    async fn plan(&self, prompt: &str, assets: Vec<AssetRef>) -> Result<PlannedSpec, PortError>;
}
