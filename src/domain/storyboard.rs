use serde::{Deserialize, Serialize};

/// Key or URL of an object stored by an external collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetRef(pub String);

impl AssetRef {
    pub fn new(key: impl Into<String>) -> Self {
        AssetRef(key.into())
    }
}

impl std::fmt::Display for AssetRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One reference image per beat, anchoring visual style at beat boundaries.
/// Generated once during the storyboard phase, immutable afterward.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoryboardImage {
    pub beat_index: usize,
    pub asset: AssetRef,
    pub prompt: String,
}
