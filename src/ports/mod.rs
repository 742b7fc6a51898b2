pub mod audio;
pub mod image_gen;
pub mod planning;
pub mod stitching;
pub mod video_gen;

/// Error type returned by collaborator adapters.
pub type PortError = Box<dyn std::error::Error + Send + Sync>;

pub use audio::{AudioRefinePort, RefinedMedia};
pub use image_gen::{GeneratedImage, ImageGenPort};
pub use planning::{PlannedSpec, PlanningPort};
pub use stitching::{StitchPort, StitchedMedia};
pub use video_gen::{ChunkGenPort, GeneratedChunk};
