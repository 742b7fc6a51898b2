//! Adreel - Prompt-to-Video-Ad Pipeline Core
//!
//! Hexagonal Architecture:
//! - domain/: Pure business logic (spec, chunks, phases, stitch math)
//! - ports/: Trait definitions for the generation collaborators
//! - application/: Generic services driving the ports
//! - config: Model presets and environment configuration
//!
//! A run turns one natural-language prompt into a short video ad by
//! executing five phases in fixed order: planning, storyboard, animatic
//! (permanently disabled), chunk generation, refinement. The chunk phase
//! maps narrative beats onto fixed-duration model chunks and threads a
//! last-frame continuation chain through them.

pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod ports;
pub mod status;

// Re-exports for convenience
pub use application::orchestrator::{PhaseOrchestrator, RenderRequest};
pub use config::{ModelCaps, ModelPreset, PipelineConfig, ProgressMilestones};
pub use domain::phase::{PhaseName, PhaseOutput, PhaseStatus, PipelineState, RunStatus};
pub use domain::spec::{AudioIntent, Beat, VideoSpec};
pub use domain::storyboard::{AssetRef, StoryboardImage};
pub use error::{PipelineError, Result};
pub use status::StatusHandle;
