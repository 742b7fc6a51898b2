//! Model presets and pipeline configuration.
//!
//! The generation backend is selected once per run as an enumerated preset
//! and passed explicitly into the orchestrator; nothing reads ambient
//! global configuration mid-run.

use std::env;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Named video-generation backend configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelPreset {
    #[default]
    Kling21,
    Veo3,
    Hailuo02,
}

/// Static capabilities of a preset.
pub struct ModelCaps {
    pub name: &'static str,
    /// Native chunk length in seconds; may differ from beat durations.
    pub chunk_duration: f64,
    /// Nominal rate used for pre-run estimates. Billing uses the cost
    /// figures returned by the collaborators.
    pub cost_per_second: f64,
    /// Model emits audio with its video; the refinement phase is skipped.
    pub native_audio: bool,
    /// Model accepts more than one conditioning image per request.
    pub multi_image: bool,
}

impl ModelPreset {
    pub fn caps(&self) -> ModelCaps {
        match self {
            ModelPreset::Kling21 => ModelCaps {
                name: "kling-2.1",
                chunk_duration: 5.0,
                cost_per_second: 0.07,
                native_audio: false,
                multi_image: true,
            },
            ModelPreset::Veo3 => ModelCaps {
                name: "veo-3",
                chunk_duration: 8.0,
                cost_per_second: 0.40,
                native_audio: true,
                multi_image: false,
            },
            ModelPreset::Hailuo02 => ModelCaps {
                name: "hailuo-02",
                chunk_duration: 6.0,
                cost_per_second: 0.05,
                native_audio: false,
                multi_image: false,
            },
        }
    }

    /// Rough generation cost for a timeline of the given length, used for
    /// logging before the collaborators report real figures.
    pub fn estimate_cost(&self, seconds: f64) -> f64 {
        self.caps().cost_per_second * seconds.max(0.0)
    }

    fn parse(value: &str) -> Option<Self> {
        match value {
            "kling-2.1" | "kling21" => Some(ModelPreset::Kling21),
            "veo-3" | "veo3" => Some(ModelPreset::Veo3),
            "hailuo-02" | "hailuo02" => Some(ModelPreset::Hailuo02),
            _ => None,
        }
    }
}

/// Progress checkpoints reported after each phase completes. Chunk
/// generation interpolates between the storyboard and chunks values.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ProgressMilestones {
    pub planning: u8,
    pub storyboard: u8,
    pub chunks: u8,
    pub refinement: u8,
}

impl Default for ProgressMilestones {
    fn default() -> Self {
        ProgressMilestones {
            planning: 10,
            storyboard: 25,
            chunks: 65,
            refinement: 100,
        }
    }
}

/// Per-run configuration, selected once and passed explicitly.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub preset: ModelPreset,
    /// Budget for a single planning/stitch/refinement call.
    pub phase_timeout: Duration,
    /// Budget for one image or chunk generation call.
    pub unit_timeout: Duration,
    /// Seconds trimmed from every chunk after the first when stitching.
    pub stitch_overlap: f64,
    /// Accepted deviation of the stitched duration from the spec target.
    pub drift_tolerance: f64,
    pub milestones: ProgressMilestones,
}

impl PipelineConfig {
    pub fn for_preset(preset: ModelPreset) -> Self {
        PipelineConfig {
            preset,
            phase_timeout: Duration::from_secs(120),
            unit_timeout: Duration::from_secs(90),
            stitch_overlap: 1.0,
            drift_tolerance: 0.5,
            milestones: ProgressMilestones::default(),
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();

        let preset = env::var("MODEL_PRESET")
            .ok()
            .and_then(|v| ModelPreset::parse(&v))
            .unwrap_or_default();

        let mut config = Self::for_preset(preset);
        if let Some(secs) = read_f64("PHASE_TIMEOUT_SECS") {
            config.phase_timeout = Duration::from_secs_f64(secs);
        }
        if let Some(secs) = read_f64("UNIT_TIMEOUT_SECS") {
            config.unit_timeout = Duration::from_secs_f64(secs);
        }
        if let Some(overlap) = read_f64("STITCH_OVERLAP_SECS") {
            config.stitch_overlap = overlap;
        }
        if let Some(tolerance) = read_f64("DRIFT_TOLERANCE_SECS") {
            config.drift_tolerance = tolerance;
        }
        config
    }
}

fn read_f64(var: &str) -> Option<f64> {
    env::var(var).ok().and_then(|v| v.parse().ok())
}
