use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::chunks::ChunkSpec;
use crate::domain::spec::VideoSpec;
use crate::domain::storyboard::{AssetRef, StoryboardImage};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseName {
    Planning,
    Storyboard,
    /// Storyboard-to-motion preview. Permanently disabled: invoked for
    /// backward-compatible bookkeeping, always reports Skipped.
    Animatic,
    ChunkGeneration,
    Refinement,
}

impl PhaseName {
    /// Fixed execution order of the pipeline.
    pub const ORDER: [PhaseName; 5] = [
        PhaseName::Planning,
        PhaseName::Storyboard,
        PhaseName::Animatic,
        PhaseName::ChunkGeneration,
        PhaseName::Refinement,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PhaseName::Planning => "planning",
            PhaseName::Storyboard => "storyboard",
            PhaseName::Animatic => "animatic",
            PhaseName::ChunkGeneration => "chunk_generation",
            PhaseName::Refinement => "refinement",
        }
    }
}

impl std::fmt::Display for PhaseName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseStatus {
    Success,
    Skipped,
    Failed,
}

/// Phase-specific output payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PhasePayload {
    Empty,
    Plan {
        spec: VideoSpec,
    },
    Storyboard {
        images: Vec<StoryboardImage>,
    },
    Chunks {
        chunks: Vec<ChunkSpec>,
        media: Vec<AssetRef>,
        stitched: AssetRef,
        measured_duration: f64,
        /// Seconds outside the drift tolerance band, if any.
        duration_drift: Option<f64>,
    },
    Refined {
        video: AssetRef,
    },
}

/// Result of one phase execution.
///
/// Invariants enforced by the constructors: Failed carries an empty payload
/// and a non-empty error message; Skipped carries zero cost.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseOutput {
    pub video_id: String,
    pub phase: PhaseName,
    pub status: PhaseStatus,
    pub payload: PhasePayload,
    pub cost: f64,
    pub elapsed: Duration,
    pub error: Option<String>,
}

impl PhaseOutput {
    pub fn success(
        video_id: impl Into<String>,
        phase: PhaseName,
        payload: PhasePayload,
        cost: f64,
        elapsed: Duration,
    ) -> Self {
        PhaseOutput {
            video_id: video_id.into(),
            phase,
            status: PhaseStatus::Success,
            payload,
            cost: cost.max(0.0),
            elapsed,
            error: None,
        }
    }

    pub fn skipped(
        video_id: impl Into<String>,
        phase: PhaseName,
        payload: PhasePayload,
        elapsed: Duration,
    ) -> Self {
        PhaseOutput {
            video_id: video_id.into(),
            phase,
            status: PhaseStatus::Skipped,
            payload,
            cost: 0.0,
            elapsed,
            error: None,
        }
    }

    pub fn failed(
        video_id: impl Into<String>,
        phase: PhaseName,
        error: impl Into<String>,
        cost: f64,
        elapsed: Duration,
    ) -> Self {
        let error = error.into();
        debug_assert!(!error.is_empty());
        PhaseOutput {
            video_id: video_id.into(),
            phase,
            status: PhaseStatus::Failed,
            payload: PhasePayload::Empty,
            cost: cost.max(0.0),
            elapsed,
            error: Some(error),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunStatus {
    Pending,
    Running { phase: PhaseName },
    Succeeded,
    Failed { phase: PhaseName, error: String },
}

impl RunStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunStatus::Succeeded | RunStatus::Failed { .. })
    }
}

/// Media references available so far, for external polling.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Artifacts {
    pub storyboard: Vec<AssetRef>,
    pub chunks: Vec<AssetRef>,
    pub stitched: Option<AssetRef>,
    pub final_video: Option<AssetRef>,
}

/// Per-run mutable state. Owned and mutated only by the orchestrator at
/// defined transition points; external consumers see read-only snapshots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineState {
    pub video_id: String,
    pub status: RunStatus,
    /// Percentage 0-100, monotonically non-decreasing. 100 only on success.
    pub progress: u8,
    pub total_cost: f64,
    pub outputs: BTreeMap<PhaseName, PhaseOutput>,
    pub artifacts: Artifacts,
}

impl PipelineState {
    pub fn new(video_id: impl Into<String>) -> Self {
        PipelineState {
            video_id: video_id.into(),
            status: RunStatus::Pending,
            progress: 0,
            total_cost: 0.0,
            outputs: BTreeMap::new(),
            artifacts: Artifacts::default(),
        }
    }

    pub fn begin_phase(&mut self, phase: PhaseName) {
        self.status = RunStatus::Running { phase };
    }

    /// Raise progress to `pct`, never lowering it.
    pub fn advance_progress(&mut self, pct: u8) {
        self.progress = self.progress.max(pct.min(100));
    }

    /// Merge a finished phase into the run: accumulate cost, store the
    /// output, pick up any artifact references from the payload.
    pub fn record_output(&mut self, output: PhaseOutput) {
        self.total_cost += output.cost;
        match &output.payload {
            PhasePayload::Storyboard { images } => {
                self.artifacts.storyboard = images.iter().map(|i| i.asset.clone()).collect();
            }
            PhasePayload::Chunks { media, stitched, .. } => {
                self.artifacts.chunks = media.clone();
                self.artifacts.stitched = Some(stitched.clone());
            }
            PhasePayload::Refined { video } => {
                self.artifacts.final_video = Some(video.clone());
            }
            PhasePayload::Empty | PhasePayload::Plan { .. } => {}
        }
        self.outputs.insert(output.phase, output);
    }

    pub fn fail(&mut self, phase: PhaseName, error: impl Into<String>) {
        self.status = RunStatus::Failed {
            phase,
            error: error.into(),
        };
    }

    pub fn succeed(&mut self) {
        self.status = RunStatus::Succeeded;
        self.progress = 100;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn execution_order_keeps_the_disabled_phase() {
        assert_eq!(PhaseName::ORDER.len(), 5);
        assert_eq!(PhaseName::ORDER[2], PhaseName::Animatic);
        assert_eq!(PhaseName::ORDER[4], PhaseName::Refinement);
    }

    #[test]
    fn progress_never_decreases() {
        let mut state = PipelineState::new("v1");
        state.advance_progress(25);
        state.advance_progress(10);
        assert_eq!(state.progress, 25);
        state.advance_progress(65);
        assert_eq!(state.progress, 65);
    }

    #[test]
    fn failed_output_has_empty_payload_and_error() {
        let out = PhaseOutput::failed("v1", PhaseName::Storyboard, "boom", 0.5, Duration::ZERO);
        assert_eq!(out.status, PhaseStatus::Failed);
        assert!(matches!(out.payload, PhasePayload::Empty));
        assert_eq!(out.error.as_deref(), Some("boom"));
    }

    #[test]
    fn skipped_output_costs_nothing() {
        let out = PhaseOutput::skipped("v1", PhaseName::Animatic, PhasePayload::Empty, Duration::ZERO);
        assert_eq!(out.cost, 0.0);
        assert_eq!(out.status, PhaseStatus::Skipped);
    }

    #[test]
    fn state_serializes_for_external_persistence() {
        let mut state = PipelineState::new("v1");
        state.begin_phase(PhaseName::Planning);
        state.advance_progress(10);
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["video_id"], "v1");
        assert_eq!(json["progress"], 10);
        assert_eq!(json["status"]["phase"], "planning");
    }

    #[test]
    fn record_output_accumulates_cost() {
        let mut state = PipelineState::new("v1");
        state.record_output(PhaseOutput::success(
            "v1",
            PhaseName::Planning,
            PhasePayload::Empty,
            0.10,
            Duration::ZERO,
        ));
        state.record_output(PhaseOutput::failed(
            "v1",
            PhaseName::Storyboard,
            "image service down",
            0.02,
            Duration::ZERO,
        ));
        assert!((state.total_cost - 0.12).abs() < 1e-9);
    }
}
