use std::time::{Duration, Instant};

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use uuid::Uuid;

use crate::application::chunks::ChunkGenerationCoordinator;
use crate::application::storyboard::generate_storyboard;
use crate::config::PipelineConfig;
use crate::domain::phase::{PhaseName, PhaseOutput, PhasePayload, PipelineState};
use crate::domain::storyboard::AssetRef;
use crate::error::{PipelineError, Result};
use crate::ports::{AudioRefinePort, ChunkGenPort, ImageGenPort, PlannedSpec, PlanningPort, StitchPort};
use crate::status::StatusHandle;

#[derive(Debug, Clone)]
pub struct RenderRequest {
    pub prompt: String,
    /// References to assets the caller uploaded beforehand (product shots,
    /// logos) for the planning collaborator to work into the script.
    pub assets: Vec<AssetRef>,
}

/// Runs the five phases in fixed order, enforcing the success/skip/fail
/// contract between them and aggregating cost and progress.
///
/// A phase failure aborts the remaining phases; cost already incurred is
/// retained. State is published through a watch channel so pollers read
/// snapshots without blocking the run.
pub struct PhaseOrchestrator<P, I, V, M, A> {
    planner: P,
    images: I,
    video: V,
    stitcher: M,
    audio: A,
    config: PipelineConfig,
    state_tx: watch::Sender<PipelineState>,
}

impl<P, I, V, M, A> PhaseOrchestrator<P, I, V, M, A>
where
    P: PlanningPort,
    I: ImageGenPort,
    V: ChunkGenPort,
    M: StitchPort,
    A: AudioRefinePort,
{
    pub fn new(
        planner: P,
        images: I,
        video: V,
        stitcher: M,
        audio: A,
        config: PipelineConfig,
    ) -> (Self, StatusHandle) {
        let (state_tx, state_rx) = watch::channel(PipelineState::new(""));
        let orchestrator = PhaseOrchestrator {
            planner,
            images,
            video,
            stitcher,
            audio,
            config,
            state_tx,
        };
        (orchestrator, StatusHandle::new(state_rx))
    }

    pub async fn run(
        &self,
        request: RenderRequest,
        cancel: CancellationToken,
    ) -> Result<PipelineState> {
        let video_id = Uuid::new_v4().to_string();
        let mut state = PipelineState::new(&video_id);
        self.publish(&state);
        info!(video_id = %video_id, model = self.config.preset.caps().name, "starting pipeline");

        // Phase 1: planning.
        self.ensure_live(&mut state, &cancel, PhaseName::Planning)?;
        state.begin_phase(PhaseName::Planning);
        self.publish(&state);
        let started = Instant::now();
        let planned = match self.plan(&request).await {
            Ok(planned) => planned,
            Err(e) => return Err(self.abort(&mut state, PhaseName::Planning, e, 0.0, started.elapsed())),
        };
        let spec = planned.spec.clone();
        info!(
            target = spec.total_duration,
            beats = spec.beats.len(),
            estimate = self.config.preset.estimate_cost(spec.total_duration),
            "plan ready"
        );
        self.commit(
            &mut state,
            PhaseOutput::success(
                &video_id,
                PhaseName::Planning,
                PhasePayload::Plan { spec: planned.spec },
                planned.cost,
                started.elapsed(),
            ),
            self.config.milestones.planning,
        );

        // Phase 2: storyboard, one image per beat generated concurrently.
        self.ensure_live(&mut state, &cancel, PhaseName::Storyboard)?;
        state.begin_phase(PhaseName::Storyboard);
        self.publish(&state);
        let started = Instant::now();
        let (storyboard_cost, result) =
            generate_storyboard(&self.images, &spec, self.config.unit_timeout).await;
        let images = match result {
            Ok(images) => images,
            Err(e) => {
                return Err(self.abort(
                    &mut state,
                    PhaseName::Storyboard,
                    e,
                    storyboard_cost,
                    started.elapsed(),
                ))
            }
        };
        self.commit(
            &mut state,
            PhaseOutput::success(
                &video_id,
                PhaseName::Storyboard,
                PhasePayload::Storyboard { images: images.clone() },
                storyboard_cost,
                started.elapsed(),
            ),
            self.config.milestones.storyboard,
        );

        // Phase 3: animatic. Permanently disabled; invoked only for
        // backward-compatible bookkeeping, never touches a service.
        self.commit(
            &mut state,
            PhaseOutput::skipped(&video_id, PhaseName::Animatic, PhasePayload::Empty, Duration::ZERO),
            self.config.milestones.storyboard,
        );

        // Phase 4: chunk generation and stitching.
        self.ensure_live(&mut state, &cancel, PhaseName::ChunkGeneration)?;
        state.begin_phase(PhaseName::ChunkGeneration);
        self.publish(&state);
        let started = Instant::now();
        let from = self.config.milestones.storyboard;
        let to = self.config.milestones.chunks;
        let mut phase_cost = 0.0;
        let coordinator = ChunkGenerationCoordinator::new(&self.video, &self.stitcher, &self.config);
        let result = {
            let state = &mut state;
            let phase_cost = &mut phase_cost;
            coordinator
                .run(&spec, &images, &cancel, |done, total, cost_so_far| {
                    *phase_cost = cost_so_far;
                    let span = (to - from) as f64;
                    let pct = from as f64 + span * done as f64 / total as f64;
                    state.advance_progress(pct as u8);
                    // Keep in-flight chunk cost visible to pollers; it is
                    // folded into total_cost when the phase commits.
                    let mut snapshot = state.clone();
                    snapshot.total_cost += cost_so_far;
                    self.state_tx.send_replace(snapshot);
                })
                .await
        };
        let batch = match result {
            Ok(batch) => batch,
            Err(e) => {
                return Err(self.abort(
                    &mut state,
                    PhaseName::ChunkGeneration,
                    e,
                    phase_cost,
                    started.elapsed(),
                ))
            }
        };
        self.commit(
            &mut state,
            PhaseOutput::success(
                &video_id,
                PhaseName::ChunkGeneration,
                PhasePayload::Chunks {
                    chunks: batch.chunks.clone(),
                    media: batch.media.clone(),
                    stitched: batch.stitched.clone(),
                    measured_duration: batch.measured_duration,
                    duration_drift: batch.duration_drift,
                },
                batch.cost,
                started.elapsed(),
            ),
            self.config.milestones.chunks,
        );

        // Phase 5: audio refinement, skipped outright for native-audio
        // models. The skip still reports the stitched URL and elapsed time
        // since downstream consumers read the output unconditionally.
        self.ensure_live(&mut state, &cancel, PhaseName::Refinement)?;
        state.begin_phase(PhaseName::Refinement);
        self.publish(&state);
        let started = Instant::now();
        let stitched = batch.stitched.clone();
        let caps = self.config.preset.caps();

        let output = if caps.native_audio {
            info!(model = caps.name, "model emits native audio, skipping refinement");
            PhaseOutput::skipped(
                &video_id,
                PhaseName::Refinement,
                PhasePayload::Refined { video: stitched },
                started.elapsed(),
            )
        } else {
            let refined = tokio::time::timeout(
                self.config.phase_timeout,
                self.audio.refine(&stitched, &spec.audio),
            )
            .await
            .map_err(|_| PipelineError::Timeout {
                phase: PhaseName::Refinement,
                waited: self.config.phase_timeout,
            })
            .and_then(|r| r.map_err(|e| PipelineError::external(PhaseName::Refinement, e.to_string())));
            match refined {
                Err(e) => {
                    return Err(self.abort(&mut state, PhaseName::Refinement, e, 0.0, started.elapsed()))
                }
                // Backend signalled not-applicable after the fact.
                Ok(None) => PhaseOutput::skipped(
                    &video_id,
                    PhaseName::Refinement,
                    PhasePayload::Refined { video: stitched },
                    started.elapsed(),
                ),
                Ok(Some(refined)) => PhaseOutput::success(
                    &video_id,
                    PhaseName::Refinement,
                    PhasePayload::Refined { video: refined.media },
                    refined.cost,
                    started.elapsed(),
                ),
            }
        };

        // Terminal transition: progress reaches 100 together with the
        // succeeded status, never before it.
        state.record_output(output);
        state.succeed();
        self.publish(&state);
        info!(video_id = %video_id, cost = state.total_cost, "pipeline succeeded");
        Ok(state)
    }

    async fn plan(&self, request: &RenderRequest) -> Result<PlannedSpec> {
        let planned = tokio::time::timeout(
            self.config.phase_timeout,
            self.planner.plan(&request.prompt, request.assets.clone()),
        )
        .await
        .map_err(|_| PipelineError::Timeout {
            phase: PhaseName::Planning,
            waited: self.config.phase_timeout,
        })?
        .map_err(|e| PipelineError::external(PhaseName::Planning, e.to_string()))?;
        planned.spec.validate()?;
        Ok(planned)
    }

    /// Merge a finished phase into the run state and publish.
    fn commit(&self, state: &mut PipelineState, output: PhaseOutput, milestone: u8) {
        info!(phase = %output.phase, cost = output.cost, "phase complete");
        state.record_output(output);
        state.advance_progress(milestone);
        self.publish(state);
    }

    /// Record the failure, mark the run terminal and hand the error back to
    /// the caller. Cost incurred by the failing phase is preserved.
    fn abort(
        &self,
        state: &mut PipelineState,
        phase: PhaseName,
        cause: PipelineError,
        cost: f64,
        elapsed: Duration,
    ) -> PipelineError {
        let message = cause.to_string();
        error!(phase = %phase, %message, "phase failed, aborting run");
        state.record_output(PhaseOutput::failed(
            state.video_id.clone(),
            phase,
            message.as_str(),
            cost,
            elapsed,
        ));
        state.fail(phase, message);
        self.publish(state);
        cause
    }

    fn ensure_live(
        &self,
        state: &mut PipelineState,
        cancel: &CancellationToken,
        phase: PhaseName,
    ) -> Result<()> {
        if cancel.is_cancelled() {
            return Err(self.abort(state, phase, PipelineError::Cancelled, 0.0, Duration::ZERO));
        }
        Ok(())
    }

    fn publish(&self, state: &PipelineState) {
        self.state_tx.send_replace(state.clone());
    }

    /// Configuration the run was started with.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }
}
