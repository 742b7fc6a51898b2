use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::config::PipelineConfig;
use crate::domain::chunks::{chunk_count, BeatChunkMapper, ChunkSpec, ContinuationChain, SeedSource};
use crate::domain::phase::PhaseName;
use crate::domain::spec::VideoSpec;
use crate::domain::stitch::duration_drift;
use crate::domain::storyboard::{AssetRef, StoryboardImage};
use crate::error::{PipelineError, Result};
use crate::ports::{ChunkGenPort, GeneratedChunk, StitchPort};

/// Everything the chunk-generation phase produced.
#[derive(Debug, Clone)]
pub struct ChunkBatch {
    pub chunks: Vec<ChunkSpec>,
    pub media: Vec<AssetRef>,
    pub stitched: AssetRef,
    pub measured_duration: f64,
    pub duration_drift: Option<f64>,
    /// Trailing frame of the last chunk.
    pub final_frame: Option<AssetRef>,
    pub cost: f64,
}

/// Drives chunk-by-chunk generation in index order.
///
/// Chunks run strictly sequentially: chunk i cannot start until chunk i-1's
/// trailing frame is known. Boundary chunks could in principle start early,
/// but the sequential loop is the conservative implementation that keeps
/// the seed-resolution ordering guarantee by construction.
pub struct ChunkGenerationCoordinator<'a, V, M> {
    video: &'a V,
    stitcher: &'a M,
    config: &'a PipelineConfig,
}

impl<'a, V, M> ChunkGenerationCoordinator<'a, V, M>
where
    V: ChunkGenPort,
    M: StitchPort,
{
    pub fn new(video: &'a V, stitcher: &'a M, config: &'a PipelineConfig) -> Self {
        ChunkGenerationCoordinator {
            video,
            stitcher,
            config,
        }
    }

    /// Generate every chunk, then stitch. `on_chunk(completed, total,
    /// cost_so_far)` fires after each chunk so the orchestrator can advance
    /// progress and keep partial cost visible even if a later chunk fails.
    pub async fn run(
        &self,
        spec: &VideoSpec,
        storyboards: &[StoryboardImage],
        cancel: &CancellationToken,
        mut on_chunk: impl FnMut(usize, usize, f64),
    ) -> Result<ChunkBatch> {
        let caps = self.config.preset.caps();
        let mapper = BeatChunkMapper::new(caps.chunk_duration)?;
        let boundaries = mapper.boundary_map(&spec.beats)?;
        let total = chunk_count(spec.total_duration, caps.chunk_duration);
        let mut chain = ContinuationChain::new(boundaries);

        let mut chunks: Vec<ChunkSpec> = Vec::with_capacity(total);
        let mut media: Vec<AssetRef> = Vec::with_capacity(total);
        let mut final_frame = None;
        let mut cost = 0.0;

        for index in 0..total {
            if cancel.is_cancelled() {
                return Err(PipelineError::Cancelled);
            }

            let start = index as f64 * caps.chunk_duration;
            let beat = spec.beat_at(start).ok_or_else(|| {
                PipelineError::validation(format!(
                    "chunk {} start {}s falls outside every beat",
                    index, start
                ))
            })?;

            // 1. Resolve the seed.
            let resolved = chain.seed_for(index, storyboards);

            // 2./3. Image-seeded attempt, with one text-only retry on
            // failure. A seeded failure alone never aborts the run.
            let (generated, used_fallback) = match &resolved {
                SeedSource::TextOnly => {
                    let g = self
                        .generate(&beat.prompt, None)
                        .await
                        .map_err(|reason| PipelineError::ChunkFailed { index, reason })?;
                    (g, true)
                }
                SeedSource::Storyboard { asset, .. } | SeedSource::PriorFrame { asset, .. } => {
                    match self.generate(&beat.prompt, Some(asset.clone())).await {
                        Ok(g) => (g, false),
                        Err(reason) => {
                            warn!(
                                chunk = index,
                                %reason,
                                "image-seeded generation failed, retrying text-only"
                            );
                            let g = self
                                .generate(&beat.prompt, None)
                                .await
                                .map_err(|reason| PipelineError::ChunkFailed { index, reason })?;
                            (g, true)
                        }
                    }
                }
            };

            // 4. Record the trailing frame for the next chunk's lookup.
            cost += generated.cost;
            chain.record_frame(index, generated.last_frame.clone());
            final_frame = generated.last_frame.clone();
            media.push(generated.media);
            chunks.push(ChunkSpec {
                index,
                start,
                duration: caps.chunk_duration,
                seed: resolved,
                prompt: beat.prompt.clone(),
                used_fallback,
            });
            on_chunk(index + 1, total, cost);
        }

        // 5. Stitch into one continuous timeline.
        let stitched = tokio::time::timeout(
            self.config.phase_timeout,
            self.stitcher.stitch(media.clone(), self.config.stitch_overlap),
        )
        .await
        .map_err(|_| PipelineError::Timeout {
            phase: PhaseName::ChunkGeneration,
            waited: self.config.phase_timeout,
        })?
        .map_err(|e| PipelineError::external(PhaseName::ChunkGeneration, e.to_string()))?;

        let drift = duration_drift(
            stitched.measured_duration,
            spec.total_duration,
            self.config.drift_tolerance,
        );
        if let Some(over) = drift {
            warn!(
                measured = stitched.measured_duration,
                target = spec.total_duration,
                over,
                "stitched duration drifted outside tolerance"
            );
        }

        Ok(ChunkBatch {
            chunks,
            media,
            stitched: stitched.media,
            measured_duration: stitched.measured_duration,
            duration_drift: drift,
            final_frame,
            cost,
        })
    }

    /// One generation attempt under the unit timeout. A timed-out call is a
    /// failure of that attempt, not of the process.
    async fn generate(
        &self,
        prompt: &str,
        seed: Option<AssetRef>,
    ) -> std::result::Result<GeneratedChunk, String> {
        let duration = self.config.preset.caps().chunk_duration;
        match tokio::time::timeout(
            self.config.unit_timeout,
            self.video.generate_chunk(prompt, seed, duration),
        )
        .await
        {
            Err(_) => Err(format!("timed out after {:?}", self.config.unit_timeout)),
            Ok(Err(e)) => Err(e.to_string()),
            Ok(Ok(g)) => Ok(g),
        }
    }
}
