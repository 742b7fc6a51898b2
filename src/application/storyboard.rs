use std::time::Duration;

use futures::future::join_all;
use tracing::info;

use crate::domain::phase::PhaseName;
use crate::domain::spec::VideoSpec;
use crate::domain::storyboard::StoryboardImage;
use crate::error::{PipelineError, Result};
use crate::ports::ImageGenPort;

/// Generate one storyboard image per beat, concurrently. No beat's image
/// depends on another's, so the per-beat calls are joined and the costs
/// reduced once afterwards instead of mutating a shared total.
///
/// Returns the cost incurred alongside the result: generation calls are
/// non-refundable, so completed images still count when a sibling fails.
pub async fn generate_storyboard<I>(
    images: &I,
    spec: &VideoSpec,
    unit_timeout: Duration,
) -> (f64, Result<Vec<StoryboardImage>>)
where
    I: ImageGenPort,
{
    let futures = spec.beats.iter().map(|beat| async move {
        let generated =
            tokio::time::timeout(unit_timeout, images.generate_image(&beat.prompt, None))
                .await
                .map_err(|_| PipelineError::Timeout {
                    phase: PhaseName::Storyboard,
                    waited: unit_timeout,
                })?
                .map_err(|e| PipelineError::external(PhaseName::Storyboard, e.to_string()))?;
        Ok::<_, PipelineError>((
            StoryboardImage {
                beat_index: beat.index,
                asset: generated.asset,
                prompt: beat.prompt.clone(),
            },
            generated.cost,
        ))
    });

    // join_all preserves input order, so results come back in beat order.
    let results = join_all(futures).await;

    let mut cost = 0.0;
    let mut out = Vec::with_capacity(spec.beats.len());
    let mut first_error = None;
    for result in results {
        match result {
            Ok((image, c)) => {
                cost += c;
                out.push(image);
            }
            Err(e) => {
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
        }
    }

    match first_error {
        Some(e) => (cost, Err(e)),
        None => {
            info!(images = out.len(), cost, "storyboard complete");
            (cost, Ok(out))
        }
    }
}
