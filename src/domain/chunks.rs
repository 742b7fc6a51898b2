use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::spec::{Beat, TIME_EPSILON};
use crate::domain::storyboard::{AssetRef, StoryboardImage};
use crate::error::{PipelineError, Result};

/// Resolved visual seed for one chunk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SeedSource {
    /// Boundary chunk, seeded from the beat's storyboard image.
    Storyboard { beat_index: usize, asset: AssetRef },
    /// Continuation, seeded from the previous chunk's trailing frame.
    PriorFrame { chunk_index: usize, asset: AssetRef },
    /// No seed could be resolved; generation runs from prompt text alone.
    TextOnly,
}

/// One fixed-duration video segment. The chunk count is derived from the
/// spec's target duration and the model's native chunk length.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkSpec {
    pub index: usize,
    pub start: f64,
    pub duration: f64,
    pub seed: SeedSource,
    pub prompt: String,
    /// True when the chunk was generated text-only, either because no seed
    /// resolved or because the image-seeded attempt failed.
    pub used_fallback: bool,
}

/// Number of chunks covering the full timeline. A trailing partial chunk is
/// generated rather than truncating the ad.
pub fn chunk_count(total_duration: f64, chunk_duration: f64) -> usize {
    ((total_duration / chunk_duration) - 1e-9).ceil().max(1.0) as usize
}

/// Computes which chunk indices fall on a beat boundary and therefore seed
/// from a storyboard image instead of a trailing frame.
#[derive(Debug, Clone)]
pub struct BeatChunkMapper {
    chunk_duration: f64,
}

impl BeatChunkMapper {
    pub fn new(chunk_duration: f64) -> Result<Self> {
        if chunk_duration <= 0.0 {
            return Err(PipelineError::validation("chunk duration must be positive"));
        }
        Ok(BeatChunkMapper { chunk_duration })
    }

    /// Partial mapping `chunk_index -> beat_index` of boundary chunks.
    ///
    /// Walks beats in order with a running cursor; each beat's stored start
    /// is authoritative, and a disagreement with the cursor is a validation
    /// error rather than something to paper over. When two beats land in
    /// the same chunk the later one wins: fidelity is bounded by chunk
    /// duration, not beat duration.
    pub fn boundary_map(&self, beats: &[Beat]) -> Result<BTreeMap<usize, usize>> {
        let mut map = BTreeMap::new();
        let mut cursor = 0.0;
        for beat in beats {
            if (beat.start - cursor).abs() > TIME_EPSILON {
                return Err(PipelineError::validation(format!(
                    "beat {} stored start {}s disagrees with timeline cursor {}s",
                    beat.id, beat.start, cursor
                )));
            }
            let chunk = ((beat.start / self.chunk_duration) + 1e-9).floor() as usize;
            map.insert(chunk, beat.index);
            cursor += beat.duration;
        }
        Ok(map)
    }
}

/// Per-run sequential state: the most recently generated chunk's trailing
/// frame, used to seed the next chunk when it is not a beat boundary. The
/// chain threads through beat boundaries implicitly by always looking at
/// chunk_index - 1.
#[derive(Debug)]
pub struct ContinuationChain {
    boundaries: BTreeMap<usize, usize>,
    last_frame: Option<(usize, AssetRef)>,
}

impl ContinuationChain {
    pub fn new(boundaries: BTreeMap<usize, usize>) -> Self {
        ContinuationChain {
            boundaries,
            last_frame: None,
        }
    }

    /// Resolve the seed for a chunk. Returns TextOnly when resolution fails
    /// (chunk 0 not a boundary, or the previous chunk left no frame), in
    /// which case the caller falls back to text-to-video generation.
    pub fn seed_for(&self, chunk_index: usize, storyboards: &[StoryboardImage]) -> SeedSource {
        if let Some(&beat_index) = self.boundaries.get(&chunk_index) {
            if let Some(image) = storyboards.iter().find(|s| s.beat_index == beat_index) {
                return SeedSource::Storyboard {
                    beat_index,
                    asset: image.asset.clone(),
                };
            }
        }
        if chunk_index > 0 {
            if let Some((prev, frame)) = &self.last_frame {
                if *prev == chunk_index - 1 {
                    return SeedSource::PriorFrame {
                        chunk_index: chunk_index - 1,
                        asset: frame.clone(),
                    };
                }
            }
        }
        SeedSource::TextOnly
    }

    /// Record the trailing frame of a completed chunk. `None` means the
    /// generator returned no frame; the next chunk will fall back.
    pub fn record_frame(&mut self, chunk_index: usize, frame: Option<AssetRef>) {
        self.last_frame = frame.map(|f| (chunk_index, f));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn beat(index: usize, start: f64, duration: f64) -> Beat {
        Beat {
            id: format!("beat-{}", index),
            index,
            start,
            duration,
            shot_type: "wide".to_string(),
            camera_movement: "static".to_string(),
            prompt: format!("scene {}", index),
        }
    }

    fn beats_with_durations(durations: &[f64]) -> Vec<Beat> {
        let mut out = Vec::new();
        let mut cursor = 0.0;
        for (i, &d) in durations.iter().enumerate() {
            out.push(beat(i, cursor, d));
            cursor += d;
        }
        out
    }

    fn storyboard(beat_index: usize) -> StoryboardImage {
        StoryboardImage {
            beat_index,
            asset: AssetRef::new(format!("img/{}.png", beat_index)),
            prompt: format!("scene {}", beat_index),
        }
    }

    #[test]
    fn mapping_with_long_first_beat() {
        let mapper = BeatChunkMapper::new(5.0).unwrap();
        let map = mapper.boundary_map(&beats_with_durations(&[10.0, 5.0, 5.0])).unwrap();
        let expected: BTreeMap<usize, usize> = [(0, 0), (2, 1), (3, 2)].into_iter().collect();
        assert_eq!(map, expected);
    }

    #[test]
    fn mapping_when_every_chunk_is_a_boundary() {
        let mapper = BeatChunkMapper::new(5.0).unwrap();
        let map = mapper.boundary_map(&beats_with_durations(&[5.0, 5.0, 5.0])).unwrap();
        let expected: BTreeMap<usize, usize> = [(0, 0), (1, 1), (2, 2)].into_iter().collect();
        assert_eq!(map, expected);
    }

    #[test]
    fn chunk_zero_always_maps_to_beat_zero_unless_overwritten() {
        let mapper = BeatChunkMapper::new(5.0).unwrap();
        let map = mapper.boundary_map(&beats_with_durations(&[10.0, 10.0])).unwrap();
        assert_eq!(map.get(&0), Some(&0));
    }

    #[test]
    fn later_beat_overwrites_collision() {
        // Beats of 3s and 3s both start inside chunk 0; the later one wins
        // and the short first beat loses its seed entry.
        let mapper = BeatChunkMapper::new(5.0).unwrap();
        let map = mapper.boundary_map(&beats_with_durations(&[3.0, 3.0, 4.0])).unwrap();
        let expected: BTreeMap<usize, usize> = [(0, 1), (1, 2)].into_iter().collect();
        assert_eq!(map, expected);
    }

    #[test]
    fn stored_start_disagreement_is_a_validation_error() {
        let mapper = BeatChunkMapper::new(5.0).unwrap();
        let mut beats = beats_with_durations(&[5.0, 5.0]);
        beats[1].start = 6.0;
        let err = mapper.boundary_map(&beats).unwrap_err();
        assert!(matches!(err, PipelineError::Validation { .. }));
    }

    #[test]
    fn chunk_count_rounds_up() {
        assert_eq!(chunk_count(20.0, 5.0), 4);
        assert_eq!(chunk_count(24.0, 5.0), 5);
        assert_eq!(chunk_count(3.0, 5.0), 1);
    }

    #[test]
    fn chain_seeds_boundary_from_storyboard() {
        let boundaries: BTreeMap<usize, usize> = [(0, 0), (2, 1)].into_iter().collect();
        let chain = ContinuationChain::new(boundaries);
        let images = vec![storyboard(0), storyboard(1)];

        match chain.seed_for(0, &images) {
            SeedSource::Storyboard { beat_index, .. } => assert_eq!(beat_index, 0),
            other => panic!("expected storyboard seed, got {:?}", other),
        }
    }

    #[test]
    fn chain_seeds_continuation_from_previous_frame() {
        let boundaries: BTreeMap<usize, usize> = [(0, 0)].into_iter().collect();
        let mut chain = ContinuationChain::new(boundaries);
        let images = vec![storyboard(0)];

        chain.record_frame(0, Some(AssetRef::new("frames/0.png")));
        match chain.seed_for(1, &images) {
            SeedSource::PriorFrame { chunk_index, asset } => {
                assert_eq!(chunk_index, 0);
                assert_eq!(asset, AssetRef::new("frames/0.png"));
            }
            other => panic!("expected prior-frame seed, got {:?}", other),
        }
    }

    #[test]
    fn missing_frame_falls_back_to_text_only() {
        let boundaries: BTreeMap<usize, usize> = [(0, 0)].into_iter().collect();
        let mut chain = ContinuationChain::new(boundaries);
        let images = vec![storyboard(0)];

        chain.record_frame(0, None);
        assert_eq!(chain.seed_for(1, &images), SeedSource::TextOnly);
    }

    #[test]
    fn chunk_zero_without_boundary_is_text_only() {
        // Malformed input: no boundary entry for chunk 0.
        let chain = ContinuationChain::new(BTreeMap::new());
        assert_eq!(chain.seed_for(0, &[]), SeedSource::TextOnly);
    }
}
