use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

/// Tolerance for comparing timeline offsets, in seconds.
pub const TIME_EPSILON: f64 = 1e-3;

/// Ordered narrative unit of the script with a shot type and time range.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Beat {
    pub id: String,
    /// 0-based, matches array position in the spec.
    pub index: usize,
    /// Start offset in seconds from the beginning of the ad.
    pub start: f64,
    /// Duration in seconds, strictly positive.
    pub duration: f64,
    pub shot_type: String,
    pub camera_movement: String,
    /// Composed natural-language scene prompt.
    pub prompt: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AudioIntent {
    pub music_style: Option<String>,
    pub voiceover: Option<String>,
    pub sound_effects: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrandKit {
    pub name: String,
    pub colors: Vec<String>,
    pub music: Option<String>,
}

/// Frozen output of the planning phase. Created once, read-only thereafter;
/// phases that augment the working state never mutate the spec in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoSpec {
    pub template_id: String,
    pub total_duration: f64,
    pub frame_rate: u32,
    pub resolution: Resolution,
    pub style: String,
    pub beats: Vec<Beat>,
    pub audio: AudioIntent,
    pub brand: Option<BrandKit>,
}

impl VideoSpec {
    /// Check the beat timeline invariants: contiguous, non-overlapping,
    /// starting at zero and summing to the target duration.
    pub fn validate(&self) -> Result<()> {
        if self.total_duration <= 0.0 {
            return Err(PipelineError::validation("total duration must be positive"));
        }
        if self.frame_rate == 0 {
            return Err(PipelineError::validation("frame rate must be positive"));
        }
        if self.beats.is_empty() {
            return Err(PipelineError::validation("spec has no beats"));
        }

        let mut cursor = 0.0;
        for (i, beat) in self.beats.iter().enumerate() {
            if beat.index != i {
                return Err(PipelineError::validation(format!(
                    "beat {} has index {}, expected {}",
                    beat.id, beat.index, i
                )));
            }
            if beat.duration <= 0.0 {
                return Err(PipelineError::validation(format!(
                    "beat {} has non-positive duration {}",
                    beat.id, beat.duration
                )));
            }
            if (beat.start - cursor).abs() > TIME_EPSILON {
                return Err(PipelineError::validation(format!(
                    "beat {} starts at {}s, expected {}s (beats must be contiguous)",
                    beat.id, beat.start, cursor
                )));
            }
            cursor += beat.duration;
        }

        if (cursor - self.total_duration).abs() > TIME_EPSILON {
            return Err(PipelineError::validation(format!(
                "beat durations sum to {}s, spec targets {}s",
                cursor, self.total_duration
            )));
        }

        Ok(())
    }

    /// Beat whose time range contains the given offset.
    pub fn beat_at(&self, offset: f64) -> Option<&Beat> {
        self.beats
            .iter()
            .find(|b| offset + TIME_EPSILON >= b.start && offset + TIME_EPSILON < b.start + b.duration)
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

    fn spec(beats: Vec<Beat>, total: f64) -> VideoSpec {
        VideoSpec {
            template_id: "product-hero".to_string(),
            total_duration: total,
            frame_rate: 24,
            resolution: Resolution {
                width: 1080,
                height: 1920,
            },
            style: "cinematic".to_string(),
            beats,
            audio: AudioIntent::default(),
            brand: None,
        }
    }

    #[test]
    fn valid_contiguous_beats_pass() {
        let s = spec(vec![beat(0, 0.0, 10.0), beat(1, 10.0, 5.0), beat(2, 15.0, 5.0)], 20.0);
        assert!(s.validate().is_ok());
    }

    #[test]
    fn gap_between_beats_is_rejected() {
        let s = spec(vec![beat(0, 0.0, 10.0), beat(1, 11.0, 5.0)], 16.0);
        let err = s.validate().unwrap_err();
        assert!(err.to_string().contains("contiguous"));
    }

    #[test]
    fn first_beat_must_start_at_zero() {
        let s = spec(vec![beat(0, 1.0, 5.0)], 6.0);
        assert!(s.validate().is_err());
    }

    #[test]
    fn duration_sum_must_match_target() {
        let s = spec(vec![beat(0, 0.0, 10.0), beat(1, 10.0, 5.0)], 20.0);
        let err = s.validate().unwrap_err();
        assert!(err.to_string().contains("sum"));
    }

    #[test]
    fn beat_at_resolves_containing_beat() {
        let s = spec(vec![beat(0, 0.0, 10.0), beat(1, 10.0, 5.0), beat(2, 15.0, 5.0)], 20.0);
        assert_eq!(s.beat_at(0.0).unwrap().index, 0);
        assert_eq!(s.beat_at(10.0).unwrap().index, 1);
        assert_eq!(s.beat_at(12.5).unwrap().index, 1);
        assert!(s.beat_at(20.0).is_none());
    }
}
