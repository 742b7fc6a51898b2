//! Stitch-plan arithmetic. The actual concatenation is performed by the
//! media-stitching collaborator; this module predicts the output duration
//! and checks the measured result against the spec target.

/// Overlap trimming convention: the first chunk contributes its full
/// duration, every later chunk contributes `chunk_duration - overlap`.
pub fn expected_duration(chunk_duration: f64, overlap: f64, chunk_count: usize) -> f64 {
    match chunk_count {
        0 => 0.0,
        n => chunk_duration + (n as f64 - 1.0) * (chunk_duration - overlap),
    }
}

/// Drift of the measured stitched duration outside the tolerance band
/// around the target, if any. Drift is a warning, never fatal: slight
/// deviation is an accepted characteristic of model-generated chunks.
pub fn duration_drift(measured: f64, target: f64, tolerance: f64) -> Option<f64> {
    let delta = (measured - target).abs();
    if delta > tolerance {
        Some(delta - tolerance)
    } else {
        None
    }
}
