//! Whole-path dimension estimate for recorded point sequences.
//!
//! Offline counterpart to the streaming engine: measures an already
//! collected path at two chord scales and applies the same two-scale
//! relation. Coarser than the compass walk, but cheap and dependency-free,
//! which makes it useful for sanity checks and batch jobs.

use crate::compass::two_scale_dimension;
use crate::point::Point3D;

/// Estimate the fractal dimension of a complete path.
///
/// Returns 0.0 for degenerate inputs: fewer than two points, non-positive
/// or equal scales, or a zero-length path.
pub fn path_dimension(points: &[Point3D], min_scale: f64, max_scale: f64) -> f64 {
    if min_scale <= 0.0 || max_scale <= 0.0 || points.len() < 2 {
        return 0.0;
    }

    let min_length = measured_length(points, min_scale);
    let max_length = measured_length(points, max_scale);

    two_scale_dimension(min_length, max_length, min_scale, max_scale).unwrap_or(0.0)
}

/// Total length measured by striding the polyline in chords of at least
/// `scale`: from each start vertex, accumulate segment lengths until the
/// accumulated chord reaches the scale, then restart from the vertex
/// reached.
fn measured_length(points: &[Point3D], scale: f64) -> f64 {
    let mut total = 0.0;
    let mut i = 0;
    while i < points.len() - 1 {
        let mut j = i + 1;
        let mut accumulated = 0.0;
        while j < points.len() && accumulated < scale {
            accumulated += points[j - 1].distance(points[j]);
            j += 1;
        }
        total += accumulated;
        i = j - 1;
    }
    total
}
