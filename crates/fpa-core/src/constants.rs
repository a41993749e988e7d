/// Number of phase-offset compass walks maintained per scale.
pub const ANCHOR_COUNT: usize = 4;

/// Default ratio of the fine compass radius to the mean step size.
pub const DEFAULT_MIN_MULTIPLIER: f64 = 0.5;

/// Default ratio of the coarse compass radius to the mean step size.
pub const DEFAULT_MAX_MULTIPLIER: f64 = 10.0;

/// Default seconds of silence after which a subject's path segment ends.
pub const DEFAULT_PATH_TIMEOUT_SECS: f64 = 60.0;

/// Numerical tolerance for near-boundary comparisons.
///
/// Used when filtering clamped line–sphere intersections: a point landing one
/// ulp outside the compass radius must still count as on the sphere, or a
/// grazing hop degenerates into zero progress.
pub const EPSILON: f64 = 1e-10;
