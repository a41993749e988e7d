//! Real-time fractal path analysis engine.
//!
//! Estimates the fractal dimension D of a moving subject's path as readings
//! arrive, without storing the path itself. Path length is measured at two
//! compass radii (a min and a max scale, both tied to the running mean step
//! size) by walking fixed-radius spheres along the path; D then follows from
//! the two-scale dividers relation D ≈ 1 − Δlog(length)/Δlog(scale). Four
//! phase-offset walks per scale smooth the estimate.
//!
//! Zero I/O — pure math engine with no opinions about transport or
//! persistence. Adapters and exporters live in `fpa-store`.

pub mod batch;
pub mod compass;
pub mod constants;
pub mod geometry;
pub mod point;
pub mod time;
pub mod tracker;

pub use batch::path_dimension;
pub use compass::{PathCompass, two_scale_dimension};
pub use constants::{
    ANCHOR_COUNT, DEFAULT_MAX_MULTIPLIER, DEFAULT_MIN_MULTIPLIER, DEFAULT_PATH_TIMEOUT_SECS,
    EPSILON,
};
pub use geometry::line_sphere_intersect;
pub use point::Point3D;
pub use time::{iso8601_to_unix, now_unix_secs, unix_to_iso8601};
pub use tracker::{Ingested, PathTracker};
