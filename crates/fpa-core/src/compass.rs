use serde::{Deserialize, Serialize};

use crate::constants::ANCHOR_COUNT;
use crate::geometry::line_sphere_intersect;
use crate::point::Point3D;

/// Per-subject, per-segment state for the streaming fractal estimator.
///
/// Carries four "compass anchors" per scale — the trailing ends of four
/// phase-offset sphere walks along the path. Each anchor remembers where its
/// last hop landed and resumes from there, so a new reading costs O(1) work
/// per anchor per scale instead of re-walking the whole path.
///
/// Fields are public for inspection and export; the tracker owns the one
/// live instance per subject and is the only writer.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PathCompass {
    pub subject_id: String,
    /// Last accepted position.
    pub position: Point3D,
    pub start_timestamp: f64,
    /// Timestamp of the last accepted reading.
    pub end_timestamp: f64,
    pub min_multiplier: f64,
    pub max_multiplier: f64,

    /// Trailing walk positions at the fine scale. Slots fill 0→3, one per
    /// accepted reading, then stay occupied for the life of the segment.
    pub min_anchors: [Option<Point3D>; ANCHOR_COUNT],
    /// Trailing walk positions at the coarse scale.
    pub max_anchors: [Option<Point3D>; ANCHOR_COUNT],
    /// Accumulated walked length per fine-scale anchor.
    pub min_path_length: [f64; ANCHOR_COUNT],
    /// Accumulated walked length per coarse-scale anchor.
    pub max_path_length: [f64; ANCHOR_COUNT],

    pub total_path_length: f64,
    pub step_count: u32,
    pub mean_step_size: f64,
    /// `mean_step_size * min_multiplier`, refreshed every accepted reading.
    pub min_step_size: f64,
    /// `mean_step_size * max_multiplier`, refreshed every accepted reading.
    pub max_step_size: f64,

    pub velocity_mode: bool,
    /// Seconds between the two most recent accepted readings.
    pub step_time: f64,
    pub step_velocity: f64,
    pub total_step_velocity: f64,
    pub mean_step_velocity: f64,
    pub min_step_velocity: f64,
    pub max_step_velocity: f64,

    /// Latest fractal dimension estimate. 0.0 until both scales have
    /// accumulated length on at least one anchor.
    pub dimension: f64,
}

impl PathCompass {
    /// Start a new segment at `position`. Anchor slot 0 of both scale arrays
    /// is seeded with the starting position; slots 1–3 fill as readings
    /// arrive.
    pub fn new(
        subject_id: &str,
        position: Point3D,
        timestamp: f64,
        min_multiplier: f64,
        max_multiplier: f64,
    ) -> Self {
        let mut anchors = [None; ANCHOR_COUNT];
        anchors[0] = Some(position);
        Self {
            subject_id: subject_id.to_string(),
            position,
            start_timestamp: timestamp,
            end_timestamp: timestamp,
            min_multiplier,
            max_multiplier,
            min_anchors: anchors,
            max_anchors: anchors,
            min_path_length: [0.0; ANCHOR_COUNT],
            max_path_length: [0.0; ANCHOR_COUNT],
            total_path_length: 0.0,
            step_count: 0,
            mean_step_size: 0.0,
            min_step_size: 0.0,
            max_step_size: 0.0,
            velocity_mode: false,
            step_time: 0.0,
            step_velocity: 0.0,
            total_step_velocity: 0.0,
            mean_step_velocity: 0.0,
            min_step_velocity: 0.0,
            max_step_velocity: 0.0,
            dimension: 0.0,
        }
    }

    /// Fold one accepted continuation reading into the running state and
    /// refresh the dimension estimate.
    ///
    /// The caller (the tracker) has already decided this reading continues
    /// the current segment; duplicates and timeouts never reach here.
    pub fn add_point(&mut self, point: Point3D, timestamp: f64, constrain_to_plane: bool) {
        self.step_count += 1;

        let step = if constrain_to_plane {
            self.position.xy_distance(point)
        } else {
            self.position.distance(point)
        };

        self.total_path_length += step;
        self.mean_step_size = self.total_path_length / self.step_count as f64;

        self.step_time = timestamp - self.end_timestamp;
        self.end_timestamp = timestamp;

        // Velocity mode normalizes the measurement scales by time. A
        // non-positive step_time (duplicate or out-of-order timestamp) would
        // divide by zero or flip signs, so the normalization is skipped for
        // that reading and the scales stay distance-based.
        if self.velocity_mode && self.step_time > 0.0 {
            self.step_velocity = step / self.step_time;
            self.total_step_velocity += self.step_velocity;
            self.mean_step_velocity = self.total_step_velocity / self.step_count as f64;
            self.mean_step_size /= self.step_time;
            self.min_step_velocity = self.mean_step_velocity * self.min_multiplier;
            self.max_step_velocity = self.mean_step_velocity * self.max_multiplier;
        }

        self.min_step_size = self.mean_step_size * self.min_multiplier;
        self.max_step_size = self.mean_step_size * self.max_multiplier;

        self.position = point;

        // Fill at most one empty anchor slot per reading, in order 0→3,
        // mirrored across both scale arrays.
        for i in 0..ANCHOR_COUNT {
            if self.min_anchors[i].is_none() {
                self.min_anchors[i] = Some(self.position);
                self.max_anchors[i] = Some(self.position);
                break;
            }
        }

        self.recompute(constrain_to_plane, self.velocity_mode);
    }

    /// Walk the anchors toward the current position at both scales, then
    /// re-derive the dimension estimate from the accumulated lengths.
    ///
    /// D = 1 − Δlog₁₀(length)/Δlog₁₀(scale), averaged over the anchors with
    /// a valid estimate; 0.0 when none is valid (degenerate scales included).
    pub fn recompute(&mut self, constrain_to_plane: bool, use_velocity: bool) {
        let mut target = self.position;
        if constrain_to_plane {
            target.z = 0.0;
        }

        let (min_scale, max_scale) = if use_velocity {
            (self.min_step_velocity, self.max_step_velocity)
        } else {
            (self.min_step_size, self.max_step_size)
        };

        walk_anchors(
            &mut self.min_anchors,
            min_scale,
            &mut self.min_path_length,
            target,
            constrain_to_plane,
        );
        walk_anchors(
            &mut self.max_anchors,
            max_scale,
            &mut self.max_path_length,
            target,
            constrain_to_plane,
        );

        let mut sum = 0.0;
        let mut valid = 0u32;
        for i in 0..ANCHOR_COUNT {
            if let Some(fd) = two_scale_dimension(
                self.min_path_length[i],
                self.max_path_length[i],
                min_scale,
                max_scale,
            ) {
                sum += fd;
                valid += 1;
            }
        }
        self.dimension = if valid > 0 { sum / valid as f64 } else { 0.0 };
    }
}

/// Advance each set anchor toward `target` in hops of exactly one radius.
///
/// An anchor hops while the target is at least one radius away: the sphere
/// of radius `scale` around the anchor is intersected with the segment
/// anchor→target, the crossing nearer the target becomes the new anchor, and
/// the accumulator gains one radius — the compass advances a fixed arc
/// length per hop by construction. Once the target is within one radius the
/// walk moves on to the next anchor; it resumes from the parked position
/// when a later reading pulls the target far enough away again.
///
/// A hop that fails to strictly reduce the anchor→target distance (clamped
/// intersections can park on the anchor itself) stalls the anchor for this
/// call instead of walking in place. Zero or negative scale skips the anchor
/// entirely; both are expected states, not errors.
fn walk_anchors(
    anchors: &mut [Option<Point3D>; ANCHOR_COUNT],
    scale: f64,
    lengths: &mut [f64; ANCHOR_COUNT],
    target: Point3D,
    constrain_to_plane: bool,
) {
    let mut i = 0;
    while i < ANCHOR_COUNT {
        let Some(stored) = anchors[i] else { break };

        if scale <= 0.0 || !scale.is_finite() {
            i += 1;
            continue;
        }

        let anchor = if constrain_to_plane {
            stored.xy_flattened()
        } else {
            stored
        };

        // A non-finite distance (NaN coordinates upstream) must park the
        // anchor: every NaN comparison below would read as "keep hopping".
        let dist = anchor.distance(target);
        if !dist.is_finite() || dist < scale {
            // Not enough path yet; the walk resumes on a later reading
            i += 1;
            continue;
        }

        let hits = line_sphere_intersect(anchor, target, anchor, scale, true);
        if hits.is_empty() {
            i += 1;
            continue;
        }

        let next = if hits.len() == 1 || hits[0].distance(target) < hits[1].distance(target) {
            hits[0]
        } else {
            hits[1]
        };

        let new_dist = next.distance(target);
        if new_dist >= dist {
            // Stalled hop; leave the anchor where it is
            i += 1;
            continue;
        }

        lengths[i] += scale;
        anchors[i] = Some(next);

        if new_dist <= scale {
            // Landed within one radius of the target: this anchor is done
            // for now. Otherwise stay on the same index and keep hopping.
            i += 1;
        }
    }
}

/// Two-scale compass dimension: D = 1 − Δlog₁₀(length)/Δlog₁₀(scale).
///
/// Returns `None` for non-positive lengths or scales, equal scales (zero
/// log-scale difference), or a non-finite result. Shared by the streaming
/// engine (per anchor) and the batch utility.
pub fn two_scale_dimension(
    min_length: f64,
    max_length: f64,
    min_scale: f64,
    max_scale: f64,
) -> Option<f64> {
    if min_length <= 0.0 || max_length <= 0.0 || min_scale <= 0.0 || max_scale <= 0.0 {
        return None;
    }
    let log_length_diff = min_length.log10() - max_length.log10();
    let log_scale_diff = min_scale.log10() - max_scale.log10();
    if log_scale_diff == 0.0 {
        return None;
    }
    let fd = 1.0 - log_length_diff / log_scale_diff;
    fd.is_finite().then_some(fd)
}
