use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::mem;

use serde::{Deserialize, Serialize};

use crate::compass::PathCompass;
use crate::constants::{
    DEFAULT_MAX_MULTIPLIER, DEFAULT_MIN_MULTIPLIER, DEFAULT_PATH_TIMEOUT_SECS,
};
use crate::point::Point3D;

/// Outcome of feeding one reading to [`PathTracker::new_reading`].
#[derive(Debug)]
pub enum Ingested {
    /// First reading for this subject; a new segment was opened.
    Started,
    /// The reading extended the subject's current segment.
    Continued,
    /// Position identical to the last accepted one; reading dropped.
    Duplicate,
    /// The gap since the last reading exceeded the timeout. The finished
    /// segment is returned and a fresh one was opened at this reading.
    Restarted(PathCompass),
}

/// Multi-subject dispatcher: routes readings to per-subject [`PathCompass`]
/// state and handles segment lifecycle (start, duplicate drop, timeout
/// rollover).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PathTracker {
    pub min_multiplier: f64,
    pub max_multiplier: f64,
    /// Maximum gap between consecutive readings before the segment is
    /// closed and a new one opened.
    pub path_timeout_secs: f64,
    pub velocity_mode: bool,
    /// Measure in the XY plane only, ignoring z throughout.
    pub constrain_to_plane: bool,
    paths: HashMap<String, PathCompass>,
}

impl Default for PathTracker {
    fn default() -> Self {
        Self::new(
            DEFAULT_MIN_MULTIPLIER,
            DEFAULT_MAX_MULTIPLIER,
            DEFAULT_PATH_TIMEOUT_SECS,
        )
    }
}

impl PathTracker {
    pub fn new(min_multiplier: f64, max_multiplier: f64, path_timeout_secs: f64) -> Self {
        Self {
            min_multiplier,
            max_multiplier,
            path_timeout_secs,
            velocity_mode: false,
            constrain_to_plane: false,
            paths: HashMap::new(),
        }
    }

    /// Feed one reading. Ordering matters: an unknown subject starts a
    /// segment, a repeated position is dropped before the timeout is
    /// consulted, and only then does a stale segment roll over.
    pub fn new_reading(&mut self, subject_id: &str, point: Point3D, timestamp: f64) -> Ingested {
        let compass = match self.paths.entry(subject_id.to_string()) {
            Entry::Vacant(slot) => {
                let mut fresh = PathCompass::new(
                    subject_id,
                    point,
                    timestamp,
                    self.min_multiplier,
                    self.max_multiplier,
                );
                fresh.velocity_mode = self.velocity_mode;
                slot.insert(fresh);
                return Ingested::Started;
            }
            Entry::Occupied(slot) => slot.into_mut(),
        };

        let repeated = if self.constrain_to_plane {
            compass.position.x == point.x && compass.position.y == point.y
        } else {
            compass.position == point
        };
        if repeated {
            return Ingested::Duplicate;
        }

        // Absolute gap: a reading that jumps backward in time by more than
        // the timeout also closes the segment.
        if (timestamp - compass.end_timestamp).abs() > self.path_timeout_secs {
            let mut fresh = PathCompass::new(
                subject_id,
                point,
                timestamp,
                compass.min_multiplier,
                compass.max_multiplier,
            );
            fresh.velocity_mode = compass.velocity_mode;
            let finished = mem::replace(compass, fresh);
            return Ingested::Restarted(finished);
        }

        compass.add_point(point, timestamp, self.constrain_to_plane);
        Ingested::Continued
    }

    /// Current segment state for a subject, if any readings have arrived.
    pub fn get(&self, subject_id: &str) -> Option<&PathCompass> {
        self.paths.get(subject_id)
    }

    /// Latest dimension estimate for a subject, 0.0 when unknown.
    pub fn dimension(&self, subject_id: &str) -> f64 {
        self.paths.get(subject_id).map_or(0.0, |c| c.dimension)
    }

    pub fn subject_count(&self) -> usize {
        self.paths.len()
    }

    pub fn subjects(&self) -> impl Iterator<Item = &str> {
        self.paths.keys().map(String::as_str)
    }

    /// Close and remove one subject's segment.
    pub fn finish(&mut self, subject_id: &str) -> Option<PathCompass> {
        self.paths.remove(subject_id)
    }

    /// Close every open segment, e.g. at end of input. Order is by subject
    /// id so downstream output is deterministic.
    pub fn finish_all(&mut self) -> Vec<PathCompass> {
        let mut finished: Vec<PathCompass> = self.paths.drain().map(|(_, c)| c).collect();
        finished.sort_by(|a, b| a.subject_id.cmp(&b.subject_id));
        finished
    }
}
