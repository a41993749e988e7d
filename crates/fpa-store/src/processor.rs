//! Batch processing pipeline: cleaned samples → tracker → finished segments.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use fpa_core::{
    DEFAULT_MAX_MULTIPLIER, DEFAULT_MIN_MULTIPLIER, DEFAULT_PATH_TIMEOUT_SECS, Ingested,
    PathCompass, PathTracker, Point3D,
};

use crate::adapter::GazeRecording;
use crate::error::Result;

/// Pipeline configuration, loadable from TOML. Every field has a default,
/// so a config file only needs the keys it overrides.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessorConfig {
    pub min_multiplier: f64,
    pub max_multiplier: f64,
    pub path_timeout_secs: f64,
    /// Gaze data is 2D; the plane constraint stays on unless a caller is
    /// feeding genuine 3D trajectories.
    pub constrain_to_plane: bool,
    pub velocity_mode: bool,
    /// Stop after this many samples, for quick looks at long recordings.
    pub max_points: Option<usize>,
    /// Process only this subject, skipping other recordings entirely.
    pub subject_filter: Option<String>,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            min_multiplier: DEFAULT_MIN_MULTIPLIER,
            max_multiplier: DEFAULT_MAX_MULTIPLIER,
            path_timeout_secs: DEFAULT_PATH_TIMEOUT_SECS,
            constrain_to_plane: true,
            velocity_mode: false,
            max_points: None,
            subject_filter: None,
        }
    }
}

impl ProcessorConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }
}

/// Drives a [`PathTracker`] over recordings and collects every finished
/// segment, including the ones still open when input ends.
pub struct Processor {
    config: ProcessorConfig,
    tracker: PathTracker,
    finished: Vec<PathCompass>,
    point_count: usize,
}

impl Processor {
    pub fn new(config: ProcessorConfig) -> Self {
        let mut tracker = PathTracker::new(
            config.min_multiplier,
            config.max_multiplier,
            config.path_timeout_secs,
        );
        tracker.constrain_to_plane = config.constrain_to_plane;
        tracker.velocity_mode = config.velocity_mode;
        Self {
            config,
            tracker,
            finished: Vec::new(),
            point_count: 0,
        }
    }

    /// Feed one recording through the tracker. Returns how many samples
    /// were consumed (less than the recording length once `max_points`
    /// trips).
    pub fn process_recording(&mut self, recording: &GazeRecording) -> usize {
        if let Some(filter) = &self.config.subject_filter
            && *filter != recording.subject_id
        {
            tracing::debug!("skipping subject {} (filtered)", recording.subject_id);
            return 0;
        }

        let mut consumed = 0;
        for sample in &recording.samples {
            if let Some(max) = self.config.max_points
                && self.point_count >= max
            {
                tracing::info!("max_points reached at {max} samples");
                break;
            }

            let point = Point3D::new(sample.x, sample.y, 0.0);
            let outcome = self
                .tracker
                .new_reading(&recording.subject_id, point, sample.timestamp);
            if let Ingested::Restarted(segment) = outcome {
                tracing::debug!(
                    "segment closed for {}: {} steps, D = {:.4}",
                    segment.subject_id,
                    segment.step_count,
                    segment.dimension
                );
                self.finished.push(segment);
            }

            self.point_count += 1;
            consumed += 1;
            if self.point_count % 10_000 == 0 {
                tracing::debug!("processed {} samples", self.point_count);
            }
        }
        consumed
    }

    /// Live (unfinished) state for a subject.
    pub fn current(&self, subject_id: &str) -> Option<&PathCompass> {
        self.tracker.get(subject_id)
    }

    pub fn point_count(&self) -> usize {
        self.point_count
    }

    /// Close all open segments and return every segment seen, in the order
    /// they finished (timeout-closed first, then end-of-input by subject).
    pub fn finish(mut self) -> Vec<PathCompass> {
        self.finished.extend(self.tracker.finish_all());
        self.finished
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::GazeSample;

    fn recording(subject: &str, samples: Vec<GazeSample>) -> GazeRecording {
        GazeRecording {
            subject_id: subject.to_string(),
            samples,
        }
    }

    fn line_samples(n: usize, dt: f64) -> Vec<GazeSample> {
        (0..n)
            .map(|k| GazeSample {
                timestamp: k as f64 * dt,
                x: 10.0 * k as f64,
                y: 0.0,
            })
            .collect()
    }

    #[test]
    fn test_config_defaults() {
        let config = ProcessorConfig::default();
        assert_eq!(config.min_multiplier, 0.5);
        assert_eq!(config.max_multiplier, 10.0);
        assert_eq!(config.path_timeout_secs, 60.0);
        assert!(config.constrain_to_plane);
        assert!(!config.velocity_mode);
        assert_eq!(config.max_points, None);
        assert_eq!(config.subject_filter, None);
    }

    #[test]
    fn test_config_partial_toml() {
        let config =
            ProcessorConfig::from_toml_str("max_multiplier = 5.0\nmax_points = 100\n").unwrap();
        assert_eq!(config.max_multiplier, 5.0);
        assert_eq!(config.max_points, Some(100));
        // Untouched keys keep their defaults
        assert_eq!(config.min_multiplier, 0.5);
        assert!(config.constrain_to_plane);
    }

    #[test]
    fn test_config_rejects_malformed_toml() {
        assert!(ProcessorConfig::from_toml_str("min_multiplier = \"fast\"").is_err());
    }

    #[test]
    fn test_single_recording_single_segment() {
        let config = ProcessorConfig {
            max_multiplier: 5.0,
            ..ProcessorConfig::default()
        };
        let mut processor = Processor::new(config);
        processor.process_recording(&recording("s1", line_samples(8, 1.0)));

        let live = processor.current("s1").unwrap();
        assert_eq!(live.step_count, 7);
        assert!(live.dimension > 0.9 && live.dimension < 1.1);

        let segments = processor.finish();
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].subject_id, "s1");
    }

    #[test]
    fn test_timeout_gap_produces_two_segments() {
        let mut samples = line_samples(5, 1.0);
        // Resume far in the future from a different spot
        for k in 0..5 {
            samples.push(GazeSample {
                timestamp: 500.0 + k as f64,
                x: 1000.0 + 10.0 * k as f64,
                y: 0.0,
            });
        }
        let mut processor = Processor::new(ProcessorConfig::default());
        processor.process_recording(&recording("s1", samples));

        let segments = processor.finish();
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].step_count, 4);
        assert_eq!(segments[1].start_timestamp, 500.0);
    }

    #[test]
    fn test_multiple_recordings_keep_subjects_separate() {
        let mut processor = Processor::new(ProcessorConfig::default());
        processor.process_recording(&recording("a", line_samples(5, 1.0)));
        processor.process_recording(&recording("b", line_samples(3, 1.0)));

        let segments = processor.finish();
        assert_eq!(segments.len(), 2);
        let ids: Vec<&str> = segments.iter().map(|s| s.subject_id.as_str()).collect();
        assert_eq!(ids, ["a", "b"]);
        assert_eq!(segments[0].step_count, 4);
        assert_eq!(segments[1].step_count, 2);
    }

    #[test]
    fn test_max_points_stops_consumption() {
        let config = ProcessorConfig {
            max_points: Some(3),
            ..ProcessorConfig::default()
        };
        let mut processor = Processor::new(config);
        let consumed = processor.process_recording(&recording("s1", line_samples(10, 1.0)));
        assert_eq!(consumed, 3);
        assert_eq!(processor.point_count(), 3);
        assert_eq!(processor.current("s1").unwrap().step_count, 2);
    }

    #[test]
    fn test_subject_filter_skips_other_recordings() {
        let config = ProcessorConfig {
            subject_filter: Some("keep".to_string()),
            ..ProcessorConfig::default()
        };
        let mut processor = Processor::new(config);
        assert_eq!(
            processor.process_recording(&recording("drop", line_samples(5, 1.0))),
            0
        );
        assert_eq!(
            processor.process_recording(&recording("keep", line_samples(5, 1.0))),
            5
        );

        let segments = processor.finish();
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].subject_id, "keep");
    }

    #[test]
    fn test_plane_constraint_passed_through() {
        let config = ProcessorConfig {
            constrain_to_plane: false,
            ..ProcessorConfig::default()
        };
        let processor = Processor::new(config);
        assert!(!processor.tracker.constrain_to_plane);
    }
}
