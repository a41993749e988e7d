//! CSV ingest for gaze recordings.
//!
//! Recordings carry one row per sample with a `Time` column and per-eye
//! coordinate columns (`Left-X`, `Left-Y`, `Right-X`, `Right-Y`). The
//! subject id is taken from the file stem. Cleanup on ingest: rows with
//! missing or non-numeric coordinates are skipped, duplicate timestamps keep
//! the first occurrence, and samples are sorted by time before processing.

use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use fpa_core::iso8601_to_unix;

use crate::error::{Result, StoreError};

/// Which eye's coordinate columns to read.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Eye {
    Left,
    Right,
}

impl Eye {
    fn x_column(self) -> &'static str {
        match self {
            Eye::Left => "Left-X",
            Eye::Right => "Right-X",
        }
    }

    fn y_column(self) -> &'static str {
        match self {
            Eye::Left => "Left-Y",
            Eye::Right => "Right-Y",
        }
    }
}

impl fmt::Display for Eye {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Eye::Left => write!(f, "left"),
            Eye::Right => write!(f, "right"),
        }
    }
}

impl FromStr for Eye {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "left" => Ok(Eye::Left),
            "right" => Ok(Eye::Right),
            other => Err(format!("unknown eye '{other}' (expected left or right)")),
        }
    }
}

/// One cleaned gaze sample. Gaze is 2D; z is fixed at 0 downstream.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GazeSample {
    pub timestamp: f64,
    pub x: f64,
    pub y: f64,
}

/// A parsed recording: the subject id plus its time-ordered samples.
#[derive(Clone, Debug)]
pub struct GazeRecording {
    pub subject_id: String,
    pub samples: Vec<GazeSample>,
}

// ---------------------------------------------------------------------------
// Pure parsing helpers (no I/O, fully unit-testable)
// ---------------------------------------------------------------------------

struct Columns {
    time: usize,
    x: usize,
    y: usize,
}

fn split_line(line: &str) -> Vec<&str> {
    line.split(',').map(str::trim).collect()
}

fn parse_header(line: &str, eye: Eye) -> Result<Columns> {
    let fields = split_line(line);
    let find = |name: &str| fields.iter().position(|f| *f == name);

    let mut missing = Vec::new();
    let time = find("Time");
    let x = find(eye.x_column());
    let y = find(eye.y_column());
    for (col, name) in [
        (&time, "Time"),
        (&x, eye.x_column()),
        (&y, eye.y_column()),
    ] {
        if col.is_none() {
            missing.push(name);
        }
    }
    match (time, x, y) {
        (Some(time), Some(x), Some(y)) => Ok(Columns { time, x, y }),
        _ => Err(StoreError::InvalidData(format!(
            "missing required columns: {missing:?}"
        ))),
    }
}

/// Timestamps appear either as fractional Unix seconds or as ISO-8601 text.
fn parse_timestamp(field: &str) -> Option<f64> {
    if let Ok(secs) = field.parse::<f64>() {
        return secs.is_finite().then_some(secs);
    }
    iso8601_to_unix(field)
}

fn parse_coordinate(field: &str) -> Option<f64> {
    let value = field.parse::<f64>().ok()?;
    value.is_finite().then_some(value)
}

/// Parse CSV content into cleaned samples.
///
/// `clip_range`, when set, clamps raw coordinates before `scale_factor` is
/// applied (normalized gaze in [0,1] can then be scaled to screen pixels).
pub fn parse_recording(
    content: &str,
    eye: Eye,
    scale_factor: f64,
    clip_range: Option<(f64, f64)>,
) -> Result<Vec<GazeSample>> {
    let mut lines = content.lines().filter(|l| !l.trim().is_empty());
    let header = lines
        .next()
        .ok_or_else(|| StoreError::InvalidData("empty recording".to_string()))?;
    let columns = parse_header(header, eye)?;

    let mut samples = Vec::new();
    let mut seen_timestamps = HashSet::new();
    let mut skipped = 0usize;

    for line in lines {
        let fields = split_line(line);
        let parsed = (|| {
            let timestamp = parse_timestamp(fields.get(columns.time)?)?;
            let x = parse_coordinate(fields.get(columns.x)?)?;
            let y = parse_coordinate(fields.get(columns.y)?)?;
            Some((timestamp, x, y))
        })();
        let Some((timestamp, mut x, mut y)) = parsed else {
            skipped += 1;
            continue;
        };

        // Keep the first sample for each timestamp
        if !seen_timestamps.insert(timestamp.to_bits()) {
            continue;
        }

        if let Some((lo, hi)) = clip_range {
            x = x.clamp(lo, hi);
            y = y.clamp(lo, hi);
        }

        samples.push(GazeSample {
            timestamp,
            x: x * scale_factor,
            y: y * scale_factor,
        });
    }

    if skipped > 0 {
        tracing::debug!("skipped {skipped} rows with missing or non-numeric fields");
    }

    // Stable sort preserves file order among equal timestamps
    samples.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));
    Ok(samples)
}

// ---------------------------------------------------------------------------
// I/O wrappers (thin shells around pure logic)
// ---------------------------------------------------------------------------

/// Read and parse a recording file. The subject id is the file stem.
pub fn load_gaze_csv(
    path: &Path,
    eye: Eye,
    scale_factor: f64,
    clip_range: Option<(f64, f64)>,
) -> Result<GazeRecording> {
    let subject_id = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .ok_or_else(|| {
            StoreError::InvalidData(format!("no file stem in path: {}", path.display()))
        })?;

    let content = fs::read_to_string(path)?;
    let samples = parse_recording(&content, eye, scale_factor, clip_range)?;
    tracing::info!(
        "loaded {} samples for subject {subject_id} from {}",
        samples.len(),
        path.display()
    );

    Ok(GazeRecording {
        subject_id,
        samples,
    })
}
