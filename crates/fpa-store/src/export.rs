//! Report output: finished segments as CSV or JSON.

use std::fs;
use std::path::Path;

use fpa_core::{PathCompass, unix_to_iso8601};

use crate::error::{Result, StoreError};

const CSV_HEADER: &str =
    "subject_id,start_time,end_time,steps,path_length,mean_step_size,dimension";

/// Render segments as a summary CSV, one row per segment. Timestamps are
/// ISO-8601 when they look like Unix seconds, raw otherwise (synthetic
/// fixtures use small counters).
pub fn segments_to_csv(segments: &[PathCompass]) -> String {
    let mut out = String::from(CSV_HEADER);
    out.push('\n');
    for s in segments {
        out.push_str(&format!(
            "{},{},{},{},{:.6},{:.6},{:.6}\n",
            csv_field(&s.subject_id),
            format_time(s.start_timestamp),
            format_time(s.end_timestamp),
            s.step_count,
            s.total_path_length,
            s.mean_step_size,
            s.dimension,
        ));
    }
    out
}

/// Full segment state as pretty JSON.
pub fn segments_to_json(segments: &[PathCompass]) -> Result<String> {
    serde_json::to_string_pretty(segments)
        .map_err(|e| StoreError::InvalidData(format!("JSON export failed: {e}")))
}

pub fn write_csv(path: &Path, segments: &[PathCompass]) -> Result<()> {
    fs::write(path, segments_to_csv(segments))?;
    tracing::info!("wrote {} segments to {}", segments.len(), path.display());
    Ok(())
}

pub fn write_json(path: &Path, segments: &[PathCompass]) -> Result<()> {
    fs::write(path, segments_to_json(segments)?)?;
    tracing::info!("wrote {} segments to {}", segments.len(), path.display());
    Ok(())
}

fn csv_field(s: &str) -> String {
    if s.contains([',', '"', '\n']) {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

/// Recording timestamps are Unix seconds; anything before 2000-01-01 is a
/// synthetic counter and stays numeric.
fn format_time(secs: f64) -> String {
    const Y2K: f64 = 946_684_800.0;
    if secs >= Y2K && secs.fract() == 0.0 {
        unix_to_iso8601(secs as u64)
    } else {
        format!("{secs}")
    }
}
