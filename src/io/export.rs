//! Export the weekly series to CSV or JSON.
//!
//! The CSV is meant to be easy to consume in spreadsheets or downstream
//! scripts; the JSON adds the run context needed to re-plot it later.

use std::fs::File;
use std::path::Path;

use serde::Serialize;
use tracing::info;

use crate::app::pipeline::RunOutput;
use crate::domain::{ResolvedColumn, WeeklyPoint};
use crate::error::AppError;

/// Write `week_start,mean_value,sample_count` rows.
pub fn write_series_csv(path: &Path, points: &[WeeklyPoint]) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_path(path)
        .map_err(|e| AppError::new(4, format!("Failed to create export CSV '{}': {e}", path.display())))?;

    for p in points {
        writer
            .serialize(p)
            .map_err(|e| AppError::new(4, format!("Failed to write export CSV row: {e}")))?;
    }
    writer
        .flush()
        .map_err(|e| AppError::new(4, format!("Failed to write export CSV: {e}")))?;

    info!(path = %path.display(), rows = points.len(), "wrote series CSV");
    Ok(())
}

/// Portable description of one run's output.
#[derive(Debug, Serialize)]
pub struct SeriesFile<'a> {
    pub tool: &'static str,
    pub tag: &'a str,
    pub column: &'a ResolvedColumn,
    pub years: u32,
    pub year_range: (i32, i32),
    pub record_count: usize,
    pub points: &'a [WeeklyPoint],
}

/// Write the series and its run context as pretty JSON.
pub fn write_series_json(path: &Path, run: &RunOutput, tag: &str, years: u32) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(4, format!("Failed to create series JSON '{}': {e}", path.display())))?;

    let doc = SeriesFile {
        tool: "pollen",
        tag,
        column: &run.column,
        years,
        year_range: run.year_range,
        record_count: run.record_count,
        points: run.series.points(),
    };

    serde_json::to_writer_pretty(file, &doc)
        .map_err(|e| AppError::new(4, format!("Failed to write series JSON: {e}")))?;

    info!(path = %path.display(), "wrote series JSON");
    Ok(())
}
