//! Trailing-years window.
//!
//! The window is anchored on the latest year present in the series, never on
//! the wall clock, so identical inputs always produce identical output.

use chrono::Datelike;
use tracing::debug;

use crate::domain::{Series, WindowSpec};
use crate::error::PipelineError;

/// Keep points whose `week_start` year lies in `[max_year - years + 1, max_year]`.
///
/// The result is a subsequence of `series` in the same order.
pub fn window(series: Series, spec: WindowSpec) -> Result<Series, PipelineError> {
    let max_year = series
        .last()
        .map(|p| p.week_start.year())
        .ok_or(PipelineError::EmptySeries)?;
    let (min_year, max_year) = spec.bounds(max_year);

    let kept: Vec<_> = series
        .into_points()
        .into_iter()
        .filter(|p| (min_year..=max_year).contains(&p.week_start.year()))
        .collect();

    debug!(min_year, max_year, kept = kept.len(), "windowed series");
    Ok(Series::from_sorted(kept))
}
