//! Shared domain types.
//!
//! These types are kept lightweight so they can be:
//!
//! - passed between the ingest, aggregation and windowing stages
//! - exported to CSV/JSON
//! - handed to the plotting code

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::error::PipelineError;

/// User-requested measurement column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnSelector {
    /// Header name, matched case-insensitively.
    ByName(String),
    /// 0-based column position (0 is the date column).
    ByIndex(usize),
}

impl FromStr for ColumnSelector {
    type Err = String;

    /// A non-negative integer selects by position, anything else by name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err("column selector must not be empty".to_string());
        }
        match s.parse::<usize>() {
            Ok(index) => Ok(ColumnSelector::ByIndex(index)),
            Err(_) => Ok(ColumnSelector::ByName(s.to_string())),
        }
    }
}

impl fmt::Display for ColumnSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnSelector::ByName(name) => write!(f, "'{name}'"),
            ColumnSelector::ByIndex(index) => write!(f, "index {index}"),
        }
    }
}

/// Column headers discovered from a sheet, in position order.
///
/// Position 0 is the date column by convention.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ColumnCatalog {
    headers: Vec<String>,
}

impl ColumnCatalog {
    pub fn new(headers: Vec<String>) -> Self {
        Self { headers }
    }

    pub fn len(&self) -> usize {
        self.headers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    pub fn header(&self, index: usize) -> Option<&str> {
        self.headers.get(index).map(String::as_str)
    }

    /// Display name of a column: its header, or `Column <letter>` when the header is blank.
    pub fn display_name(&self, index: usize) -> String {
        match self.header(index) {
            Some(h) if !h.trim().is_empty() => h.trim().to_string(),
            _ => format!("Column {}", column_letter(index)),
        }
    }

    /// Every non-date column, in position order.
    pub fn value_columns(&self) -> Vec<AvailableColumn> {
        (1..self.headers.len())
            .map(|index| AvailableColumn {
                index,
                name: self.display_name(index),
            })
            .collect()
    }
}

/// One selectable column as reported back to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AvailableColumn {
    pub index: usize,
    pub name: String,
}

/// A column that passed resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedColumn {
    /// Always a valid catalog position other than 0.
    pub index: usize,
    pub name: String,
}

/// Outcome of resolving a selector against a catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnResolution {
    Resolved(ResolvedColumn),
    Unresolved {
        attempted: ColumnSelector,
        available: Vec<AvailableColumn>,
    },
}

impl ColumnResolution {
    pub fn into_result(self) -> Result<ResolvedColumn, PipelineError> {
        match self {
            ColumnResolution::Resolved(column) => Ok(column),
            ColumnResolution::Unresolved { attempted, available } => {
                Err(PipelineError::ColumnUnresolved {
                    selector: attempted,
                    available,
                })
            }
        }
    }
}

/// A raw spreadsheet cell as yielded by a tabular source.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    Date(NaiveDate),
}

/// A (date cell, value cell) pair extracted from one row, before parsing.
#[derive(Debug, Clone, Copy)]
pub struct RawRecord<'a> {
    pub file_id: &'a str,
    /// 1-based sheet row number (the header is row 1).
    pub row_ordinal: usize,
    pub date: &'a Cell,
    pub value: &'a Cell,
}

/// A validated observation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizedRecord {
    pub date: NaiveDate,
    pub value: f64,
}

/// Mean of all observations within one Monday-aligned week.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WeeklyPoint {
    pub week_start: NaiveDate,
    pub mean_value: f64,
    pub sample_count: usize,
}

/// Weekly points sorted ascending by `week_start`, without duplicates.
///
/// Only the aggregator builds a series from scratch; the windower narrows one.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Series {
    points: Vec<WeeklyPoint>,
}

impl Series {
    /// Caller guarantees ascending, unique `week_start` values.
    pub(crate) fn from_sorted(points: Vec<WeeklyPoint>) -> Self {
        debug_assert!(points.windows(2).all(|w| w[0].week_start < w[1].week_start));
        Self { points }
    }

    pub fn points(&self) -> &[WeeklyPoint] {
        &self.points
    }

    pub fn into_points(self) -> Vec<WeeklyPoint> {
        self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<&WeeklyPoint> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&WeeklyPoint> {
        self.points.last()
    }

    /// Years of the first and last `week_start`.
    pub fn year_range(&self) -> Option<(i32, i32)> {
        Some((self.first()?.week_start.year(), self.last()?.week_start.year()))
    }

    pub fn total_samples(&self) -> usize {
        self.points.iter().map(|p| p.sample_count).sum()
    }
}

/// Trailing span of years to keep, counted back from the data's latest year.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSpec {
    years: u32,
}

impl WindowSpec {
    pub fn new(years: u32) -> Result<Self, PipelineError> {
        if years == 0 {
            return Err(PipelineError::InvalidWindow { years });
        }
        Ok(Self { years })
    }

    pub fn years(self) -> u32 {
        self.years
    }

    /// Inclusive `[max_year - years + 1, max_year]`.
    pub fn bounds(self, max_year: i32) -> (i32, i32) {
        let span = i32::try_from(self.years).unwrap_or(i32::MAX);
        (max_year.saturating_sub(span - 1), max_year)
    }
}

impl Default for WindowSpec {
    fn default() -> Self {
        Self { years: 10 }
    }
}

/// Non-fatal per-file ingestion failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileFailure {
    pub file_id: String,
    pub reason: String,
}

/// Provenance counts for one file that was read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileReport {
    pub file_id: String,
    pub rows_read: usize,
    pub records_kept: usize,
    pub rows_dropped: usize,
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus defaults).
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub data_dir: PathBuf,
    pub tag: String,
    pub selector: ColumnSelector,
    pub window: WindowSpec,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            tag: "NICE".to_string(),
            selector: ColumnSelector::ByIndex(6),
            window: WindowSpec::default(),
        }
    }
}

/// Spreadsheet column letters: 0 -> `A`, 25 -> `Z`, 26 -> `AA`.
pub fn column_letter(index: usize) -> String {
    let mut n = index + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(char::from(b'A' + rem as u8));
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}
