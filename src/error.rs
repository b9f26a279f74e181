use std::path::PathBuf;

use thiserror::Error;

use crate::domain::{AvailableColumn, ColumnSelector, FileFailure};

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

/// Fatal outcomes of a pipeline run.
///
/// Every variant carries enough context (attempted value, alternatives,
/// counts) for the caller to correct the invocation.
#[derive(Debug, Clone, Error)]
pub enum PipelineError {
    #[error("No spreadsheet files matching tag '{tag}' found in '{}'.", .location.display())]
    NoMatchingFiles { tag: String, location: PathBuf },

    #[error("Cannot read data folder '{}': {reason}", .path.display())]
    DataDir { path: PathBuf, reason: String },

    #[error(
        "Column {selector} not found. Available columns: {}",
        list_available(.available)
    )]
    ColumnUnresolved {
        selector: ColumnSelector,
        available: Vec<AvailableColumn>,
    },

    #[error(
        "None of the {} matching file(s) could be read: {}",
        .failures.len(),
        list_failures(.failures)
    )]
    NoReadableFiles { failures: Vec<FileFailure> },

    #[error(
        "No valid (date, value) rows remain after normalization ({files} file(s), {rows_read} row(s) read, {rows_dropped} dropped)."
    )]
    EmptyAfterNormalization {
        files: usize,
        rows_read: usize,
        rows_dropped: usize,
    },

    /// The window always includes `max_year`, so a non-empty series with a
    /// valid `WindowSpec` never produces this; it guards the non-empty
    /// contract of the windowed result.
    #[error("Windowing to the last {years} year(s) ending {max_year} left no weekly points.")]
    EmptyAfterWindowing { years: u32, max_year: i32 },

    #[error("Cannot window an empty series.")]
    EmptySeries,

    #[error("Invalid year window: years must be at least 1 (got {years}).")]
    InvalidWindow { years: u32 },
}

impl PipelineError {
    /// Process exit code: 2 for bad input or selection, 3 when nothing is left to plot.
    pub fn exit_code(&self) -> u8 {
        match self {
            PipelineError::NoMatchingFiles { .. }
            | PipelineError::DataDir { .. }
            | PipelineError::ColumnUnresolved { .. }
            | PipelineError::NoReadableFiles { .. }
            | PipelineError::InvalidWindow { .. } => 2,
            PipelineError::EmptyAfterNormalization { .. }
            | PipelineError::EmptyAfterWindowing { .. }
            | PipelineError::EmptySeries => 3,
        }
    }
}

impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        AppError::new(err.exit_code(), err.to_string())
    }
}

fn list_available(available: &[AvailableColumn]) -> String {
    if available.is_empty() {
        return "(none)".to_string();
    }
    available
        .iter()
        .map(|c| format!("{} [{}]", c.name, c.index))
        .collect::<Vec<_>>()
        .join(", ")
}

fn list_failures(failures: &[FileFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("{} ({})", f.file_id, f.reason))
        .collect::<Vec<_>>()
        .join("; ")
}
