//! Tabular sources: anything that yields a header row plus rows of typed cells.
//!
//! - `WorkbookFile`: first worksheet of an `.xlsx`/`.xls`/`.xlsm`/`.ods` file (calamine)
//! - `CsvFile`: comma-separated text with a header line (csv)
//!
//! The pipeline only sees the `TabularSource` trait, so tests can feed it
//! in-memory sheets.

use std::fs::File;
use std::path::{Path, PathBuf};

use calamine::{Data, Reader, open_workbook_auto};

use crate::domain::Cell;

/// A sheet as read from a source: the header row and every data row below it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sheet {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

/// A readable table with a stable identifier.
pub trait TabularSource: Send + Sync {
    /// Identifier used in logs and per-file reports (the file name for files).
    fn id(&self) -> &str;

    /// Read the whole sheet. Errors are human-readable reasons.
    fn read(&self) -> Result<Sheet, String>;
}

/// Open `path` with the reader matching its extension.
pub fn open_source(path: &Path) -> Box<dyn TabularSource> {
    let is_csv = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("csv"))
        == Some(true);

    if is_csv {
        Box::new(CsvFile::new(path))
    } else {
        Box::new(WorkbookFile::new(path))
    }
}

fn file_id(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// First worksheet of a spreadsheet workbook.
#[derive(Debug, Clone)]
pub struct WorkbookFile {
    path: PathBuf,
    id: String,
}

impl WorkbookFile {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            id: file_id(path),
        }
    }
}

impl TabularSource for WorkbookFile {
    fn id(&self) -> &str {
        &self.id
    }

    fn read(&self) -> Result<Sheet, String> {
        let mut workbook =
            open_workbook_auto(&self.path).map_err(|e| format!("failed to open workbook: {e}"))?;

        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| "workbook has no worksheet".to_string())?
            .map_err(|e| format!("failed to read worksheet: {e}"))?;

        let mut rows = range.rows();
        let headers = rows
            .next()
            .ok_or_else(|| "worksheet is empty".to_string())?
            .iter()
            .map(header_from_data)
            .collect();

        let rows = rows
            .map(|row| row.iter().map(cell_from_data).collect())
            .collect();

        Ok(Sheet { headers, rows })
    }
}

fn cell_from_data(data: &Data) -> Cell {
    match data {
        Data::Empty | Data::Error(_) => Cell::Empty,
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
        Data::Float(f) => Cell::Number(*f),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Bool(b) => Cell::Text(b.to_string()),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(|d| Cell::Date(d.date()))
            .unwrap_or(Cell::Empty),
    }
}

fn header_from_data(data: &Data) -> String {
    match data {
        Data::String(s) => s.trim().to_string(),
        Data::Empty | Data::Error(_) => String::new(),
        other => other.to_string().trim().to_string(),
    }
}

/// Comma-separated file with a header line.
#[derive(Debug, Clone)]
pub struct CsvFile {
    path: PathBuf,
    id: String,
}

impl CsvFile {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            id: file_id(path),
        }
    }
}

impl TabularSource for CsvFile {
    fn id(&self) -> &str {
        &self.id
    }

    fn read(&self) -> Result<Sheet, String> {
        let file = File::open(&self.path).map_err(|e| format!("failed to open CSV: {e}"))?;
        read_csv(file)
    }
}

fn read_csv<R: std::io::Read>(reader: R) -> Result<Sheet, String> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| format!("failed to read CSV headers: {e}"))?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_string())
        .collect();
    if headers.iter().all(|h| h.is_empty()) {
        return Err("CSV file is empty".to_string());
    }

    let mut rows = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        // +2: records start on line 2, after the header.
        let record = result.map_err(|e| format!("CSV parse error on line {}: {e}", idx + 2))?;
        rows.push(
            record
                .iter()
                .map(|field| {
                    if field.is_empty() {
                        Cell::Empty
                    } else {
                        Cell::Text(field.to_string())
                    }
                })
                .collect(),
        );
    }

    Ok(Sheet { headers, rows })
}

/// Fixed in-memory sheet, used as a stand-in source in tests.
#[cfg(test)]
#[derive(Debug, Clone)]
pub struct MemorySource {
    pub id: String,
    pub sheet: Result<Sheet, String>,
}

#[cfg(test)]
impl TabularSource for MemorySource {
    fn id(&self) -> &str {
        &self.id
    }

    fn read(&self) -> Result<Sheet, String> {
        self.sheet.clone()
    }
}
