//! Row normalization: raw cells to `(date, value)` records.
//!
//! Rows whose date or value cannot be parsed are dropped. Nothing is imputed:
//! a dropped row is neither zero-filled nor dated "now".

use chrono::{Days, NaiveDate, NaiveDateTime};
use thiserror::Error;
use tracing::trace;

use crate::domain::{Cell, NormalizedRecord, RawRecord};

/// Column holding the observation date in every sheet.
pub const DATE_COLUMN: usize = 0;

static EMPTY: Cell = Cell::Empty;

/// Largest serial day spreadsheets can represent (9999-12-31).
const MAX_EXCEL_SERIAL: f64 = 2_958_465.0;

/// Why a row was dropped.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RowRejection {
    #[error("missing date")]
    MissingDate,
    #[error("unparsable date '{0}'")]
    InvalidDate(String),
    #[error("missing value")]
    MissingValue,
    #[error("non-numeric value '{0}'")]
    InvalidValue(String),
    #[error("non-finite value")]
    NonFiniteValue,
}

/// Pair each row's date cell with its cell at `value_column`.
///
/// Short rows yield empty cells rather than being skipped here, so the
/// normalizer accounts for them as dropped.
pub fn raw_records<'a>(
    file_id: &'a str,
    rows: &'a [Vec<Cell>],
    value_column: usize,
) -> impl Iterator<Item = RawRecord<'a>> + 'a {
    rows.iter().enumerate().map(move |(idx, row)| RawRecord {
        file_id,
        // +2: rows are 1-based and the header occupies row 1.
        row_ordinal: idx + 2,
        date: row.get(DATE_COLUMN).unwrap_or(&EMPTY),
        value: row.get(value_column).unwrap_or(&EMPTY),
    })
}

/// Lazily normalize raw records, counting the ones dropped.
pub fn normalize<'a, I>(records: I) -> Normalize<I>
where
    I: Iterator<Item = RawRecord<'a>>,
{
    Normalize {
        records,
        dropped: 0,
    }
}

/// Iterator returned by [`normalize`].
pub struct Normalize<I> {
    records: I,
    dropped: usize,
}

impl<I> Normalize<I> {
    /// Rows rejected so far.
    pub fn dropped(&self) -> usize {
        self.dropped
    }
}

impl<'a, I> Iterator for Normalize<I>
where
    I: Iterator<Item = RawRecord<'a>>,
{
    type Item = NormalizedRecord;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let raw = self.records.next()?;
            match normalize_record(&raw) {
                Ok(record) => return Some(record),
                Err(reason) => {
                    trace!(file = raw.file_id, row = raw.row_ordinal, %reason, "dropping row");
                    self.dropped += 1;
                }
            }
        }
    }
}

pub fn normalize_record(raw: &RawRecord<'_>) -> Result<NormalizedRecord, RowRejection> {
    let date = parse_date_cell(raw.date)?;
    let value = parse_value_cell(raw.value)?;
    Ok(NormalizedRecord { date, value })
}

pub fn parse_date_cell(cell: &Cell) -> Result<NaiveDate, RowRejection> {
    match cell {
        Cell::Empty => Err(RowRejection::MissingDate),
        Cell::Date(d) => Ok(*d),
        Cell::Number(n) => {
            excel_serial_to_date(*n).ok_or_else(|| RowRejection::InvalidDate(n.to_string()))
        }
        Cell::Text(s) => {
            let s = s.trim();
            if s.is_empty() {
                return Err(RowRejection::MissingDate);
            }
            parse_date_text(s).ok_or_else(|| RowRejection::InvalidDate(s.to_string()))
        }
    }
}

pub fn parse_value_cell(cell: &Cell) -> Result<f64, RowRejection> {
    let v = match cell {
        Cell::Empty => return Err(RowRejection::MissingValue),
        Cell::Date(d) => return Err(RowRejection::InvalidValue(d.to_string())),
        Cell::Number(n) => *n,
        Cell::Text(s) => {
            let s = s.trim();
            if s.is_empty() {
                return Err(RowRejection::MissingValue);
            }
            parse_decimal(s).ok_or_else(|| RowRejection::InvalidValue(s.to_string()))?
        }
    };
    if v.is_finite() { Ok(v) } else { Err(RowRejection::NonFiniteValue) }
}

fn parse_date_text(s: &str) -> Option<NaiveDate> {
    const DATE_FMTS: [&str; 4] = ["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y", "%Y/%m/%d"];
    const DATETIME_FMTS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%d/%m/%Y %H:%M:%S"];

    DATE_FMTS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .or_else(|| {
            DATETIME_FMTS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
                .map(|dt| dt.date())
        })
}

/// Plain decimal, or one with a single decimal comma (`2,5`).
fn parse_decimal(s: &str) -> Option<f64> {
    if let Ok(v) = s.parse::<f64>() {
        return Some(v);
    }
    if s.matches(',').count() == 1 && !s.contains('.') {
        return s.replace(',', ".").parse::<f64>().ok();
    }
    None
}

/// Spreadsheet serial day (1900 system) to a calendar date.
fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || !(1.0..=MAX_EXCEL_SERIAL).contains(&serial) {
        return None;
    }
    // Epoch is 1899-12-30 so that serial 60 (the phantom 1900-02-29) lines up
    // with every later date.
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    epoch.checked_add_days(Days::new(serial.floor() as u64))
}
