//! Shared pipeline logic used by every front-end command.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! discover -> catalog -> resolve -> normalize + merge -> aggregate -> window
//!
//! The CLI can then focus on presentation (printing, charts, exports).

use rayon::prelude::*;
use tracing::{info, warn};

use crate::domain::{
    ColumnCatalog, ColumnSelector, FileFailure, FileReport, NormalizedRecord, PipelineConfig,
    ResolvedColumn, Series,
};
use crate::error::PipelineError;
use crate::io::discover::discover_files;
use crate::io::source::{Sheet, TabularSource, open_source};
use crate::series::{DATE_COLUMN, aggregate, normalize, raw_records, resolve, window};

/// All computed outputs of a single run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    /// Windowed weekly series, ascending by week.
    pub series: Series,
    pub column: ResolvedColumn,
    /// Catalog of the first readable file.
    pub catalog: ColumnCatalog,
    /// Normalized records merged across all files, before windowing.
    pub record_count: usize,
    /// First and last year of the windowed series.
    pub year_range: (i32, i32),
    pub files_matched: usize,
    /// Per-file provenance for every file that was read, in discovery order.
    pub file_reports: Vec<FileReport>,
    pub file_failures: Vec<FileFailure>,
}

/// Discover the dataset's files and run the pipeline over them.
pub fn run(config: &PipelineConfig) -> Result<RunOutput, PipelineError> {
    let sources = discover_sources(config)?;
    run_with_sources(config, &sources)
}

/// Open every file matching the configured tag.
pub fn discover_sources(config: &PipelineConfig) -> Result<Vec<Box<dyn TabularSource>>, PipelineError> {
    let paths = discover_files(&config.data_dir, &config.tag)?;
    info!(tag = %config.tag, files = paths.len(), "matched dataset files");
    Ok(paths.iter().map(|p| open_source(p)).collect())
}

/// Catalog of the first readable source, plus failures for the ones before it.
///
/// A sheet needs a date column and at least one value column to supply the
/// catalog; anything narrower is recorded as a failure and skipped.
pub fn read_catalog(
    sources: &[Box<dyn TabularSource>],
) -> Result<(usize, Sheet, Vec<FileFailure>), PipelineError> {
    let mut failures = Vec::new();
    for (idx, source) in sources.iter().enumerate() {
        match source.read() {
            Ok(sheet) if sheet.headers.len() > DATE_COLUMN + 1 => return Ok((idx, sheet, failures)),
            Ok(sheet) => {
                warn!(file = source.id(), columns = sheet.headers.len(), "no value columns");
                failures.push(FileFailure {
                    file_id: source.id().to_string(),
                    reason: format!("no value columns ({} column(s) in header)", sheet.headers.len()),
                });
            }
            Err(reason) => {
                warn!(file = source.id(), %reason, "skipping unreadable file");
                failures.push(FileFailure {
                    file_id: source.id().to_string(),
                    reason,
                });
            }
        }
    }
    Err(PipelineError::NoReadableFiles { failures })
}

/// Run the pipeline over already-opened sources.
///
/// Sources are processed in the given order; this order fixes the merge order
/// and the order of per-file reports.
pub fn run_with_sources(
    config: &PipelineConfig,
    sources: &[Box<dyn TabularSource>],
) -> Result<RunOutput, PipelineError> {
    if sources.is_empty() {
        return Err(PipelineError::NoMatchingFiles {
            tag: config.tag.clone(),
            location: config.data_dir.clone(),
        });
    }

    // 1) Catalog from the first readable file, and resolve before any further reads.
    let (first_idx, first_sheet, mut file_failures) = read_catalog(sources)?;
    let catalog = ColumnCatalog::new(first_sheet.headers.clone());
    let column = resolve(&config.selector, &catalog).into_result()?;
    info!(column = %column.name, index = column.index, "using column");

    // 2) Normalize each file. The first file's sheet is already in memory;
    //    the rest are read in parallel and collected back in source order.
    let first = ingest_sheet(sources[first_idx].id(), &first_sheet, column.index);
    let rest: Vec<Result<FileIngest, FileFailure>> = sources[first_idx + 1..]
        .par_iter()
        .map(|source| ingest_source(source.as_ref(), &config.selector, &column))
        .collect();

    // 3) Merge: flat concatenation, no deduplication across files.
    let mut records: Vec<NormalizedRecord> = Vec::new();
    let mut file_reports = Vec::new();
    let mut rows_read = 0usize;
    let mut rows_dropped = 0usize;
    for outcome in std::iter::once(Ok(first)).chain(rest) {
        match outcome {
            Ok(ingest) => {
                rows_read += ingest.report.rows_read;
                rows_dropped += ingest.report.rows_dropped;
                if ingest.records.is_empty() {
                    warn!(file = %ingest.report.file_id, rows = ingest.report.rows_read, "no parsable rows");
                    file_failures.push(FileFailure {
                        file_id: ingest.report.file_id.clone(),
                        reason: format!(
                            "no parsable rows ({} of {} dropped)",
                            ingest.report.rows_dropped, ingest.report.rows_read
                        ),
                    });
                }
                records.extend(ingest.records);
                file_reports.push(ingest.report);
            }
            Err(failure) => {
                warn!(file = %failure.file_id, reason = %failure.reason, "file skipped");
                file_failures.push(failure);
            }
        }
    }

    let record_count = records.len();
    if record_count == 0 {
        return Err(PipelineError::EmptyAfterNormalization {
            files: file_reports.len(),
            rows_read,
            rows_dropped,
        });
    }
    info!(records = record_count, dropped = rows_dropped, "merged records");

    // 4) Aggregate + window.
    let weekly = aggregate(records);
    let max_year = weekly.year_range().map(|(_, max)| max).unwrap_or_default();
    let series = window(weekly, config.window)?;
    let year_range = series.year_range().ok_or(PipelineError::EmptyAfterWindowing {
        years: config.window.years(),
        max_year,
    })?;

    Ok(RunOutput {
        series,
        column,
        catalog,
        record_count,
        year_range,
        files_matched: sources.len(),
        file_reports,
        file_failures,
    })
}

/// Records and provenance from one file.
#[derive(Debug, Clone)]
struct FileIngest {
    records: Vec<NormalizedRecord>,
    report: FileReport,
}

fn ingest_source(
    source: &dyn TabularSource,
    selector: &ColumnSelector,
    column: &ResolvedColumn,
) -> Result<FileIngest, FileFailure> {
    let fail = |reason: String| FileFailure {
        file_id: source.id().to_string(),
        reason,
    };

    let sheet = source.read().map_err(fail)?;
    let value_column = locate_column(&sheet, selector, column).map_err(fail)?;
    info!(file = source.id(), rows = sheet.rows.len(), "processing file");
    Ok(ingest_sheet(source.id(), &sheet, value_column))
}

/// Position of the resolved column within another file's header.
///
/// Names are looked up again since yearly files may order columns differently.
fn locate_column(sheet: &Sheet, selector: &ColumnSelector, column: &ResolvedColumn) -> Result<usize, String> {
    let catalog = ColumnCatalog::new(sheet.headers.clone());
    match selector {
        ColumnSelector::ByName(_) => resolve(selector, &catalog)
            .into_result()
            .map(|c| c.index)
            .map_err(|_| format!("column '{}' not found in this file", column.name)),
        ColumnSelector::ByIndex(index) if *index < catalog.len() => Ok(*index),
        ColumnSelector::ByIndex(index) => Err(format!(
            "column index {index} out of range (file has {} columns)",
            catalog.len()
        )),
    }
}

fn ingest_sheet(file_id: &str, sheet: &Sheet, value_column: usize) -> FileIngest {
    let mut normalized = normalize(raw_records(file_id, &sheet.rows, value_column));
    let records: Vec<NormalizedRecord> = normalized.by_ref().collect();
    let report = FileReport {
        file_id: file_id.to_string(),
        rows_read: sheet.rows.len(),
        records_kept: records.len(),
        rows_dropped: normalized.dropped(),
    };
    FileIngest { records, report }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Cell, WindowSpec};
    use crate::io::source::MemorySource;
    use chrono::NaiveDate;

    fn headers() -> Vec<String> {
        ["DATE", "BETULA", "ALNUS", "CORYLUS", "POACEAE"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    fn row(date: &str, alnus: f64) -> Vec<Cell> {
        vec![
            Cell::Text(date.to_string()),
            Cell::Number(1.0),
            Cell::Number(alnus),
            Cell::Number(0.0),
            Cell::Empty,
        ]
    }

    fn source(id: &str, rows: Vec<Vec<Cell>>) -> Box<dyn TabularSource> {
        Box::new(MemorySource {
            id: id.to_string(),
            sheet: Ok(Sheet { headers: headers(), rows }),
        })
    }

    fn broken(id: &str) -> Box<dyn TabularSource> {
        Box::new(MemorySource {
            id: id.to_string(),
            sheet: Err("failed to open workbook: corrupt".to_string()),
        })
    }

    fn config(selector: ColumnSelector, years: u32) -> PipelineConfig {
        PipelineConfig {
            selector,
            window: WindowSpec::new(years).unwrap(),
            ..PipelineConfig::default()
        }
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn merges_files_and_aggregates_weekly() {
        let sources = vec![
            source("a.xlsx", vec![row("2024-01-01", 5.0), row("2024-01-03", 7.0)]),
            source("b.xlsx", vec![row("2024-01-10", 9.0)]),
        ];

        let out = run_with_sources(&config(ColumnSelector::ByName("alnus".into()), 10), &sources).unwrap();

        assert_eq!(out.column, ResolvedColumn { index: 2, name: "ALNUS".into() });
        assert_eq!(out.record_count, 3);
        assert_eq!(out.year_range, (2024, 2024));
        let points = out.series.points();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].week_start, d(2024, 1, 1));
        assert_eq!(points[0].mean_value, 6.0);
        assert_eq!(points[0].sample_count, 2);
        assert_eq!(points[1].week_start, d(2024, 1, 8));
        assert!(out.file_failures.is_empty());
    }

    #[test]
    fn unparsable_file_does_not_abort_the_run() {
        let sources = vec![
            source("bad_dates.xlsx", vec![row("??", 1.0), row("later", 2.0)]),
            broken("corrupt.xlsx"),
            source("good.xlsx", vec![row("2024-05-06", 4.0)]),
        ];

        let out = run_with_sources(&config(ColumnSelector::ByIndex(2), 10), &sources).unwrap();

        assert_eq!(out.record_count, 1);
        assert_eq!(out.file_reports.len(), 2);
        assert_eq!(out.file_reports[0].records_kept, 0);
        assert_eq!(out.file_reports[0].rows_dropped, 2);
        let failed: Vec<&str> = out.file_failures.iter().map(|f| f.file_id.as_str()).collect();
        assert_eq!(failed, vec!["bad_dates.xlsx", "corrupt.xlsx"]);
    }

    #[test]
    fn unreadable_first_file_falls_through_to_next_catalog() {
        let sources = vec![broken("corrupt.xlsx"), source("ok.xlsx", vec![row("2024-05-06", 4.0)])];
        let out = run_with_sources(&config(ColumnSelector::ByIndex(2), 10), &sources).unwrap();
        assert_eq!(out.file_failures.len(), 1);
        assert_eq!(out.catalog.len(), 5);
    }

    #[test]
    fn header_only_first_file_does_not_supply_the_catalog() {
        let narrow = Box::new(MemorySource {
            id: "a.csv".to_string(),
            sheet: Ok(Sheet { headers: vec!["DATE".into()], rows: Vec::new() }),
        }) as Box<dyn TabularSource>;
        let sources = vec![narrow, source("b.xlsx", vec![row("2024-05-06", 4.0)])];

        let out = run_with_sources(&config(ColumnSelector::ByName("ALNUS".into()), 10), &sources).unwrap();

        assert_eq!(out.column.index, 2);
        assert_eq!(out.record_count, 1);
        assert_eq!(out.file_failures.len(), 1);
        assert_eq!(out.file_failures[0].file_id, "a.csv");
        assert!(out.file_failures[0].reason.contains("no value columns"));
    }

    #[test]
    fn unresolved_column_fails_before_ingestion() {
        let sources = vec![source("a.xlsx", vec![row("2024-01-01", 5.0)])];
        let err = run_with_sources(&config(ColumnSelector::ByIndex(6), 10), &sources).unwrap_err();
        match err {
            PipelineError::ColumnUnresolved { selector, available } => {
                assert_eq!(selector, ColumnSelector::ByIndex(6));
                let names: Vec<_> = available.iter().map(|c| c.name.as_str()).collect();
                assert_eq!(names, vec!["BETULA", "ALNUS", "CORYLUS", "POACEAE"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn all_rows_dropped_is_fatal() {
        // POACEAE (index 4) is empty on every row.
        let sources = vec![source("a.xlsx", vec![row("2024-01-01", 5.0), row("2024-01-02", 6.0)])];
        let err = run_with_sources(&config(ColumnSelector::ByIndex(4), 10), &sources).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::EmptyAfterNormalization { files: 1, rows_read: 2, rows_dropped: 2 }
        ));
    }

    #[test]
    fn nothing_readable_is_fatal() {
        let err = run_with_sources(&config(ColumnSelector::ByIndex(2), 10), &[broken("x.xlsx")]).unwrap_err();
        assert!(matches!(err, PipelineError::NoReadableFiles { ref failures } if failures.len() == 1));
    }

    #[test]
    fn name_is_relocated_in_reordered_files() {
        let reordered = Box::new(MemorySource {
            id: "b.xlsx".to_string(),
            sheet: Ok(Sheet {
                headers: vec!["DATE".into(), "ALNUS".into(), "BETULA".into()],
                rows: vec![vec![Cell::Text("2024-01-02".into()), Cell::Number(7.0), Cell::Number(100.0)]],
            }),
        }) as Box<dyn TabularSource>;
        let sources = vec![source("a.xlsx", vec![row("2024-01-01", 5.0)]), reordered];

        let out = run_with_sources(&config(ColumnSelector::ByName("ALNUS".into()), 10), &sources).unwrap();
        assert_eq!(out.series.points()[0].mean_value, 6.0);
    }

    #[test]
    fn short_file_fails_index_lookup() {
        let narrow = Box::new(MemorySource {
            id: "narrow.xlsx".to_string(),
            sheet: Ok(Sheet {
                headers: vec!["DATE".into(), "BETULA".into()],
                rows: vec![vec![Cell::Text("2024-01-02".into()), Cell::Number(7.0)]],
            }),
        }) as Box<dyn TabularSource>;
        let sources = vec![source("a.xlsx", vec![row("2024-01-01", 5.0)]), narrow];

        let out = run_with_sources(&config(ColumnSelector::ByIndex(3), 10), &sources).unwrap();
        assert_eq!(out.file_failures.len(), 1);
        assert!(out.file_failures[0].reason.contains("out of range"));
    }

    #[test]
    fn window_trims_to_trailing_years() {
        let rows = (2016..=2026).map(|y| row(&format!("{y}-06-15"), f64::from(y))).collect();
        let sources = vec![source("a.xlsx", rows)];

        let out = run_with_sources(&config(ColumnSelector::ByIndex(2), 3), &sources).unwrap();

        assert_eq!(out.record_count, 11);
        assert_eq!(out.year_range, (2024, 2026));
        assert_eq!(out.series.len(), 3);
    }

    #[test]
    fn merge_is_deterministic() {
        let make = || -> Vec<Box<dyn TabularSource>> {
            (0..8)
                .map(|i| source(&format!("f{i}.xlsx"), vec![row(&format!("2024-02-{:02}", i + 1), f64::from(i) / 3.0)]))
                .collect()
        };
        let cfg = config(ColumnSelector::ByIndex(2), 10);
        let a = run_with_sources(&cfg, &make()).unwrap();
        let b = run_with_sources(&cfg, &make()).unwrap();
        assert_eq!(a.series, b.series);
        let ids: Vec<_> = a.file_reports.iter().map(|r| r.file_id.clone()).collect();
        assert_eq!(ids, (0..8).map(|i| format!("f{i}.xlsx")).collect::<Vec<_>>());
    }
}
