//! End-to-end runs over real files in a temporary data folder.

use std::fs;
use std::path::Path;

use pollen_weekly::app::pipeline;
use pollen_weekly::domain::{ColumnSelector, PipelineConfig, WindowSpec};
use pollen_weekly::error::PipelineError;
use pollen_weekly::io::write_series_csv;

const HEADER: &str = "DATE,BETULA,ALNUS,CORYLUS,POACEAE\n";

fn write(dir: &Path, name: &str, body: &str) {
    fs::write(dir.join(name), body).unwrap();
}

fn config(dir: &Path, selector: ColumnSelector, years: u32) -> PipelineConfig {
    PipelineConfig {
        data_dir: dir.to_path_buf(),
        tag: "nice".to_string(),
        selector,
        window: WindowSpec::new(years).unwrap(),
    }
}

#[test]
fn weekly_series_from_tagged_files() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "pollens_NICE_2024a.csv",
        &format!("{HEADER}2024-01-01,1,5,0,\n2024-01-03,1,7,0,\n"),
    );
    write(dir.path(), "pollens_NICE_2024b.csv", &format!("{HEADER}10/01/2024,1,9,0,\n"));
    write(dir.path(), "pollens_LYON_2024.csv", &format!("{HEADER}2024-01-01,1,500,0,\n"));

    let out = pipeline::run(&config(dir.path(), ColumnSelector::ByName("Alnus".into()), 10)).unwrap();

    assert_eq!(out.files_matched, 2);
    assert_eq!(out.column.index, 2);
    assert_eq!(out.record_count, 3);
    let summary: Vec<(String, f64, usize)> = out
        .series
        .points()
        .iter()
        .map(|p| (p.week_start.to_string(), p.mean_value, p.sample_count))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("2024-01-01".to_string(), 6.0, 2),
            ("2024-01-08".to_string(), 9.0, 1),
        ]
    );

    let export = dir.path().join("series.csv");
    write_series_csv(&export, out.series.points()).unwrap();
    let text = fs::read_to_string(export).unwrap();
    assert_eq!(text.lines().count(), 3);
}

#[test]
fn file_with_no_valid_dates_is_reported_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "a_nice.csv", &format!("{HEADER}2023-03-01,1,2,0,\n"));
    write(dir.path(), "b_nice.csv", &format!("{HEADER}soon,1,2,0,\nnever,1,3,0,\n"));
    write(dir.path(), "c_nice.csv", &format!("{HEADER}2023-03-08,1,4,0,\n"));

    let out = pipeline::run(&config(dir.path(), ColumnSelector::ByIndex(2), 10)).unwrap();

    assert_eq!(out.record_count, 2);
    assert_eq!(out.file_failures.len(), 1);
    assert_eq!(out.file_failures[0].file_id, "b_nice.csv");
    assert_eq!(out.series.total_samples(), 2);
}

#[test]
fn trailing_years_are_kept() {
    let dir = tempfile::tempdir().unwrap();
    let mut body = HEADER.to_string();
    for year in 2016..=2026 {
        body.push_str(&format!("{year}-04-15,1,{year},0,\n"));
    }
    write(dir.path(), "nice_all.csv", &body);

    let out = pipeline::run(&config(dir.path(), ColumnSelector::ByIndex(2), 3)).unwrap();

    assert_eq!(out.year_range, (2024, 2026));
    assert_eq!(out.series.len(), 3);
    assert_eq!(out.record_count, 11);
}

#[test]
fn missing_dataset_is_reported_with_location() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "pollens_LYON_2024.csv", HEADER);

    let err = pipeline::run(&config(dir.path(), ColumnSelector::ByIndex(2), 10)).unwrap_err();

    match err {
        PipelineError::NoMatchingFiles { tag, location } => {
            assert_eq!(tag, "nice");
            assert_eq!(location, dir.path());
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn default_column_is_out_of_range_for_narrow_sheets() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "nice.csv", &format!("{HEADER}2024-01-01,1,5,0,\n"));

    let mut cfg = config(dir.path(), ColumnSelector::ByIndex(2), 10);
    cfg.selector = PipelineConfig::default().selector;
    let err = pipeline::run(&cfg).unwrap_err();

    let PipelineError::ColumnUnresolved { available, .. } = err else {
        panic!("expected unresolved column");
    };
    let names: Vec<_> = available.into_iter().map(|c| c.name).collect();
    assert_eq!(names, vec!["BETULA", "ALNUS", "CORYLUS", "POACEAE"]);
}

#[test]
fn empty_first_file_is_skipped_for_the_catalog() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "a_nice.csv", "");
    write(dir.path(), "b_nice.csv", "DATE,BETULA,ALNUS\n2024-01-01,1,5\n");

    let out = pipeline::run(&config(dir.path(), ColumnSelector::ByName("ALNUS".into()), 10)).unwrap();

    assert_eq!(out.column.name, "ALNUS");
    assert_eq!(out.record_count, 1);
    let failed: Vec<&str> = out.file_failures.iter().map(|f| f.file_id.as_str()).collect();
    assert_eq!(failed, vec!["a_nice.csv"]);
}
