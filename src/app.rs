//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments and sets up logging
//! - makes sure the dataset is on disk
//! - runs the pipeline
//! - prints reports/plots
//! - writes the chart and optional exports

use std::path::PathBuf;

use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::cli::{ColumnsArgs, Command, DatasetArgs, FetchArgs, PlotArgs};
use crate::domain::{ColumnCatalog, PipelineConfig, WindowSpec};
use crate::error::{AppError, PipelineError};
use crate::io::fetch::{DEFAULT_DATASET_URL, ensure_dataset};

pub mod pipeline;

const DATA_DIR_ENV: &str = "POLLEN_DATA_DIR";
const DATASET_URL_ENV: &str = "POLLEN_DATASET_URL";
const DEFAULT_DATA_DIR: &str = "data";

/// Entry point for the `pollen` binary.
pub fn run() -> Result<(), AppError> {
    // `pollen`, `pollen data -c LYON` and `pollen -a ALNUS` all mean `pollen plot ...`.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    dotenvy::dotenv().ok();
    init_logging(cli.verbose);

    match cli.command {
        Command::Plot(args) => handle_plot(args),
        Command::Columns(args) => handle_columns(args),
        Command::Fetch(args) => handle_fetch(args),
    }
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    // Ignore the error if a subscriber is already installed.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn handle_plot(args: PlotArgs) -> Result<(), AppError> {
    let config = pipeline_config_from_args(&args)?;

    if !args.no_fetch {
        let url = dataset_url(None);
        let files = ensure_dataset(&config.data_dir, &url, args.refresh)?;
        info!(dir = %config.data_dir.display(), files, "dataset ready");
    }

    let run = match pipeline::run(&config) {
        Ok(run) => run,
        Err(PipelineError::ColumnUnresolved { selector, available }) => {
            // Show the numbered list so the user can pick a column directly.
            print!(
                "{}",
                crate::report::format_available_columns(
                    &available,
                    Some(&selector),
                    &config.data_dir.display().to_string(),
                    &config.tag,
                )
            );
            return Err(PipelineError::ColumnUnresolved { selector, available }.into());
        }
        Err(err) => return Err(err.into()),
    };

    for failure in &run.file_failures {
        warn!(file = %failure.file_id, reason = %failure.reason, "file did not contribute");
    }

    let years = config.window.years();
    println!("{}", crate::report::format_run_summary(&run, &config.tag, years));
    println!(
        "{}",
        crate::report::format_series_preview(run.series.points(), crate::report::PREVIEW_ROWS)
    );
    println!(
        "{}",
        crate::report::format_file_report(&run.file_reports, &run.file_failures)
    );

    if !args.no_plot {
        let plot = crate::plot::render_ascii_plot(run.series.points(), &run.column.name, args.width, args.height);
        println!("{plot}");
    }

    if !args.no_chart {
        let path = crate::plot::write_chart(
            &args.out_dir,
            run.series.points(),
            &run.column.name,
            &config.tag,
            run.year_range,
        )?;
        println!("Plot saved to: {}", path.display());
    }

    // Optional exports.
    if let Some(path) = &args.export {
        crate::io::export::write_series_csv(path, run.series.points())?;
    }
    if let Some(path) = &args.export_json {
        crate::io::export::write_series_json(path, &run, &config.tag, years)?;
    }

    Ok(())
}

fn handle_columns(args: ColumnsArgs) -> Result<(), AppError> {
    let data_dir = data_dir(&args.dataset);
    let config = PipelineConfig {
        data_dir,
        tag: args.dataset.tag.clone(),
        ..PipelineConfig::default()
    };

    let sources = pipeline::discover_sources(&config)?;
    let (idx, sheet, failures) = pipeline::read_catalog(&sources)?;
    for failure in &failures {
        warn!(file = %failure.file_id, reason = %failure.reason, "skipping unreadable file");
    }

    let catalog = ColumnCatalog::new(sheet.headers);
    println!("Columns of {}:", sources[idx].id());
    print!(
        "{}",
        crate::report::format_available_columns(
            &catalog.value_columns(),
            None,
            &config.data_dir.display().to_string(),
            &config.tag,
        )
    );
    Ok(())
}

fn handle_fetch(args: FetchArgs) -> Result<(), AppError> {
    let dir = args.data_dir.clone().unwrap_or_else(default_data_dir);
    let url = dataset_url(args.url.as_deref());
    let files = ensure_dataset(&dir, &url, args.force)?;
    println!("{files} spreadsheet file(s) in '{}'.", dir.display());
    Ok(())
}

pub fn pipeline_config_from_args(args: &PlotArgs) -> Result<PipelineConfig, AppError> {
    Ok(PipelineConfig {
        data_dir: data_dir(&args.dataset),
        tag: args.dataset.tag.clone(),
        selector: args.column.clone(),
        window: WindowSpec::new(args.years)?,
    })
}

fn data_dir(args: &DatasetArgs) -> PathBuf {
    args.data_dir.clone().unwrap_or_else(default_data_dir)
}

fn default_data_dir() -> PathBuf {
    std::env::var(DATA_DIR_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_DATA_DIR))
}

fn dataset_url(explicit: Option<&str>) -> String {
    explicit
        .map(str::to_string)
        .or_else(|| std::env::var(DATASET_URL_ENV).ok())
        .unwrap_or_else(|| DEFAULT_DATASET_URL.to_string())
}

/// Rewrite argv so `pollen` defaults to `pollen plot`.
///
/// Rules:
/// - `pollen`                       -> `pollen plot`
/// - `pollen -a ALNUS ...`          -> `pollen plot -a ALNUS ...`
/// - `pollen data ...`              -> `pollen plot data ...`
/// - `pollen -v columns ...`        -> unchanged (global flags before a subcommand)
/// - `pollen --help/--version/-h`   -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    // Global flags may precede the subcommand; look past them.
    let first = argv.iter().skip(1).find(|arg| !is_verbosity_flag(arg)).cloned();
    let Some(arg1) = first else {
        argv.push("plot".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "plot" | "columns" | "fetch");
    if is_subcommand {
        return argv;
    }

    // A flag or a folder path: treat everything as plot arguments.
    argv.insert(1, "plot".to_string());
    argv
}

/// `-v`, `-vv`, ... or `--verbose`.
fn is_verbosity_flag(arg: &str) -> bool {
    arg == "--verbose" || (arg.len() > 1 && arg.starts_with('-') && arg[1..].chars().all(|c| c == 'v'))
}
