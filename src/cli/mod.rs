//! Command-line parsing for the weekly pollen series tool.
//!
//! The goal of this module is to keep **argument parsing** separate from the
//! pipeline and presentation code.

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

use crate::domain::ColumnSelector;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "pollen", version, about = "Weekly allergen series from pollen spreadsheets")]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace). `RUST_LOG` takes precedence.
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Build the weekly series, print diagnostics and write the chart.
    Plot(PlotArgs),
    /// List the selectable columns of a dataset.
    Columns(ColumnsArgs),
    /// Download the dataset archive into the data folder.
    Fetch(FetchArgs),
}

/// Dataset selection shared by every command that reads files.
#[derive(Debug, Args, Clone)]
pub struct DatasetArgs {
    /// Folder containing the spreadsheet files (default: `$POLLEN_DATA_DIR` or `data`).
    pub data_dir: Option<PathBuf>,

    /// Dataset tag matched against file names (case-insensitive, first 8 characters).
    #[arg(short = 'c', long = "tag", visible_alias = "city", default_value = "NICE")]
    pub tag: String,
}

/// Options for building and plotting a series.
#[derive(Debug, Args, Clone)]
pub struct PlotArgs {
    #[command(flatten)]
    pub dataset: DatasetArgs,

    /// Column to plot: a 0-based index or a header name.
    #[arg(short = 'a', long = "column", visible_alias = "allergen", default_value = "6")]
    pub column: ColumnSelector,

    /// Number of trailing years to keep, counted back from the latest year in the data.
    #[arg(short = 'y', long, default_value_t = 10, value_parser = clap::value_parser!(u32).range(1..))]
    pub years: u32,

    /// Download the dataset again even if the folder already has files.
    #[arg(short = 'r', long)]
    pub refresh: bool,

    /// Never download; fail if the folder has no matching files.
    #[arg(long, conflicts_with = "refresh")]
    pub no_fetch: bool,

    /// Folder the chart image is written to.
    #[arg(long, default_value = ".")]
    pub out_dir: PathBuf,

    /// Do not write the chart image.
    #[arg(long)]
    pub no_chart: bool,

    /// Disable the terminal plot.
    #[arg(long)]
    pub no_plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,

    /// Export the weekly series to CSV.
    #[arg(long)]
    pub export: Option<PathBuf>,

    /// Export the weekly series and run context to JSON.
    #[arg(long = "export-json")]
    pub export_json: Option<PathBuf>,
}

/// Options for listing columns.
#[derive(Debug, Args, Clone)]
pub struct ColumnsArgs {
    #[command(flatten)]
    pub dataset: DatasetArgs,
}

/// Options for downloading the dataset.
#[derive(Debug, Args, Clone)]
pub struct FetchArgs {
    /// Destination folder (default: `$POLLEN_DATA_DIR` or `data`).
    pub data_dir: Option<PathBuf>,

    /// Archive URL (default: `$POLLEN_DATASET_URL` or the data.gouv.fr resource).
    #[arg(long)]
    pub url: Option<String>,

    /// Download even if the folder already has spreadsheets.
    #[arg(long)]
    pub force: bool,
}
