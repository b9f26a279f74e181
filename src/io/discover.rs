//! Dataset file discovery.
//!
//! A file belongs to a dataset when its name contains the dataset tag,
//! case-insensitively. Only the first characters of the tag are matched so
//! long city names still find files named with a shortened form.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::PipelineError;

/// Spreadsheet extensions recognized in the data folder.
pub const SPREADSHEET_EXTENSIONS: [&str; 5] = ["xlsx", "xls", "xlsm", "ods", "csv"];

/// Number of leading tag characters used for matching.
pub const TAG_MATCH_LEN: usize = 8;

/// List spreadsheets in `dir` whose name matches `tag` (sorted by name).
pub fn discover_files(dir: &Path, tag: &str) -> Result<Vec<PathBuf>, PipelineError> {
    let needle = match_key(tag);
    let files: Vec<PathBuf> = list_spreadsheets(dir)?
        .into_iter()
        .filter(|path| file_name(path).to_lowercase().contains(&needle))
        .collect();

    if files.is_empty() {
        return Err(PipelineError::NoMatchingFiles {
            tag: tag.to_string(),
            location: dir.to_path_buf(),
        });
    }
    Ok(files)
}

/// Number of spreadsheet files directly under `dir` (0 if it does not exist).
pub fn count_spreadsheets(dir: &Path) -> usize {
    list_spreadsheets(dir).map(|files| files.len()).unwrap_or(0)
}

/// The lower-cased tag prefix that file names are matched against.
pub fn match_key(tag: &str) -> String {
    tag.trim().chars().take(TAG_MATCH_LEN).collect::<String>().to_lowercase()
}

fn list_spreadsheets(dir: &Path) -> Result<Vec<PathBuf>, PipelineError> {
    let entries = fs::read_dir(dir).map_err(|e| PipelineError::DataDir {
        path: dir.to_path_buf(),
        reason: e.to_string(),
    })?;

    let mut out: Vec<PathBuf> = entries
        .flatten()
        .filter(|entry| entry.file_type().map(|ft| ft.is_file()).unwrap_or(false))
        .map(|entry| entry.path())
        .filter(|path| is_spreadsheet(path))
        .collect();

    out.sort_by_key(|path| file_name(path));
    Ok(out)
}

fn is_spreadsheet(path: &Path) -> bool {
    // Lock files left by office suites (`~$book.xlsx`) are not workbooks.
    if file_name(path).starts_with("~$") {
        return false;
    }
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| SPREADSHEET_EXTENSIONS.iter().any(|known| ext.eq_ignore_ascii_case(known)))
        == Some(true)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
