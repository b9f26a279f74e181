//! Dataset download.
//!
//! The published dataset is a ZIP archive of per-city, per-year workbooks.
//! We download it once into the data folder and flatten its directory tree.

use std::fs::{self, File};
use std::io::{Cursor, Read, Seek};
use std::path::Path;

use reqwest::blocking::Client;
use thiserror::Error;
use tracing::{debug, info};

use crate::error::AppError;
use crate::io::discover::count_spreadsheets;

/// Historical pollen surveillance archive on data.gouv.fr.
pub const DEFAULT_DATASET_URL: &str =
    "https://www.data.gouv.fr/api/1/datasets/r/d8c275e4-9e8b-4c58-97fe-8f0d48d2d5c7";

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("download failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("invalid archive: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("IO operation failed: {0}")]
    Io(#[from] std::io::Error),
}

impl From<FetchError> for AppError {
    fn from(err: FetchError) -> Self {
        AppError::new(4, format!("Failed to fetch dataset: {err}"))
    }
}

/// Make sure `dir` holds spreadsheets, downloading `url` when it does not (or when `force`).
///
/// Returns the number of spreadsheets in `dir` afterwards.
pub fn ensure_dataset(dir: &Path, url: &str, force: bool) -> Result<usize, FetchError> {
    let existing = count_spreadsheets(dir);
    if existing > 0 && !force {
        debug!(dir = %dir.display(), files = existing, "dataset already present");
        return Ok(existing);
    }

    fs::create_dir_all(dir)?;
    info!(%url, "downloading dataset");
    let bytes = Client::new().get(url).send()?.error_for_status()?.bytes()?;
    info!(bytes = bytes.len(), "download complete");

    let extracted = extract_flat(Cursor::new(bytes), dir)?;
    info!(dir = %dir.display(), files = extracted, "archive extracted");
    Ok(count_spreadsheets(dir))
}

/// Extract every file entry of a ZIP archive directly into `dir`, dropping folders.
///
/// Entries whose path escapes the archive root are skipped.
pub fn extract_flat<R: Read + Seek>(reader: R, dir: &Path) -> Result<usize, FetchError> {
    let mut archive = zip::ZipArchive::new(reader)?;
    let mut extracted = 0usize;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        if entry.is_dir() {
            continue;
        }
        let Some(name) = entry
            .enclosed_name()
            .and_then(|p| p.file_name())
            .map(|n| n.to_os_string())
        else {
            debug!(entry = entry.name(), "skipping unsafe archive entry");
            continue;
        };

        let mut out = File::create(dir.join(&name))?;
        std::io::copy(&mut entry, &mut out)?;
        extracted += 1;
    }

    Ok(extracted)
}
