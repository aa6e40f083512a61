//! Local persistence of DataStore results.
//!
//! - [`PackageDownloader`]: writes the two files of a reference package
//! - [`SearchExporter`]: writes QuickSearch records as CSV
//!
//! Every file is written to a temporary sibling and renamed into place, so
//! an interrupted write never leaves a truncated file behind.

mod export;
mod package;

pub use export::{ExportSummary, SearchExporter};
pub use package::{DownloadedFile, PackageDownload, PackageDownloader};

use std::fs;
use std::io;
use std::path::Path;
use tempfile::NamedTempFile;

use crate::client::DatastoreError;

/// Create a directory and its parents; returns whether it had to be created
pub(crate) fn ensure_dir(path: &Path) -> Result<bool, DatastoreError> {
    if path.as_os_str().is_empty() || path.is_dir() {
        return Ok(false);
    }

    tracing::info!("creating directory {}", path.display());
    fs::create_dir_all(path).map_err(|e| DatastoreError::io(path, e))?;
    Ok(true)
}

/// Write a file through a temporary sibling, replacing any existing file
pub(crate) fn write_atomically<F>(path: &Path, write: F) -> Result<(), DatastoreError>
where
    F: FnOnce(&mut NamedTempFile) -> io::Result<()>,
{
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut temp = NamedTempFile::new_in(dir).map_err(|e| DatastoreError::io(dir, e))?;
    write(&mut temp).map_err(|e| DatastoreError::io(path, e))?;
    temp.as_file()
        .sync_all()
        .map_err(|e| DatastoreError::io(path, e))?;
    temp.persist(path)
        .map_err(|e| DatastoreError::io(path, e.error))?;

    Ok(())
}
