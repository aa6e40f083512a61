//! Reference package downloads.

use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::{NamedTempFile, TempPath};

use crate::client::{DatastoreError, Dispatcher};
use crate::models::ApiResponse;
use crate::output::ensure_dir;

/// A file written by a package download
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DownloadedFile {
    /// Name from the file descriptor
    pub name: String,

    /// Where it was written
    pub path: PathBuf,

    /// Number of bytes written
    pub bytes: u64,
}

/// Result of downloading a package
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageDownload {
    /// Destination directory
    pub directory: PathBuf,

    /// Files written, in descriptor order
    pub files: Vec<DownloadedFile>,
}

impl PackageDownload {
    pub fn total_bytes(&self) -> u64 {
        self.files.iter().map(|f| f.bytes).sum()
    }
}

/// Downloads the files listed in a digital-files response
#[derive(Debug, Clone, Copy)]
pub struct PackageDownloader<'a> {
    dispatcher: &'a Dispatcher,
}

impl<'a> PackageDownloader<'a> {
    pub fn new(dispatcher: &'a Dispatcher) -> Self {
        Self { dispatcher }
    }

    /// Download both package files into `destination`.
    ///
    /// All file bodies are fetched before anything touches the disk. Both
    /// files are then staged as temporary siblings and only moved into place
    /// once both are staged. Existing files are set aside while the package
    /// is committed and put back if any step fails, so the directory ends up
    /// with either the whole new package or what it held before.
    pub async fn download(
        &self,
        response: &ApiResponse,
        destination: &Path,
    ) -> Result<PackageDownload, DatastoreError> {
        let descriptors = response.package_descriptors()?;

        let mut bodies = Vec::with_capacity(descriptors.len());
        for descriptor in &descriptors {
            let bytes = self
                .dispatcher
                .fetch_bytes(&descriptor.download_link)
                .await?;
            tracing::debug!(
                "fetched {} ({} bytes) from {}",
                descriptor.file_name,
                bytes.len(),
                descriptor.download_link
            );
            bodies.push(bytes);
        }

        let created_dir = ensure_dir(destination)?;
        if !created_dir {
            tracing::debug!("directory {} already exists", destination.display());
        }

        let mut staged = Vec::with_capacity(descriptors.len());
        for (descriptor, bytes) in descriptors.iter().zip(&bodies) {
            match stage(destination, &descriptor.file_name, bytes) {
                Ok(file) => staged.push(file),
                Err(e) => {
                    drop(staged);
                    remove_created_dir(destination, created_dir);
                    return Err(e);
                }
            }
        }

        let mut committed: Vec<Committed> = Vec::with_capacity(staged.len());
        for file in staged {
            match commit(file) {
                Ok(done) => committed.push(done),
                Err(e) => {
                    rollback(committed, destination, created_dir);
                    return Err(e);
                }
            }
        }

        let files = committed
            .into_iter()
            .map(|done| {
                tracing::info!("wrote {} ({} bytes)", done.file.path.display(), done.file.bytes);
                done.file
            })
            .collect();

        Ok(PackageDownload {
            directory: destination.to_path_buf(),
            files,
        })
    }
}

/// A package file written to a temporary sibling, not yet in place
struct Staged {
    file: DownloadedFile,
    temp: NamedTempFile,
}

/// A package file moved into place, with the file it replaced
struct Committed {
    file: DownloadedFile,
    backup: Option<TempPath>,
}

fn stage(destination: &Path, name: &str, bytes: &[u8]) -> Result<Staged, DatastoreError> {
    let path = destination.join(name);
    let mut temp =
        NamedTempFile::new_in(destination).map_err(|e| DatastoreError::io(destination, e))?;
    temp.write_all(bytes)
        .and_then(|_| temp.as_file().sync_all())
        .map_err(|e| DatastoreError::io(&path, e))?;

    Ok(Staged {
        file: DownloadedFile {
            name: name.to_string(),
            path,
            bytes: bytes.len() as u64,
        },
        temp,
    })
}

fn commit(staged: Staged) -> Result<Committed, DatastoreError> {
    let Staged { file, temp } = staged;
    let dir = file.path.parent().unwrap_or_else(|| Path::new("."));

    let backup = if file.path.is_file() {
        let backup = NamedTempFile::new_in(dir)
            .map_err(|e| DatastoreError::io(dir, e))?
            .into_temp_path();
        fs::rename(&file.path, &backup).map_err(|e| DatastoreError::io(&file.path, e))?;
        Some(backup)
    } else {
        None
    };

    if let Err(e) = temp.persist(&file.path) {
        if let Some(backup) = backup {
            restore(backup, &file.path);
        }
        return Err(DatastoreError::io(&file.path, e.error));
    }

    Ok(Committed { file, backup })
}

/// Put a set-aside file back where it was
fn restore(backup: TempPath, path: &Path) {
    if let Err(e) = fs::rename(&backup, path) {
        match backup.keep() {
            Ok(kept) => tracing::error!(
                "could not restore {} ({}); previous contents kept at {}",
                path.display(),
                e,
                kept.display()
            ),
            Err(keep) => tracing::error!("could not restore {}: {}", path.display(), keep.error),
        }
    }
}

fn rollback(committed: Vec<Committed>, destination: &Path, created_dir: bool) {
    for done in committed.into_iter().rev() {
        match done.backup {
            Some(backup) => restore(backup, &done.file.path),
            None => {
                if let Err(e) = fs::remove_file(&done.file.path) {
                    tracing::warn!("failed to remove {}: {}", done.file.path.display(), e);
                }
            }
        }
    }

    remove_created_dir(destination, created_dir);
}

fn remove_created_dir(destination: &Path, created_dir: bool) {
    if created_dir {
        // only succeeds if nothing else was put there meanwhile
        let _ = fs::remove_dir(destination);
    }
}
