//! CSV export of QuickSearch results.

use serde::Serialize;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::client::DatastoreError;
use crate::models::{value_text, ApiResponse, SEARCH_PAGE_SIZE};
use crate::output::{ensure_dir, write_atomically};

/// Result of a CSV export
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportSummary {
    /// Path of the written CSV file
    pub path: PathBuf,

    /// Header columns, taken from the first record
    pub columns: Vec<String>,

    /// Number of data rows written
    pub rows: usize,
}

/// Writes search records to a header-driven CSV file
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchExporter;

impl SearchExporter {
    pub fn new() -> Self {
        Self
    }

    /// Export the `items` of a search response to `<destination>.csv`.
    ///
    /// The header is the key set of the first record. Every record is
    /// written against that header: missing keys give empty cells and keys
    /// the first record lacks are dropped.
    pub fn export(
        &self,
        response: &ApiResponse,
        destination: &Path,
    ) -> Result<ExportSummary, DatastoreError> {
        let results = response.search_results()?;
        let headers = results
            .headers()
            .ok_or_else(|| DatastoreError::EmptyResult(response.url().to_string()))?;

        if results.may_be_truncated() {
            tracing::warn!(
                "search returned a full page of {} results; the API does not page further",
                SEARCH_PAGE_SIZE
            );
        }

        for (index, record) in results.items.iter().enumerate() {
            let extra: Vec<&str> = record
                .keys()
                .filter(|key| !headers.contains(key))
                .map(String::as_str)
                .collect();
            if !extra.is_empty() {
                tracing::warn!(
                    "record {} has fields not in the header, dropped: {}",
                    index,
                    extra.join(", ")
                );
            }
        }

        let path = csv_path(destination);
        if let Some(parent) = path.parent() {
            ensure_dir(parent)?;
        }

        write_atomically(&path, |file| {
            let mut writer = csv::Writer::from_writer(file);
            writer.write_record(&headers)?;
            for record in &results.items {
                let row = headers
                    .iter()
                    .map(|key| record.get(key).map(value_text).unwrap_or_default());
                writer.write_record(row)?;
            }
            writer.flush()?;
            Ok(())
        })?;

        tracing::info!(
            "wrote {} search results to {}",
            results.len(),
            path.display()
        );

        Ok(ExportSummary {
            path,
            columns: headers,
            rows: results.len(),
        })
    }
}

/// `<destination>.csv`, keeping any dots already in the name
fn csv_path(destination: &Path) -> PathBuf {
    let mut name = OsString::from(destination.as_os_str());
    name.push(".csv");
    PathBuf::from(name)
}
