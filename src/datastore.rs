//! High-level DataStore operations.
//!
//! [`Datastore`] pairs a [`Dispatcher`] with the configured output
//! locations: packages land in `<packages_dir>/<reference id>/` and search
//! exports in `<search_results_dir>/<term>.csv`.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use crate::client::{CredentialProvider, DatastoreError, Dispatcher};
use crate::config::{Config, OutputConfig};
use crate::models::{ApiResponse, FileDescriptor, QueryMode, QuerySpec, SearchResults};
use crate::output::{ExportSummary, PackageDownload, PackageDownloader, SearchExporter};

/// Entry point for searching, listing files, downloading and exporting
#[derive(Debug)]
pub struct Datastore {
    dispatcher: Dispatcher,
    output: OutputConfig,
}

impl Datastore {
    /// Create a datastore client from configuration
    pub fn new(config: &Config) -> Result<Self, DatastoreError> {
        Ok(Self {
            dispatcher: Dispatcher::new(config)?,
            output: config.output.clone(),
        })
    }

    /// Create from an existing dispatcher
    pub fn from_dispatcher(dispatcher: Dispatcher, output: OutputConfig) -> Self {
        Self { dispatcher, output }
    }

    /// Use a credential provider for package downloads
    pub fn with_credentials(mut self, credentials: Arc<dyn CredentialProvider>) -> Self {
        self.dispatcher = self.dispatcher.with_credentials(credentials);
        self
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Run a query and return the raw parsed response
    pub async fn query(&self, query: &QuerySpec) -> Result<ApiResponse, DatastoreError> {
        self.dispatcher.query(query).await
    }

    /// QuickSearch for a term
    pub async fn search(&self, query: &QuerySpec) -> Result<SearchResults, DatastoreError> {
        expect_mode(query, QueryMode::Search)?;
        let response = self.query(query).await?;
        let results = response.search_results()?;
        tracing::info!(
            "search for '{}' returned {} results",
            query.term(),
            results.len()
        );
        Ok(results)
    }

    /// List the digital files attached to a reference
    pub async fn digital_files(
        &self,
        reference_id: impl std::fmt::Display,
    ) -> Result<Vec<FileDescriptor>, DatastoreError> {
        let response = self
            .query(&QuerySpec::by_reference_id(reference_id))
            .await?;
        response.file_descriptors()
    }

    /// Default package directory for a reference id
    pub fn package_destination(
        &self,
        reference_id: impl std::fmt::Display,
    ) -> Result<PathBuf, DatastoreError> {
        let name = reference_id.to_string();
        Ok(self.output.packages_dir.join(single_component(&name)?))
    }

    /// Default export path (without `.csv`) for a search term
    pub fn export_destination(&self, term: &str) -> Result<PathBuf, DatastoreError> {
        Ok(self.output.search_results_dir.join(single_component(term)?))
    }

    /// Download the two files of a reference package.
    ///
    /// Writes into `destination`, or `<packages_dir>/<reference id>` when none
    /// is given.
    pub async fn download_package(
        &self,
        reference_id: impl std::fmt::Display,
        destination: Option<&Path>,
    ) -> Result<PackageDownload, DatastoreError> {
        let query = QuerySpec::by_reference_id(reference_id);
        let destination = match destination {
            Some(path) => path.to_path_buf(),
            None => self.package_destination(query.term())?,
        };

        let response = self.query(&query).await?;
        PackageDownloader::new(&self.dispatcher)
            .download(&response, &destination)
            .await
    }

    /// Search for a term and export the results to CSV.
    ///
    /// Writes `<destination>.csv`, or `<search_results_dir>/<term>.csv` when
    /// no destination is given.
    pub async fn export_search_results(
        &self,
        query: &QuerySpec,
        destination: Option<&Path>,
    ) -> Result<ExportSummary, DatastoreError> {
        expect_mode(query, QueryMode::Search)?;
        let destination = match destination {
            Some(path) => path.to_path_buf(),
            None => self.export_destination(query.term())?,
        };

        let response = self.query(query).await?;
        SearchExporter::new().export(&response, &destination)
    }
}

/// A term or id used as a file name must stay inside its output directory
fn single_component(name: &str) -> Result<&Path, DatastoreError> {
    let path = Path::new(name);
    let mut components = path.components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(path),
        _ => Err(DatastoreError::InvalidRequest(format!(
            "'{}' cannot be used as a file name; pass an explicit destination",
            name
        ))),
    }
}

fn expect_mode(query: &QuerySpec, mode: QueryMode) -> Result<(), DatastoreError> {
    if query.mode() != mode {
        return Err(DatastoreError::InvalidRequest(format!(
            "expected a {} query, got a {} query",
            mode,
            query.mode()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_destinations() {
        let datastore = Datastore::new(&Config::default()).unwrap();
        assert_eq!(
            datastore.package_destination(2293662).unwrap(),
            PathBuf::from("packages/2293662")
        );
        assert_eq!(
            datastore.export_destination("Isle Royale").unwrap(),
            PathBuf::from("search_results/Isle Royale")
        );
    }

    #[test]
    fn test_destinations_stay_inside_output_dirs() {
        let datastore = Datastore::new(&Config::default()).unwrap();
        for term in ["/tmp/outside/evil", "../evil", "a/b", "..", ".", ""] {
            assert!(
                matches!(
                    datastore.export_destination(term),
                    Err(DatastoreError::InvalidRequest(_))
                ),
                "accepted {:?}",
                term
            );
            assert!(datastore.package_destination(term).is_err());
        }
        assert_eq!(
            datastore.export_destination("v1.2 report").unwrap(),
            PathBuf::from("search_results/v1.2 report")
        );
    }

    #[tokio::test]
    async fn test_export_rejects_absolute_term_before_querying() {
        let mut config = Config::default();
        config.api.base_url = "http://127.0.0.1:9/rest/".to_string();
        let datastore = Datastore::new(&config).unwrap();

        let result = datastore
            .export_search_results(&QuerySpec::search("/tmp/outside/evil"), None)
            .await;
        assert!(matches!(result, Err(DatastoreError::InvalidRequest(_))));
    }

    #[test]
    fn test_from_dispatcher_uses_given_output() {
        let config = Config::default();
        let output = OutputConfig {
            packages_dir: PathBuf::from("/data/pkgs"),
            ..config.output.clone()
        };
        let datastore = Datastore::from_dispatcher(Dispatcher::new(&config).unwrap(), output);
        assert_eq!(
            datastore.package_destination("42").unwrap(),
            PathBuf::from("/data/pkgs/42")
        );
    }

    #[tokio::test]
    async fn test_search_rejects_reference_query() {
        let datastore = Datastore::new(&Config::default()).unwrap();
        let result = datastore.search(&QuerySpec::by_reference_id(1)).await;
        assert!(matches!(result, Err(DatastoreError::InvalidRequest(_))));
    }
}
