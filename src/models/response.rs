//! Typed views over DataStore API responses.
//!
//! Responses are kept as generic JSON and only validated into a concrete
//! shape when a caller needs one, so a malformed body fails with a
//! [`DatastoreError::ResponseParse`] instead of a panic on indexing.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::client::DatastoreError;

/// Number of items QuickSearch returns per page
pub const SEARCH_PAGE_SIZE: usize = 25;

/// Files that make up one reference package
pub const PACKAGE_FILE_COUNT: usize = 2;

/// One search result record, keys in the order the API sent them
pub type Record = Map<String, Value>;

/// Text of a record value as shown in a table cell or CSV field.
///
/// Null is empty, strings are verbatim, anything else is compact JSON.
pub fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Parsed body of a DataStore response together with the URL it came from
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiResponse {
    url: String,
    body: Value,
}

impl ApiResponse {
    pub fn new(url: impl Into<String>, body: Value) -> Self {
        Self {
            url: url.into(),
            body,
        }
    }

    /// URL the response was fetched from
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn body(&self) -> &Value {
        &self.body
    }

    pub fn into_body(self) -> Value {
        self.body
    }

    /// Interpret the body as a QuickSearch result page
    pub fn search_results(&self) -> Result<SearchResults, DatastoreError> {
        let object = self
            .body
            .as_object()
            .ok_or_else(|| self.parse_error("expected a JSON object with an 'items' array"))?;

        let items = object
            .get("items")
            .and_then(Value::as_array)
            .ok_or_else(|| self.parse_error("missing 'items' array"))?;

        let records = items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                item.as_object()
                    .cloned()
                    .ok_or_else(|| self.parse_error(&format!("item {} is not an object", index)))
            })
            .collect::<Result<Vec<Record>, _>>()?;

        Ok(SearchResults {
            items: records,
            page_detail: object.get("pageDetail").cloned(),
        })
    }

    /// Interpret the body as a list of digital-file descriptors
    pub fn file_descriptors(&self) -> Result<Vec<FileDescriptor>, DatastoreError> {
        self.descriptor_entries()?
            .iter()
            .enumerate()
            .map(|(index, entry)| self.descriptor(index, entry))
            .collect()
    }

    /// The two descriptors that make up a package.
    ///
    /// Extra descriptors beyond the second are not part of the package.
    pub fn package_descriptors(&self) -> Result<Vec<FileDescriptor>, DatastoreError> {
        let entries = self.descriptor_entries()?;
        if entries.len() < PACKAGE_FILE_COUNT {
            return Err(DatastoreError::MissingDescriptor {
                expected: PACKAGE_FILE_COUNT,
                found: entries.len(),
            });
        }

        if entries.len() > PACKAGE_FILE_COUNT {
            tracing::warn!(
                "{} lists {} files; only the first {} are downloaded",
                self.url,
                entries.len(),
                PACKAGE_FILE_COUNT
            );
        }

        let descriptors = entries
            .iter()
            .take(PACKAGE_FILE_COUNT)
            .enumerate()
            .map(|(index, entry)| self.descriptor(index, entry))
            .collect::<Result<Vec<_>, _>>()?;

        if descriptors[0].file_name == descriptors[1].file_name {
            return Err(self.parse_error(&format!(
                "both package files are named '{}'",
                descriptors[0].file_name
            )));
        }
        Ok(descriptors)
    }

    fn descriptor_entries(&self) -> Result<&Vec<Value>, DatastoreError> {
        self.body
            .as_array()
            .ok_or_else(|| self.parse_error("expected a JSON array of file descriptors"))
    }

    fn descriptor(&self, index: usize, entry: &Value) -> Result<FileDescriptor, DatastoreError> {
        let descriptor: FileDescriptor = serde_json::from_value(entry.clone())
            .map_err(|e| self.parse_error(&format!("file descriptor {}: {}", index, e)))?;
        descriptor.validate_file_name().map_err(|reason| {
            self.parse_error(&format!("file descriptor {}: {}", index, reason))
        })?;
        Ok(descriptor)
    }

    fn parse_error(&self, message: &str) -> DatastoreError {
        DatastoreError::ResponseParse {
            url: self.url.clone(),
            message: message.to_string(),
        }
    }
}

/// One page of QuickSearch results
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResults {
    /// Result records
    pub items: Vec<Record>,

    /// Paging metadata as returned by the API
    #[serde(rename = "pageDetail")]
    pub page_detail: Option<Value>,
}

impl SearchResults {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Column names taken from the first record
    pub fn headers(&self) -> Option<Vec<String>> {
        self.items
            .first()
            .map(|record| record.keys().cloned().collect())
    }

    /// A full page usually means the API stopped at its page size
    pub fn may_be_truncated(&self) -> bool {
        self.items.len() >= SEARCH_PAGE_SIZE
    }
}

/// A downloadable file attached to a reference
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileDescriptor {
    pub download_link: String,
    pub file_name: String,

    /// Remaining fields, passed through untouched
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FileDescriptor {
    /// Reject names that would escape the destination directory
    fn validate_file_name(&self) -> Result<(), String> {
        let name = self.file_name.as_str();
        if name.is_empty() || name == "." || name == ".." {
            return Err(format!("unusable file name '{}'", name));
        }
        if name.contains('/') || name.contains('\\') {
            return Err(format!("file name '{}' contains a path separator", name));
        }
        Ok(())
    }
}
