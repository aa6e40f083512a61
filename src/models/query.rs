//! Query specification models.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::client::{build_url, DatastoreError};

/// Which DataStore endpoint a query targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryMode {
    /// Keyword search against `QuickSearch`
    Search,
    /// Digital-file listing for a known reference id
    ByReferenceId,
}

impl QueryMode {
    /// Mode tag appended for keyword search
    pub const SEARCH_TAG: &'static str = "QuickSearch?";

    /// Mode tag appended for digital-file lookups
    pub const DIGITAL_FILES_TAG: &'static str = "/DigitalFiles";

    /// The literal tag the URL builder appends for this mode
    pub fn tag(&self) -> &'static str {
        match self {
            QueryMode::Search => Self::SEARCH_TAG,
            QueryMode::ByReferenceId => Self::DIGITAL_FILES_TAG,
        }
    }

    /// Name of the parameter holding the term or id
    pub fn parameter_name(&self) -> &'static str {
        match self {
            QueryMode::Search => "q",
            QueryMode::ByReferenceId => "referenceID",
        }
    }

    /// Whether a non-2xx status is an error for this mode.
    ///
    /// QuickSearch bodies are parsed whatever the status; digital-file
    /// lookups must come back successful.
    pub fn requires_success_status(&self) -> bool {
        matches!(self, QueryMode::ByReferenceId)
    }
}

impl fmt::Display for QueryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryMode::Search => write!(f, "search"),
            QueryMode::ByReferenceId => write!(f, "reference"),
        }
    }
}

impl FromStr for QueryMode {
    type Err = DatastoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            Self::SEARCH_TAG | "search" => Ok(QueryMode::Search),
            Self::DIGITAL_FILES_TAG | "" | "reference" | "digital-files" => {
                Ok(QueryMode::ByReferenceId)
            }
            other => Err(DatastoreError::UnrecognizedMode(other.to_string())),
        }
    }
}

/// Query parameters, always iterated in lexicographic key order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterSet {
    entries: BTreeMap<String, String>,
}

impl ParameterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a parameter
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Entries sorted by key
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ParameterSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut set = ParameterSet::new();
        for (key, value) in iter {
            set.insert(key, value);
        }
        set
    }
}

/// A single DataStore query: a search term or reference id plus its mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuerySpec {
    term: String,
    mode: QueryMode,
    params: ParameterSet,
}

impl QuerySpec {
    /// Create a query for the given term (or id) and mode
    pub fn new(term: impl fmt::Display, mode: QueryMode) -> Self {
        let term = term.to_string();
        let mut params = ParameterSet::new();
        params.insert(mode.parameter_name(), term.clone());

        Self { term, mode, params }
    }

    /// Keyword search
    pub fn search(term: impl fmt::Display) -> Self {
        Self::new(term, QueryMode::Search)
    }

    /// Digital-file lookup for a reference id
    pub fn by_reference_id(reference_id: impl fmt::Display) -> Self {
        Self::new(reference_id, QueryMode::ByReferenceId)
    }

    /// Parse the mode from its tag (`QuickSearch?` or `/DigitalFiles`)
    pub fn from_tag(term: impl fmt::Display, tag: &str) -> Result<Self, DatastoreError> {
        Ok(Self::new(term, tag.parse()?))
    }

    /// Add an extra query parameter
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key, value);
        self
    }

    pub fn term(&self) -> &str {
        &self.term
    }

    pub fn mode(&self) -> QueryMode {
        self.mode
    }

    pub fn params(&self) -> &ParameterSet {
        &self.params
    }

    /// Build the request URL against a base ending in `/`
    pub fn url(&self, base_url: &str) -> Result<String, DatastoreError> {
        match self.mode {
            QueryMode::Search => build_url(base_url, &self.params, self.mode.tag()),
            QueryMode::ByReferenceId => build_url(
                &format!("{}Reference/", base_url),
                &self.params,
                self.mode.tag(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://irmaservices.nps.gov/datastore/v4/rest/";

    #[test]
    fn test_search_url() {
        let query = QuerySpec::search("Isle Royale");
        assert_eq!(
            query.url(BASE).unwrap(),
            "https://irmaservices.nps.gov/datastore/v4/rest/QuickSearch?q=Isle Royale"
        );
    }

    #[test]
    fn test_reference_url() {
        let query = QuerySpec::by_reference_id(2293662);
        assert_eq!(
            query.url(BASE).unwrap(),
            "https://irmaservices.nps.gov/datastore/v4/rest/Reference/2293662/DigitalFiles"
        );
    }

    #[test]
    fn test_extra_params_are_sorted() {
        let query = QuerySpec::search("bison").with_param("top", "10").with_param("a", "1");
        assert_eq!(
            query.url(BASE).unwrap(),
            format!("{}QuickSearch?a=1&q=bison&top=10", BASE)
        );
    }

    #[test]
    fn test_mode_from_tag() {
        assert_eq!("QuickSearch?".parse::<QueryMode>().unwrap(), QueryMode::Search);
        assert_eq!(
            "/DigitalFiles".parse::<QueryMode>().unwrap(),
            QueryMode::ByReferenceId
        );
        assert_eq!("search".parse::<QueryMode>().unwrap(), QueryMode::Search);
        assert_eq!("".parse::<QueryMode>().unwrap(), QueryMode::ByReferenceId);
    }

    #[test]
    fn test_empty_tag_builds_reference_url() {
        let query = QuerySpec::from_tag("2293662", "").unwrap();
        assert_eq!(query.mode(), QueryMode::ByReferenceId);
        assert_eq!(
            query.url(BASE).unwrap(),
            format!("{}Reference/2293662/DigitalFiles", BASE)
        );
    }

    #[test]
    fn test_mode_rejects_unknown_tag() {
        for tag in ["quicksearch?", "DigitalFiles", "/Reference", " "] {
            let err = tag.parse::<QueryMode>().unwrap_err();
            assert!(matches!(err, DatastoreError::UnrecognizedMode(ref t) if t == tag));
        }
        assert!(QuerySpec::from_tag("bison", "Search").is_err());
    }

    #[test]
    fn test_mode_status_policy() {
        assert!(!QueryMode::Search.requires_success_status());
        assert!(QueryMode::ByReferenceId.requires_success_status());
    }

    #[test]
    fn test_parameter_set_order_independent() {
        let a: ParameterSet = [("q", "x"), ("b", "2"), ("a", "1")].into_iter().collect();
        let b: ParameterSet = [("a", "1"), ("q", "x"), ("b", "2")].into_iter().collect();
        assert_eq!(a, b);
        let keys: Vec<_> = a.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["a", "b", "q"]);
    }
}
