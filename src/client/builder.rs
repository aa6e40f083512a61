//! Request URL assembly.
//!
//! Values are inserted verbatim: nothing is percent-encoded, so a term
//! containing `&` or `=` changes the query it produces.

use crate::client::DatastoreError;
use crate::models::{ParameterSet, QueryMode};

/// Build a request URL from a base, a parameter set and a mode tag.
///
/// With `QuickSearch?` the parameters become `key=value` pairs after the
/// tag: `{base}QuickSearch?a=1&q=term`. With `/DigitalFiles` or the empty
/// tag only the values are joined and the tag is appended as a suffix:
/// `{base}2293662/DigitalFiles`. Keys are always taken in lexicographic
/// order.
pub fn build_url(
    base_url: &str,
    params: &ParameterSet,
    mode_tag: &str,
) -> Result<String, DatastoreError> {
    if base_url.is_empty() {
        return Err(DatastoreError::InvalidRequest(
            "base URL must not be empty".to_string(),
        ));
    }
    if params.is_empty() {
        return Err(DatastoreError::InvalidRequest(
            "at least one query parameter is required".to_string(),
        ));
    }

    let url = match mode_tag {
        QueryMode::SEARCH_TAG => {
            let pairs: Vec<String> = params.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
            format!("{}{}{}", base_url, mode_tag, pairs.join("&"))
        }
        QueryMode::DIGITAL_FILES_TAG | "" => {
            let values: Vec<&str> = params.iter().map(|(_, v)| v).collect();
            format!("{}{}{}", base_url, values.join("&"), mode_tag)
        }
        other => return Err(DatastoreError::UnrecognizedMode(other.to_string())),
    };

    tracing::debug!(mode = mode_tag, "built url {}", url);
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://irmaservices.nps.gov/datastore/v4/rest/";

    fn params(entries: &[(&str, &str)]) -> ParameterSet {
        entries.iter().copied().collect()
    }

    #[test]
    fn test_quick_search_single_param() {
        let url = build_url(BASE, &params(&[("q", "Isle Royale")]), "QuickSearch?").unwrap();
        assert_eq!(
            url,
            "https://irmaservices.nps.gov/datastore/v4/rest/QuickSearch?q=Isle Royale"
        );
    }

    #[test]
    fn test_digital_files() {
        let base = format!("{}Reference/", BASE);
        let url = build_url(&base, &params(&[("referenceID", "2293662")]), "/DigitalFiles")
            .unwrap();
        assert_eq!(
            url,
            "https://irmaservices.nps.gov/datastore/v4/rest/Reference/2293662/DigitalFiles"
        );
    }

    #[test]
    fn test_insertion_order_does_not_matter() {
        let forward = params(&[("q", "bison"), ("top", "5"), ("area", "west")]);
        let reverse = params(&[("area", "west"), ("top", "5"), ("q", "bison")]);

        for tag in ["QuickSearch?", "/DigitalFiles", ""] {
            assert_eq!(
                build_url(BASE, &forward, tag).unwrap(),
                build_url(BASE, &reverse, tag).unwrap()
            );
        }
    }

    #[test]
    fn test_search_pairs_sorted_by_key() {
        let url = build_url(
            BASE,
            &params(&[("q", "bison"), ("top", "5"), ("area", "west")]),
            "QuickSearch?",
        )
        .unwrap();
        assert_eq!(url, format!("{}QuickSearch?area=west&q=bison&top=5", BASE));
    }

    #[test]
    fn test_bare_values_joined_then_tag() {
        let url = build_url(BASE, &params(&[("b", "2"), ("a", "1")]), "/DigitalFiles").unwrap();
        assert_eq!(url, format!("{}1&2/DigitalFiles", BASE));
    }

    #[test]
    fn test_empty_tag_shares_reference_branch() {
        let url = build_url(BASE, &params(&[("referenceID", "42")]), "").unwrap();
        assert_eq!(url, format!("{}42", BASE));
    }

    #[test]
    fn test_values_are_not_escaped() {
        let url = build_url(BASE, &params(&[("q", "a&b=c")]), "QuickSearch?").unwrap();
        assert_eq!(url, format!("{}QuickSearch?q=a&b=c", BASE));
    }

    #[test]
    fn test_unrecognized_tag() {
        for tag in ["Search", "quicksearch?", "/digitalfiles", "?"] {
            let err = build_url(BASE, &params(&[("q", "x")]), tag).unwrap_err();
            assert!(matches!(err, DatastoreError::UnrecognizedMode(ref t) if t == tag));
        }
    }

    #[test]
    fn test_rejects_empty_inputs() {
        assert!(matches!(
            build_url("", &params(&[("q", "x")]), "QuickSearch?"),
            Err(DatastoreError::InvalidRequest(_))
        ));
        assert!(matches!(
            build_url(BASE, &ParameterSet::new(), "QuickSearch?"),
            Err(DatastoreError::InvalidRequest(_))
        ));
    }
}
