//! Utility modules supporting DataStore operations.
//!
//! - [`HttpClient`]: shared HTTP client with explicit timeouts
//!
//! ```rust,no_run
//! use irma_datastore::config::ApiConfig;
//! use irma_datastore::utils::HttpClient;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let client = HttpClient::new(&ApiConfig::default())?;
//! let _request = client.get("https://irmaservices.nps.gov/datastore/v4/rest/QuickSearch?q=bison");
//! # Ok(())
//! # }
//! ```

mod http;

pub use http::HttpClient;
