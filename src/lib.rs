//! # IRMA DataStore
//!
//! Client for the NPS IRMA DataStore REST API: keyword search (QuickSearch)
//! and digital-file lookup by reference id, with helpers to download a
//! reference's file package or export search results to CSV.
//!
//! ## Architecture
//!
//! - [`models`]: query specifications and typed views over API responses
//! - [`client`]: URL builder, dispatcher, response cache and credential seam
//! - [`output`]: package downloader and CSV search exporter
//! - [`datastore`]: facade tying a dispatcher to output locations
//! - [`config`]: configuration management
//! - [`utils`]: HTTP client construction
//! - [`ui`]: terminal rendering for the CLI

pub mod client;
pub mod config;
pub mod datastore;
pub mod models;
pub mod output;
pub mod ui;
pub mod utils;

// Re-export commonly used types
pub use client::{DatastoreError, Dispatcher};
pub use datastore::Datastore;
pub use models::{QueryMode, QuerySpec};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
