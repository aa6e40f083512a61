//! Core data models for DataStore queries and responses.

mod query;
mod response;

pub use query::{ParameterSet, QueryMode, QuerySpec};
pub use response::{
    value_text, ApiResponse, FileDescriptor, Record, SearchResults, PACKAGE_FILE_COUNT,
    SEARCH_PAGE_SIZE,
};
