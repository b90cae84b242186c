//! Local emulation of a search-index service over flat-file JSON
//! records.
//!
//! `solosearch` scans collections of JSON record files on disk and
//! evaluates a restricted Lucene-like query language against them in
//! memory, with pagination and an optional streaming sink. It exists
//! so that code written against a "search a data index by query
//! string" contract can run against local file data instead of a live
//! search cluster.

pub mod cli;
pub mod models;
pub mod search;
pub mod store;

pub use models::{
    CollectionRef, FieldTerm, QueryExpr, Record, SearchError, SearchRequest, StoreError,
    DEFAULT_ROWS,
};
pub use search::{parse_query, run_search, run_search_each, Engine, Searchable};
pub use store::{FileStore, RecordSource, StoreConfig};
