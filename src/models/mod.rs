//! Shared data models for records, collections, queries, and requests.
//!
//! These types form the public API surface used by the query parser,
//! the search engine, the record store, and the CLI.

use std::convert::Infallible;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Default number of rows returned by a search when the caller does
/// not specify a window size.
pub const DEFAULT_ROWS: usize = 1000;

/// A single record: an opaque mapping from field name to JSON value.
///
/// Records are immutable once loaded. The only field with special
/// meaning is the optional `id`, which the store uses to deduplicate
/// data-bag items and the CLI uses for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

impl Record {
    /// Look up a top-level field by name.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// The record's `id` field, when present and a string.
    pub fn id(&self) -> Option<&str> {
        self.0.get("id").and_then(Value::as_str)
    }

    /// Borrow the underlying field map.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl From<Map<String, Value>> for Record {
    fn from(fields: Map<String, Value>) -> Self {
        Record(fields)
    }
}

/// Reference to a named group of records.
///
/// `Node` and `Role` are reserved kinds backed by dedicated
/// directories; everything else is a generic data bag. The kind only
/// determines which directory the store consults; loading and
/// matching semantics are identical for all three.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionRef {
    Node,
    Role,
    DataBag(String),
}

impl FromStr for CollectionRef {
    type Err = Infallible;

    /// The reserved names `node` and `role` select the dedicated
    /// collections; any other name refers to a data bag. A data bag
    /// literally named `node` or `role` is therefore not reachable
    /// through this mapping.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "node" => CollectionRef::Node,
            "role" => CollectionRef::Role,
            other => CollectionRef::DataBag(other.to_string()),
        })
    }
}

impl fmt::Display for CollectionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CollectionRef::Node => f.write_str("node"),
            CollectionRef::Role => f.write_str("role"),
            CollectionRef::DataBag(name) => f.write_str(name),
        }
    }
}

/// A single field comparison such as `color:red` or `name:jo*`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldTerm {
    /// Field name, whitespace-trimmed.
    pub field: String,
    /// Comparison string. For prefix terms the trailing `*` is already
    /// stripped.
    pub value: String,
    /// Invert the result of the comparison (leading `NOT`).
    #[serde(default)]
    pub negate: bool,
}

/// Parsed query AST.
///
/// Built once per query string and reused across all records in one
/// search call. The tree is finite and acyclic; its depth is bounded
/// by the number of boolean connectives in the source string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryExpr {
    /// Matches every record unconditionally (absent query or `*:*`).
    Any,
    /// Exact string-form comparison against a field.
    Field(FieldTerm),
    /// Prefix comparison against a field (trailing `*` in the query).
    Prefix(FieldTerm),
    /// All sub-queries must match.
    And(Vec<QueryExpr>),
    /// Any sub-query must match.
    Or(Vec<QueryExpr>),
    /// The first sub-query must match and none of the rest may.
    Not(Vec<QueryExpr>),
}

/// Parameters for one search invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    /// Collection to search.
    pub collection: CollectionRef,
    /// Query string; `None` matches every record.
    #[serde(default)]
    pub query: Option<String>,
    /// Sort specification. Always rejected; carried here only so the
    /// engine can surface the failure to callers of the emulated
    /// contract.
    #[serde(default)]
    pub sort: Option<String>,
    /// Zero-based position of the first matching record to return.
    #[serde(default)]
    pub start: usize,
    /// Maximum number of matching records to return.
    #[serde(default = "default_rows")]
    pub rows: usize,
}

fn default_rows() -> usize {
    DEFAULT_ROWS
}

impl SearchRequest {
    /// Request over `collection` with no query (match everything) and
    /// the default window.
    pub fn new(collection: CollectionRef) -> Self {
        Self {
            collection,
            query: None,
            sort: None,
            start: 0,
            rows: DEFAULT_ROWS,
        }
    }

    /// Replace the query string.
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    /// Replace the pagination window.
    pub fn with_window(mut self, start: usize, rows: usize) -> Self {
        self.start = start;
        self.rows = rows;
        self
    }
}

/// Failures surfaced by the record store.
///
/// These are fatal to the calling search invocation and never retried:
/// a search is a pure read, so retrying with unchanged files cannot
/// succeed where the first attempt failed.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A record file could not be read.
    #[error("failed to read record file {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// A record file is not a single JSON object.
    #[error("invalid record file {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Failures surfaced by a search invocation.
///
/// All variants abort the entire call before any sink invocation or
/// result construction; partial results are never returned alongside
/// a failure.
#[derive(Debug, Error)]
pub enum SearchError {
    /// A sort specification was supplied; result ordering is not
    /// supported.
    #[error("sorting search results is not supported")]
    UnsupportedSort,
    /// The query string does not parse under the supported grammar.
    #[error("query {0:?} is not supported")]
    UnsupportedQuery(String),
    /// Propagated record store failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}
