//! Query language and search execution.

pub mod engine;
pub mod query;

pub use engine::{run_search, run_search_each, Engine, Searchable};
pub use query::{parse_query, record_matches};
