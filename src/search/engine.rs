//! Core search entry points.
//!
//! These functions provide the "search as a function" API used by the
//! CLI and by host runtimes that embed the engine. Both entry points
//! compile the query once, pull the collection's records from a
//! `RecordSource`, and window the matches identically; they differ
//! only in how results are delivered.

use tracing::debug;

use crate::models::{QueryExpr, Record, SearchError, SearchRequest};
use crate::search::query::{parse_query, record_matches};
use crate::store::RecordSource;

/// Execute a search and return the paginated matches.
///
/// Records are scanned in the source's load order; matches at filtered
/// positions `[start, start + rows)` are returned. A `start` at or
/// past the number of matches yields an empty result, and a window
/// reaching past the last match is clipped, never an error.
pub fn run_search<S: RecordSource>(
    store: &mut S,
    request: &SearchRequest,
) -> Result<Vec<Record>, SearchError> {
    let query = compile(request)?;
    let records = store.load(&request.collection)?;

    let mut result = Vec::new();
    let mut pos = 0usize;
    for record in records {
        if !record_matches(&query, record) {
            continue;
        }
        if in_window(pos, request) {
            result.push(record.clone());
        }
        pos += 1;
    }

    debug!(
        collection = %request.collection,
        matched = pos,
        returned = result.len(),
        "search complete"
    );

    Ok(result)
}

/// Execute a search, delivering each match in the window to `sink`.
///
/// The sink is invoked synchronously, in filtered order, exactly once
/// per matching record whose zero-based position (counted over
/// matching records only) falls inside `[start, start + rows)`, and
/// never outside that window. Nothing is buffered; the record set
/// delivered is the same one `run_search` would return.
pub fn run_search_each<S, F>(
    store: &mut S,
    request: &SearchRequest,
    mut sink: F,
) -> Result<(), SearchError>
where
    S: RecordSource,
    F: FnMut(&Record),
{
    let query = compile(request)?;
    let records = store.load(&request.collection)?;

    let mut pos = 0usize;
    for record in records {
        if !record_matches(&query, record) {
            continue;
        }
        if in_window(pos, request) {
            sink(record);
        }
        pos += 1;
    }

    Ok(())
}

/// Validate the request and compile its query string.
///
/// A sort specification is rejected before anything else happens; an
/// unsupported query fails before any record is loaded, so neither
/// failure can be preceded by a sink invocation.
fn compile(request: &SearchRequest) -> Result<QueryExpr, SearchError> {
    if request.sort.is_some() {
        return Err(SearchError::UnsupportedSort);
    }
    parse_query(request.query.as_deref())
        .ok_or_else(|| SearchError::UnsupportedQuery(request.query.clone().unwrap_or_default()))
}

fn in_window(pos: usize, request: &SearchRequest) -> bool {
    pos >= request.start && pos < request.start.saturating_add(request.rows)
}

/// Capability interface a host runtime wires into its execution
/// context to give embedded code a `search` primitive.
///
/// The engine is handed in by reference (dependency injection or a
/// registered callback), never installed through ambient global state.
pub trait Searchable {
    /// Buffered search: return the paginated matches.
    fn search(&mut self, request: &SearchRequest) -> Result<Vec<Record>, SearchError>;

    /// Streaming search: deliver each match in the window to `sink`.
    fn search_each(
        &mut self,
        request: &SearchRequest,
        sink: &mut dyn FnMut(&Record),
    ) -> Result<(), SearchError>;
}

/// Search engine bound to a concrete record source.
pub struct Engine<S> {
    store: S,
}

impl<S: RecordSource> Engine<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Consume the engine and hand back its record source.
    pub fn into_store(self) -> S {
        self.store
    }
}

impl<S: RecordSource> Searchable for Engine<S> {
    fn search(&mut self, request: &SearchRequest) -> Result<Vec<Record>, SearchError> {
        run_search(&mut self.store, request)
    }

    fn search_each(
        &mut self,
        request: &SearchRequest,
        sink: &mut dyn FnMut(&Record),
    ) -> Result<(), SearchError> {
        run_search_each(&mut self.store, request, sink)
    }
}
