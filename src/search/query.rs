//! Query parsing and evaluation.
//!
//! This module implements the restricted Lucene-like query language
//! used by the search engine and CLI. It supports fielded terms such
//! as `color:red`, trailing-star prefix terms such as `name:jo*`, a
//! leading `NOT` on a single term, and flat boolean composition:
//! - ` AND ` combines sub-queries so that all of them must match.
//! - ` OR ` combines sub-queries so that any of them may match.
//! - ` NOT ` keeps the first sub-query as the base condition and
//!   requires every remaining sub-query to fail.
//!
//! Connectives are recognized by plain substring search, so the tokens
//! ` AND `, ` OR `, and ` NOT ` cannot appear inside field values.
//! Parentheses are stripped only when a single pair wraps the entire
//! query; arbitrary sub-grouping is not supported. Both limitations
//! are part of the grammar this engine emulates.

use std::borrow::Cow;

use serde_json::Value;

use crate::models::{FieldTerm, QueryExpr, Record};

/// Parse a query string into a `QueryExpr`.
///
/// An absent query matches every record. `None` is returned when the
/// query is unsupported: no `:` separator remains after connective
/// splitting and `NOT`-prefix stripping, in the query itself or in any
/// of its sub-queries. Callers must surface that as a hard error
/// rather than silently matching nothing.
pub fn parse_query(query: Option<&str>) -> Option<QueryExpr> {
    match query {
        None => Some(QueryExpr::Any),
        Some(raw) => parse_expr(raw),
    }
}

fn parse_expr(raw: &str) -> Option<QueryExpr> {
    if raw == "*:*" {
        return Some(QueryExpr::Any);
    }

    // `[* TO *]` is the full-range form of a wildcard; collapse it
    // before any splitting so range-on-everything queries reduce to a
    // prefix term with an empty comparison string.
    let normalized = raw.replace("[* TO *]", "*");
    let query = strip_outer_parens(&normalized);

    if query.contains(" AND ") {
        return split_into(query, " AND ").map(QueryExpr::And);
    }
    if query.contains(" OR ") {
        return split_into(query, " OR ").map(QueryExpr::Or);
    }
    if query.contains(" NOT ") {
        return split_into(query, " NOT ").map(QueryExpr::Not);
    }

    let (negate, rest) = match query.strip_prefix("NOT") {
        Some(rest) => (true, rest),
        None => (false, query),
    };

    let (field, value) = rest.split_once(':')?;
    let field = field.trim().to_string();

    if let Some(prefix) = value.strip_suffix('*') {
        Some(QueryExpr::Prefix(FieldTerm {
            field,
            value: prefix.to_string(),
            negate,
        }))
    } else {
        Some(QueryExpr::Field(FieldTerm {
            field,
            value: value.to_string(),
            negate,
        }))
    }
}

/// Parse each part of `query` around `connective`; any unsupported
/// part makes the whole query unsupported.
fn split_into(query: &str, connective: &str) -> Option<Vec<QueryExpr>> {
    query.split(connective).map(parse_expr).collect()
}

/// Strip parentheses only when the query contains exactly one pair and
/// it wraps the whole string.
fn strip_outer_parens(query: &str) -> &str {
    let parens = query.chars().filter(|c| *c == '(' || *c == ')').count();
    if parens == 2 && query.starts_with('(') && query.ends_with(')') {
        &query[1..query.len() - 1]
    } else {
        query
    }
}

/// Evaluate a parsed query against a single record.
pub fn record_matches(expr: &QueryExpr, record: &Record) -> bool {
    match expr {
        QueryExpr::Any => true,
        QueryExpr::Field(term) => evaluate_term(term, record, match_value),
        QueryExpr::Prefix(term) => evaluate_term(term, record, match_prefix),
        QueryExpr::And(children) => children.iter().all(|c| record_matches(c, record)),
        QueryExpr::Or(children) => children.iter().any(|c| record_matches(c, record)),
        QueryExpr::Not(children) => match children.split_first() {
            Some((base, rest)) => {
                record_matches(base, record) && rest.iter().all(|c| !record_matches(c, record))
            }
            None => false,
        },
    }
}

/// Look up the term's field and compare with `compare`.
///
/// An absent field never matches: the miss is decided before negation
/// is applied, so a negated term cannot turn a missing field into a
/// match.
fn evaluate_term(term: &FieldTerm, record: &Record, compare: fn(&Value, &str) -> bool) -> bool {
    let Some(value) = record.get(&term.field) else {
        return false;
    };
    let result = compare(value, &term.value);
    if term.negate {
        !result
    } else {
        result
    }
}

/// Whether `value` equality-matches `needle`.
///
/// Array values match when any element matches; everything else is
/// compared by its exact string form.
fn match_value(value: &Value, needle: &str) -> bool {
    match value {
        Value::Array(items) => items.iter().any(|item| match_value(item, needle)),
        other => string_form(other) == needle,
    }
}

/// Whether `value` prefix-matches `needle`.
///
/// Like `match_value` with `starts_with` in place of equality. A
/// string value that is blank after trimming matches any prefix.
fn match_prefix(value: &Value, needle: &str) -> bool {
    match value {
        Value::String(s) if s.trim().is_empty() => true,
        Value::Array(items) => items.iter().any(|item| match_prefix(item, needle)),
        other => string_form(other).starts_with(needle),
    }
}

/// String form used for comparisons: strings verbatim, numbers and
/// booleans via their display form, null as the empty string.
fn string_form(value: &Value) -> Cow<'_, str> {
    match value {
        Value::String(s) => Cow::Borrowed(s),
        Value::Null => Cow::Borrowed(""),
        Value::Bool(b) => Cow::Owned(b.to_string()),
        Value::Number(n) => Cow::Owned(n.to_string()),
        other => Cow::Owned(other.to_string()),
    }
}
