use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Deserialize;

use crate::models::{CollectionRef, SearchRequest, DEFAULT_ROWS};
use crate::store::StoreConfig;

/// Top-level CLI entrypoint for `solosearch`.
#[derive(Parser, Debug)]
#[command(
    name = "solosearch",
    about = "Search flat-file JSON records with a restricted Lucene-style query language",
    subcommand_required = false,
    arg_required_else_help = false
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Top-level CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Search a collection of records.
    Search(SearchArgs),
    /// List the record ids of a collection.
    List(ListArgs),
}

/// Arguments specific to the `search` subcommand.
#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Collection to search: `node`, `role`, or a data bag name.
    pub collection: CollectionRef,

    /// Query string; omit to match every record.
    pub query: Option<String>,

    /// Base directory containing `data_bags/`, `nodes/`, and `roles/`
    /// (defaults to the current directory).
    #[arg(long = "kitchen", env = "SOLOSEARCH_KITCHEN")]
    pub kitchen: Option<PathBuf>,

    /// Directory holding data bag subdirectories (overrides the
    /// kitchen layout).
    #[arg(long = "data-bags")]
    pub data_bags: Option<PathBuf>,

    /// Directory holding node records (overrides the kitchen layout).
    #[arg(long = "nodes")]
    pub nodes: Option<PathBuf>,

    /// Directory holding role records (overrides the kitchen layout).
    #[arg(long = "roles")]
    pub roles: Option<PathBuf>,

    /// Zero-based position of the first match to output.
    #[arg(long = "start", default_value_t = 0)]
    pub start: usize,

    /// Maximum number of matches to output.
    #[arg(long = "rows")]
    pub rows: Option<usize>,

    /// Sort specification. Result ordering is not supported; this flag
    /// exists so callers of the emulated contract get the real error
    /// rather than an argument-parsing one.
    #[arg(long = "sort")]
    pub sort: Option<String>,

    /// Output format (text or json).
    #[arg(long = "format", value_enum)]
    pub format: Option<OutputFormat>,
}

/// Arguments specific to the `list` subcommand.
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Collection to list: `node`, `role`, or a data bag name.
    pub collection: CollectionRef,

    /// Base directory containing `data_bags/`, `nodes/`, and `roles/`
    /// (defaults to the current directory).
    #[arg(long = "kitchen", env = "SOLOSEARCH_KITCHEN")]
    pub kitchen: Option<PathBuf>,

    /// Directory holding data bag subdirectories (overrides the
    /// kitchen layout).
    #[arg(long = "data-bags")]
    pub data_bags: Option<PathBuf>,

    /// Directory holding node records (overrides the kitchen layout).
    #[arg(long = "nodes")]
    pub nodes: Option<PathBuf>,

    /// Directory holding role records (overrides the kitchen layout).
    #[arg(long = "roles")]
    pub roles: Option<PathBuf>,

    /// Output format (text or json).
    #[arg(long = "format", value_enum)]
    pub format: Option<OutputFormat>,
}

/// CLI representation of the output format.
#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Text,
    Json,
}

/// Build the store configuration from path flags.
///
/// Explicit per-root flags win over `--kitchen`; the kitchen defaults
/// to the current directory.
pub fn store_config_from_paths(
    kitchen: Option<&Path>,
    data_bags: Option<&Path>,
    nodes: Option<&Path>,
    roles: Option<&Path>,
) -> StoreConfig {
    let base = kitchen.unwrap_or_else(|| Path::new("."));
    let mut config = StoreConfig::rooted_at(base);

    if let Some(dir) = data_bags {
        config.data_bag_root = dir.to_path_buf();
    }
    if let Some(dir) = nodes {
        config.node_root = dir.to_path_buf();
    }
    if let Some(dir) = roles {
        config.role_root = dir.to_path_buf();
    }

    config
}

pub fn store_config_from_search_args(args: &SearchArgs) -> StoreConfig {
    store_config_from_paths(
        args.kitchen.as_deref(),
        args.data_bags.as_deref(),
        args.nodes.as_deref(),
        args.roles.as_deref(),
    )
}

pub fn store_config_from_list_args(args: &ListArgs) -> StoreConfig {
    store_config_from_paths(
        args.kitchen.as_deref(),
        args.data_bags.as_deref(),
        args.nodes.as_deref(),
        args.roles.as_deref(),
    )
}

pub fn search_request_from_args(args: &SearchArgs) -> SearchRequest {
    SearchRequest {
        collection: args.collection.clone(),
        query: args.query.clone(),
        sort: args.sort.clone(),
        start: args.start,
        rows: args.rows.unwrap_or(DEFAULT_ROWS),
    }
}
