use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::cli::args::OutputFormat;
use crate::cli::{ListArgs, SearchArgs};

/// Top-level representation of `.solosearch/config.toml`.
#[derive(Debug, Default, Deserialize)]
pub struct CliConfig {
    #[serde(default)]
    pub store: Option<StoreSection>,

    #[serde(default)]
    pub search: Option<SearchSection>,
}

/// Filesystem roots for record collections.
#[derive(Debug, Default, Deserialize)]
pub struct StoreSection {
    #[serde(default)]
    pub kitchen: Option<PathBuf>,
    #[serde(default, alias = "data_bag_path")]
    pub data_bags: Option<PathBuf>,
    #[serde(default, alias = "node_path")]
    pub nodes: Option<PathBuf>,
    #[serde(default, alias = "role_path")]
    pub roles: Option<PathBuf>,
}

/// Defaults applied to the `search` subcommand.
#[derive(Debug, Default, Deserialize)]
pub struct SearchSection {
    #[serde(default)]
    pub rows: Option<usize>,
    #[serde(default)]
    pub format: Option<OutputFormat>,
}

/// Discover and load a project-local `.solosearch/config.toml` (or
/// `.solosearch/solosearch.toml`) starting from the current working
/// directory and walking up parent directories.
pub fn load_cli_config() -> Result<Option<CliConfig>> {
    let cwd = std::env::current_dir().context("failed to read current directory")?;
    let config_path = find_project_config(&cwd);

    let Some(path) = config_path else {
        return Ok(None);
    };

    let contents = fs::read_to_string(&path)
        .with_context(|| format!("failed to read config file at {}", path.display()))?;
    let config: CliConfig = toml::from_str(&contents)
        .with_context(|| format!("failed to parse TOML config at {}", path.display()))?;

    Ok(Some(config))
}

fn find_project_config(start: &Path) -> Option<PathBuf> {
    let mut dir = Some(start);

    while let Some(current) = dir {
        let solosearch_dir = current.join(".solosearch");
        let config_toml = solosearch_dir.join("config.toml");
        if config_toml.is_file() {
            return Some(config_toml);
        }

        let solosearch_toml = solosearch_dir.join("solosearch.toml");
        if solosearch_toml.is_file() {
            return Some(solosearch_toml);
        }

        dir = current.parent();
    }

    None
}

pub fn apply_search_config_defaults(config: &CliConfig, args: &mut SearchArgs) {
    if let Some(store) = &config.store {
        apply_store_defaults(
            store,
            &mut args.kitchen,
            &mut args.data_bags,
            &mut args.nodes,
            &mut args.roles,
        );
    }

    if let Some(search) = &config.search {
        if args.rows.is_none() {
            if let Some(rows) = search.rows {
                args.rows = Some(rows);
            }
        }

        if args.format.is_none() {
            if let Some(format) = search.format {
                args.format = Some(format);
            }
        }
    }
}

pub fn apply_list_config_defaults(config: &CliConfig, args: &mut ListArgs) {
    if let Some(store) = &config.store {
        apply_store_defaults(
            store,
            &mut args.kitchen,
            &mut args.data_bags,
            &mut args.nodes,
            &mut args.roles,
        );
    }
}

fn apply_store_defaults(
    store: &StoreSection,
    kitchen: &mut Option<PathBuf>,
    data_bags: &mut Option<PathBuf>,
    nodes: &mut Option<PathBuf>,
    roles: &mut Option<PathBuf>,
) {
    if kitchen.is_none() {
        if let Some(dir) = &store.kitchen {
            *kitchen = Some(dir.clone());
        }
    }

    if data_bags.is_none() {
        if let Some(dir) = &store.data_bags {
            *data_bags = Some(dir.clone());
        }
    }

    if nodes.is_none() {
        if let Some(dir) = &store.nodes {
            *nodes = Some(dir.clone());
        }
    }

    if roles.is_none() {
        if let Some(dir) = &store.roles {
            *roles = Some(dir.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_parses_store_and_search_sections() {
        let config: CliConfig = toml::from_str(
            r#"
            [store]
            kitchen = "/srv/kitchen"
            data_bags = "/srv/kitchen/bags"

            [search]
            rows = 25
            format = "json"
            "#,
        )
        .expect("parse config");

        let store = config.store.expect("store section");
        assert_eq!(store.kitchen, Some(PathBuf::from("/srv/kitchen")));
        assert_eq!(store.data_bags, Some(PathBuf::from("/srv/kitchen/bags")));
        assert_eq!(store.nodes, None);

        let search = config.search.expect("search section");
        assert_eq!(search.rows, Some(25));
        assert_eq!(search.format, Some(OutputFormat::Json));
    }

    #[test]
    fn config_accepts_path_style_aliases() {
        let config: CliConfig = toml::from_str(
            r#"
            [store]
            data_bag_path = "/srv/bags"
            node_path = "/srv/nodes"
            role_path = "/srv/roles"
            "#,
        )
        .expect("parse config");

        let store = config.store.expect("store section");
        assert_eq!(store.data_bags, Some(PathBuf::from("/srv/bags")));
        assert_eq!(store.nodes, Some(PathBuf::from("/srv/nodes")));
        assert_eq!(store.roles, Some(PathBuf::from("/srv/roles")));
    }

    #[test]
    fn empty_config_applies_no_defaults() {
        let config = CliConfig::default();
        let mut args = SearchArgs {
            collection: "users".parse().expect("collection"),
            query: None,
            kitchen: None,
            data_bags: None,
            nodes: None,
            roles: None,
            start: 0,
            rows: None,
            sort: None,
            format: None,
        };

        apply_search_config_defaults(&config, &mut args);
        assert_eq!(args.kitchen, None);
        assert_eq!(args.rows, None);
        assert_eq!(args.format, None);
    }

    #[test]
    fn explicit_arguments_win_over_config_defaults() {
        let config: CliConfig = toml::from_str(
            r#"
            [store]
            kitchen = "/from/config"

            [search]
            rows = 5
            "#,
        )
        .expect("parse config");

        let mut args = SearchArgs {
            collection: "users".parse().expect("collection"),
            query: None,
            kitchen: Some(PathBuf::from("/from/flag")),
            data_bags: None,
            nodes: None,
            roles: None,
            start: 0,
            rows: Some(50),
            sort: None,
            format: None,
        };

        apply_search_config_defaults(&config, &mut args);
        assert_eq!(args.kitchen, Some(PathBuf::from("/from/flag")));
        assert_eq!(args.rows, Some(50));
    }
}
