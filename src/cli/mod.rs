use anyhow::Result;
use clap::{CommandFactory, Parser};

use crate::search::engine;
use crate::store::FileStore;

mod args;
mod config;
mod format;

pub use args::{Cli, Commands, ListArgs, OutputFormat, SearchArgs};

use config::{apply_list_config_defaults, apply_search_config_defaults, load_cli_config};

/// Entry point for the CLI binary.
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    let cli_config = load_cli_config()?;

    match cli.command {
        Some(Commands::Search(mut search_args)) => {
            if let Some(ref config) = cli_config {
                apply_search_config_defaults(config, &mut search_args);
            }

            let request = args::search_request_from_args(&search_args);
            let mut store = FileStore::new(args::store_config_from_search_args(&search_args));

            let records = engine::run_search(&mut store, &request)?;

            match search_args.format.unwrap_or(OutputFormat::Text) {
                OutputFormat::Text => format::print_text(&records),
                OutputFormat::Json => format::print_json(&records),
            }
        }
        Some(Commands::List(mut list_args)) => {
            if let Some(ref config) = cli_config {
                apply_list_config_defaults(config, &mut list_args);
            }

            let mut store = FileStore::new(args::store_config_from_list_args(&list_args));
            let ids = store.record_ids(&list_args.collection)?;

            match list_args.format.unwrap_or(OutputFormat::Text) {
                OutputFormat::Text => {
                    format::print_ids_text(&ids);
                    Ok(())
                }
                OutputFormat::Json => format::print_ids_json(&ids),
            }
        }
        None => {
            let mut cmd = Cli::command();
            cmd.print_help()?;
            println!();
            Ok(())
        }
    }
}
