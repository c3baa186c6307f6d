//! notekeep - local note storage with tombstoned deletes and background sync

pub mod assistant;
pub mod cli;
pub mod domain;
pub mod ipc;
pub mod links;
pub mod logging;
pub mod store;
pub mod sync;

use anyhow::Result;
use clap::Parser;

use cli::{
    Cli, Command,
    config::Config,
    handlers::{handle_completions, handle_list, handle_migrate, handle_serve},
};

/// Main entry point for the CLI application.
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    if let Command::Completions(args) = &cli.command {
        return handle_completions(args);
    }

    let config = Config::load()?;
    let db_path = config.db_path(cli.db.as_ref());

    match &cli.command {
        Command::Serve(args) => handle_serve(args, &db_path, &config),
        Command::List(args) => handle_list(args, &db_path),
        Command::Migrate(args) => handle_migrate(args, &db_path),
        Command::Completions(args) => handle_completions(args),
    }
}
