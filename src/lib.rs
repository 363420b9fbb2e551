pub mod cli;
pub mod coerce;
pub mod config;
pub mod error;
pub mod filter;
pub mod import;
pub mod import_cmd;
pub mod io_utils;
pub mod mapping;
pub mod output;
pub mod paginate;
pub mod query_cmd;
pub mod schema;
pub mod schema_cmd;
pub mod table;
pub mod workspace;

use std::{env, sync::OnceLock};

use anyhow::Result;
use clap::Parser;
use log::{LevelFilter, debug};

use crate::{
    cli::{Cli, Commands},
    config::Config,
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("workspace_cli", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    let config = Config::discover(cli.config.as_deref())?;
    let workspace_path = config.workspace_path(cli.workspace.as_deref());
    debug!("Using workspace {:?}", workspace_path);
    match &cli.command {
        Commands::Import(args) => import_cmd::execute(args, &config, &workspace_path),
        Commands::Query(args) => query_cmd::execute(args, &config, &workspace_path),
        Commands::Schema(args) => schema_cmd::execute(args, &workspace_path),
    }
}
