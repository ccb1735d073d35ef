#![forbid(unsafe_code)]
#![allow(dead_code)]

use anyhow::Result;
use clap::Parser;
use tracing::debug;

mod catalog;
mod cli;
mod codegen;
mod config;
mod db;
mod query;
mod utils;

use cli::Cli;
use config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;
    utils::logging::init_tracing(&config.logging);
    debug!(command = ?cli.command, "sqlite-query-gen starting");

    cli::run(cli, config).await
}
