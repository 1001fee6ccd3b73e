//! workmirror - Mirror remote work items into a local document store.
//!
//! A thin binary over `workmirror-core`: it loads settings, wires one
//! remote API per configured source to the file store, and either polls
//! forever or runs a single cycle.

mod cli;
mod commands;
mod config;
mod output;
mod wiring;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose, cli.json_logs);

    let settings = config::load(&cli.global)?;

    match cli.command {
        Commands::Run(args) => commands::run::run(settings, args).await,
        Commands::Sync(args) => commands::sync::run(settings, args).await,
        Commands::List(args) => commands::list::run(settings, args).await,
        Commands::Get(args) => commands::get::run(settings, args).await,
    }
}

fn init_logging(verbosity: u8, json: bool) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .init();
    }
}
