//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::commands::{get::GetArgs, list::ListArgs, run::RunArgs, sync::SyncArgs};

/// Mirror Azure DevOps work items into a local document store.
#[derive(Parser, Debug)]
#[command(name = "workmirror")]
#[command(author, version = env!("WORKMIRROR_VERSION"), about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Output logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Options that locate configuration and data.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Settings file (JSON)
    #[arg(long, env = "WORKMIRROR_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Store directory, overriding the settings file
    #[arg(long, env = "WORKMIRROR_STORE", global = true)]
    pub store: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Poll every configured source until interrupted
    Run(RunArgs),

    /// Run one sync cycle and report per source
    Sync(SyncArgs),

    /// List mirrored documents in a collection
    List(ListArgs),

    /// Show one mirrored document
    Get(GetArgs),
}
