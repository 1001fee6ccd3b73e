//! List command implementation.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use workmirror_core::{Collection, MirrorStore};

use crate::config::Settings;
use crate::{output, wiring};

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Local collection name
    #[arg(long)]
    pub collection: String,

    /// Only documents in this state
    #[arg(long)]
    pub state: Option<String>,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,
}

pub async fn run(settings: Settings, args: ListArgs) -> Result<()> {
    let collection = Collection::new(&args.collection).context("Invalid collection name")?;
    let store = wiring::open_store(&settings)?;

    let documents = store
        .list(&collection)
        .await
        .context("Failed to list documents")?;

    let mut shown = 0usize;
    for doc in documents
        .iter()
        .filter(|d| args.state.as_deref().is_none_or(|s| d.state == s))
    {
        output::document(doc, args.pretty)?;
        shown += 1;
    }

    if shown == 0 {
        eprintln!("{}", "No documents found.".dimmed());
    }

    Ok(())
}
