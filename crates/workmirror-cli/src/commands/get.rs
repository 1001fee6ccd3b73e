//! Get command implementation.

use anyhow::{Context, Result};
use clap::Args;

use workmirror_core::{Collection, ExternalId, MirrorStore};

use crate::config::Settings;
use crate::{output, wiring};

#[derive(Args, Debug)]
pub struct GetArgs {
    /// Local collection name
    #[arg(long)]
    pub collection: String,

    /// External work item id
    pub id: u64,

    /// Print only the labeled projection fields
    #[arg(long)]
    pub brief: bool,
}

pub async fn run(settings: Settings, args: GetArgs) -> Result<()> {
    let collection = Collection::new(&args.collection).context("Invalid collection name")?;
    let id = ExternalId::new(args.id);
    let store = wiring::open_store(&settings)?;

    let doc = store
        .get(&collection, id)
        .await
        .context("Failed to read document")?
        .with_context(|| format!("No document {} in collection {}", id, collection))?;

    if args.brief {
        output::field("ID", &doc.external_id.to_string());
        output::field("Title", &doc.title);
        output::field("State", &doc.state);
        output::field("Synced", &doc.last_synced_at.to_rfc3339());
    } else {
        output::document(&doc, true)?;
    }

    Ok(())
}
