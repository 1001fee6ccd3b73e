//! Sync command implementation.

use anyhow::{Result, bail};
use clap::Args;

use crate::config::Settings;
use crate::{output, wiring};

#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Print the cycle report as JSON instead of text
    #[arg(long)]
    pub json: bool,
}

pub async fn run(settings: Settings, args: SyncArgs) -> Result<()> {
    let scheduler = wiring::build_scheduler(&settings)?;

    let (report, failed) = match scheduler.run_cycle().await {
        Ok(report) => (report, false),
        Err(e) => (e.0, true),
    };

    if args.json {
        let summary = serde_json::json!({
            "succeeded": report.succeeded.iter().map(|s| serde_json::json!({
                "source": s.source,
                "fetched": s.fetched,
                "reconciled": s.reconciled,
            })).collect::<Vec<_>>(),
            "failed": report.failed.iter().map(|f| serde_json::json!({
                "source": f.source,
                "error": f.error.to_string(),
            })).collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        output::report(&report);
    }

    if failed {
        bail!("{} of {} source(s) failed", report.failed.len(), report.total());
    }
    Ok(())
}
