//! Run command implementation.

use std::future::Future;

use anyhow::{Context, Result, anyhow};
use clap::Args;
use colored::Colorize;
use tokio::task::JoinHandle;
use tracing::info;

use crate::config::Settings;
use crate::{output, wiring};

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Seconds between the end of one cycle and the start of the next
    #[arg(long, env = "WORKMIRROR_POLL_INTERVAL")]
    pub interval: Option<u64>,
}

pub async fn run(mut settings: Settings, args: RunArgs) -> Result<()> {
    if let Some(interval) = args.interval {
        settings.poll_interval_secs = interval;
    }

    let scheduler = wiring::build_scheduler(&settings)?;

    let banner = format!(
        "Polling {} source(s) every {}s. Press Ctrl+C to stop.",
        scheduler.jobs().len(),
        scheduler.interval().as_secs()
    );
    eprintln!("{}", banner.as_str().dimmed());

    supervise(scheduler.spawn(), tokio::signal::ctrl_c()).await?;

    output::success("Stopped");
    Ok(())
}

/// Wait for `shutdown`, then abort the poll loop.
///
/// The loop never returns on its own, so its task finishing first means it
/// panicked or was cancelled; that is reported as an error.
async fn supervise<S>(mut poll_loop: JoinHandle<()>, shutdown: S) -> Result<()>
where
    S: Future<Output = std::io::Result<()>>,
{
    tokio::select! {
        joined = &mut poll_loop => {
            joined.context("Poll loop stopped unexpectedly")?;
            Err(anyhow!("Poll loop exited"))
        }
        signal = shutdown => {
            poll_loop.abort();
            // Cancellation is the expected outcome here.
            let _ = poll_loop.await;
            signal.context("Failed to listen for Ctrl+C")?;
            info!("interrupted, stopping");
            Ok(())
        }
    }
}
