//! Builds the pipeline from settings.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use workmirror_core::{ConvergenceEngine, MirrorStore, PollScheduler, SourceAdapter, SyncJob};
use workmirror_file::FileStore;
use workmirror_remote::{RemoteApi, RetryPolicy, RetryingTransport};

use crate::config::{self, Settings};

pub fn store_path(settings: &Settings) -> Result<PathBuf> {
    match &settings.store_path {
        Some(path) => Ok(path.clone()),
        None => config::default_store_path(),
    }
}

pub fn open_store(settings: &Settings) -> Result<Arc<FileStore>> {
    let path = store_path(settings)?;
    std::fs::create_dir_all(&path)
        .with_context(|| format!("Failed to create store directory {}", path.display()))?;
    Ok(Arc::new(FileStore::new(path)))
}

/// One job per configured source, all writing to the same store.
pub fn build_scheduler(settings: &Settings) -> Result<PollScheduler> {
    let sources = settings.resolve_sources(|var| std::env::var(var).ok())?;
    let store: Arc<dyn MirrorStore> = open_store(settings)?;
    let transport = RetryingTransport::new(settings.request_timeout(), RetryPolicy::default())
        .context("Failed to build HTTP client")?;

    let jobs = sources
        .into_iter()
        .map(|source| {
            info!(
                source = %source.name,
                organization = %source.credential.organization(),
                item_type = %source.item_type,
                collection = %source.collection,
                "configured source"
            );

            let api = RemoteApi::with_transport(
                settings.api_base.clone(),
                source.credential,
                transport.clone(),
            );
            let adapter = SourceAdapter::new(source.name, api, source.item_type)
                .with_page_size(settings.page_size)
                .with_chunk_size(settings.chunk_size);
            let engine = ConvergenceEngine::new(store.clone(), source.collection);

            SyncJob::new(Arc::new(adapter), engine).with_states(source.states)
        })
        .collect();

    Ok(PollScheduler::new(jobs, settings.poll_interval())
        .with_concurrent_sources(settings.concurrent_sources))
}
