//! Chunked bulk fetch of full records.

use std::collections::{HashMap, HashSet};

use tracing::{debug, instrument, warn};

use crate::error::Error;
use crate::record::RemoteRecord;
use crate::traits::WorkItemApi;
use crate::types::ExternalId;
use crate::Result;

/// Identifiers per bulk-fetch call; stays under the per-call and URL-length ceilings.
pub const DEFAULT_CHUNK_SIZE: usize = 190;

/// Hard per-call identifier limit of the remote API.
pub const MAX_CHUNK_SIZE: usize = 200;

/// Retrieves full records for an ordered identifier list, one call per chunk.
pub struct BatchFetcher<'a, A: ?Sized> {
    api: &'a A,
    chunk_size: usize,
}

impl<'a, A> BatchFetcher<'a, A>
where
    A: WorkItemApi + ?Sized,
{
    pub fn new(api: &'a A) -> Self {
        Self {
            api,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// Override the chunk size, clamped to `1..=MAX_CHUNK_SIZE`.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.clamp(1, MAX_CHUNK_SIZE);
        self
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Fetch every identifier, all or nothing.
    ///
    /// Output follows input order. Every input id appears at most once;
    /// ids the remote no longer knows are simply absent.
    #[instrument(skip(self, ids), fields(ids = ids.len(), chunk_size = self.chunk_size))]
    pub async fn fetch(&self, ids: &[ExternalId]) -> Result<Vec<RemoteRecord>> {
        let chunks = ids.len().div_ceil(self.chunk_size);
        let mut records = Vec::with_capacity(ids.len());
        let mut seen = HashSet::with_capacity(ids.len());

        for (index, chunk) in ids.chunks(self.chunk_size).enumerate() {
            let fetched = self
                .api
                .fetch_work_items(chunk)
                .await
                .map_err(|e| Error::fetch(index + 1, chunks, e))?;

            debug!(chunk = index + 1, chunks, records = fetched.len(), "fetched chunk");
            records.extend(order_chunk(chunk, fetched, &mut seen));
        }

        Ok(records)
    }
}

/// Put a chunk's records into request order, dropping anything unrequested or repeated.
fn order_chunk(
    requested: &[ExternalId],
    fetched: Vec<RemoteRecord>,
    seen: &mut HashSet<ExternalId>,
) -> Vec<RemoteRecord> {
    let wanted: HashSet<ExternalId> = requested.iter().copied().collect();
    let mut by_id: HashMap<ExternalId, RemoteRecord> = HashMap::with_capacity(fetched.len());

    for record in fetched {
        if !wanted.contains(&record.id) {
            warn!(id = %record.id, "remote returned an unrequested record");
            continue;
        }
        if by_id.contains_key(&record.id) {
            warn!(id = %record.id, "remote returned a record twice");
            continue;
        }
        by_id.insert(record.id, record);
    }

    requested
        .iter()
        .filter(|id| seen.insert(**id))
        .filter_map(|id| by_id.remove(id))
        .collect()
}
