//! Per-source composition of enumeration and bulk fetch.

use async_trait::async_trait;
use tracing::{debug, info, instrument};

use crate::record::RemoteRecord;
use crate::traits::{RecordSource, WorkItemApi};
use crate::types::SourceQuery;
use crate::Result;

use super::{BatchFetcher, DEFAULT_CHUNK_SIZE, DEFAULT_PAGE_SIZE, IdEnumerator};

/// One tracked upstream source: an API bound to a credential plus an item type.
///
/// Holds no state between cycles.
#[derive(Debug)]
pub struct SourceAdapter<A> {
    name: String,
    api: A,
    item_type: String,
    page_size: u32,
    chunk_size: usize,
}

impl<A: WorkItemApi> SourceAdapter<A> {
    pub fn new(name: impl Into<String>, api: A, item_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            api,
            item_type: item_type.into(),
            page_size: DEFAULT_PAGE_SIZE,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn item_type(&self) -> &str {
        &self.item_type
    }

    /// Enumerate every matching id, then fetch them.
    ///
    /// Enumeration completes before any fetch starts, so an enumeration
    /// failure never leads to a partial fetch.
    #[instrument(skip(self), fields(source = %self.name, item_type = %self.item_type))]
    pub async fn fetch(&self, states: Option<&[String]>) -> Result<Vec<RemoteRecord>> {
        let mut query = SourceQuery::new(self.item_type.as_str());
        if let Some(states) = states {
            query = query.with_states(states.iter().cloned());
        }

        let ids = IdEnumerator::new(&self.api, &query)
            .with_page_size(self.page_size)
            .collect_all()
            .await?;

        if ids.is_empty() {
            debug!("no matching work items");
            return Ok(Vec::new());
        }

        let records = BatchFetcher::new(&self.api)
            .with_chunk_size(self.chunk_size)
            .fetch(&ids)
            .await?;

        info!(ids = ids.len(), records = records.len(), "fetched source");
        Ok(records)
    }
}

#[async_trait]
impl<A: WorkItemApi> RecordSource for SourceAdapter<A> {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self, states: Option<&[String]>) -> Result<Vec<RemoteRecord>> {
        SourceAdapter::fetch(self, states).await
    }
}
