//! Remote work-item API trait.

use async_trait::async_trait;

use crate::query::Wiql;
use crate::record::RemoteRecord;
use crate::types::{ContinuationToken, ExternalId};
use crate::Result;

/// One page of identifiers from a query submission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdPage {
    /// Identifiers in the order the remote returned them.
    pub ids: Vec<ExternalId>,

    /// Present when more pages exist.
    pub continuation: Option<ContinuationToken>,
}

/// The two remote operations the pipeline consumes.
///
/// An implementation is bound to exactly one credential; every call is
/// authorized with it.
#[async_trait]
pub trait WorkItemApi: Send + Sync {
    /// The project every query is scoped to.
    fn project(&self) -> &str;

    /// Submit an identifier query, optionally continuing from a cursor.
    async fn query_ids(
        &self,
        query: &Wiql,
        page_size: u32,
        continuation: Option<&ContinuationToken>,
    ) -> Result<IdPage>;

    /// Fetch full records for a list of identifiers in one call.
    async fn fetch_work_items(&self, ids: &[ExternalId]) -> Result<Vec<RemoteRecord>>;
}
