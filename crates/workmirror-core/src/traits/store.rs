//! Local document store trait.

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::record::MirrorDocument;
use crate::types::{Collection, ExternalId};
use crate::Result;

/// Whether an upsert created or replaced a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
}

/// A keyed document store.
///
/// Implementations must make [`MirrorStore::upsert`] atomic per key; the
/// pipeline adds no locking of its own and may write distinct keys
/// concurrently.
#[async_trait]
pub trait MirrorStore: Send + Sync {
    /// Insert the document if absent, else overwrite only the given fields.
    async fn upsert(
        &self,
        collection: &Collection,
        id: ExternalId,
        fields: Map<String, Value>,
    ) -> Result<UpsertOutcome>;

    /// Read one document.
    async fn get(
        &self,
        collection: &Collection,
        id: ExternalId,
    ) -> Result<Option<MirrorDocument>>;

    /// Read every document in a collection, ascending by external id.
    async fn list(&self, collection: &Collection) -> Result<Vec<MirrorDocument>>;
}
