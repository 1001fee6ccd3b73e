//! Locally persisted document shape.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::types::ExternalId;

/// The subset of a remote record the mirror keeps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Projection {
    pub external_id: ExternalId,
    pub title: String,
    pub state: String,
}

impl Projection {
    /// The field set written by an upsert, stamped with the sync time.
    ///
    /// Only these keys are overwritten; anything else already stored on
    /// the document is left as is.
    pub fn into_update(self, synced_at: DateTime<Utc>) -> Map<String, Value> {
        let mut update = Map::new();
        update.insert(
            "external_id".to_string(),
            Value::from(self.external_id.get()),
        );
        update.insert("title".to_string(), Value::String(self.title));
        update.insert("state".to_string(), Value::String(self.state));
        update.insert(
            "last_synced_at".to_string(),
            Value::String(synced_at.to_rfc3339()),
        );
        update
    }
}

/// A mirrored work item.
///
/// Created on the first sync of an external id, overwritten on every later
/// sync that observes it, and never deleted by the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MirrorDocument {
    /// Unique reconciliation key.
    pub external_id: ExternalId,
    pub title: String,
    pub state: String,
    pub last_synced_at: DateTime<Utc>,

    /// Fields added locally outside the projection.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
