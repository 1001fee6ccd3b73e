//! Reconciles fetched records into the local store.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument, warn};

use crate::record::RemoteRecord;
use crate::traits::{MirrorStore, UpsertOutcome};
use crate::types::Collection;
use crate::Result;

/// Source of the `last_synced_at` timestamp.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Projects remote records and upserts them keyed by external id.
#[derive(Clone)]
pub struct ConvergenceEngine {
    store: Arc<dyn MirrorStore>,
    collection: Collection,
    clock: Clock,
}

impl ConvergenceEngine {
    pub fn new(store: Arc<dyn MirrorStore>, collection: Collection) -> Self {
        Self {
            store,
            collection,
            clock: Arc::new(Utc::now),
        }
    }

    /// Replace the wall clock, mainly for tests.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn collection(&self) -> &Collection {
        &self.collection
    }

    /// Upsert every projectable record and return how many were written.
    ///
    /// A record missing a required field is logged and skipped; it never
    /// aborts the batch. A store failure does.
    #[instrument(skip(self, records), fields(collection = %self.collection, records = records.len()))]
    pub async fn reconcile(&self, records: &[RemoteRecord]) -> Result<usize> {
        let mut reconciled = 0usize;
        let mut inserted = 0usize;
        let mut skipped = 0usize;

        for record in records {
            let projection = match record.project() {
                Ok(projection) => projection,
                Err(e) => {
                    warn!(id = %record.id, error = %e, "skipping unprojectable record");
                    skipped += 1;
                    continue;
                }
            };

            let id = projection.external_id;
            let update = projection.into_update((self.clock)());
            let outcome = self.store.upsert(&self.collection, id, update).await?;
            debug!(%id, ?outcome, "upserted");

            if outcome == UpsertOutcome::Inserted {
                inserted += 1;
            }
            reconciled += 1;
        }

        info!(reconciled, inserted, skipped, "reconciled batch");
        Ok(reconciled)
    }
}

impl fmt::Debug for ConvergenceEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConvergenceEngine")
            .field("collection", &self.collection)
            .finish_non_exhaustive()
    }
}
