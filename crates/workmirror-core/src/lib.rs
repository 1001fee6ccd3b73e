//! workmirror-core - Core types, traits and the sync pipeline.
//!
//! Backends plug in through [`WorkItemApi`] (the remote issue tracker) and
//! [`MirrorStore`] (the local document store). Everything between them, from
//! identifier enumeration to the poll loop, lives in [`sync`].

pub mod credential;
pub mod error;
pub mod query;
pub mod record;
pub mod sync;
pub mod traits;
pub mod types;

mod test_support;

pub use credential::{AccessToken, Credential};
pub use error::Error;
pub use query::Wiql;
pub use record::{MirrorDocument, Projection, RemoteRecord};
pub use sync::{
    BatchFetcher, ConvergenceEngine, CycleReport, IdEnumerator, PollScheduler, SchedulerState,
    SchedulerStatus, SourceAdapter, SyncJob,
};
pub use traits::{IdPage, MirrorStore, RecordSource, UpsertOutcome, WorkItemApi};
pub use types::{ApiBase, Collection, ContinuationToken, ExternalId, SourceQuery};

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;
