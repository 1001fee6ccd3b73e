//! The remote-to-local synchronization pipeline.
//!
//! Leaf first: [`IdEnumerator`] walks paginated identifier queries,
//! [`BatchFetcher`] pulls full records in bounded chunks, [`SourceAdapter`]
//! composes the two per upstream source, [`ConvergenceEngine`] upserts the
//! results, and [`PollScheduler`] drives it all on a fixed interval.

mod adapter;
mod batch;
mod converge;
mod enumerate;
mod scheduler;

pub use adapter::SourceAdapter;
pub use batch::{BatchFetcher, DEFAULT_CHUNK_SIZE, MAX_CHUNK_SIZE};
pub use converge::{Clock, ConvergenceEngine};
pub use enumerate::{DEFAULT_PAGE_SIZE, IdEnumerator};
pub use scheduler::{
    CycleError, CycleReport, DEFAULT_POLL_INTERVAL, PollScheduler, SchedulerState,
    SchedulerStatus, SourceFailure, SourceReport, SyncJob,
};
