//! Core traits for the remote API, the local store and record sources.

mod api;
mod source;
mod store;

pub use api::{IdPage, WorkItemApi};
pub use source::RecordSource;
pub use store::{MirrorStore, UpsertOutcome};
