//! Core value types.
//!
//! These types enforce their invariants at construction time,
//! so invalid states are unrepresentable further down the pipeline.

mod api_base;
mod collection;
mod continuation;
mod external_id;
mod source_query;

pub use api_base::{API_VERSION, ApiBase};
pub use collection::Collection;
pub use continuation::ContinuationToken;
pub use external_id::ExternalId;
pub use source_query::SourceQuery;
