//! workmirror-remote - Azure DevOps REST backend.
//!
//! [`RemoteApi`] implements [`workmirror_core::WorkItemApi`] for one
//! credential. Every call goes through [`RetryingTransport`].

mod api;
mod http;

pub use api::RemoteApi;
pub use http::transport::{DEFAULT_TIMEOUT, RetryPolicy, RetryingTransport};
