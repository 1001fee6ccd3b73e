//! Remote and mirrored record shapes.
//!
//! A [`RemoteRecord`] is read-only and only ever projected; a
//! [`MirrorDocument`] is what the local store keeps per external id.

mod mirror;
mod remote;

pub use mirror::{MirrorDocument, Projection};
pub use remote::RemoteRecord;
