//! HTTP plumbing: the retrying transport and wire types.

pub mod endpoints;
pub mod transport;
