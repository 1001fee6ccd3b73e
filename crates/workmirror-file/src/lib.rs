//! workmirror-file - Filesystem-backed mirror store.

mod store;

pub use store::FileStore;
