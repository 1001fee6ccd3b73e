//! Subcommand implementations.

pub mod get;
pub mod list;
pub mod run;
pub mod sync;
