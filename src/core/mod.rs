//! Core library components.
//!
//! Everything below is a synchronous, single-invocation library: the CLI
//! layer parses arguments, builds a [`config::Config`], and drives
//! [`vault::Vault`]. No global mutable state, no background tasks.

// Public API
pub mod config;
pub mod document;
pub mod policy;
pub mod types;
pub mod vault;

// Internal implementation - exposed to the CLI but not part of the public API
pub(crate) mod cipher;
pub(crate) mod constants;
pub(crate) mod diff;
pub(crate) mod envfile;
pub(crate) mod identity;
pub(crate) mod inject;
pub(crate) mod store;
pub(crate) mod yaml;

pub use diff::{Diff, DiffEntry, EntryStatus};
pub use envfile::EnvFile;
pub use identity::Identity;
pub use inject::ExportFormat;
