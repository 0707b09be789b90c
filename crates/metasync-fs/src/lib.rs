//! Filesystem layer for metasync
//!
//! Owns everything the sync engine persists between runs: the per-pair state
//! directory layout, atomic replace-on-write, the single-writer run lock and
//! format-agnostic profile loading.

pub mod checksum;
pub mod config;
pub mod error;
pub mod io;
pub mod layout;
pub mod lock;

pub use config::ConfigStore;
pub use error::{Error, Result};
pub use layout::{StateFile, StateLayout, validate_identifier};
pub use lock::RunLock;
