//! Command implementations for metasync-cli

pub mod cache;
pub mod run;
pub mod script;

pub use cache::{run_cache_clear, run_cache_show};
pub use run::run_sync;
pub use script::run_script_show;
