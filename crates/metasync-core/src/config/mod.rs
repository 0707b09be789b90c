//! Run configuration
//!
//! A [`SyncProfile`] describes one upstream/registry pair and lives in a file
//! (TOML, JSON or YAML, chosen by extension). [`RunOptions`] carry the
//! per-invocation knobs. Both are folded once into an immutable [`RunConfig`]
//! that the orchestrator consumes.
//!
//! ```toml
//! name = "pepfar-datim"
//!
//! [upstream]
//! system = "dhis2"
//! base_url = "https://dhis2.example.org"
//! export_path = "api/metadata.json?indicators=true"
//! format = "dhis2"
//!
//! [registry]
//! system = "ocl"
//! base_url = "https://api.openconceptlab.org"
//! export_path = "orgs/PEPFAR/sources/DATIM/export"
//! format = "ocl"
//! timeout_secs = 120
//!
//! [target]
//! owner = "PEPFAR"
//! repository = "DATIM"
//! ```

mod profile;
mod run;

pub use profile::{RegistryTarget, SyncProfile};
pub use run::{RunConfig, RunOptions, SyncMode};
