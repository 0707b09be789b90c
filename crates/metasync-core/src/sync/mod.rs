//! Run orchestration

mod orchestrator;
mod state;

pub use orchestrator::SyncOrchestrator;
pub use state::{StateMachine, SyncState};
