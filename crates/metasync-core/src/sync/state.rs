//! Run state machine
//!
//! ```text
//! INIT -> FETCHING -> DIFFING -> BUILDING_SCRIPT -> DONE
//!                            \-> EXECUTING -------> DONE
//!                            \-----------------------> DONE (short-circuit)
//! any non-terminal state -> ABORTED
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SyncState {
    Init,
    Fetching,
    Diffing,
    BuildingScript,
    Executing,
    Done,
    Aborted,
}

impl SyncState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Init => "INIT",
            Self::Fetching => "FETCHING",
            Self::Diffing => "DIFFING",
            Self::BuildingScript => "BUILDING_SCRIPT",
            Self::Executing => "EXECUTING",
            Self::Done => "DONE",
            Self::Aborted => "ABORTED",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Aborted)
    }

    /// Whether `self -> to` is a legal transition.
    pub fn can_transition_to(self, to: SyncState) -> bool {
        use SyncState::*;

        if self.is_terminal() {
            return false;
        }
        matches!(
            (self, to),
            (_, Aborted)
                | (Init, Fetching)
                | (Fetching, Diffing)
                | (Diffing, BuildingScript | Executing | Done)
                | (BuildingScript | Executing, Done)
        )
    }
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Current state plus every state visited so far.
#[derive(Debug, Clone)]
pub struct StateMachine {
    trail: Vec<SyncState>,
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl StateMachine {
    pub fn new() -> Self {
        Self {
            trail: vec![SyncState::Init],
        }
    }

    pub fn current(&self) -> SyncState {
        self.trail.last().copied().unwrap_or(SyncState::Init)
    }

    /// Move to `to`, rejecting illegal transitions.
    pub fn advance(&mut self, to: SyncState) -> Result<()> {
        let from = self.current();
        if !from.can_transition_to(to) {
            return Err(Error::InvalidTransition { from, to });
        }
        tracing::debug!(%from, %to, "Sync state transition");
        self.trail.push(to);
        Ok(())
    }

    pub fn trail(&self) -> &[SyncState] {
        &self.trail
    }

    pub fn into_trail(self) -> Vec<SyncState> {
        self.trail
    }
}
