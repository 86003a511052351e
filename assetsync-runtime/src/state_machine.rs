//! Sync run state machine

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stage of a sync run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncState {
    /// Run has not started
    Idle,

    /// Pulling records from the Assets API
    Fetching,

    /// Replacing the customers table
    PersistingDb,

    /// Writing the backup files
    PersistingFiles,

    /// Run finished, whatever the database outcome
    Done,

    /// Run aborted
    Failed,
}

impl SyncState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncState::Idle => "idle",
            SyncState::Fetching => "fetching",
            SyncState::PersistingDb => "persisting_db",
            SyncState::PersistingFiles => "persisting_files",
            SyncState::Done => "done",
            SyncState::Failed => "failed",
        }
    }

    /// Whether no further transition is possible
    pub fn is_terminal(&self) -> bool {
        matches!(self, SyncState::Done | SyncState::Failed)
    }
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State machine for a single sync run
pub struct SyncStateMachine {
    current_state: SyncState,
    state_history: Vec<(SyncState, DateTime<Utc>)>,
}

impl SyncStateMachine {
    /// Create a new state machine in `Idle`
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            current_state: SyncState::Idle,
            state_history: vec![(SyncState::Idle, now)],
        }
    }

    /// Get the current state
    pub fn current_state(&self) -> SyncState {
        self.current_state
    }

    /// Transition to a new state
    pub fn transition(&mut self, new_state: SyncState) -> Result<()> {
        if !self.is_valid_transition(new_state) {
            return Err(Error::InvalidState(format!(
                "Invalid transition from {} to {}",
                self.current_state, new_state
            )));
        }

        self.current_state = new_state;
        self.state_history.push((new_state, Utc::now()));

        Ok(())
    }

    /// Check if a state transition is valid
    ///
    /// A database failure does not fail the run, so `PersistingDb` can only
    /// move on to `PersistingFiles`.
    fn is_valid_transition(&self, new_state: SyncState) -> bool {
        use SyncState::*;

        matches!(
            (self.current_state, new_state),
            (Idle, Fetching)
                | (Fetching, PersistingDb | Failed)
                | (PersistingDb, PersistingFiles)
                | (PersistingFiles, Done | Failed)
        )
    }

    /// Get the state history
    pub fn history(&self) -> &[(SyncState, DateTime<Utc>)] {
        &self.state_history
    }
}

impl Default for SyncStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state() {
        let sm = SyncStateMachine::new();
        assert_eq!(sm.current_state(), SyncState::Idle);
        assert_eq!(sm.history().len(), 1);
    }

    #[test]
    fn test_full_run() {
        let mut sm = SyncStateMachine::new();
        for state in [
            SyncState::Fetching,
            SyncState::PersistingDb,
            SyncState::PersistingFiles,
            SyncState::Done,
        ] {
            sm.transition(state).unwrap();
        }

        assert_eq!(sm.current_state(), SyncState::Done);
        let states: Vec<_> = sm.history().iter().map(|(s, _)| *s).collect();
        assert_eq!(
            states,
            vec![
                SyncState::Idle,
                SyncState::Fetching,
                SyncState::PersistingDb,
                SyncState::PersistingFiles,
                SyncState::Done,
            ]
        );
    }

    #[test]
    fn test_fetch_failure() {
        let mut sm = SyncStateMachine::new();
        sm.transition(SyncState::Fetching).unwrap();
        sm.transition(SyncState::Failed).unwrap();
        assert!(sm.current_state().is_terminal());
    }

    #[test]
    fn test_invalid_transitions() {
        let mut sm = SyncStateMachine::new();
        assert!(sm.transition(SyncState::PersistingFiles).is_err());

        sm.transition(SyncState::Fetching).unwrap();
        sm.transition(SyncState::PersistingDb).unwrap();
        let err = sm.transition(SyncState::Failed).unwrap_err();
        assert!(matches!(err, Error::InvalidState(_)));
        assert_eq!(sm.current_state(), SyncState::PersistingDb);
    }

    #[test]
    fn test_done_is_terminal() {
        let mut sm = SyncStateMachine::new();
        sm.transition(SyncState::Fetching).unwrap();
        sm.transition(SyncState::PersistingDb).unwrap();
        sm.transition(SyncState::PersistingFiles).unwrap();
        sm.transition(SyncState::Done).unwrap();
        assert!(sm.transition(SyncState::Fetching).is_err());
    }
}
