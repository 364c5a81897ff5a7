use std::fmt;

use thiserror::Error;

use crate::db::SessionStatus;
use crate::store::StoreError;

#[derive(Error, Debug)]
pub enum EngineError {
    /// Resume target is missing or no longer active
    #[error("session {0} cannot be resumed")]
    SessionNotResumable(i64),

    #[error("invalid session state: {0}")]
    InvalidSessionState(InvalidState),

    #[error("routine {0} not found")]
    RoutineNotFound(i64),

    #[error("persistence error: {0}")]
    Persistence(#[from] StoreError),
}

/// Why an operation was refused in the current state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidState {
    NotActive(SessionStatus),
    Resting,
    NoCurrentExercise,
    EmptySequence,
    RoutineLocked,
    ZeroTargetSets,
}

impl fmt::Display for InvalidState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvalidState::NotActive(status) => write!(f, "session is {status}"),
            InvalidState::Resting => f.write_str("rest timer is running"),
            InvalidState::NoCurrentExercise => f.write_str("no current exercise"),
            InvalidState::EmptySequence => f.write_str("session has no exercises"),
            InvalidState::RoutineLocked => {
                f.write_str("exercises can only be added to custom workouts")
            }
            InvalidState::ZeroTargetSets => f.write_str("target sets must be at least 1"),
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
