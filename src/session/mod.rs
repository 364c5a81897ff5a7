//! Session module - the workout state machine
//!
//! - `engine`: lifecycle of one active session
//! - `progress`: pointer reconstruction from logged sets
//! - `rest`: owned rest countdown

pub mod engine;
pub mod error;
pub mod progress;
pub mod rest;

pub use engine::{
    CUSTOM_WORKOUT_NAME, Clock, Direction, SessionLauncher, SessionState, SystemClock,
    WorkoutEngine,
};
pub use error::{EngineError, EngineResult, InvalidState};
pub use progress::Position;
pub use rest::{RestState, RestTimer};
