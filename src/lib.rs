//! ironlog - Personal workout tracker
//!
//! Routines, routine-driven workout sessions with a rest timer, and
//! resumable progress rebuilt from logged sets.

pub mod db;
pub mod exercises;
pub mod routine;
pub mod session;
pub mod store;
pub mod summary;
pub mod tui;

pub use db::Database;
pub use session::{SessionLauncher, WorkoutEngine};
pub use store::WorkoutStore;
