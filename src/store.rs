//! Persistence seam consumed by the session engine

use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;

use crate::db::{
    ExerciseSet, NewSession, NewSet, Routine, RoutineExercise, SessionUpdate, WorkoutSession,
};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Owner-scoped row operations. Each call succeeds or fails atomically.
#[async_trait]
pub trait WorkoutStore: Send + Sync {
    /// Most recent `active` session for the user on the given calendar date
    async fn get_active_session_for_date(
        &self,
        user_id: &str,
        date: NaiveDate,
    ) -> StoreResult<Option<WorkoutSession>>;

    async fn get_session(&self, session_id: i64) -> StoreResult<Option<WorkoutSession>>;

    async fn create_session(&self, session: &NewSession) -> StoreResult<WorkoutSession>;

    /// Apply a status change and return the updated row
    async fn update_session(
        &self,
        session_id: i64,
        update: &SessionUpdate,
    ) -> StoreResult<WorkoutSession>;

    async fn get_routine(&self, routine_id: i64) -> StoreResult<Option<Routine>>;

    /// Exercises of a routine ordered by `order_index`
    async fn get_routine_exercises(&self, routine_id: i64) -> StoreResult<Vec<RoutineExercise>>;

    /// Sets of a session in insertion order
    async fn get_sets_for_session(&self, session_id: i64) -> StoreResult<Vec<ExerciseSet>>;

    async fn insert_set(&self, set: &NewSet) -> StoreResult<ExerciseSet>;
}
