//! Workout session engine
//!
//! Drives one session from start to a terminal state: keeps the pointer into
//! the exercise sequence, logs sets, runs the rest countdown and writes the
//! final status. Entry goes through [`SessionLauncher`], which also applies
//! the one-active-session-per-day guard.

use std::sync::Arc;

use chrono::{DateTime, Local, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::db::{
    ExerciseSet, NewSession, NewSet, RoutineExercise, SessionStatus, SessionUpdate,
    WorkoutSession,
};
use crate::store::WorkoutStore;

use super::error::{EngineError, EngineResult, InvalidState};
use super::progress;
use super::rest::RestTimer;

pub const CUSTOM_WORKOUT_NAME: &str = "Custom Workout";

/// Wall-clock source; sessions are dated in the user's local calendar
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Local>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

/// Read-only snapshot for the presentation layer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionState {
    pub session_id: i64,
    pub status: SessionStatus,
    pub current_exercise_index: usize,
    pub current_set_number: u32,
    pub is_resting: bool,
    pub rest_seconds_remaining: u32,
    pub session_start_time: DateTime<Utc>,
    pub all_targets_met: bool,
}

/// Opens sessions for one user
pub struct SessionLauncher<S> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    user_id: String,
}

impl<S: WorkoutStore> SessionLauncher<S> {
    pub fn new(store: Arc<S>, user_id: impl Into<String>) -> Self {
        Self {
            store,
            clock: Arc::new(SystemClock),
            user_id: user_id.into(),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Start a workout from a routine, or resume today's active session.
    ///
    /// The guard is scoped to the calendar date only: an active session from
    /// another routine is resumed as-is.
    pub async fn start_routine(&self, routine_id: i64) -> EngineResult<WorkoutEngine<S>> {
        let routine = self
            .store
            .get_routine(routine_id)
            .await?
            .filter(|r| r.user_id == self.user_id)
            .ok_or(EngineError::RoutineNotFound(routine_id))?;
        let exercises = self.store.get_routine_exercises(routine_id).await?;

        if let Some(existing) = self.active_today().await? {
            if existing.routine_id != Some(routine_id) {
                warn!(
                    session_id = existing.id,
                    requested_routine = routine_id,
                    active_routine = ?existing.routine_id,
                    "active session already exists today, resuming it instead"
                );
            }
            return self.resume_session(existing).await;
        }

        let now = self.clock.now();
        let session = self
            .store
            .create_session(&NewSession {
                user_id: self.user_id.clone(),
                routine_id: Some(routine_id),
                name: routine.name,
                date: now.date_naive(),
                created_at: now.with_timezone(&Utc),
            })
            .await?;
        info!(session_id = session.id, routine_id, "started workout from routine");

        Ok(self.engine(session, exercises, Vec::new()))
    }

    /// Start a routine-less workout, or resume today's active session
    pub async fn start_custom(&self) -> EngineResult<WorkoutEngine<S>> {
        if let Some(existing) = self.active_today().await? {
            return self.resume_session(existing).await;
        }

        let now = self.clock.now();
        let session = self
            .store
            .create_session(&NewSession {
                user_id: self.user_id.clone(),
                routine_id: None,
                name: CUSTOM_WORKOUT_NAME.to_string(),
                date: now.date_naive(),
                created_at: now.with_timezone(&Utc),
            })
            .await?;
        info!(session_id = session.id, "started custom workout");

        Ok(self.engine(session, Vec::new(), Vec::new()))
    }

    /// Pick an interrupted session back up from its persisted sets
    pub async fn resume(&self, session_id: i64) -> EngineResult<WorkoutEngine<S>> {
        let session = self
            .store
            .get_session(session_id)
            .await?
            .filter(|s| s.user_id == self.user_id && s.status == SessionStatus::Active)
            .ok_or(EngineError::SessionNotResumable(session_id))?;

        self.resume_session(session).await
    }

    async fn active_today(&self) -> EngineResult<Option<WorkoutSession>> {
        let today = self.clock.now().date_naive();
        Ok(self
            .store
            .get_active_session_for_date(&self.user_id, today)
            .await?)
    }

    async fn resume_session(&self, session: WorkoutSession) -> EngineResult<WorkoutEngine<S>> {
        let sets = self.store.get_sets_for_session(session.id).await?;
        let exercises = match session.routine_id {
            Some(routine_id) => self.store.get_routine_exercises(routine_id).await?,
            None => progress::sequence_from_sets(&sets),
        };

        let engine = self.engine(session, exercises, sets);
        info!(
            session_id = engine.session.id,
            exercise_index = engine.current_exercise_index,
            set_number = engine.current_set_number,
            "resumed workout"
        );
        Ok(engine)
    }

    fn engine(
        &self,
        session: WorkoutSession,
        exercises: Vec<RoutineExercise>,
        sets: Vec<ExerciseSet>,
    ) -> WorkoutEngine<S> {
        let position = progress::reconstruct(&exercises, &sets);
        WorkoutEngine {
            store: self.store.clone(),
            clock: self.clock.clone(),
            session,
            exercises,
            sets,
            current_exercise_index: position.exercise_index,
            current_set_number: position.set_number,
            rest: RestTimer::new(),
        }
    }
}

/// State machine for one workout session
pub struct WorkoutEngine<S> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    session: WorkoutSession,
    /// Snapshot taken at start/resume; routine edits don't reach a running session
    exercises: Vec<RoutineExercise>,
    sets: Vec<ExerciseSet>,
    current_exercise_index: usize,
    current_set_number: u32,
    rest: RestTimer,
}

impl<S: WorkoutStore> WorkoutEngine<S> {
    pub fn session(&self) -> &WorkoutSession {
        &self.session
    }

    pub fn exercises(&self) -> &[RoutineExercise] {
        &self.exercises
    }

    pub fn sets(&self) -> &[ExerciseSet] {
        &self.sets
    }

    pub fn current_exercise(&self) -> Option<&RoutineExercise> {
        self.exercises.get(self.current_exercise_index)
    }

    pub fn state(&self) -> SessionState {
        let rest = self.rest.state();
        SessionState {
            session_id: self.session.id,
            status: self.session.status,
            current_exercise_index: self.current_exercise_index,
            current_set_number: self.current_set_number,
            is_resting: rest.is_resting,
            rest_seconds_remaining: rest.seconds_remaining,
            session_start_time: self.session.created_at,
            all_targets_met: progress::all_targets_met(&self.exercises, &self.sets),
        }
    }

    /// Log the next set of the current exercise.
    ///
    /// Nothing changes in memory unless the write succeeds.
    pub async fn log_set(
        &mut self,
        weight: Option<f64>,
        reps: Option<u32>,
    ) -> EngineResult<ExerciseSet> {
        self.ensure_active()?;
        if self.rest.is_resting() {
            return Err(EngineError::InvalidSessionState(InvalidState::Resting));
        }
        let exercise = self
            .current_exercise()
            .cloned()
            .ok_or(EngineError::InvalidSessionState(InvalidState::NoCurrentExercise))?;

        let set = self
            .store
            .insert_set(&NewSet {
                workout_session_id: self.session.id,
                exercise_id: exercise.exercise_id.clone(),
                set_number: self.current_set_number,
                weight,
                reps,
                created_at: self.clock.now().with_timezone(&Utc),
            })
            .await?;
        info!(
            session_id = self.session.id,
            exercise = %exercise.exercise_id,
            set_number = set.set_number,
            "set logged"
        );

        self.sets.push(set.clone());
        self.current_set_number += 1;

        if progress::all_targets_met(&self.exercises, &self.sets) {
            self.current_exercise_index = self.exercises.len();
            self.current_set_number = 1;
            info!(session_id = self.session.id, "all exercise targets met");
            return Ok(set);
        }

        let counts = progress::set_counts(&self.sets);
        let next_index = self.current_exercise_index + 1;
        let advance_to = (progress::logged_for(&counts, &exercise.exercise_id)
            >= exercise.target_sets)
            .then(|| self.exercises.get(next_index))
            .flatten()
            .map(|next| progress::next_set_number(&counts, &next.exercise_id));

        if let Some(set_number) = advance_to {
            self.current_exercise_index = next_index;
            self.current_set_number = set_number;
            debug!(exercise_index = next_index, set_number, "advanced to next exercise");
        }

        // Rest belongs to the set just finished, even after advancing
        if let Some(seconds) = exercise.rest_seconds {
            self.rest.start(seconds);
        }

        Ok(set)
    }

    pub fn start_rest_timer(&mut self, seconds: u32) -> EngineResult<()> {
        self.ensure_active()?;
        self.rest.start(seconds);
        Ok(())
    }

    pub fn skip_rest(&mut self) {
        self.rest.skip();
    }

    /// Move the pointer manually, independent of set completion
    pub fn advance_exercise(&mut self, direction: Direction) -> EngineResult<()> {
        self.ensure_active()?;
        if self.exercises.is_empty() {
            return Err(EngineError::InvalidSessionState(InvalidState::EmptySequence));
        }

        // The pointer sits one past the end once every target is met
        let last = self.exercises.len() - 1;
        let index = self.current_exercise_index.min(last + 1);
        let target = match direction {
            Direction::Forward => (index + 1).min(last),
            Direction::Backward => index.saturating_sub(1),
        };
        self.move_to(target);
        Ok(())
    }

    /// Append an exercise to a routine-less session
    pub fn add_exercise(
        &mut self,
        exercise_id: &str,
        target_sets: u32,
        rest_seconds: Option<u32>,
    ) -> EngineResult<()> {
        self.ensure_active()?;
        if self.session.routine_id.is_some() {
            return Err(EngineError::InvalidSessionState(InvalidState::RoutineLocked));
        }
        if target_sets == 0 {
            return Err(EngineError::InvalidSessionState(InvalidState::ZeroTargetSets));
        }

        let was_at_end = self.current_exercise_index >= self.exercises.len();
        self.exercises.push(RoutineExercise {
            exercise_id: exercise_id.to_string(),
            order_index: self.exercises.len() as i32,
            target_sets,
            target_reps: None,
            target_weight: None,
            rest_seconds,
            notes: None,
        });
        if was_at_end {
            self.move_to(self.exercises.len() - 1);
        }
        Ok(())
    }

    /// Complete the session, even with exercises under target
    pub async fn finish(&mut self) -> EngineResult<WorkoutSession> {
        self.close(SessionStatus::Completed).await
    }

    pub async fn cancel(&mut self) -> EngineResult<WorkoutSession> {
        self.close(SessionStatus::Cancelled).await
    }

    async fn close(&mut self, status: SessionStatus) -> EngineResult<WorkoutSession> {
        self.ensure_active()?;

        let now = self.clock.now().with_timezone(&Utc);
        let duration = elapsed_minutes(self.session.created_at, now);
        let update = SessionUpdate {
            status,
            duration_minutes: Some(duration),
            completed_at: (status == SessionStatus::Completed).then_some(now),
        };

        let updated = self.store.update_session(self.session.id, &update).await?;
        self.rest.skip();
        self.session = updated;
        info!(
            session_id = self.session.id,
            status = %status,
            duration_minutes = duration,
            "workout closed"
        );

        Ok(self.session.clone())
    }

    fn move_to(&mut self, index: usize) {
        let Some(exercise) = self.exercises.get(index) else {
            return;
        };
        let counts = progress::set_counts(&self.sets);
        self.current_set_number = progress::next_set_number(&counts, &exercise.exercise_id);
        self.current_exercise_index = index;
    }

    fn ensure_active(&self) -> EngineResult<()> {
        let status = self.session.status;
        if status.is_terminal() {
            return Err(EngineError::InvalidSessionState(InvalidState::NotActive(status)));
        }
        Ok(())
    }
}

/// Whole minutes between two instants, rounded to nearest
pub fn elapsed_minutes(start: DateTime<Utc>, end: DateTime<Utc>) -> i64 {
    let seconds = (end - start).num_seconds().max(0);
    (seconds as f64 / 60.0).round() as i64
}
