//! Database module - SQLite storage for routines, sessions and sets

use std::fmt;
use std::sync::{Mutex, MutexGuard};

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, params};
use serde::{Deserialize, Serialize};

use crate::store::{StoreError, StoreResult, WorkoutStore};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Workout session status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Active,
    Completed,
    Cancelled,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Active => "active",
            SessionStatus::Completed => "completed",
            SessionStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "active" => Some(SessionStatus::Active),
            "completed" => Some(SessionStatus::Completed),
            "cancelled" => Some(SessionStatus::Cancelled),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, SessionStatus::Active)
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User-defined exercise template
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Routine {
    pub id: i64,
    pub user_id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// One entry of a routine's exercise sequence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutineExercise {
    pub exercise_id: String,
    /// Position in the routine, unique per routine
    pub order_index: i32,
    pub target_sets: u32,
    pub target_reps: Option<u32>,
    pub target_weight: Option<f64>,
    pub rest_seconds: Option<u32>,
    pub notes: Option<String>,
}

/// Workout session record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutSession {
    pub id: i64,
    pub user_id: String,
    /// `None` for custom workouts
    pub routine_id: Option<i64>,
    pub name: String,
    /// User-local calendar date
    pub date: NaiveDate,
    pub status: SessionStatus,
    pub duration_minutes: Option<i64>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewSession {
    pub user_id: String,
    pub routine_id: Option<i64>,
    pub name: String,
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

/// Terminal transition written on finish/cancel
#[derive(Debug, Clone)]
pub struct SessionUpdate {
    pub status: SessionStatus,
    pub duration_minutes: Option<i64>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// One logged set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseSet {
    pub id: i64,
    pub workout_session_id: i64,
    pub exercise_id: String,
    /// 1-based, unique per (session, exercise)
    pub set_number: u32,
    pub weight: Option<f64>,
    pub reps: Option<u32>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewSet {
    pub workout_session_id: i64,
    pub exercise_id: String,
    pub set_number: u32,
    pub weight: Option<f64>,
    pub reps: Option<u32>,
    pub created_at: DateTime<Utc>,
}

/// Database wrapper
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open or create database
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::with_connection(conn)
    }

    /// Fresh in-memory database
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        match self.conn.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Create a routine together with its exercise sequence
    pub fn create_routine(
        &self,
        user_id: &str,
        name: &str,
        exercises: &[RoutineExercise],
    ) -> StoreResult<Routine> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        let created_at = Utc::now();

        tx.execute(
            "INSERT INTO routines (user_id, name, created_at) VALUES (?1, ?2, ?3)",
            params![user_id, name, created_at.to_rfc3339()],
        )?;
        let routine_id = tx.last_insert_rowid();

        for exercise in exercises {
            tx.execute(
                "INSERT INTO routine_exercises
                    (routine_id, exercise_id, order_index, target_sets, target_reps, target_weight, rest_seconds, notes)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    routine_id,
                    exercise.exercise_id,
                    exercise.order_index,
                    exercise.target_sets,
                    exercise.target_reps,
                    exercise.target_weight,
                    exercise.rest_seconds,
                    exercise.notes,
                ],
            )?;
        }
        tx.commit()?;

        Ok(Routine {
            id: routine_id,
            user_id: user_id.to_string(),
            name: name.to_string(),
            created_at,
        })
    }

    /// Routines owned by a user, oldest first
    pub fn list_routines(&self, user_id: &str) -> StoreResult<Vec<Routine>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, user_id, name, created_at FROM routines WHERE user_id = ?1 ORDER BY id",
        )?;
        let routines = stmt
            .query_map(params![user_id], routine_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(routines)
    }

    /// Session history, newest first
    pub fn list_sessions(&self, user_id: &str, limit: usize) -> StoreResult<Vec<WorkoutSession>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {SESSION_COLUMNS} FROM workout_sessions
             WHERE user_id = ?1
             ORDER BY date DESC, created_at DESC, id DESC
             LIMIT ?2"
        ))?;
        let sessions = stmt
            .query_map(params![user_id, limit as i64], session_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(sessions)
    }

    fn session_by_id(conn: &Connection, session_id: i64) -> StoreResult<Option<WorkoutSession>> {
        let session = conn
            .query_row(
                &format!("SELECT {SESSION_COLUMNS} FROM workout_sessions WHERE id = ?1"),
                params![session_id],
                session_from_row,
            )
            .optional()?;
        Ok(session)
    }
}

#[async_trait]
impl WorkoutStore for Database {
    async fn get_active_session_for_date(
        &self,
        user_id: &str,
        date: NaiveDate,
    ) -> StoreResult<Option<WorkoutSession>> {
        let conn = self.conn();
        let session = conn
            .query_row(
                &format!(
                    "SELECT {SESSION_COLUMNS} FROM workout_sessions
                     WHERE user_id = ?1 AND date = ?2 AND status = 'active'
                     ORDER BY created_at DESC, id DESC
                     LIMIT 1"
                ),
                params![user_id, date.format(DATE_FORMAT).to_string()],
                session_from_row,
            )
            .optional()?;
        Ok(session)
    }

    async fn get_session(&self, session_id: i64) -> StoreResult<Option<WorkoutSession>> {
        Self::session_by_id(&self.conn(), session_id)
    }

    async fn create_session(&self, session: &NewSession) -> StoreResult<WorkoutSession> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO workout_sessions (user_id, routine_id, name, date, status, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                session.user_id,
                session.routine_id,
                session.name,
                session.date.format(DATE_FORMAT).to_string(),
                SessionStatus::Active.as_str(),
                session.created_at.to_rfc3339(),
            ],
        )?;

        Ok(WorkoutSession {
            id: conn.last_insert_rowid(),
            user_id: session.user_id.clone(),
            routine_id: session.routine_id,
            name: session.name.clone(),
            date: session.date,
            status: SessionStatus::Active,
            duration_minutes: None,
            completed_at: None,
            created_at: session.created_at,
        })
    }

    async fn update_session(
        &self,
        session_id: i64,
        update: &SessionUpdate,
    ) -> StoreResult<WorkoutSession> {
        let conn = self.conn();
        let changed = conn.execute(
            "UPDATE workout_sessions
             SET status = ?1,
                 duration_minutes = ?2,
                 completed_at = ?3
             WHERE id = ?4",
            params![
                update.status.as_str(),
                update.duration_minutes,
                update.completed_at.map(|dt| dt.to_rfc3339()),
                session_id,
            ],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound {
                entity: "session",
                id: session_id,
            });
        }

        Self::session_by_id(&conn, session_id)?.ok_or(StoreError::NotFound {
            entity: "session",
            id: session_id,
        })
    }

    async fn get_routine(&self, routine_id: i64) -> StoreResult<Option<Routine>> {
        let conn = self.conn();
        let routine = conn
            .query_row(
                "SELECT id, user_id, name, created_at FROM routines WHERE id = ?1",
                params![routine_id],
                routine_from_row,
            )
            .optional()?;
        Ok(routine)
    }

    async fn get_routine_exercises(&self, routine_id: i64) -> StoreResult<Vec<RoutineExercise>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT exercise_id, order_index, target_sets, target_reps, target_weight, rest_seconds, notes
             FROM routine_exercises
             WHERE routine_id = ?1
             ORDER BY order_index",
        )?;
        let exercises = stmt
            .query_map(params![routine_id], |row| {
                Ok(RoutineExercise {
                    exercise_id: row.get(0)?,
                    order_index: row.get(1)?,
                    target_sets: row.get(2)?,
                    target_reps: row.get(3)?,
                    target_weight: row.get(4)?,
                    rest_seconds: row.get(5)?,
                    notes: row.get(6)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(exercises)
    }

    async fn get_sets_for_session(&self, session_id: i64) -> StoreResult<Vec<ExerciseSet>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, workout_session_id, exercise_id, set_number, weight, reps, created_at
             FROM exercise_sets
             WHERE workout_session_id = ?1
             ORDER BY created_at, id",
        )?;
        let sets = stmt
            .query_map(params![session_id], |row| {
                let created_at: String = row.get(6)?;
                Ok(ExerciseSet {
                    id: row.get(0)?,
                    workout_session_id: row.get(1)?,
                    exercise_id: row.get(2)?,
                    set_number: row.get(3)?,
                    weight: row.get(4)?,
                    reps: row.get(5)?,
                    created_at: parse_timestamp(6, &created_at)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(sets)
    }

    async fn insert_set(&self, set: &NewSet) -> StoreResult<ExerciseSet> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO exercise_sets (workout_session_id, exercise_id, set_number, weight, reps, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                set.workout_session_id,
                set.exercise_id,
                set.set_number,
                set.weight,
                set.reps,
                set.created_at.to_rfc3339(),
            ],
        )?;

        Ok(ExerciseSet {
            id: conn.last_insert_rowid(),
            workout_session_id: set.workout_session_id,
            exercise_id: set.exercise_id.clone(),
            set_number: set.set_number,
            weight: set.weight,
            reps: set.reps,
            created_at: set.created_at,
        })
    }
}

const SESSION_COLUMNS: &str =
    "id, user_id, routine_id, name, date, status, duration_minutes, completed_at, created_at";

/// Initialize database schema
fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS routines (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id TEXT NOT NULL,
            name TEXT NOT NULL,
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS routine_exercises (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            routine_id INTEGER NOT NULL REFERENCES routines(id) ON DELETE CASCADE,
            exercise_id TEXT NOT NULL,
            order_index INTEGER NOT NULL,
            target_sets INTEGER NOT NULL CHECK (target_sets >= 1),
            target_reps INTEGER,
            target_weight REAL,
            rest_seconds INTEGER CHECK (rest_seconds IS NULL OR rest_seconds >= 0),
            notes TEXT,
            UNIQUE (routine_id, order_index)
        );

        CREATE TABLE IF NOT EXISTS workout_sessions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id TEXT NOT NULL,
            routine_id INTEGER REFERENCES routines(id) ON DELETE SET NULL,
            name TEXT NOT NULL,
            date TEXT NOT NULL,
            status TEXT NOT NULL CHECK (status IN ('active', 'completed', 'cancelled')),
            duration_minutes INTEGER,
            completed_at TEXT,
            created_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_sessions_user_date
            ON workout_sessions (user_id, date, status);

        CREATE TABLE IF NOT EXISTS exercise_sets (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            workout_session_id INTEGER NOT NULL REFERENCES workout_sessions(id) ON DELETE CASCADE,
            exercise_id TEXT NOT NULL,
            set_number INTEGER NOT NULL CHECK (set_number >= 1),
            weight REAL,
            reps INTEGER,
            created_at TEXT NOT NULL,
            UNIQUE (workout_session_id, exercise_id, set_number)
        );",
    )
}

fn conversion_error(
    idx: usize,
    err: impl Into<Box<dyn std::error::Error + Send + Sync>>,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, err.into())
}

fn parse_timestamp(idx: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|err| conversion_error(idx, err))
}

fn routine_from_row(row: &Row) -> rusqlite::Result<Routine> {
    let created_at: String = row.get(3)?;
    Ok(Routine {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        created_at: parse_timestamp(3, &created_at)?,
    })
}

fn session_from_row(row: &Row) -> rusqlite::Result<WorkoutSession> {
    let date: String = row.get(4)?;
    let status: String = row.get(5)?;
    let completed_at: Option<String> = row.get(7)?;
    let created_at: String = row.get(8)?;

    Ok(WorkoutSession {
        id: row.get(0)?,
        user_id: row.get(1)?,
        routine_id: row.get(2)?,
        name: row.get(3)?,
        date: NaiveDate::parse_from_str(&date, DATE_FORMAT)
            .map_err(|err| conversion_error(4, err))?,
        status: SessionStatus::parse(&status)
            .ok_or_else(|| conversion_error(5, format!("unknown session status '{status}'")))?,
        duration_minutes: row.get(6)?,
        completed_at: completed_at
            .map(|raw| parse_timestamp(7, &raw))
            .transpose()?,
        created_at: parse_timestamp(8, &created_at)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn exercise(id: &str, order_index: i32, target_sets: u32) -> RoutineExercise {
        RoutineExercise {
            exercise_id: id.to_string(),
            order_index,
            target_sets,
            target_reps: Some(10),
            target_weight: None,
            rest_seconds: Some(90),
            notes: None,
        }
    }

    fn new_session(user_id: &str, date: NaiveDate) -> NewSession {
        NewSession {
            user_id: user_id.to_string(),
            routine_id: None,
            name: "Custom Workout".to_string(),
            date,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_routine_exercises_ordered_by_index() {
        let db = Database::open_in_memory().unwrap();
        let routine = db
            .create_routine(
                "u1",
                "Push",
                &[exercise("dips", 2, 3), exercise("bench_press", 0, 5), exercise("overhead_press", 1, 3)],
            )
            .unwrap();

        let exercises = db.get_routine_exercises(routine.id).await.unwrap();
        let ids: Vec<_> = exercises.iter().map(|e| e.exercise_id.as_str()).collect();
        assert_eq!(ids, vec!["bench_press", "overhead_press", "dips"]);
        assert_eq!(exercises[0].rest_seconds, Some(90));

        let loaded = db.get_routine(routine.id).await.unwrap().unwrap();
        assert_eq!(loaded.name, "Push");
        assert_eq!(db.list_routines("u1").unwrap().len(), 1);
        assert!(db.list_routines("u2").unwrap().is_empty());
    }

    #[test]
    fn test_duplicate_order_index_rejected() {
        let db = Database::open_in_memory().unwrap();
        let result = db.create_routine("u1", "Bad", &[exercise("squat", 0, 3), exercise("lunges", 0, 3)]);
        assert!(result.is_err());
        // Transaction rolled back
        assert!(db.list_routines("u1").unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_active_session_lookup_is_user_and_date_scoped() {
        let db = Database::open_in_memory().unwrap();
        let today = NaiveDate::from_ymd_opt(2026, 3, 14).unwrap();
        let created = db.create_session(&new_session("u1", today)).await.unwrap();

        let found = db.get_active_session_for_date("u1", today).await.unwrap();
        assert_eq!(found.map(|s| s.id), Some(created.id));

        let yesterday = today - Duration::days(1);
        assert!(db.get_active_session_for_date("u1", yesterday).await.unwrap().is_none());
        assert!(db.get_active_session_for_date("u2", today).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_session_to_terminal_status() {
        let db = Database::open_in_memory().unwrap();
        let today = NaiveDate::from_ymd_opt(2026, 3, 14).unwrap();
        let created = db.create_session(&new_session("u1", today)).await.unwrap();

        let completed_at = Utc::now();
        let updated = db
            .update_session(
                created.id,
                &SessionUpdate {
                    status: SessionStatus::Completed,
                    duration_minutes: Some(42),
                    completed_at: Some(completed_at),
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.status, SessionStatus::Completed);
        assert_eq!(updated.duration_minutes, Some(42));
        assert!(updated.completed_at.is_some());
        // No longer considered active for the day
        assert!(db.get_active_session_for_date("u1", today).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_missing_session_is_not_found() {
        let db = Database::open_in_memory().unwrap();
        let result = db
            .update_session(
                99,
                &SessionUpdate {
                    status: SessionStatus::Cancelled,
                    duration_minutes: Some(1),
                    completed_at: None,
                },
            )
            .await;
        assert!(matches!(result, Err(StoreError::NotFound { id: 99, .. })));
    }

    #[tokio::test]
    async fn test_sets_round_trip_and_unique_set_number() {
        let db = Database::open_in_memory().unwrap();
        let today = NaiveDate::from_ymd_opt(2026, 3, 14).unwrap();
        let session = db.create_session(&new_session("u1", today)).await.unwrap();

        let set = NewSet {
            workout_session_id: session.id,
            exercise_id: "squat".to_string(),
            set_number: 1,
            weight: Some(102.5),
            reps: Some(5),
            created_at: Utc::now(),
        };
        db.insert_set(&set).await.unwrap();
        assert!(db.insert_set(&set).await.is_err());

        let sets = db.get_sets_for_session(session.id).await.unwrap();
        assert_eq!(sets.len(), 1);
        assert_eq!(sets[0].weight, Some(102.5));
        assert_eq!(sets[0].reps, Some(5));
    }

    #[tokio::test]
    async fn test_list_sessions_newest_first() {
        let db = Database::open_in_memory().unwrap();
        let day1 = NaiveDate::from_ymd_opt(2026, 3, 13).unwrap();
        let day2 = NaiveDate::from_ymd_opt(2026, 3, 14).unwrap();
        let first = db.create_session(&new_session("u1", day1)).await.unwrap();
        let second = db.create_session(&new_session("u1", day2)).await.unwrap();

        let history = db.list_sessions("u1", 10).unwrap();
        let ids: Vec<_> = history.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);
        assert_eq!(db.list_sessions("u1", 1).unwrap().len(), 1);
    }
}
