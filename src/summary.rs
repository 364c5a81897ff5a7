//! Session summary - per-exercise totals for a finished or running workout

use serde::Serialize;

use crate::db::{ExerciseSet, RoutineExercise, WorkoutSession};
use crate::exercises::display_name;
use crate::session::progress::{logged_for, sequence_from_sets, set_counts};

#[derive(Debug, Clone, Serialize)]
pub struct ExerciseSummary {
    pub exercise_id: String,
    pub name: String,
    pub sets_logged: u32,
    pub target_sets: u32,
    pub total_reps: u32,
    /// Sum of weight × reps over sets that carry both
    pub volume: f64,
    pub best_weight: Option<f64>,
}

impl ExerciseSummary {
    pub fn is_complete(&self) -> bool {
        self.sets_logged >= self.target_sets
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub session: WorkoutSession,
    pub exercises: Vec<ExerciseSummary>,
    pub total_sets: usize,
    pub total_volume: f64,
}

impl SessionSummary {
    /// Summarize a session against its exercise sequence.
    ///
    /// Sets logged for exercises outside the sequence still get a row,
    /// targeting what was logged.
    pub fn build(
        session: WorkoutSession,
        exercises: &[RoutineExercise],
        sets: &[ExerciseSet],
    ) -> Self {
        let counts = set_counts(sets);

        let extra = sequence_from_sets(sets)
            .into_iter()
            .filter(|ex| !exercises.iter().any(|e| e.exercise_id == ex.exercise_id));

        let rows: Vec<ExerciseSummary> = exercises
            .iter()
            .cloned()
            .chain(extra)
            .map(|ex| {
                let logged: Vec<&ExerciseSet> = sets
                    .iter()
                    .filter(|s| s.exercise_id == ex.exercise_id)
                    .collect();
                ExerciseSummary {
                    name: display_name(&ex.exercise_id).to_string(),
                    sets_logged: logged_for(&counts, &ex.exercise_id),
                    target_sets: ex.target_sets,
                    total_reps: logged.iter().filter_map(|s| s.reps).sum(),
                    volume: logged.iter().map(|s| set_volume(s)).sum(),
                    best_weight: logged
                        .iter()
                        .filter_map(|s| s.weight)
                        .fold(None, |best: Option<f64>, w| Some(best.map_or(w, |b| b.max(w)))),
                    exercise_id: ex.exercise_id,
                }
            })
            .collect();

        Self {
            total_sets: sets.len(),
            total_volume: rows.iter().map(|r| r.volume).sum(),
            exercises: rows,
            session,
        }
    }

    pub fn unfinished(&self) -> impl Iterator<Item = &ExerciseSummary> {
        self.exercises.iter().filter(|e| !e.is_complete())
    }
}

fn set_volume(set: &ExerciseSet) -> f64 {
    match (set.weight, set.reps) {
        (Some(weight), Some(reps)) => weight * reps as f64,
        _ => 0.0,
    }
}
