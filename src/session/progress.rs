//! Set accounting over a session's exercise sequence
//!
//! Everything here is a pure function of the exercise sequence and the
//! logged sets, so the engine's pointers can always be rebuilt from
//! persisted rows.

use std::collections::HashMap;

use crate::db::{ExerciseSet, RoutineExercise};

/// Where the session stands in its exercise sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    /// Index into the sequence; equal to its length once every target is met
    pub exercise_index: usize,
    /// Next set to log for the exercise at `exercise_index`
    pub set_number: u32,
}

/// Completed sets per exercise id
pub fn set_counts(sets: &[ExerciseSet]) -> HashMap<&str, u32> {
    let mut counts = HashMap::new();
    for set in sets {
        *counts.entry(set.exercise_id.as_str()).or_insert(0) += 1;
    }
    counts
}

pub fn logged_for(counts: &HashMap<&str, u32>, exercise_id: &str) -> u32 {
    counts.get(exercise_id).copied().unwrap_or(0)
}

/// Next set number for an exercise: its logged count + 1
pub fn next_set_number(counts: &HashMap<&str, u32>, exercise_id: &str) -> u32 {
    logged_for(counts, exercise_id) + 1
}

/// Rebuild the session pointer from persisted sets.
///
/// The first exercise (in sequence order) whose logged count is below its
/// target is the resume point. Only per-exercise counts matter; set order
/// and timestamps are ignored.
pub fn reconstruct(exercises: &[RoutineExercise], sets: &[ExerciseSet]) -> Position {
    let counts = set_counts(sets);

    exercises
        .iter()
        .enumerate()
        .find(|(_, ex)| logged_for(&counts, &ex.exercise_id) < ex.target_sets)
        .map(|(index, ex)| Position {
            exercise_index: index,
            set_number: next_set_number(&counts, &ex.exercise_id),
        })
        .unwrap_or(Position {
            exercise_index: exercises.len(),
            set_number: 1,
        })
}

/// True when the sequence is non-empty and every exercise reached its target
pub fn all_targets_met(exercises: &[RoutineExercise], sets: &[ExerciseSet]) -> bool {
    let counts = set_counts(sets);
    !exercises.is_empty()
        && exercises
            .iter()
            .all(|ex| logged_for(&counts, &ex.exercise_id) >= ex.target_sets)
}

/// Sequence for a routine-less session, derived from what was logged.
///
/// Exercises appear in order of their first logged set, each targeting
/// exactly the sets already logged. Sets don't carry rest times, so every
/// entry has `rest_seconds: None`, and exercises added to the session but
/// never logged are not recovered.
pub fn sequence_from_sets(sets: &[ExerciseSet]) -> Vec<RoutineExercise> {
    let counts = set_counts(sets);
    let mut sequence: Vec<RoutineExercise> = Vec::new();

    for set in sets {
        if sequence.iter().any(|ex| ex.exercise_id == set.exercise_id) {
            continue;
        }
        sequence.push(RoutineExercise {
            exercise_id: set.exercise_id.clone(),
            order_index: sequence.len() as i32,
            target_sets: logged_for(&counts, &set.exercise_id),
            target_reps: None,
            target_weight: None,
            rest_seconds: None,
            notes: None,
        });
    }

    sequence
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn exercise(id: &str, order_index: i32, target_sets: u32) -> RoutineExercise {
        RoutineExercise {
            exercise_id: id.to_string(),
            order_index,
            target_sets,
            target_reps: None,
            target_weight: None,
            rest_seconds: None,
            notes: None,
        }
    }

    fn logged(exercise_id: &str, set_number: u32) -> ExerciseSet {
        ExerciseSet {
            id: 0,
            workout_session_id: 1,
            exercise_id: exercise_id.to_string(),
            set_number,
            weight: Some(60.0),
            reps: Some(8),
            created_at: Utc::now(),
        }
    }

    fn routine() -> Vec<RoutineExercise> {
        vec![exercise("squat", 0, 3), exercise("bench_press", 1, 2), exercise("barbell_row", 2, 2)]
    }

    #[test]
    fn test_fresh_session_starts_at_first_set() {
        let pos = reconstruct(&routine(), &[]);
        assert_eq!(pos, Position { exercise_index: 0, set_number: 1 });
    }

    #[test]
    fn test_resume_mid_exercise() {
        let sets = vec![logged("squat", 1), logged("squat", 2)];
        let pos = reconstruct(&routine(), &sets);
        assert_eq!(pos, Position { exercise_index: 0, set_number: 3 });
    }

    #[test]
    fn test_resume_moves_past_completed_exercise() {
        let sets = vec![logged("squat", 1), logged("squat", 2), logged("squat", 3), logged("bench_press", 1)];
        let pos = reconstruct(&routine(), &sets);
        assert_eq!(pos, Position { exercise_index: 1, set_number: 2 });
    }

    #[test]
    fn test_resume_picks_first_unfinished_not_last_touched() {
        // Bench finished out of order while squat still lags behind
        let sets = vec![
            logged("bench_press", 1),
            logged("bench_press", 2),
            logged("squat", 1),
            logged("barbell_row", 1),
        ];
        let pos = reconstruct(&routine(), &sets);
        assert_eq!(pos, Position { exercise_index: 0, set_number: 2 });
    }

    #[test]
    fn test_set_number_counts_extra_sets_per_exercise() {
        // Four squats logged against a target of three, bench untouched
        let sets = vec![
            logged("squat", 1),
            logged("squat", 2),
            logged("squat", 3),
            logged("squat", 4),
            logged("barbell_row", 1),
        ];
        let pos = reconstruct(&routine(), &sets);
        assert_eq!(pos, Position { exercise_index: 1, set_number: 1 });
    }

    #[test]
    fn test_all_targets_met_points_past_end() {
        let sets = vec![
            logged("squat", 1),
            logged("squat", 2),
            logged("squat", 3),
            logged("bench_press", 1),
            logged("bench_press", 2),
            logged("barbell_row", 1),
            logged("barbell_row", 2),
        ];
        let exercises = routine();
        assert_eq!(reconstruct(&exercises, &sets).exercise_index, exercises.len());
        assert!(all_targets_met(&exercises, &sets));
        assert!(!all_targets_met(&exercises, &sets[..6]));
    }

    #[test]
    fn test_sets_for_unknown_exercises_are_ignored() {
        let sets = vec![logged("plank", 1), logged("plank", 2)];
        let pos = reconstruct(&routine(), &sets);
        assert_eq!(pos, Position { exercise_index: 0, set_number: 1 });
    }

    #[test]
    fn test_empty_sequence() {
        assert_eq!(reconstruct(&[], &[]), Position { exercise_index: 0, set_number: 1 });
        assert!(!all_targets_met(&[], &[]));
    }

    #[test]
    fn test_round_trip_log_then_resume() {
        let exercises = routine();
        let mut sets = Vec::new();
        // Log sets in sequence order, checking the rebuilt pointer after each one
        for ex in &exercises {
            for n in 1..=ex.target_sets {
                sets.push(logged(&ex.exercise_id, n));
                let pos = reconstruct(&exercises, &sets);
                if pos.exercise_index < exercises.len() {
                    let at = &exercises[pos.exercise_index];
                    let counts = set_counts(&sets);
                    assert_eq!(pos.set_number, logged_for(&counts, &at.exercise_id) + 1);
                }
            }
        }
        assert_eq!(reconstruct(&exercises, &sets).exercise_index, exercises.len());
    }

    #[test]
    fn test_sequence_from_sets_keeps_first_appearance_order() {
        let sets = vec![logged("dips", 1), logged("pullups", 1), logged("dips", 2)];
        let sequence = sequence_from_sets(&sets);
        assert_eq!(sequence.len(), 2);
        assert_eq!(sequence[0].exercise_id, "dips");
        assert_eq!(sequence[0].target_sets, 2);
        assert_eq!(sequence[1].exercise_id, "pullups");
        assert_eq!(sequence[1].order_index, 1);
    }
}
