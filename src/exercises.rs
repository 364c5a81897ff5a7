//! Exercise catalog - ids referenced by routines and logged sets

use serde::{Deserialize, Serialize};

/// Muscle groups worked by an exercise
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum MuscleGroup {
    Chest,
    Shoulders,
    Triceps,
    Back,
    Biceps,
    Core,
    Glutes,
    Quads,
    Hamstrings,
    Calves,
}

impl MuscleGroup {
    pub fn name(&self) -> &'static str {
        match self {
            MuscleGroup::Chest => "chest",
            MuscleGroup::Shoulders => "shoulders",
            MuscleGroup::Triceps => "triceps",
            MuscleGroup::Back => "back",
            MuscleGroup::Biceps => "biceps",
            MuscleGroup::Core => "core",
            MuscleGroup::Glutes => "glutes",
            MuscleGroup::Quads => "quads",
            MuscleGroup::Hamstrings => "hamstrings",
            MuscleGroup::Calves => "calves",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub enum Category {
    Push,
    Pull,
    Legs,
    Core,
}

impl Category {
    pub fn emoji(&self) -> &'static str {
        match self {
            Category::Push => "💪",
            Category::Pull => "🏋️",
            Category::Legs => "🦵",
            Category::Core => "🎯",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Exercise {
    pub id: &'static str,
    pub name: &'static str,
    pub category: Category,
    pub muscle_groups: &'static [MuscleGroup],
}

pub const EXERCISES: &[Exercise] = &[
    // Push
    Exercise {
        id: "bench_press",
        name: "Bench Press",
        category: Category::Push,
        muscle_groups: &[MuscleGroup::Chest, MuscleGroup::Triceps, MuscleGroup::Shoulders],
    },
    Exercise {
        id: "overhead_press",
        name: "Overhead Press",
        category: Category::Push,
        muscle_groups: &[MuscleGroup::Shoulders, MuscleGroup::Triceps, MuscleGroup::Core],
    },
    Exercise {
        id: "incline_dumbbell_press",
        name: "Incline Dumbbell Press",
        category: Category::Push,
        muscle_groups: &[MuscleGroup::Chest, MuscleGroup::Shoulders],
    },
    Exercise {
        id: "dips",
        name: "Dips",
        category: Category::Push,
        muscle_groups: &[MuscleGroup::Triceps, MuscleGroup::Chest],
    },
    Exercise {
        id: "pushups",
        name: "Push-ups",
        category: Category::Push,
        muscle_groups: &[MuscleGroup::Chest, MuscleGroup::Triceps, MuscleGroup::Core],
    },
    // Pull
    Exercise {
        id: "deadlift",
        name: "Deadlift",
        category: Category::Pull,
        muscle_groups: &[MuscleGroup::Back, MuscleGroup::Hamstrings, MuscleGroup::Glutes],
    },
    Exercise {
        id: "barbell_row",
        name: "Barbell Row",
        category: Category::Pull,
        muscle_groups: &[MuscleGroup::Back, MuscleGroup::Biceps],
    },
    Exercise {
        id: "pullups",
        name: "Pull-ups",
        category: Category::Pull,
        muscle_groups: &[MuscleGroup::Back, MuscleGroup::Biceps],
    },
    Exercise {
        id: "lat_pulldown",
        name: "Lat Pulldown",
        category: Category::Pull,
        muscle_groups: &[MuscleGroup::Back, MuscleGroup::Biceps],
    },
    Exercise {
        id: "bicep_curl",
        name: "Bicep Curl",
        category: Category::Pull,
        muscle_groups: &[MuscleGroup::Biceps],
    },
    // Legs
    Exercise {
        id: "squat",
        name: "Squat",
        category: Category::Legs,
        muscle_groups: &[MuscleGroup::Quads, MuscleGroup::Glutes, MuscleGroup::Core],
    },
    Exercise {
        id: "romanian_deadlift",
        name: "Romanian Deadlift",
        category: Category::Legs,
        muscle_groups: &[MuscleGroup::Hamstrings, MuscleGroup::Glutes],
    },
    Exercise {
        id: "leg_press",
        name: "Leg Press",
        category: Category::Legs,
        muscle_groups: &[MuscleGroup::Quads, MuscleGroup::Glutes],
    },
    Exercise {
        id: "lunges",
        name: "Walking Lunges",
        category: Category::Legs,
        muscle_groups: &[MuscleGroup::Quads, MuscleGroup::Glutes, MuscleGroup::Hamstrings],
    },
    Exercise {
        id: "calf_raises",
        name: "Calf Raises",
        category: Category::Legs,
        muscle_groups: &[MuscleGroup::Calves],
    },
    // Core
    Exercise {
        id: "plank",
        name: "Plank",
        category: Category::Core,
        muscle_groups: &[MuscleGroup::Core, MuscleGroup::Shoulders],
    },
    Exercise {
        id: "hanging_leg_raise",
        name: "Hanging Leg Raise",
        category: Category::Core,
        muscle_groups: &[MuscleGroup::Core],
    },
];

pub fn get_all_exercises() -> &'static [Exercise] {
    EXERCISES
}

pub fn find_exercise(id: &str) -> Option<&'static Exercise> {
    EXERCISES.iter().find(|e| e.id == id)
}

/// Human-readable name, falling back to the raw id for exercises outside the catalog
pub fn display_name(id: &str) -> &str {
    find_exercise(id).map(|e| e.name).unwrap_or(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_catalog_ids_unique() {
        let ids: HashSet<_> = EXERCISES.iter().map(|e| e.id).collect();
        assert_eq!(ids.len(), EXERCISES.len());
    }

    #[test]
    fn test_display_name_falls_back_to_id() {
        assert_eq!(display_name("squat"), "Squat");
        assert_eq!(display_name("zercher_carry"), "zercher_carry");
    }
}
