//! Routine definitions from the command line
//!
//! Each exercise is written as `exercise_id:sets[:reps[:weight[:rest]]]`,
//! e.g. `squat:5:5:100:180` or `pullups:3::` (empty fields are skipped).

use std::str::FromStr;

use thiserror::Error;

use crate::db::RoutineExercise;

#[derive(Error, Debug, PartialEq)]
pub enum SpecError {
    #[error("missing exercise id")]
    MissingExercise,

    #[error("missing set count for '{0}'")]
    MissingSets(String),

    #[error("invalid {field} '{value}'")]
    InvalidNumber { field: &'static str, value: String },

    #[error("target sets must be at least 1")]
    ZeroSets,

    #[error("too many fields in '{0}'")]
    TooManyFields(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RoutineExerciseSpec {
    pub exercise_id: String,
    pub target_sets: u32,
    pub target_reps: Option<u32>,
    pub target_weight: Option<f64>,
    pub rest_seconds: Option<u32>,
}

impl RoutineExerciseSpec {
    pub fn into_exercise(self, order_index: i32) -> RoutineExercise {
        RoutineExercise {
            exercise_id: self.exercise_id,
            order_index,
            target_sets: self.target_sets,
            target_reps: self.target_reps,
            target_weight: self.target_weight,
            rest_seconds: self.rest_seconds,
            notes: None,
        }
    }
}

/// Sequence in argument order
pub fn build_sequence(specs: Vec<RoutineExerciseSpec>) -> Vec<RoutineExercise> {
    specs
        .into_iter()
        .enumerate()
        .map(|(i, spec)| spec.into_exercise(i as i32))
        .collect()
}

impl FromStr for RoutineExerciseSpec {
    type Err = SpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = s.split(':').map(str::trim).collect();
        if fields.len() > 5 {
            return Err(SpecError::TooManyFields(s.to_string()));
        }

        let exercise_id = fields[0];
        if exercise_id.is_empty() {
            return Err(SpecError::MissingExercise);
        }

        let field = |i: usize| fields.get(i).copied().filter(|v| !v.is_empty());

        let target_sets = field(1)
            .ok_or_else(|| SpecError::MissingSets(exercise_id.to_string()))
            .and_then(|v| parse_number::<u32>("sets", v))?;
        if target_sets == 0 {
            return Err(SpecError::ZeroSets);
        }

        let target_weight = field(3)
            .map(|v| parse_number::<f64>("weight", v))
            .transpose()?;
        if let Some(w) = target_weight
            && (!w.is_finite() || w < 0.0)
        {
            return Err(SpecError::InvalidNumber {
                field: "weight",
                value: w.to_string(),
            });
        }

        Ok(Self {
            exercise_id: exercise_id.to_string(),
            target_sets,
            target_reps: field(2).map(|v| parse_number("reps", v)).transpose()?,
            target_weight,
            rest_seconds: field(4).map(|v| parse_number("rest", v)).transpose()?,
        })
    }
}

fn parse_number<T: FromStr>(field: &'static str, value: &str) -> Result<T, SpecError> {
    value.parse().map_err(|_| SpecError::InvalidNumber {
        field,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_spec() {
        let spec: RoutineExerciseSpec = "squat:5:5:102.5:180".parse().unwrap();
        assert_eq!(
            spec,
            RoutineExerciseSpec {
                exercise_id: "squat".to_string(),
                target_sets: 5,
                target_reps: Some(5),
                target_weight: Some(102.5),
                rest_seconds: Some(180),
            }
        );
    }

    #[test]
    fn test_parse_skips_empty_fields() {
        let spec: RoutineExerciseSpec = "pullups:3:::90".parse().unwrap();
        assert_eq!(spec.target_reps, None);
        assert_eq!(spec.target_weight, None);
        assert_eq!(spec.rest_seconds, Some(90));

        let spec: RoutineExerciseSpec = "plank:3".parse().unwrap();
        assert_eq!(spec.rest_seconds, None);
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!("".parse::<RoutineExerciseSpec>(), Err(SpecError::MissingExercise));
        assert_eq!(
            "dips".parse::<RoutineExerciseSpec>(),
            Err(SpecError::MissingSets("dips".to_string()))
        );
        assert_eq!("dips:0".parse::<RoutineExerciseSpec>(), Err(SpecError::ZeroSets));
        assert!(matches!(
            "dips:3:ten".parse::<RoutineExerciseSpec>(),
            Err(SpecError::InvalidNumber { field: "reps", .. })
        ));
        assert!(matches!(
            "dips:3:10:-5".parse::<RoutineExerciseSpec>(),
            Err(SpecError::InvalidNumber { field: "weight", .. })
        ));
        assert!(matches!(
            "dips:3:10:0:-1".parse::<RoutineExerciseSpec>(),
            Err(SpecError::InvalidNumber { field: "rest", .. })
        ));
        assert!(matches!(
            "dips:3:10:0:60:x".parse::<RoutineExerciseSpec>(),
            Err(SpecError::TooManyFields(_))
        ));
    }

    #[test]
    fn test_sequence_uses_argument_order() {
        let specs = vec!["bench_press:3".parse().unwrap(), "dips:2".parse().unwrap()];
        let sequence = build_sequence(specs);
        assert_eq!(sequence[0].order_index, 0);
        assert_eq!(sequence[1].exercise_id, "dips");
        assert_eq!(sequence[1].order_index, 1);
    }
}
