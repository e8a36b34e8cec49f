use serde::Deserialize;
use thiserror::Error;

use crate::model::ids::SessionId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum WorkoutPlanError {
    #[error("muscle group cannot be empty")]
    EmptyMuscleGroup,

    #[error("session name cannot be empty")]
    EmptySessionName,

    #[error("exercise #{0} has an empty name")]
    EmptyExerciseName(usize),
}

/// The workout a guided run walks through: which session of which muscle
/// group, and its ordered exercise names.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawWorkoutPlan")]
pub struct WorkoutPlan {
    muscle_group: String,
    session_name: String,
    exercises: Vec<String>,
}

#[derive(Deserialize)]
struct RawWorkoutPlan {
    muscle_group: String,
    #[serde(alias = "name")]
    session_name: String,
    #[serde(default)]
    exercises: Vec<String>,
}

impl TryFrom<RawWorkoutPlan> for WorkoutPlan {
    type Error = WorkoutPlanError;

    fn try_from(raw: RawWorkoutPlan) -> Result<Self, Self::Error> {
        Self::new(raw.muscle_group, raw.session_name, raw.exercises)
    }
}

impl WorkoutPlan {
    /// Creates a validated plan. Names are trimmed; the exercise list may be empty.
    ///
    /// # Errors
    ///
    /// Returns `WorkoutPlanError` if the muscle group, session name, or any
    /// exercise name is blank.
    pub fn new(
        muscle_group: impl Into<String>,
        session_name: impl Into<String>,
        exercises: Vec<String>,
    ) -> Result<Self, WorkoutPlanError> {
        let muscle_group = muscle_group.into().trim().to_owned();
        if muscle_group.is_empty() {
            return Err(WorkoutPlanError::EmptyMuscleGroup);
        }
        let session_name = session_name.into().trim().to_owned();
        if session_name.is_empty() {
            return Err(WorkoutPlanError::EmptySessionName);
        }

        let mut cleaned = Vec::with_capacity(exercises.len());
        for (index, name) in exercises.into_iter().enumerate() {
            let name = name.trim().to_owned();
            if name.is_empty() {
                return Err(WorkoutPlanError::EmptyExerciseName(index + 1));
            }
            cleaned.push(name);
        }

        Ok(Self {
            muscle_group,
            session_name,
            exercises: cleaned,
        })
    }

    #[must_use]
    pub fn muscle_group(&self) -> &str {
        &self.muscle_group
    }

    #[must_use]
    pub fn session_name(&self) -> &str {
        &self.session_name
    }

    #[must_use]
    pub fn exercises(&self) -> &[String] {
        &self.exercises
    }

    /// Identifier shared by all runs of this workout.
    #[must_use]
    pub fn session_id(&self) -> SessionId {
        SessionId::for_workout(&self.muscle_group, &self.session_name)
    }
}
