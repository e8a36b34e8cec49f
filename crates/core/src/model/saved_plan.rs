use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::ids::UserId;
use crate::model::plan::WorkoutPlan;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SavedPlanError {
    #[error("plan name cannot be empty")]
    EmptyName,

    #[error("a plan needs at least one exercise")]
    NoExercises,

    #[error("updated_at is before created_at")]
    InvalidTimeRange,
}

/// A workout a user keeps under a name so later runs can pick it up again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedPlan {
    user_id: UserId,
    name: String,
    description: Option<String>,
    plan: WorkoutPlan,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl SavedPlan {
    /// Creates a plan saved at `now`.
    ///
    /// The name is trimmed; a blank description is dropped.
    ///
    /// # Errors
    ///
    /// Returns `SavedPlanError` if the name is blank or the workout has no
    /// exercises.
    pub fn new(
        user_id: UserId,
        name: impl Into<String>,
        description: Option<String>,
        plan: WorkoutPlan,
        now: DateTime<Utc>,
    ) -> Result<Self, SavedPlanError> {
        Self::restore(user_id, name, description, plan, now, now)
    }

    /// Rebuilds a stored plan, checking the same rules as [`Self::new`].
    ///
    /// # Errors
    ///
    /// Returns `SavedPlanError` if the name is blank, the workout has no
    /// exercises, or the timestamps are out of order.
    pub fn restore(
        user_id: UserId,
        name: impl Into<String>,
        description: Option<String>,
        plan: WorkoutPlan,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Result<Self, SavedPlanError> {
        let name = name.into().trim().to_owned();
        if name.is_empty() {
            return Err(SavedPlanError::EmptyName);
        }
        if plan.exercises().is_empty() {
            return Err(SavedPlanError::NoExercises);
        }
        if updated_at < created_at {
            return Err(SavedPlanError::InvalidTimeRange);
        }
        let description = description
            .map(|text| text.trim().to_owned())
            .filter(|text| !text.is_empty());

        Ok(Self {
            user_id,
            name,
            description,
            plan,
            created_at,
            updated_at,
        })
    }

    /// Keep the original creation time when this plan replaces `previous`.
    #[must_use]
    pub fn replacing(mut self, previous: &SavedPlan) -> Self {
        if previous.created_at < self.created_at {
            self.created_at = previous.created_at;
        }
        self
    }

    #[must_use]
    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    #[must_use]
    pub fn plan(&self) -> &WorkoutPlan {
        &self.plan
    }

    #[must_use]
    pub fn into_plan(self) -> WorkoutPlan {
        self.plan
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}
