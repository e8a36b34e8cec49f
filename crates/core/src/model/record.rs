use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{RunId, SessionId, StepId, UserId};
use crate::model::plan::WorkoutPlan;
use crate::model::step::{StepDefinition, StepKind};
use crate::model::values::{StepInputs, StepValueStore};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionRecordError {
    #[error("completed_at is before started_at")]
    InvalidTimeRange,

    #[error("total duration ({total}s) does not match the sum of step durations ({sum}s)")]
    DurationMismatch { total: u32, sum: u32 },

    #[error("max weight must be a positive finite number")]
    InvalidWeight,

    #[error("step {0} has no values")]
    MissingStepValues(StepId),
}

//
// ─── AGGREGATES ────────────────────────────────────────────────────────────────
//

/// Summary statistics of one finished run.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SessionAggregates {
    pub total_duration_seconds: u32,
    /// Heaviest exercise weight; `None` when no exercise had a non-zero weight.
    pub max_weight_kg: Option<f64>,
    /// Longest exercise step; `None` when no exercise had a non-zero duration.
    pub longest_exercise_seconds: Option<u32>,
}

impl SessionAggregates {
    /// Sum durations over all steps; take maxima over exercise steps only.
    #[must_use]
    pub fn compute(catalog: &[StepDefinition], values: &StepValueStore) -> Self {
        let mut total = 0_u32;
        let mut max_weight = 0.0_f64;
        let mut longest = 0_u32;

        for step in catalog {
            let Some(step_values) = values.get(step.id()) else {
                continue;
            };
            let duration = step_values.actual_duration_seconds().unwrap_or(0);
            total = total.saturating_add(duration);

            if let StepInputs::Exercise(inputs) = step_values.inputs() {
                max_weight = max_weight.max(inputs.weight_kg.unwrap_or(0.0));
                longest = longest.max(duration);
            }
        }

        Self {
            total_duration_seconds: total,
            max_weight_kg: (max_weight > 0.0).then_some(max_weight),
            longest_exercise_seconds: (longest > 0).then_some(longest),
        }
    }
}

//
// ─── RECORDS ───────────────────────────────────────────────────────────────────
//

/// Snapshot of one step at the time the run was saved.
///
/// Fields that do not apply to the step's kind are `None` and serialize as `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepRecord {
    pub id: StepId,
    #[serde(rename = "type")]
    pub kind: StepKind,
    pub label: String,
    #[serde(rename = "speedKmH")]
    pub speed_kmh: Option<f64>,
    pub duration_seconds: Option<u32>,
    pub weight_kg: Option<f64>,
    pub sets: Option<u32>,
    pub repetitions: Option<u32>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl StepRecord {
    /// Capture a step definition together with its current values.
    ///
    /// # Errors
    ///
    /// Returns `SessionRecordError::MissingStepValues` if the store has no
    /// entry for the step.
    pub fn snapshot(
        step: &StepDefinition,
        values: &StepValueStore,
    ) -> Result<Self, SessionRecordError> {
        let step_values = values
            .get(step.id())
            .ok_or(SessionRecordError::MissingStepValues(step.id()))?;

        let mut record = Self {
            id: step.id(),
            kind: step.kind(),
            label: step.label().to_owned(),
            speed_kmh: None,
            duration_seconds: step_values.actual_duration_seconds(),
            weight_kg: None,
            sets: None,
            repetitions: None,
            started_at: step_values.started_at(),
            completed_at: step_values.completed_at(),
        };

        match step_values.inputs() {
            StepInputs::Treadmill(inputs) => {
                record.speed_kmh = inputs.speed_kmh;
            }
            StepInputs::Exercise(inputs) => {
                record.weight_kg = inputs.weight_kg;
                record.sets = inputs.sets;
                record.repetitions = inputs.repetitions;
            }
        }

        Ok(record)
    }
}

/// A completed run as handed to, and returned from, the record store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub run_id: RunId,
    pub user_id: UserId,
    pub session_id: SessionId,
    pub muscle_group: String,
    pub session_name: String,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub total_duration_seconds: u32,
    pub max_weight_kg: Option<f64>,
    pub longest_exercise_seconds: Option<u32>,
    pub steps: Vec<StepRecord>,
    pub notes: Option<String>,
}

impl SessionRecord {
    /// Assemble the record for a finished run.
    ///
    /// # Errors
    ///
    /// Returns `SessionRecordError::InvalidTimeRange` if `completed_at` precedes
    /// `started_at`, or `MissingStepValues` if a catalog step has no values.
    #[allow(clippy::too_many_arguments)]
    pub fn from_run(
        run_id: RunId,
        user_id: UserId,
        plan: &WorkoutPlan,
        catalog: &[StepDefinition],
        values: &StepValueStore,
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
    ) -> Result<Self, SessionRecordError> {
        if completed_at < started_at {
            return Err(SessionRecordError::InvalidTimeRange);
        }

        let aggregates = SessionAggregates::compute(catalog, values);
        let steps = catalog
            .iter()
            .map(|step| StepRecord::snapshot(step, values))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            run_id,
            user_id,
            session_id: plan.session_id(),
            muscle_group: plan.muscle_group().to_owned(),
            session_name: plan.session_name().to_owned(),
            started_at,
            completed_at,
            total_duration_seconds: aggregates.total_duration_seconds,
            max_weight_kg: aggregates.max_weight_kg,
            longest_exercise_seconds: aggregates.longest_exercise_seconds,
            steps,
            notes: None,
        })
    }

    /// Check the invariants a rehydrated record must satisfy.
    ///
    /// # Errors
    ///
    /// Returns `SessionRecordError` if timestamps are out of order or the total
    /// does not match the step durations.
    pub fn validate(&self) -> Result<(), SessionRecordError> {
        if self.completed_at < self.started_at {
            return Err(SessionRecordError::InvalidTimeRange);
        }
        if self
            .max_weight_kg
            .is_some_and(|kg| !kg.is_finite() || kg <= 0.0)
        {
            return Err(SessionRecordError::InvalidWeight);
        }
        let sum = self
            .steps
            .iter()
            .map(|step| step.duration_seconds.unwrap_or(0))
            .fold(0_u32, u32::saturating_add);
        if sum != self.total_duration_seconds {
            return Err(SessionRecordError::DurationMismatch {
                total: self.total_duration_seconds,
                sum,
            });
        }
        Ok(())
    }
}
