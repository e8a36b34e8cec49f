//! Shared error types for the services crate.

use thiserror::Error;

use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;
use trener_core::TimerError;
use trener_core::model::{SavedPlanError, SessionRecordError, StepId, StepKind};

/// Reasons a step transition is refused. The run is left unchanged.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum RunError {
    #[error("the run is already finished")]
    RunFinished,
    #[error("step {0} is still running")]
    StepActive(StepId),
    #[error("unknown step {0}")]
    UnknownStep(StepId),
    #[error("step {requested} cannot start before {current}")]
    NotCurrentStep { requested: StepId, current: StepId },
    #[error("step {0} is already complete")]
    StepAlreadyComplete(StepId),
    #[error("treadmill step {0} needs a speed and a duration")]
    MissingTreadmillInputs(StepId),
    #[error("exercise step {0} needs sets and repetitions")]
    MissingExerciseInputs(StepId),
    #[error("step {0} is not running")]
    NotActive(StepId),
    #[error("no step is running")]
    NoActiveStep,
    #[error("not every step is complete yet")]
    Incomplete,
    #[error(transparent)]
    Timer(#[from] TimerError),
}

impl RunError {
    pub(crate) fn missing_inputs(step_id: StepId, kind: StepKind) -> Self {
        match kind {
            StepKind::Treadmill => Self::MissingTreadmillInputs(step_id),
            StepKind::Exercise => Self::MissingExerciseInputs(step_id),
        }
    }

    /// True for input problems the user can fix before trying again.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::MissingTreadmillInputs(_) | Self::MissingExerciseInputs(_)
        )
    }
}

/// Errors emitted by the training loop.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TrainingError {
    #[error(transparent)]
    Run(#[from] RunError),
    #[error(transparent)]
    Record(#[from] SessionRecordError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by saved-plan operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PlanError {
    #[error(transparent)]
    Invalid(#[from] SavedPlanError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
}
