mod ids;
mod plan;
mod record;
mod saved_plan;
mod slug;
mod stats;
mod step;
mod values;

pub use ids::{ParseIdError, RecordId, RunId, SessionId, StepId, UserId};
pub use plan::{WorkoutPlan, WorkoutPlanError};
pub use record::{SessionAggregates, SessionRecord, SessionRecordError, StepRecord};
pub use saved_plan::{SavedPlan, SavedPlanError};
pub use slug::slugify;
pub use stats::TrainingTotals;
pub use step::{
    COOLDOWN_SUBTITLE, StepDefinition, StepKind, TREADMILL_LABEL, WARMUP_SUBTITLE, build_catalog,
};
pub use values::{
    DEFAULT_REPETITIONS, DEFAULT_SETS, DEFAULT_TREADMILL_MINUTES, ExerciseInputs, StepInputs,
    StepValueStore, StepValues, StepValuesPatch, TreadmillInputs,
};
