#![forbid(unsafe_code)]

pub mod app_services;
pub mod error;
pub mod plans;
pub mod statistics;
pub mod training;

pub use trener_core::Clock;

pub use app_services::AppServices;
pub use error::{AppServicesError, PlanError, RunError, TrainingError};
pub use plans::PlanService;
pub use statistics::{RECENT_RECORDS, RecordListItem, StatisticsService, TrainingOverview};
pub use training::{
    LoopTick, PrefillOutcome, RunProgress, RunTick, StepFinish, StepOutcome, StepStart,
    TrainingLoopService, TrainingRun,
};
