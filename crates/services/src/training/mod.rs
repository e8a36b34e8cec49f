mod prefill;
mod progress;
mod run;
mod workflow;

// Public API of the training subsystem.
pub use crate::error::{RunError, TrainingError};
pub use prefill::PrefillOutcome;
pub use progress::RunProgress;
pub use run::{RunTick, StepFinish, StepStart, TrainingRun};
pub use workflow::{LoopTick, StepOutcome, TrainingLoopService};
