use trener_core::model::StepId;

/// Aggregated view of run progress, useful for front ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunProgress {
    pub total_steps: usize,
    pub completed_steps: usize,
    pub current_index: usize,
    pub active_step: Option<StepId>,
    /// Elapsed seconds for a stopwatch, remaining seconds for a countdown.
    pub timer_seconds: u32,
    pub is_finished: bool,
    pub is_saved: bool,
}

impl RunProgress {
    #[must_use]
    pub fn remaining_steps(&self) -> usize {
        self.total_steps.saturating_sub(self.completed_steps)
    }
}
