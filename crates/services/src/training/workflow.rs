use std::sync::Arc;

use storage::repository::SessionRecordRepository;
use trener_core::model::{RecordId, RunId, UserId, WorkoutPlan};

use super::prefill::prefill_run;
use super::run::{RunTick, StepFinish, StepStart, TrainingRun};
use crate::Clock;
use crate::error::TrainingError;

/// Result of finishing a step through the loop service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepOutcome {
    pub finish: StepFinish,
    /// Set once the finished run has been saved.
    pub record_id: Option<RecordId>,
}

/// Result of one tick through the loop service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopTick {
    pub tick: RunTick,
    pub record_id: Option<RecordId>,
}

/// Orchestrates guided runs: history prefill, clocked transitions, and the
/// single save at the end.
#[derive(Clone)]
pub struct TrainingLoopService {
    clock: Clock,
    records: Arc<dyn SessionRecordRepository>,
}

impl TrainingLoopService {
    #[must_use]
    pub fn new(clock: Clock, records: Arc<dyn SessionRecordRepository>) -> Self {
        Self { clock, records }
    }

    /// Create a run for `plan` and prefill it from the user's last record of
    /// the same workout. A failed lookup is reported through
    /// [`TrainingRun::history`], never as an error.
    pub async fn start_run(&self, user_id: UserId, plan: WorkoutPlan) -> TrainingRun {
        let mut run = TrainingRun::new(RunId::generate(), user_id, plan);
        let outcome = prefill_run(self.records.as_ref(), &mut run).await;
        run.set_history(outcome);
        tracing::info!(
            run_id = %run.run_id(),
            user = %run.user_id(),
            session = %run.plan().session_id(),
            steps = run.catalog().len(),
            "training run created"
        );
        run
    }

    /// Start the step the run is on.
    ///
    /// # Errors
    ///
    /// Returns `TrainingError::Run` if the step cannot start.
    pub fn start_current(&self, run: &mut TrainingRun) -> Result<StepStart, TrainingError> {
        let started = run.start_current(self.clock.now())?;
        tracing::debug!(step = %started.step_id, seconds = started.seconds, "step started");
        Ok(started)
    }

    /// Advance the timer one second, saving the run if an expiring countdown
    /// completed it.
    ///
    /// # Errors
    ///
    /// Returns `TrainingError::Storage` if the save fails; the run stays
    /// finished but unsaved and [`Self::finalize_record`] can retry.
    pub async fn tick(&self, run: &mut TrainingRun) -> Result<LoopTick, TrainingError> {
        let tick = run.tick(self.clock.now())?;
        let record_id = match tick {
            RunTick::Finished(finish) => {
                tracing::debug!(step = %finish.step_id, seconds = finish.duration_seconds, "countdown finished step");
                self.persist_if_complete(run, finish).await?
            }
            _ => run.record_id(),
        };
        Ok(LoopTick { tick, record_id })
    }

    /// Finish the running step, saving the run when it was the last one.
    ///
    /// # Errors
    ///
    /// Returns `TrainingError::Run` if no step is running, or
    /// `TrainingError::Storage` if the final save fails.
    pub async fn finish_active(&self, run: &mut TrainingRun) -> Result<StepOutcome, TrainingError> {
        let finish = run.finish_active(self.clock.now())?;
        tracing::debug!(step = %finish.step_id, seconds = finish.duration_seconds, "step finished");
        let record_id = self.persist_if_complete(run, finish).await?;
        Ok(StepOutcome { finish, record_id })
    }

    /// Save a finished run whose earlier save failed.
    ///
    /// Returns the existing id without touching storage if the run is
    /// already saved.
    ///
    /// # Errors
    ///
    /// Returns `RunError::Incomplete` if steps remain, or
    /// `TrainingError::Storage` if persistence fails again.
    pub async fn finalize_record(&self, run: &mut TrainingRun) -> Result<RecordId, TrainingError> {
        if let Some(id) = run.record_id() {
            return Ok(id);
        }
        self.persist(run).await
    }

    /// Save right after the finish that completed the run. Nothing retries
    /// automatically; see [`Self::finalize_record`].
    async fn persist_if_complete(
        &self,
        run: &mut TrainingRun,
        finish: StepFinish,
    ) -> Result<Option<RecordId>, TrainingError> {
        if !finish.run_complete {
            return Ok(None);
        }
        if let Some(id) = run.record_id() {
            return Ok(Some(id));
        }
        self.persist(run).await.map(Some)
    }

    async fn persist(&self, run: &mut TrainingRun) -> Result<RecordId, TrainingError> {
        let record = run.build_record()?;
        match self.records.create_record(&record).await {
            Ok(id) => {
                run.mark_saved(id, self.clock.now());
                tracing::info!(
                    run_id = %run.run_id(),
                    record_id = %id,
                    total_seconds = record.total_duration_seconds,
                    "training run saved"
                );
                Ok(id)
            }
            Err(err) => {
                tracing::warn!(run_id = %run.run_id(), error = %err, "saving training run failed");
                Err(err.into())
            }
        }
    }
}
