use chrono::{DateTime, Utc};
use trener_core::model::{
    RecordId, RunId, SessionRecord, StepDefinition, StepId, StepInputs, StepValueStore,
    StepValues, StepValuesPatch, UserId, WorkoutPlan, build_catalog,
};
use trener_core::{SessionTimer, TimerMode, TimerTick};

use super::prefill::PrefillOutcome;
use super::progress::RunProgress;
use crate::error::{RunError, TrainingError};

//
// ─── TRANSITION RESULTS ────────────────────────────────────────────────────────
//

/// A step that was just started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepStart {
    pub step_id: StepId,
    pub mode: TimerMode,
    /// Initial timer value: 0 for a stopwatch, the target for a countdown.
    pub seconds: u32,
}

/// A step that was just finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepFinish {
    pub step_id: StepId,
    pub duration_seconds: u32,
    /// Every step of the run now has a completion timestamp.
    pub run_complete: bool,
}

/// Outcome of one timer tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunTick {
    Idle,
    Running { step_id: StepId, seconds: u32 },
    /// A countdown ran out and its step was finished.
    Finished(StepFinish),
}

//
// ─── RUN ───────────────────────────────────────────────────────────────────────
//

/// In-memory state of one guided training run.
///
/// Walks the step catalog strictly in order: start the current step, let the
/// timer run, finish it, move on. Time comes in through the `now` arguments
/// so the services layer controls the clock.
#[derive(Debug, Clone)]
pub struct TrainingRun {
    run_id: RunId,
    user_id: UserId,
    plan: WorkoutPlan,
    catalog: Vec<StepDefinition>,
    values: StepValueStore,
    timer: SessionTimer,
    current: usize,
    active: Option<StepId>,
    started_at: Option<DateTime<Utc>>,
    finished_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    record_id: Option<RecordId>,
    history: PrefillOutcome,
}

impl TrainingRun {
    #[must_use]
    pub fn new(run_id: RunId, user_id: UserId, plan: WorkoutPlan) -> Self {
        let catalog = build_catalog(plan.exercises());
        let values = StepValueStore::with_defaults(&catalog);
        Self {
            run_id,
            user_id,
            plan,
            catalog,
            values,
            timer: SessionTimer::new(),
            current: 0,
            active: None,
            started_at: None,
            finished_at: None,
            completed_at: None,
            record_id: None,
            history: PrefillOutcome::default(),
        }
    }

    #[must_use]
    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    #[must_use]
    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    #[must_use]
    pub fn plan(&self) -> &WorkoutPlan {
        &self.plan
    }

    #[must_use]
    pub fn catalog(&self) -> &[StepDefinition] {
        &self.catalog
    }

    #[must_use]
    pub fn values(&self) -> &StepValueStore {
        &self.values
    }

    #[must_use]
    pub fn step_values(&self, step_id: StepId) -> Option<&StepValues> {
        self.values.get(step_id)
    }

    #[must_use]
    pub fn timer(&self) -> &SessionTimer {
        &self.timer
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn current_step(&self) -> Option<&StepDefinition> {
        self.catalog.get(self.current)
    }

    #[must_use]
    pub fn active_step(&self) -> Option<StepId> {
        self.active
    }

    /// Time the first step was started.
    #[must_use]
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    /// Time the last step was finished.
    #[must_use]
    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }

    /// Time the record was saved. Set once; this is the terminal condition.
    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    #[must_use]
    pub fn record_id(&self) -> Option<RecordId> {
        self.record_id
    }

    /// All steps are done; the record may still be unsaved.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.finished_at.is_some()
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.completed_at.is_some()
    }

    #[must_use]
    pub fn history(&self) -> &PrefillOutcome {
        &self.history
    }

    #[must_use]
    pub fn progress(&self) -> RunProgress {
        let completed = self
            .catalog
            .iter()
            .filter(|step| self.values.get(step.id()).is_some_and(StepValues::is_complete))
            .count();
        RunProgress {
            total_steps: self.catalog.len(),
            completed_steps: completed,
            current_index: self.current,
            active_step: self.active,
            timer_seconds: self.timer.seconds(),
            is_finished: self.is_finished(),
            is_saved: self.is_complete(),
        }
    }

    fn current_id(&self) -> Option<StepId> {
        self.current_step().map(StepDefinition::id)
    }

    fn has_step(&self, step_id: StepId) -> bool {
        self.catalog.iter().any(|step| step.id() == step_id)
    }

    /// Overwrite default inputs from an earlier record of the same workout.
    ///
    /// Only allowed before the first step starts; returns whether anything
    /// was applied.
    pub fn apply_history(&mut self, record: &SessionRecord) -> bool {
        if self.started_at.is_some() || self.active.is_some() {
            return false;
        }
        self.values.prefill_from(&self.catalog, record);
        true
    }

    pub(crate) fn set_history(&mut self, outcome: PrefillOutcome) {
        self.history = outcome;
    }

    /// Merge edited inputs into a step. No-op for unknown steps or once the
    /// run is finished.
    pub fn update(&mut self, step_id: StepId, patch: &StepValuesPatch) -> bool {
        if self.is_finished() {
            return false;
        }
        self.values.update(step_id, patch)
    }

    /// Change an exercise weight by `delta` kilograms.
    pub fn adjust_weight(&mut self, step_id: StepId, delta: f64) -> Option<f64> {
        if self.is_finished() {
            return None;
        }
        self.values.adjust_weight(step_id, delta)
    }

    /// Start the given step and arm the timer for it.
    ///
    /// # Errors
    ///
    /// Returns `RunError` without changing anything if the run is finished,
    /// another step is running, the step is unknown, not the current one,
    /// already complete, or its inputs are missing.
    pub fn start(&mut self, step_id: StepId, now: DateTime<Utc>) -> Result<StepStart, RunError> {
        if self.is_finished() {
            return Err(RunError::RunFinished);
        }
        if let Some(active) = self.active {
            return Err(RunError::StepActive(active));
        }
        if !self.has_step(step_id) {
            return Err(RunError::UnknownStep(step_id));
        }
        let current = self.current_id().ok_or(RunError::UnknownStep(step_id))?;
        if step_id != current {
            return Err(RunError::NotCurrentStep {
                requested: step_id,
                current,
            });
        }

        let values = self
            .values
            .get(step_id)
            .ok_or(RunError::UnknownStep(step_id))?;
        if values.is_complete() {
            return Err(RunError::StepAlreadyComplete(step_id));
        }
        let inputs = *values.inputs();
        if !inputs.is_ready() {
            return Err(RunError::missing_inputs(step_id, inputs.kind()));
        }

        let seconds = match inputs {
            StepInputs::Treadmill(treadmill) => {
                let minutes = treadmill.duration_minutes.unwrap_or(0.0);
                self.timer.start_count_down(minutes)?
            }
            StepInputs::Exercise(_) => {
                self.timer.start_count_up()?;
                0
            }
        };
        let mode = self.timer.mode().unwrap_or(TimerMode::CountUp);

        self.values.mark_started(step_id, now);
        self.active = Some(step_id);
        self.started_at.get_or_insert(now);

        Ok(StepStart {
            step_id,
            mode,
            seconds,
        })
    }

    /// Start whichever step the run is currently on.
    ///
    /// # Errors
    ///
    /// See [`TrainingRun::start`].
    pub fn start_current(&mut self, now: DateTime<Utc>) -> Result<StepStart, RunError> {
        let step_id = self.current_id().ok_or(RunError::RunFinished)?;
        self.start(step_id, now)
    }

    /// Advance the running timer by one second. An expired countdown
    /// finishes its step.
    ///
    /// # Errors
    ///
    /// Returns `RunError` if finishing the expired step fails.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Result<RunTick, RunError> {
        let Some(step_id) = self.active else {
            return Ok(RunTick::Idle);
        };
        match self.timer.tick() {
            TimerTick::Idle => Ok(RunTick::Idle),
            TimerTick::Running { seconds } => Ok(RunTick::Running { step_id, seconds }),
            TimerTick::Expired => self.finish(step_id, now).map(RunTick::Finished),
        }
    }

    /// Stop the timer and record the step's measured duration.
    ///
    /// A zero measurement falls back to the step's previously recorded
    /// duration, if any.
    ///
    /// # Errors
    ///
    /// Returns `RunError::NoActiveStep` or `RunError::NotActive` when the
    /// step is not the one running.
    pub fn finish(&mut self, step_id: StepId, now: DateTime<Utc>) -> Result<StepFinish, RunError> {
        let Some(active) = self.active else {
            return Err(if self.is_finished() {
                RunError::RunFinished
            } else {
                RunError::NoActiveStep
            });
        };
        if active != step_id {
            return Err(RunError::NotActive(step_id));
        }

        let measured = self.timer.stop().unwrap_or(0);
        let duration_seconds = if measured == 0 {
            self.values
                .get(step_id)
                .and_then(StepValues::actual_duration_seconds)
                .unwrap_or(0)
        } else {
            measured
        };

        self.values.mark_completed(step_id, duration_seconds, now);
        self.active = None;
        self.current = (self.current + 1).min(self.catalog.len().saturating_sub(1));

        let run_complete = self.values.all_complete(&self.catalog);
        if run_complete {
            self.finished_at.get_or_insert(now);
        }

        Ok(StepFinish {
            step_id,
            duration_seconds,
            run_complete,
        })
    }

    /// Finish whichever step is running.
    ///
    /// # Errors
    ///
    /// See [`TrainingRun::finish`].
    pub fn finish_active(&mut self, now: DateTime<Utc>) -> Result<StepFinish, RunError> {
        let step_id = self.active.ok_or(if self.is_finished() {
            RunError::RunFinished
        } else {
            RunError::NoActiveStep
        })?;
        self.finish(step_id, now)
    }

    /// Build the record to persist. The same run always yields the same record.
    ///
    /// # Errors
    ///
    /// Returns `RunError::Incomplete` before every step is done, or a
    /// `SessionRecordError` if the record cannot be assembled.
    pub fn build_record(&self) -> Result<SessionRecord, TrainingError> {
        let (Some(started_at), Some(finished_at)) = (self.started_at, self.finished_at) else {
            return Err(RunError::Incomplete.into());
        };
        let record = SessionRecord::from_run(
            self.run_id,
            self.user_id.clone(),
            &self.plan,
            &self.catalog,
            &self.values,
            started_at,
            finished_at,
        )?;
        Ok(record)
    }

    pub(crate) fn mark_saved(&mut self, record_id: RecordId, at: DateTime<Utc>) {
        self.record_id = Some(record_id);
        self.completed_at.get_or_insert(at);
    }
}
