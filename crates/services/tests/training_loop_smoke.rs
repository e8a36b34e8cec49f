use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use services::{
    Clock, PrefillOutcome, RunError, RunTick, StatisticsService, TrainingError,
    TrainingLoopService, TrainingRun,
};
use storage::repository::{
    InMemoryRepository, SessionRecordRepository, SessionRecordRow, StorageError,
};
use trener_core::model::{
    RecordId, SessionId, SessionRecord, StepId, StepValuesPatch, UserId, WorkoutPlan,
};
use trener_core::time::fixed_now;

/// Wraps the in-memory repository, counting saves and optionally failing them.
#[derive(Default)]
struct FlakyRepository {
    inner: InMemoryRepository,
    creates: AtomicUsize,
    fail_creates: AtomicBool,
    fail_reads: AtomicBool,
}

#[async_trait]
impl SessionRecordRepository for FlakyRepository {
    async fn create_record(&self, record: &SessionRecord) -> Result<RecordId, StorageError> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        if self.fail_creates.load(Ordering::SeqCst) {
            return Err(StorageError::Connection("gateway down".into()));
        }
        self.inner.create_record(record).await
    }

    async fn latest_record(
        &self,
        user_id: &UserId,
        session_id: &SessionId,
    ) -> Result<Option<SessionRecordRow>, StorageError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StorageError::Connection("history down".into()));
        }
        self.inner.latest_record(user_id, session_id).await
    }

    async fn get_record(&self, id: RecordId) -> Result<SessionRecordRow, StorageError> {
        self.inner.get_record(id).await
    }

    async fn list_records(
        &self,
        user_id: &UserId,
        limit: Option<u32>,
    ) -> Result<Vec<SessionRecordRow>, StorageError> {
        self.inner.list_records(user_id, limit).await
    }
}

fn user() -> UserId {
    UserId::new("athlete-1").unwrap()
}

fn plan() -> WorkoutPlan {
    WorkoutPlan::new("Legs", "Day A", vec!["Squat".into(), "Row".into()]).unwrap()
}

fn service(repo: &Arc<FlakyRepository>) -> TrainingLoopService {
    let records: Arc<dyn SessionRecordRepository> = repo.clone();
    TrainingLoopService::new(Clock::fixed(fixed_now()), records)
}

fn set_treadmill(run: &mut TrainingRun, minutes: f64) {
    let patch = StepValuesPatch::default()
        .speed_kmh(Some(6.0))
        .duration_minutes(Some(minutes));
    run.update(StepId::Warmup, &patch);
    run.update(StepId::Cooldown, &patch);
}

async fn tick_until_finished(svc: &TrainingLoopService, run: &mut TrainingRun) -> Option<RecordId> {
    loop {
        let tick = svc.tick(run).await.unwrap();
        if let RunTick::Finished(_) = tick.tick {
            return tick.record_id;
        }
    }
}

/// Warm-up 300 s, Squat 60 s at 50 kg, Row 90 s, cool-down 300 s.
/// Returns the record id reported when the last step finished.
async fn drive_reference_run(
    svc: &TrainingLoopService,
    run: &mut TrainingRun,
) -> Result<Option<RecordId>, TrainingError> {
    set_treadmill(run, 5.0);
    run.update(
        StepId::Exercise(0),
        &StepValuesPatch::default().weight_kg(Some(50.0)),
    );

    svc.start_current(run)?;
    assert_eq!(tick_until_finished(svc, run).await, None);

    for seconds in [60, 90] {
        svc.start_current(run)?;
        for _ in 0..seconds {
            svc.tick(run).await?;
        }
        let outcome = svc.finish_active(run).await?;
        assert_eq!(outcome.finish.duration_seconds, seconds);
        assert_eq!(outcome.record_id, None);
    }

    svc.start_current(run)?;
    for _ in 0..299 {
        svc.tick(run).await?;
    }
    let last = svc.tick(run).await?;
    assert!(matches!(last.tick, RunTick::Finished(f) if f.run_complete));
    Ok(last.record_id)
}

#[tokio::test]
async fn reference_run_is_saved_once_with_expected_aggregates() {
    let repo = Arc::new(FlakyRepository::default());
    let svc = service(&repo);

    let mut run = svc.start_run(user(), plan()).await;
    assert_eq!(run.history(), &PrefillOutcome::NoHistory);
    assert_eq!(run.catalog().len(), 4);

    let record_id = drive_reference_run(&svc, &mut run)
        .await
        .unwrap()
        .expect("saved on completion");
    assert!(run.is_complete());
    assert_eq!(run.record_id(), Some(record_id));
    assert_eq!(repo.creates.load(Ordering::SeqCst), 1);

    let stored = repo.get_record(record_id).await.unwrap().record;
    assert_eq!(stored.total_duration_seconds, 750);
    assert_eq!(stored.max_weight_kg, Some(50.0));
    assert_eq!(stored.longest_exercise_seconds, Some(90));
    assert_eq!(stored.run_id, run.run_id());

    // Later ticks and completion checks never save again.
    let idle = svc.tick(&mut run).await.unwrap();
    assert_eq!(idle.tick, RunTick::Idle);
    assert_eq!(svc.finalize_record(&mut run).await.unwrap(), record_id);
    assert!(matches!(
        svc.finish_active(&mut run).await,
        Err(TrainingError::Run(RunError::RunFinished))
    ));
    assert_eq!(repo.creates.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn failed_save_is_retried_only_through_finalize() {
    let repo = Arc::new(FlakyRepository::default());
    repo.fail_creates.store(true, Ordering::SeqCst);
    let svc = service(&repo);

    let mut run = svc.start_run(user(), plan()).await;
    let err = drive_reference_run(&svc, &mut run).await.unwrap_err();
    assert!(matches!(err, TrainingError::Storage(_)));
    assert!(run.is_finished());
    assert!(!run.is_complete());
    assert_eq!(run.completed_at(), None);

    // Ticking a finished, unsaved run does not retry behind the caller's back.
    svc.tick(&mut run).await.unwrap();
    assert_eq!(repo.creates.load(Ordering::SeqCst), 1);

    assert!(svc.finalize_record(&mut run).await.is_err());

    repo.fail_creates.store(false, Ordering::SeqCst);
    let id = svc.finalize_record(&mut run).await.unwrap();
    assert!(run.is_complete());
    assert_eq!(svc.finalize_record(&mut run).await.unwrap(), id);
    assert_eq!(repo.creates.load(Ordering::SeqCst), 3);

    let stored = repo.list_records(&user(), None).await.unwrap();
    assert_eq!(stored.len(), 1);
}

#[tokio::test]
async fn finalize_refuses_an_unfinished_run() {
    let repo = Arc::new(FlakyRepository::default());
    let svc = service(&repo);
    let mut run = svc.start_run(user(), plan()).await;

    let err = svc.finalize_record(&mut run).await.unwrap_err();
    assert!(matches!(err, TrainingError::Run(RunError::Incomplete)));
    assert_eq!(repo.creates.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn next_run_is_prefilled_from_history() {
    let repo = Arc::new(FlakyRepository::default());
    let svc = service(&repo);

    let mut first = svc.start_run(user(), plan()).await;
    let first_id = drive_reference_run(&svc, &mut first).await.unwrap().unwrap();

    let second = svc.start_run(user(), plan()).await;
    assert_eq!(
        second.history(),
        &PrefillOutcome::Applied {
            record_id: first_id
        }
    );
    let warmup = *second.step_values(StepId::Warmup).unwrap().treadmill().unwrap();
    assert_eq!(warmup.speed_kmh, Some(6.0));
    assert_eq!(warmup.duration_minutes, Some(5.0));
    let squat = *second.step_values(StepId::Exercise(0)).unwrap().exercise().unwrap();
    assert_eq!(squat.weight_kg, Some(50.0));
    assert_eq!(squat.sets, Some(4));
    assert_ne!(second.run_id(), first.run_id());

    let other_workout = WorkoutPlan::new("Back", "Pull", vec!["Row".into()]).unwrap();
    let unrelated = svc.start_run(user(), other_workout).await;
    assert_eq!(unrelated.history(), &PrefillOutcome::NoHistory);
}

#[tokio::test]
async fn history_failure_is_only_an_advisory() {
    let repo = Arc::new(FlakyRepository::default());
    repo.fail_reads.store(true, Ordering::SeqCst);
    let svc = service(&repo);

    let mut run = svc.start_run(user(), plan()).await;
    assert!(run.history().advisory().is_some());

    let warmup = *run.step_values(StepId::Warmup).unwrap().treadmill().unwrap();
    assert_eq!(warmup.speed_kmh, None);
    assert_eq!(warmup.duration_minutes, Some(10.0));

    let err = svc.start_current(&mut run).unwrap_err();
    assert!(matches!(
        err,
        TrainingError::Run(RunError::MissingTreadmillInputs(StepId::Warmup))
    ));
    set_treadmill(&mut run, 10.0);
    let start = svc.start_current(&mut run).unwrap();
    assert_eq!(start.seconds, 600);
}

#[tokio::test]
async fn statistics_cover_saved_runs() {
    let repo = Arc::new(FlakyRepository::default());
    let svc = service(&repo);
    let records: Arc<dyn SessionRecordRepository> = repo.clone();
    let stats = StatisticsService::new(records);

    let empty = stats.overview(&user()).await.unwrap();
    assert_eq!(empty.totals.sessions, 0);
    assert!(empty.recent.is_empty());

    for _ in 0..2 {
        let mut run = svc.start_run(user(), plan()).await;
        drive_reference_run(&svc, &mut run).await.unwrap();
    }

    let overview = stats.overview(&user()).await.unwrap();
    assert_eq!(overview.totals.sessions, 2);
    assert_eq!(overview.totals.total_duration_seconds, 1500);
    assert_eq!(overview.totals.max_weight_kg, 50.0);
    assert_eq!(overview.totals.longest_exercise_seconds, 90);
    assert_eq!(overview.recent.len(), 2);

    let limited = stats.history(&user(), Some(1)).await.unwrap();
    assert_eq!(limited.len(), 1);
    let full = stats.record(limited[0].id).await.unwrap();
    assert_eq!(full.record.steps.len(), 4);
}
