use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use trener_core::model::{RecordId, RunId, SavedPlan, SessionId, SessionRecord, UserId};

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// A stored session record together with the id the store assigned to it.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionRecordRow {
    pub id: RecordId,
    pub record: SessionRecord,
}

impl SessionRecordRow {
    #[must_use]
    pub fn new(id: RecordId, record: SessionRecord) -> Self {
        Self { id, record }
    }
}

/// Repository contract for finished training runs.
#[async_trait]
pub trait SessionRecordRepository: Send + Sync {
    /// Persist a finished run and return its id.
    ///
    /// Saving is idempotent on `record.run_id`: a second call with the same
    /// run id returns the id of the existing record and stores nothing new.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the record cannot be stored.
    async fn create_record(&self, record: &SessionRecord) -> Result<RecordId, StorageError>;

    /// Most recently completed record for a user's workout, if any.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be queried.
    async fn latest_record(
        &self,
        user_id: &UserId,
        session_id: &SessionId,
    ) -> Result<Option<SessionRecordRow>, StorageError>;

    /// Fetch a record by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, or other storage errors.
    async fn get_record(&self, id: RecordId) -> Result<SessionRecordRow, StorageError>;

    /// A user's records, newest first, optionally capped at `limit`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be queried.
    async fn list_records(
        &self,
        user_id: &UserId,
        limit: Option<u32>,
    ) -> Result<Vec<SessionRecordRow>, StorageError>;
}

/// Repository contract for a user's named workout plans.
#[async_trait]
pub trait PlanRepository: Send + Sync {
    /// Insert a plan, or replace the user's plan of the same name.
    ///
    /// Replacing keeps the stored creation time. Returns the plan as stored.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the plan cannot be stored.
    async fn save_plan(&self, plan: &SavedPlan) -> Result<SavedPlan, StorageError>;

    /// Fetch a user's plan by name.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, or other storage errors.
    async fn get_plan(&self, user_id: &UserId, name: &str) -> Result<SavedPlan, StorageError>;

    /// All of a user's plans ordered by name.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be queried.
    async fn list_plans(&self, user_id: &UserId) -> Result<Vec<SavedPlan>, StorageError>;

    /// Delete a user's plan by name.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, or other storage errors.
    async fn delete_plan(&self, user_id: &UserId, name: &str) -> Result<(), StorageError>;
}

#[derive(Default)]
struct InMemoryState {
    next_id: u64,
    rows: Vec<SessionRecordRow>,
    by_run: HashMap<RunId, RecordId>,
    plans: HashMap<(UserId, String), SavedPlan>,
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    state: Arc<Mutex<InMemoryState>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, InMemoryState>, StorageError> {
        self.state
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))
    }
}

fn newest_first(rows: &mut [SessionRecordRow]) {
    rows.sort_by(|a, b| {
        b.record
            .completed_at
            .cmp(&a.record.completed_at)
            .then(b.id.cmp(&a.id))
    });
}

#[async_trait]
impl SessionRecordRepository for InMemoryRepository {
    async fn create_record(&self, record: &SessionRecord) -> Result<RecordId, StorageError> {
        let mut guard = self.lock()?;
        if let Some(existing) = guard.by_run.get(&record.run_id) {
            return Ok(*existing);
        }

        guard.next_id += 1;
        let id = RecordId::new(guard.next_id);
        guard.by_run.insert(record.run_id, id);
        guard.rows.push(SessionRecordRow::new(id, record.clone()));
        Ok(id)
    }

    async fn latest_record(
        &self,
        user_id: &UserId,
        session_id: &SessionId,
    ) -> Result<Option<SessionRecordRow>, StorageError> {
        let guard = self.lock()?;
        let mut matching: Vec<SessionRecordRow> = guard
            .rows
            .iter()
            .filter(|row| &row.record.user_id == user_id && &row.record.session_id == session_id)
            .cloned()
            .collect();
        newest_first(&mut matching);
        Ok(matching.into_iter().next())
    }

    async fn get_record(&self, id: RecordId) -> Result<SessionRecordRow, StorageError> {
        let guard = self.lock()?;
        guard
            .rows
            .iter()
            .find(|row| row.id == id)
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    async fn list_records(
        &self,
        user_id: &UserId,
        limit: Option<u32>,
    ) -> Result<Vec<SessionRecordRow>, StorageError> {
        let guard = self.lock()?;
        let mut rows: Vec<SessionRecordRow> = guard
            .rows
            .iter()
            .filter(|row| &row.record.user_id == user_id)
            .cloned()
            .collect();
        newest_first(&mut rows);
        if let Some(limit) = limit {
            rows.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        }
        Ok(rows)
    }
}

fn plan_key(user_id: &UserId, name: &str) -> (UserId, String) {
    (user_id.clone(), name.trim().to_owned())
}

#[async_trait]
impl PlanRepository for InMemoryRepository {
    async fn save_plan(&self, plan: &SavedPlan) -> Result<SavedPlan, StorageError> {
        let mut guard = self.lock()?;
        let key = plan_key(plan.user_id(), plan.name());
        let stored = match guard.plans.get(&key) {
            Some(previous) => plan.clone().replacing(previous),
            None => plan.clone(),
        };
        guard.plans.insert(key, stored.clone());
        Ok(stored)
    }

    async fn get_plan(&self, user_id: &UserId, name: &str) -> Result<SavedPlan, StorageError> {
        let guard = self.lock()?;
        guard
            .plans
            .get(&plan_key(user_id, name))
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    async fn list_plans(&self, user_id: &UserId) -> Result<Vec<SavedPlan>, StorageError> {
        let guard = self.lock()?;
        let mut plans: Vec<SavedPlan> = guard
            .plans
            .values()
            .filter(|plan| plan.user_id() == user_id)
            .cloned()
            .collect();
        plans.sort_by(|a, b| a.name().cmp(b.name()));
        Ok(plans)
    }

    async fn delete_plan(&self, user_id: &UserId, name: &str) -> Result<(), StorageError> {
        let mut guard = self.lock()?;
        guard
            .plans
            .remove(&plan_key(user_id, name))
            .map(|_| ())
            .ok_or(StorageError::NotFound)
    }
}

/// Repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub records: Arc<dyn SessionRecordRepository>,
    pub plans: Arc<dyn PlanRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = Arc::new(InMemoryRepository::new());
        let records: Arc<dyn SessionRecordRepository> = repo.clone();
        let plans: Arc<dyn PlanRepository> = repo;
        Self { records, plans }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use trener_core::model::{StepValueStore, WorkoutPlan, build_catalog};
    use trener_core::time::fixed_now;

    fn finished(user: &str, session: &str, offset_minutes: i64) -> SessionRecord {
        let plan = WorkoutPlan::new("Legs", session, vec!["Squat".into()]).unwrap();
        let catalog = build_catalog(plan.exercises());
        let mut values = StepValueStore::with_defaults(&catalog);
        let end = fixed_now() + Duration::minutes(offset_minutes);
        for step in &catalog {
            values.mark_started(step.id(), end);
            values.mark_completed(step.id(), 60, end);
        }
        SessionRecord::from_run(
            RunId::generate(),
            UserId::new(user).unwrap(),
            &plan,
            &catalog,
            &values,
            end,
            end,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn create_is_idempotent_on_run_id() {
        let repo = InMemoryRepository::new();
        let record = finished("u1", "A", 0);

        let first = repo.create_record(&record).await.unwrap();
        let second = repo.create_record(&record).await.unwrap();
        assert_eq!(first, second);

        let all = repo.list_records(&record.user_id, None).await.unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn latest_record_matches_user_and_session() {
        let repo = InMemoryRepository::new();
        let older = finished("u1", "A", 0);
        let newer = finished("u1", "A", 30);
        let other_session = finished("u1", "B", 60);
        let other_user = finished("u2", "A", 90);
        for record in [&older, &newer, &other_session, &other_user] {
            repo.create_record(record).await.unwrap();
        }

        let latest = repo
            .latest_record(&older.user_id, &older.session_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(latest.record.run_id, newer.run_id);

        let none = repo
            .latest_record(&UserId::new("u3").unwrap(), &older.session_id)
            .await
            .unwrap();
        assert!(none.is_none());
    }

    #[tokio::test]
    async fn list_is_newest_first_and_limited() {
        let repo = InMemoryRepository::new();
        for offset in [0, 20, 10] {
            repo.create_record(&finished("u1", "A", offset)).await.unwrap();
        }
        let user = UserId::new("u1").unwrap();

        let rows = repo.list_records(&user, Some(2)).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows[0].record.completed_at > rows[1].record.completed_at);

        let err = repo.get_record(RecordId::new(99)).await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound));
    }

    fn saved(user: &str, name: &str, offset_minutes: i64) -> SavedPlan {
        let plan = WorkoutPlan::new("Legs", "Day A", vec!["Squat".into()]).unwrap();
        SavedPlan::new(
            UserId::new(user).unwrap(),
            name,
            None,
            plan,
            fixed_now() + Duration::minutes(offset_minutes),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn saving_a_plan_twice_replaces_it_and_keeps_creation_time() {
        let repo = InMemoryRepository::new();
        repo.save_plan(&saved("u1", "legs", 0)).await.unwrap();
        let stored = repo.save_plan(&saved("u1", "legs", 30)).await.unwrap();

        assert_eq!(stored.created_at(), fixed_now());
        assert_eq!(stored.updated_at(), fixed_now() + Duration::minutes(30));
        let user = UserId::new("u1").unwrap();
        assert_eq!(repo.list_plans(&user).await.unwrap().len(), 1);
        assert_eq!(repo.get_plan(&user, " legs ").await.unwrap(), stored);
    }

    #[tokio::test]
    async fn plans_are_listed_per_user_by_name_and_deleted() {
        let repo = InMemoryRepository::new();
        for plan in [saved("u1", "push", 0), saved("u1", "legs", 0), saved("u2", "arms", 0)] {
            repo.save_plan(&plan).await.unwrap();
        }
        let user = UserId::new("u1").unwrap();

        let names: Vec<String> = repo
            .list_plans(&user)
            .await
            .unwrap()
            .iter()
            .map(|plan| plan.name().to_owned())
            .collect();
        assert_eq!(names, ["legs", "push"]);

        repo.delete_plan(&user, "legs").await.unwrap();
        assert!(matches!(
            repo.get_plan(&user, "legs").await.unwrap_err(),
            StorageError::NotFound
        ));
        assert!(matches!(
            repo.delete_plan(&user, "legs").await.unwrap_err(),
            StorageError::NotFound
        ));
    }
}
