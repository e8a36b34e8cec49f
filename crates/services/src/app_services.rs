use std::sync::Arc;

use storage::repository::Storage;

use crate::Clock;
use crate::error::AppServicesError;
use crate::plans::PlanService;
use crate::statistics::StatisticsService;
use crate::training::TrainingLoopService;

/// Assembles the services a front end needs over one storage backend.
#[derive(Clone)]
pub struct AppServices {
    training: Arc<TrainingLoopService>,
    statistics: Arc<StatisticsService>,
    plans: Arc<PlanService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(db_url: &str, clock: Clock) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::from_storage(&storage, clock))
    }

    /// Build services over volatile in-memory storage.
    #[must_use]
    pub fn in_memory(clock: Clock) -> Self {
        Self::from_storage(&Storage::in_memory(), clock)
    }

    #[must_use]
    pub fn from_storage(storage: &Storage, clock: Clock) -> Self {
        let training = Arc::new(TrainingLoopService::new(
            clock,
            Arc::clone(&storage.records),
        ));
        let statistics = Arc::new(StatisticsService::new(Arc::clone(&storage.records)));
        let plans = Arc::new(PlanService::new(clock, Arc::clone(&storage.plans)));
        Self {
            training,
            statistics,
            plans,
        }
    }

    #[must_use]
    pub fn training(&self) -> Arc<TrainingLoopService> {
        Arc::clone(&self.training)
    }

    #[must_use]
    pub fn statistics(&self) -> Arc<StatisticsService> {
        Arc::clone(&self.statistics)
    }

    #[must_use]
    pub fn plans(&self) -> Arc<PlanService> {
        Arc::clone(&self.plans)
    }
}
