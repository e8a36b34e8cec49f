use std::sync::Arc;

use storage::repository::PlanRepository;
use trener_core::model::{SavedPlan, UserId, WorkoutPlan};

use crate::Clock;
use crate::error::PlanError;

/// Named workout plans a user keeps between runs.
#[derive(Clone)]
pub struct PlanService {
    clock: Clock,
    plans: Arc<dyn PlanRepository>,
}

impl PlanService {
    #[must_use]
    pub fn new(clock: Clock, plans: Arc<dyn PlanRepository>) -> Self {
        Self { clock, plans }
    }

    /// Save `plan` under `name`, replacing the user's plan of that name.
    ///
    /// # Errors
    ///
    /// Returns `PlanError::Invalid` for a blank name or a workout without
    /// exercises, or `PlanError::Storage` if it cannot be stored.
    pub async fn save_plan(
        &self,
        user_id: UserId,
        name: &str,
        description: Option<String>,
        plan: WorkoutPlan,
    ) -> Result<SavedPlan, PlanError> {
        let saved = SavedPlan::new(user_id, name, description, plan, self.clock.now())?;
        let stored = self.plans.save_plan(&saved).await?;
        tracing::info!(
            user = %stored.user_id(),
            plan = stored.name(),
            exercises = stored.plan().exercises().len(),
            "workout plan saved"
        );
        Ok(stored)
    }

    /// # Errors
    ///
    /// Returns `PlanError::Storage` (`NotFound` when the name is unknown).
    pub async fn get_plan(&self, user_id: &UserId, name: &str) -> Result<SavedPlan, PlanError> {
        Ok(self.plans.get_plan(user_id, name).await?)
    }

    /// # Errors
    ///
    /// Returns `PlanError::Storage` if the store cannot be queried.
    pub async fn list_plans(&self, user_id: &UserId) -> Result<Vec<SavedPlan>, PlanError> {
        Ok(self.plans.list_plans(user_id).await?)
    }

    /// # Errors
    ///
    /// Returns `PlanError::Storage` (`NotFound` when the name is unknown).
    pub async fn remove_plan(&self, user_id: &UserId, name: &str) -> Result<(), PlanError> {
        self.plans.delete_plan(user_id, name).await?;
        tracing::info!(user = %user_id, plan = name.trim(), "workout plan removed");
        Ok(())
    }
}
