use sqlx::Row;
use trener_core::model::{SavedPlan, UserId};

use super::SqliteRepository;
use super::mapping::{conn, map_plan_row, ser};
use crate::repository::{PlanRepository, StorageError};

const PLAN_COLUMNS: &str = r"
    user_id, name, description, muscle_group, session_name, created_at, updated_at
";

impl SqliteRepository {
    async fn load_exercises(&self, user_id: &str, name: &str) -> Result<Vec<String>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT name
                FROM workout_plan_exercises
                WHERE user_id = ?1 AND plan_name = ?2
                ORDER BY position ASC
            ",
        )
        .bind(user_id)
        .bind(name)
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter()
            .map(|row| row.try_get::<String, _>("name").map_err(ser))
            .collect()
    }

    async fn hydrate_plan(&self, row: &sqlx::sqlite::SqliteRow) -> Result<SavedPlan, StorageError> {
        let user_id: String = row.try_get("user_id").map_err(ser)?;
        let name: String = row.try_get("name").map_err(ser)?;
        let exercises = self.load_exercises(&user_id, &name).await?;
        map_plan_row(row, exercises)
    }
}

#[async_trait::async_trait]
impl PlanRepository for SqliteRepository {
    async fn save_plan(&self, plan: &SavedPlan) -> Result<SavedPlan, StorageError> {
        let user_id = plan.user_id().as_str();
        let workout = plan.plan();
        let mut tx = self.pool.begin().await.map_err(conn)?;

        sqlx::query(
            r"
                INSERT INTO workout_plans (
                    user_id, name, description, muscle_group, session_name,
                    created_at, updated_at
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                ON CONFLICT(user_id, name) DO UPDATE SET
                    description = excluded.description,
                    muscle_group = excluded.muscle_group,
                    session_name = excluded.session_name,
                    updated_at = excluded.updated_at
            ",
        )
        .bind(user_id)
        .bind(plan.name())
        .bind(plan.description())
        .bind(workout.muscle_group())
        .bind(workout.session_name())
        .bind(plan.created_at())
        .bind(plan.updated_at())
        .execute(&mut *tx)
        .await
        .map_err(conn)?;

        sqlx::query("DELETE FROM workout_plan_exercises WHERE user_id = ?1 AND plan_name = ?2")
            .bind(user_id)
            .bind(plan.name())
            .execute(&mut *tx)
            .await
            .map_err(conn)?;

        for (position, exercise) in workout.exercises().iter().enumerate() {
            let position = i64::try_from(position)
                .map_err(|_| StorageError::Serialization("exercise position overflow".into()))?;
            sqlx::query(
                r"
                    INSERT INTO workout_plan_exercises (user_id, plan_name, position, name)
                    VALUES (?1, ?2, ?3, ?4)
                ",
            )
            .bind(user_id)
            .bind(plan.name())
            .bind(position)
            .bind(exercise.as_str())
            .execute(&mut *tx)
            .await
            .map_err(conn)?;
        }

        tx.commit().await.map_err(conn)?;
        self.get_plan(plan.user_id(), plan.name()).await
    }

    async fn get_plan(&self, user_id: &UserId, name: &str) -> Result<SavedPlan, StorageError> {
        let sql = format!("SELECT {PLAN_COLUMNS} FROM workout_plans WHERE user_id = ?1 AND name = ?2");
        let row = sqlx::query(&sql)
            .bind(user_id.as_str())
            .bind(name.trim())
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?
            .ok_or(StorageError::NotFound)?;

        self.hydrate_plan(&row).await
    }

    async fn list_plans(&self, user_id: &UserId) -> Result<Vec<SavedPlan>, StorageError> {
        let sql = format!("SELECT {PLAN_COLUMNS} FROM workout_plans WHERE user_id = ?1 ORDER BY name ASC");
        let rows = sqlx::query(&sql)
            .bind(user_id.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(conn)?;

        let mut plans = Vec::with_capacity(rows.len());
        for row in &rows {
            plans.push(self.hydrate_plan(row).await?);
        }
        Ok(plans)
    }

    async fn delete_plan(&self, user_id: &UserId, name: &str) -> Result<(), StorageError> {
        let res = sqlx::query("DELETE FROM workout_plans WHERE user_id = ?1 AND name = ?2")
            .bind(user_id.as_str())
            .bind(name.trim())
            .execute(&self.pool)
            .await
            .map_err(conn)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }
}
