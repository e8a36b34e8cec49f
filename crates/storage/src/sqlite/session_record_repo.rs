use sqlx::Row;
use trener_core::model::{RecordId, SessionId, SessionRecord, StepRecord, UserId};

use super::SqliteRepository;
use super::mapping::{conn, map_record_row, map_step_row, record_id_from_i64, record_id_to_i64, ser};
use crate::repository::{SessionRecordRepository, SessionRecordRow, StorageError};

const RECORD_COLUMNS: &str = r"
    id, run_id, user_id, session_id, muscle_group, session_name,
    started_at, completed_at, total_duration_seconds, max_weight_kg,
    longest_exercise_seconds, notes
";

impl SqliteRepository {
    async fn load_steps(&self, record_id: i64) -> Result<Vec<StepRecord>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT
                    step_id, kind, label, speed_kmh, duration_seconds,
                    weight_kg, sets, repetitions, started_at, completed_at
                FROM session_record_steps
                WHERE record_id = ?1
                ORDER BY position ASC
            ",
        )
        .bind(record_id)
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_step_row).collect()
    }

    async fn hydrate(&self, rows: Vec<sqlx::sqlite::SqliteRow>) -> Result<Vec<SessionRecordRow>, StorageError> {
        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let id: i64 = row.try_get("id").map_err(ser)?;
            let steps = self.load_steps(id).await?;
            out.push(map_record_row(&row, steps)?);
        }
        Ok(out)
    }
}

#[async_trait::async_trait]
impl SessionRecordRepository for SqliteRepository {
    async fn create_record(&self, record: &SessionRecord) -> Result<RecordId, StorageError> {
        let run_id = record.run_id.to_string();
        let mut tx = self.pool.begin().await.map_err(conn)?;

        // A concurrent save of the same run loses here and reads the winner's id.
        let res = sqlx::query(
            r"
                INSERT INTO session_records (
                    run_id, user_id, session_id, muscle_group, session_name,
                    started_at, completed_at, total_duration_seconds, max_weight_kg,
                    longest_exercise_seconds, notes
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
                ON CONFLICT(run_id) DO NOTHING
            ",
        )
        .bind(&run_id)
        .bind(record.user_id.as_str())
        .bind(record.session_id.as_str())
        .bind(&record.muscle_group)
        .bind(&record.session_name)
        .bind(record.started_at)
        .bind(record.completed_at)
        .bind(i64::from(record.total_duration_seconds))
        .bind(record.max_weight_kg)
        .bind(record.longest_exercise_seconds.map(i64::from))
        .bind(record.notes.as_deref())
        .execute(&mut *tx)
        .await
        .map_err(conn)?;

        if res.rows_affected() == 0 {
            let row = sqlx::query("SELECT id FROM session_records WHERE run_id = ?1")
                .bind(&run_id)
                .fetch_one(&mut *tx)
                .await
                .map_err(conn)?;
            tx.commit().await.map_err(conn)?;
            let id = record_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?;
            tracing::debug!(%id, run_id = %record.run_id, "record already stored for run");
            return Ok(id);
        }
        let record_id = res.last_insert_rowid();

        for (position, step) in record.steps.iter().enumerate() {
            let position = i64::try_from(position)
                .map_err(|_| StorageError::Serialization("step position overflow".into()))?;
            sqlx::query(
                r"
                    INSERT INTO session_record_steps (
                        record_id, position, step_id, kind, label, speed_kmh,
                        duration_seconds, weight_kg, sets, repetitions,
                        started_at, completed_at
                    )
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
                ",
            )
            .bind(record_id)
            .bind(position)
            .bind(step.id.to_string())
            .bind(step.kind.as_str())
            .bind(&step.label)
            .bind(step.speed_kmh)
            .bind(step.duration_seconds.map(i64::from))
            .bind(step.weight_kg)
            .bind(step.sets.map(i64::from))
            .bind(step.repetitions.map(i64::from))
            .bind(step.started_at)
            .bind(step.completed_at)
            .execute(&mut *tx)
            .await
            .map_err(conn)?;
        }

        tx.commit().await.map_err(conn)?;
        record_id_from_i64(record_id)
    }

    async fn latest_record(
        &self,
        user_id: &UserId,
        session_id: &SessionId,
    ) -> Result<Option<SessionRecordRow>, StorageError> {
        let sql = format!(
            "SELECT {RECORD_COLUMNS} FROM session_records
             WHERE user_id = ?1 AND session_id = ?2
             ORDER BY completed_at DESC, id DESC
             LIMIT 1"
        );
        let row = sqlx::query(&sql)
            .bind(user_id.as_str())
            .bind(session_id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?;

        match row {
            Some(row) => Ok(self.hydrate(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn get_record(&self, id: RecordId) -> Result<SessionRecordRow, StorageError> {
        let sql = format!("SELECT {RECORD_COLUMNS} FROM session_records WHERE id = ?1");
        let row = sqlx::query(&sql)
            .bind(record_id_to_i64(id)?)
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?
            .ok_or(StorageError::NotFound)?;

        self.hydrate(vec![row])
            .await?
            .pop()
            .ok_or(StorageError::NotFound)
    }

    async fn list_records(
        &self,
        user_id: &UserId,
        limit: Option<u32>,
    ) -> Result<Vec<SessionRecordRow>, StorageError> {
        let mut sql = format!(
            "SELECT {RECORD_COLUMNS} FROM session_records
             WHERE user_id = ?1
             ORDER BY completed_at DESC, id DESC"
        );
        if limit.is_some() {
            sql.push_str(" LIMIT ?2");
        }

        let mut query = sqlx::query(&sql).bind(user_id.as_str());
        if let Some(limit) = limit {
            query = query.bind(i64::from(limit));
        }

        let rows = query.fetch_all(&self.pool).await.map_err(conn)?;
        self.hydrate(rows).await
    }
}
