use chrono::{DateTime, Utc};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;
use trener_core::model::{
    RecordId, RunId, SavedPlan, SessionId, SessionRecord, StepId, StepKind, StepRecord, UserId,
    WorkoutPlan,
};

use crate::repository::{SessionRecordRow, StorageError};

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn conn(e: sqlx::Error) -> StorageError {
    StorageError::Connection(e.to_string())
}

pub(crate) fn record_id_to_i64(id: RecordId) -> Result<i64, StorageError> {
    i64::try_from(id.value()).map_err(|_| StorageError::Serialization("record_id overflow".into()))
}

pub(crate) fn record_id_from_i64(v: i64) -> Result<RecordId, StorageError> {
    u64::try_from(v)
        .map(RecordId::new)
        .map_err(|_| StorageError::Serialization(format!("invalid record_id: {v}")))
}

fn u32_from_i64(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

fn opt_u32(row: &SqliteRow, field: &'static str) -> Result<Option<u32>, StorageError> {
    row.try_get::<Option<i64>, _>(field)
        .map_err(ser)?
        .map(|v| u32_from_i64(field, v))
        .transpose()
}

pub(crate) fn map_step_row(row: &SqliteRow) -> Result<StepRecord, StorageError> {
    let id: StepId = row
        .try_get::<String, _>("step_id")
        .map_err(ser)?
        .parse()
        .map_err(ser)?;
    let kind: StepKind = row
        .try_get::<String, _>("kind")
        .map_err(ser)?
        .parse()
        .map_err(ser)?;

    Ok(StepRecord {
        id,
        kind,
        label: row.try_get("label").map_err(ser)?,
        speed_kmh: row.try_get("speed_kmh").map_err(ser)?,
        duration_seconds: opt_u32(row, "duration_seconds")?,
        weight_kg: row.try_get("weight_kg").map_err(ser)?,
        sets: opt_u32(row, "sets")?,
        repetitions: opt_u32(row, "repetitions")?,
        started_at: row
            .try_get::<Option<DateTime<Utc>>, _>("started_at")
            .map_err(ser)?,
        completed_at: row
            .try_get::<Option<DateTime<Utc>>, _>("completed_at")
            .map_err(ser)?,
    })
}

/// Rebuild a record from its header row and ordered step snapshots.
///
/// The result is validated so a corrupted row surfaces as a serialization
/// error instead of wrong aggregates.
pub(crate) fn map_record_row(
    row: &SqliteRow,
    steps: Vec<StepRecord>,
) -> Result<SessionRecordRow, StorageError> {
    let id = record_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?;
    let run_id: RunId = row
        .try_get::<String, _>("run_id")
        .map_err(ser)?
        .parse()
        .map_err(ser)?;
    let user_id = UserId::new(row.try_get::<String, _>("user_id").map_err(ser)?).map_err(ser)?;
    let session_id =
        SessionId::new(row.try_get::<String, _>("session_id").map_err(ser)?).map_err(ser)?;

    let record = SessionRecord {
        run_id,
        user_id,
        session_id,
        muscle_group: row.try_get("muscle_group").map_err(ser)?,
        session_name: row.try_get("session_name").map_err(ser)?,
        started_at: row.try_get("started_at").map_err(ser)?,
        completed_at: row.try_get("completed_at").map_err(ser)?,
        total_duration_seconds: u32_from_i64(
            "total_duration_seconds",
            row.try_get::<i64, _>("total_duration_seconds").map_err(ser)?,
        )?,
        max_weight_kg: row.try_get("max_weight_kg").map_err(ser)?,
        longest_exercise_seconds: opt_u32(row, "longest_exercise_seconds")?,
        steps,
        notes: row.try_get("notes").map_err(ser)?,
    };
    record.validate().map_err(ser)?;

    Ok(SessionRecordRow::new(id, record))
}

/// Rebuild a saved plan from its row and ordered exercise names.
pub(crate) fn map_plan_row(row: &SqliteRow, exercises: Vec<String>) -> Result<SavedPlan, StorageError> {
    let user_id = UserId::new(row.try_get::<String, _>("user_id").map_err(ser)?).map_err(ser)?;
    let plan = WorkoutPlan::new(
        row.try_get::<String, _>("muscle_group").map_err(ser)?,
        row.try_get::<String, _>("session_name").map_err(ser)?,
        exercises,
    )
    .map_err(ser)?;

    SavedPlan::restore(
        user_id,
        row.try_get::<String, _>("name").map_err(ser)?,
        row.try_get("description").map_err(ser)?,
        plan,
        row.try_get("created_at").map_err(ser)?,
        row.try_get("updated_at").map_err(ser)?,
    )
    .map_err(ser)
}
