use chrono::{DateTime, Utc};
use std::sync::Arc;

use storage::repository::{SessionRecordRepository, SessionRecordRow, StorageError};
use trener_core::model::{RecordId, SessionId, TrainingTotals, UserId};

/// How many records the overview lists.
pub const RECENT_RECORDS: usize = 6;

/// Presentation-agnostic list item for a saved run.
///
/// No pre-formatted strings; front ends format durations and dates.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordListItem {
    pub id: RecordId,
    pub session_id: SessionId,
    pub muscle_group: String,
    pub session_name: String,
    pub completed_at: DateTime<Utc>,
    pub total_duration_seconds: u32,
    pub max_weight_kg: Option<f64>,
    pub longest_exercise_seconds: Option<u32>,
}

impl RecordListItem {
    #[must_use]
    pub fn from_row(row: &SessionRecordRow) -> Self {
        let record = &row.record;
        Self {
            id: row.id,
            session_id: record.session_id.clone(),
            muscle_group: record.muscle_group.clone(),
            session_name: record.session_name.clone(),
            completed_at: record.completed_at,
            total_duration_seconds: record.total_duration_seconds,
            max_weight_kg: record.max_weight_kg,
            longest_exercise_seconds: record.longest_exercise_seconds,
        }
    }
}

/// Lifetime totals plus the most recent runs.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingOverview {
    pub totals: TrainingTotals,
    pub recent: Vec<RecordListItem>,
}

/// Read-side queries over saved runs.
#[derive(Clone)]
pub struct StatisticsService {
    records: Arc<dyn SessionRecordRepository>,
}

impl StatisticsService {
    #[must_use]
    pub fn new(records: Arc<dyn SessionRecordRepository>) -> Self {
        Self { records }
    }

    /// Totals over every record of the user and the newest few runs.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if records cannot be listed.
    pub async fn overview(&self, user_id: &UserId) -> Result<TrainingOverview, StorageError> {
        let rows = self.records.list_records(user_id, None).await?;
        let totals = TrainingTotals::from_records(rows.iter().map(|row| &row.record));
        let recent = rows
            .iter()
            .take(RECENT_RECORDS)
            .map(RecordListItem::from_row)
            .collect();
        Ok(TrainingOverview { totals, recent })
    }

    /// The user's runs, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if records cannot be listed.
    pub async fn history(
        &self,
        user_id: &UserId,
        limit: Option<u32>,
    ) -> Result<Vec<RecordListItem>, StorageError> {
        let rows = self.records.list_records(user_id, limit).await?;
        Ok(rows.iter().map(RecordListItem::from_row).collect())
    }

    /// A single stored run with all of its steps.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the id is unknown.
    pub async fn record(&self, id: RecordId) -> Result<SessionRecordRow, StorageError> {
        self.records.get_record(id).await
    }
}
