use storage::repository::SessionRecordRepository;
use trener_core::model::RecordId;

use super::run::TrainingRun;

/// What happened when a run tried to load its history.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PrefillOutcome {
    /// History was never looked up.
    #[default]
    Skipped,
    /// No earlier record of this workout exists.
    NoHistory,
    /// Inputs were copied from the given record.
    Applied { record_id: RecordId },
    /// The lookup failed; the run keeps its defaults.
    Unavailable { advisory: String },
}

impl PrefillOutcome {
    /// Message to show the user, if any.
    #[must_use]
    pub fn advisory(&self) -> Option<&str> {
        match self {
            PrefillOutcome::Unavailable { advisory } => Some(advisory),
            _ => None,
        }
    }
}

/// Copy inputs from the latest record of the same workout into `run`.
///
/// Lookup failures never fail the run; they come back as an advisory.
pub(crate) async fn prefill_run(
    records: &dyn SessionRecordRepository,
    run: &mut TrainingRun,
) -> PrefillOutcome {
    let session_id = run.plan().session_id();
    match records.latest_record(run.user_id(), &session_id).await {
        Ok(Some(row)) => {
            if run.apply_history(&row.record) {
                tracing::debug!(record_id = %row.id, session = %session_id, "prefilled run from history");
                PrefillOutcome::Applied { record_id: row.id }
            } else {
                PrefillOutcome::Skipped
            }
        }
        Ok(None) => PrefillOutcome::NoHistory,
        Err(err) => {
            tracing::warn!(error = %err, session = %session_id, "could not load previous session");
            PrefillOutcome::Unavailable {
                advisory: format!("previous values are unavailable: {err}"),
            }
        }
    }
}
