use crate::model::record::SessionRecord;

/// Lifetime totals across a user's saved runs.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TrainingTotals {
    pub sessions: usize,
    pub total_duration_seconds: u64,
    /// Zero when no record carries a weight.
    pub max_weight_kg: f64,
    /// Zero when no record carries an exercise duration.
    pub longest_exercise_seconds: u32,
}

impl TrainingTotals {
    #[must_use]
    pub fn from_records<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a SessionRecord>,
    {
        records.into_iter().fold(Self::default(), |mut acc, record| {
            acc.sessions += 1;
            acc.total_duration_seconds += u64::from(record.total_duration_seconds);
            acc.max_weight_kg = acc.max_weight_kg.max(record.max_weight_kg.unwrap_or(0.0));
            acc.longest_exercise_seconds = acc
                .longest_exercise_seconds
                .max(record.longest_exercise_seconds.unwrap_or(0));
            acc
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{RunId, SessionId, UserId};
    use crate::time::fixed_now;

    fn record(total: u32, weight: Option<f64>, longest: Option<u32>) -> SessionRecord {
        SessionRecord {
            run_id: RunId::generate(),
            user_id: UserId::new("u1").unwrap(),
            session_id: SessionId::new("legs-a").unwrap(),
            muscle_group: "legs".into(),
            session_name: "A".into(),
            started_at: fixed_now(),
            completed_at: fixed_now(),
            total_duration_seconds: total,
            max_weight_kg: weight,
            longest_exercise_seconds: longest,
            steps: Vec::new(),
            notes: None,
        }
    }

    #[test]
    fn empty_history_is_all_zero() {
        let totals = TrainingTotals::from_records(&Vec::<SessionRecord>::new());
        assert_eq!(totals, TrainingTotals::default());
    }

    #[test]
    fn sums_durations_and_tracks_maxima() {
        let records = [
            record(1200, Some(40.0), Some(80)),
            record(900, None, None),
            record(1500, Some(62.5), Some(45)),
        ];
        let totals = TrainingTotals::from_records(&records);
        assert_eq!(totals.sessions, 3);
        assert_eq!(totals.total_duration_seconds, 3600);
        assert_eq!(totals.max_weight_kg, 62.5);
        assert_eq!(totals.longest_exercise_seconds, 80);
    }
}
