use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

use crate::model::ids::StepId;
use crate::model::record::SessionRecord;
use crate::model::step::{StepDefinition, StepKind};

/// Target treadmill duration before any history is applied.
pub const DEFAULT_TREADMILL_MINUTES: f64 = 10.0;
pub const DEFAULT_SETS: u32 = 4;
pub const DEFAULT_REPETITIONS: u32 = 12;

//
// ─── INPUTS ────────────────────────────────────────────────────────────────────
//

/// User-editable inputs of a treadmill step.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TreadmillInputs {
    pub speed_kmh: Option<f64>,
    /// Target duration; the countdown starts from this.
    pub duration_minutes: Option<f64>,
}

impl TreadmillInputs {
    /// Both speed and duration must be set and positive before the step can start.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        is_positive(self.speed_kmh) && is_positive(self.duration_minutes)
    }
}

/// User-editable inputs of an exercise step.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ExerciseInputs {
    pub weight_kg: Option<f64>,
    pub sets: Option<u32>,
    pub repetitions: Option<u32>,
}

impl ExerciseInputs {
    /// Sets and repetitions must be set and non-zero; weight is optional.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.sets.unwrap_or(0) > 0 && self.repetitions.unwrap_or(0) > 0
    }
}

// NaN and infinities never reach stored inputs.
fn is_finite_or_clear(value: &Option<f64>) -> bool {
    value.is_none_or(f64::is_finite)
}

fn is_positive(value: Option<f64>) -> bool {
    value.is_some_and(|v| v.is_finite() && v > 0.0)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StepInputs {
    Treadmill(TreadmillInputs),
    Exercise(ExerciseInputs),
}

impl StepInputs {
    #[must_use]
    pub fn kind(&self) -> StepKind {
        match self {
            StepInputs::Treadmill(_) => StepKind::Treadmill,
            StepInputs::Exercise(_) => StepKind::Exercise,
        }
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        match self {
            StepInputs::Treadmill(inputs) => inputs.is_ready(),
            StepInputs::Exercise(inputs) => inputs.is_ready(),
        }
    }
}

//
// ─── STEP VALUES ───────────────────────────────────────────────────────────────
//

/// Mutable record for one step: inputs plus lifecycle timestamps.
///
/// A step is complete iff `completed_at` is set.
#[derive(Debug, Clone, PartialEq)]
pub struct StepValues {
    inputs: StepInputs,
    actual_duration_seconds: Option<u32>,
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
}

impl StepValues {
    /// Default values for a step of the given kind.
    #[must_use]
    pub fn default_for(kind: StepKind) -> Self {
        let inputs = match kind {
            StepKind::Treadmill => StepInputs::Treadmill(TreadmillInputs {
                speed_kmh: None,
                duration_minutes: Some(DEFAULT_TREADMILL_MINUTES),
            }),
            StepKind::Exercise => StepInputs::Exercise(ExerciseInputs {
                weight_kg: None,
                sets: Some(DEFAULT_SETS),
                repetitions: Some(DEFAULT_REPETITIONS),
            }),
        };
        Self {
            inputs,
            actual_duration_seconds: None,
            started_at: None,
            completed_at: None,
        }
    }

    #[must_use]
    pub fn inputs(&self) -> &StepInputs {
        &self.inputs
    }

    #[must_use]
    pub fn treadmill(&self) -> Option<&TreadmillInputs> {
        match &self.inputs {
            StepInputs::Treadmill(inputs) => Some(inputs),
            StepInputs::Exercise(_) => None,
        }
    }

    #[must_use]
    pub fn exercise(&self) -> Option<&ExerciseInputs> {
        match &self.inputs {
            StepInputs::Exercise(inputs) => Some(inputs),
            StepInputs::Treadmill(_) => None,
        }
    }

    #[must_use]
    pub fn kind(&self) -> StepKind {
        self.inputs.kind()
    }

    #[must_use]
    pub fn actual_duration_seconds(&self) -> Option<u32> {
        self.actual_duration_seconds
    }

    #[must_use]
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.completed_at.is_some()
    }

    fn apply(&mut self, patch: &StepValuesPatch) {
        match &mut self.inputs {
            StepInputs::Treadmill(inputs) => {
                if let Some(speed) = patch.speed_kmh.filter(is_finite_or_clear) {
                    inputs.speed_kmh = speed;
                }
                if let Some(minutes) = patch.duration_minutes.filter(is_finite_or_clear) {
                    inputs.duration_minutes = minutes;
                }
            }
            StepInputs::Exercise(inputs) => {
                if let Some(weight) = patch.weight_kg.filter(is_finite_or_clear) {
                    inputs.weight_kg = weight;
                }
                if let Some(sets) = patch.sets {
                    inputs.sets = sets;
                }
                if let Some(repetitions) = patch.repetitions {
                    inputs.repetitions = repetitions;
                }
            }
        }
    }
}

//
// ─── PATCH ─────────────────────────────────────────────────────────────────────
//

/// Partial update of step inputs.
///
/// Outer `None` leaves a field untouched; `Some(None)` clears it. Fields that
/// do not belong to the target step's kind are ignored, and so are non-finite
/// numbers.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StepValuesPatch {
    pub speed_kmh: Option<Option<f64>>,
    pub duration_minutes: Option<Option<f64>>,
    pub weight_kg: Option<Option<f64>>,
    pub sets: Option<Option<u32>>,
    pub repetitions: Option<Option<u32>>,
}

impl StepValuesPatch {
    #[must_use]
    pub fn speed_kmh(mut self, value: Option<f64>) -> Self {
        self.speed_kmh = Some(value);
        self
    }

    #[must_use]
    pub fn duration_minutes(mut self, value: Option<f64>) -> Self {
        self.duration_minutes = Some(value);
        self
    }

    #[must_use]
    pub fn weight_kg(mut self, value: Option<f64>) -> Self {
        self.weight_kg = Some(value);
        self
    }

    #[must_use]
    pub fn sets(mut self, value: Option<u32>) -> Self {
        self.sets = Some(value);
        self
    }

    #[must_use]
    pub fn repetitions(mut self, value: Option<u32>) -> Self {
        self.repetitions = Some(value);
        self
    }
}

//
// ─── STORE ─────────────────────────────────────────────────────────────────────
//

/// Per-step values for one run, keyed by step id.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StepValueStore {
    values: BTreeMap<StepId, StepValues>,
}

impl StepValueStore {
    /// Default values for every step in the catalog.
    #[must_use]
    pub fn with_defaults(catalog: &[StepDefinition]) -> Self {
        let values = catalog
            .iter()
            .map(|step| (step.id(), StepValues::default_for(step.kind())))
            .collect();
        Self { values }
    }

    #[must_use]
    pub fn get(&self, id: StepId) -> Option<&StepValues> {
        self.values.get(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (StepId, &StepValues)> {
        self.values.iter().map(|(id, values)| (*id, values))
    }

    /// Merge a partial update into a step's inputs.
    ///
    /// Returns `false` (and changes nothing) when the step id is unknown.
    pub fn update(&mut self, id: StepId, patch: &StepValuesPatch) -> bool {
        match self.values.get_mut(&id) {
            Some(values) => {
                values.apply(patch);
                true
            }
            None => false,
        }
    }

    /// Add `delta` kilograms to an exercise step's weight.
    ///
    /// The result is clamped at 0 and rounded to one decimal place; a
    /// non-finite result becomes 0. Returns the new weight, or `None` for
    /// treadmill steps and unknown ids.
    pub fn adjust_weight(&mut self, id: StepId, delta: f64) -> Option<f64> {
        let StepInputs::Exercise(inputs) = &mut self.values.get_mut(&id)?.inputs else {
            return None;
        };

        let next = (inputs.weight_kg.unwrap_or(0.0) + delta).max(0.0);
        let rounded = if next.is_finite() {
            (next * 10.0).round() / 10.0
        } else {
            0.0
        };
        inputs.weight_kg = Some(rounded);
        Some(rounded)
    }

    /// Record the start of a step, discarding any earlier completion data.
    pub fn mark_started(&mut self, id: StepId, at: DateTime<Utc>) -> bool {
        let Some(values) = self.values.get_mut(&id) else {
            return false;
        };
        values.started_at = Some(at);
        values.completed_at = None;
        values.actual_duration_seconds = None;
        true
    }

    /// Record the measured duration and completion time of a step.
    pub fn mark_completed(&mut self, id: StepId, duration_seconds: u32, at: DateTime<Utc>) -> bool {
        let Some(values) = self.values.get_mut(&id) else {
            return false;
        };
        values.actual_duration_seconds = Some(duration_seconds);
        values.completed_at = Some(at);
        true
    }

    /// True when every step of the catalog has a completion timestamp.
    #[must_use]
    pub fn all_complete(&self, catalog: &[StepDefinition]) -> bool {
        catalog
            .iter()
            .all(|step| self.get(step.id()).is_some_and(StepValues::is_complete))
    }

    /// Overwrite inputs from the most recent record of the same workout.
    ///
    /// Only steps present in both the catalog and the record are touched, and
    /// only with non-null historical values. Treadmill minutes come from the
    /// recorded seconds, rounded; a zero duration is ignored.
    pub fn prefill_from(&mut self, catalog: &[StepDefinition], record: &SessionRecord) {
        for step in catalog {
            let Some(history) = record.steps.iter().find(|entry| entry.id == step.id()) else {
                continue;
            };
            let Some(values) = self.values.get_mut(&step.id()) else {
                continue;
            };

            match &mut values.inputs {
                StepInputs::Treadmill(inputs) => {
                    if let Some(speed) = history.speed_kmh {
                        inputs.speed_kmh = Some(speed);
                    }
                    if let Some(seconds) = history.duration_seconds.filter(|s| *s > 0) {
                        inputs.duration_minutes = Some((f64::from(seconds) / 60.0).round());
                    }
                }
                StepInputs::Exercise(inputs) => {
                    if let Some(weight) = history.weight_kg {
                        inputs.weight_kg = Some(weight);
                    }
                    if let Some(sets) = history.sets {
                        inputs.sets = Some(sets);
                    }
                    if let Some(repetitions) = history.repetitions {
                        inputs.repetitions = Some(repetitions);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::record::StepRecord;
    use crate::model::step::build_catalog;
    use crate::model::{RunId, SessionId, UserId};
    use crate::time::fixed_now;

    fn store() -> (Vec<StepDefinition>, StepValueStore) {
        let catalog = build_catalog(&["Squat", "Row"]);
        let store = StepValueStore::with_defaults(&catalog);
        (catalog, store)
    }

    #[test]
    fn defaults_follow_step_kind() {
        let (_, store) = store();
        let warmup = store.get(StepId::Warmup).unwrap().treadmill().unwrap();
        assert_eq!(warmup.speed_kmh, None);
        assert_eq!(warmup.duration_minutes, Some(10.0));

        let squat = store.get(StepId::Exercise(0)).unwrap().exercise().unwrap();
        assert_eq!(squat.weight_kg, None);
        assert_eq!(squat.sets, Some(4));
        assert_eq!(squat.repetitions, Some(12));
        assert!(store.iter().all(|(_, v)| v.actual_duration_seconds().is_none()));
    }

    #[test]
    fn update_merges_fields_of_matching_kind_only() {
        let (_, mut store) = store();
        let patch = StepValuesPatch::default()
            .speed_kmh(Some(7.5))
            .sets(Some(5));

        assert!(store.update(StepId::Warmup, &patch));
        let warmup = store.get(StepId::Warmup).unwrap().treadmill().unwrap();
        assert_eq!(warmup.speed_kmh, Some(7.5));
        assert_eq!(warmup.duration_minutes, Some(10.0));

        assert!(store.update(StepId::Exercise(1), &patch));
        let row = store.get(StepId::Exercise(1)).unwrap().exercise().unwrap();
        assert_eq!(row.sets, Some(5));
        assert_eq!(row.repetitions, Some(12));
    }

    #[test]
    fn update_can_clear_a_field() {
        let (_, mut store) = store();
        store.update(StepId::Cooldown, &StepValuesPatch::default().duration_minutes(None));
        let cooldown = store.get(StepId::Cooldown).unwrap().treadmill().unwrap();
        assert_eq!(cooldown.duration_minutes, None);
    }

    #[test]
    fn update_skips_non_finite_numbers() {
        let (_, mut store) = store();
        let treadmill = StepValuesPatch::default()
            .speed_kmh(Some(f64::NAN))
            .duration_minutes(Some(f64::INFINITY));
        store.update(StepId::Warmup, &treadmill);
        let warmup = store.get(StepId::Warmup).unwrap().treadmill().unwrap();
        assert_eq!(warmup.speed_kmh, None);
        assert_eq!(warmup.duration_minutes, Some(10.0));

        let squat = StepId::Exercise(0);
        store.update(squat, &StepValuesPatch::default().weight_kg(Some(40.0)));
        let patch = StepValuesPatch::default()
            .weight_kg(Some(f64::INFINITY))
            .sets(Some(3));
        store.update(squat, &patch);
        let squat = store.get(squat).unwrap().exercise().unwrap();
        assert_eq!(squat.weight_kg, Some(40.0));
        assert_eq!(squat.sets, Some(3));
    }

    #[test]
    fn update_ignores_unknown_step() {
        let (_, mut store) = store();
        let before = store.clone();
        assert!(!store.update(StepId::Exercise(9), &StepValuesPatch::default().sets(Some(1))));
        assert_eq!(store, before);
    }

    #[test]
    fn adjust_weight_clamps_and_rounds() {
        let (_, mut store) = store();
        let squat = StepId::Exercise(0);

        assert_eq!(store.adjust_weight(squat, 2.0), Some(2.0));
        assert_eq!(store.adjust_weight(squat, -1000.0), Some(0.0));
        assert_eq!(store.adjust_weight(squat, 2.25), Some(2.3));
        assert_eq!(store.adjust_weight(squat, f64::INFINITY), Some(0.0));
        assert_eq!(
            store.get(squat).unwrap().exercise().unwrap().weight_kg,
            Some(0.0)
        );
    }

    #[test]
    fn adjust_weight_ignores_treadmill_and_unknown_steps() {
        let (_, mut store) = store();
        let before = store.clone();
        assert_eq!(store.adjust_weight(StepId::Warmup, 5.0), None);
        assert_eq!(store.adjust_weight(StepId::Exercise(7), 5.0), None);
        assert_eq!(store, before);
    }

    #[test]
    fn lifecycle_marks_and_completion() {
        let (catalog, mut store) = store();
        assert!(!store.all_complete(&catalog));

        for step in &catalog {
            assert!(store.mark_started(step.id(), fixed_now()));
            assert!(store.mark_completed(step.id(), 30, fixed_now()));
        }
        assert!(store.all_complete(&catalog));

        store.mark_started(StepId::Warmup, fixed_now());
        let warmup = store.get(StepId::Warmup).unwrap();
        assert!(!warmup.is_complete());
        assert_eq!(warmup.actual_duration_seconds(), None);
    }

    #[test]
    fn prefill_copies_matching_history() {
        let (catalog, mut store) = store();
        let now = fixed_now();
        let record = SessionRecord {
            run_id: RunId::generate(),
            user_id: UserId::new("u1").unwrap(),
            session_id: SessionId::new("legs-a").unwrap(),
            muscle_group: "legs".into(),
            session_name: "A".into(),
            started_at: now,
            completed_at: now,
            total_duration_seconds: 0,
            max_weight_kg: None,
            longest_exercise_seconds: None,
            notes: None,
            steps: vec![
                StepRecord {
                    id: StepId::Warmup,
                    kind: StepKind::Treadmill,
                    label: "t".into(),
                    speed_kmh: Some(8.0),
                    duration_seconds: Some(450),
                    weight_kg: None,
                    sets: None,
                    repetitions: None,
                    started_at: None,
                    completed_at: None,
                },
                StepRecord {
                    id: StepId::Cooldown,
                    kind: StepKind::Treadmill,
                    label: "t".into(),
                    speed_kmh: None,
                    duration_seconds: Some(0),
                    weight_kg: None,
                    sets: None,
                    repetitions: None,
                    started_at: None,
                    completed_at: None,
                },
                StepRecord {
                    id: StepId::Exercise(0),
                    kind: StepKind::Exercise,
                    label: "Squat".into(),
                    speed_kmh: None,
                    duration_seconds: Some(60),
                    weight_kg: Some(50.0),
                    sets: Some(5),
                    repetitions: None,
                    started_at: None,
                    completed_at: None,
                },
                StepRecord {
                    id: StepId::Exercise(4),
                    kind: StepKind::Exercise,
                    label: "Gone".into(),
                    speed_kmh: None,
                    duration_seconds: None,
                    weight_kg: Some(99.0),
                    sets: None,
                    repetitions: None,
                    started_at: None,
                    completed_at: None,
                },
            ],
        };

        store.prefill_from(&catalog, &record);

        let warmup = store.get(StepId::Warmup).unwrap().treadmill().unwrap();
        assert_eq!(warmup.speed_kmh, Some(8.0));
        assert_eq!(warmup.duration_minutes, Some(8.0));

        let cooldown = store.get(StepId::Cooldown).unwrap().treadmill().unwrap();
        assert_eq!(cooldown.speed_kmh, None);
        assert_eq!(cooldown.duration_minutes, Some(10.0));

        let squat = store.get(StepId::Exercise(0)).unwrap().exercise().unwrap();
        assert_eq!(squat.weight_kg, Some(50.0));
        assert_eq!(squat.sets, Some(5));
        assert_eq!(squat.repetitions, Some(12));

        let row = store.get(StepId::Exercise(1)).unwrap().exercise().unwrap();
        assert_eq!(row.weight_kg, None);
        assert!(store.get(StepId::Exercise(4)).is_none());
    }
}
