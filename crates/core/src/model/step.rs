use serde::{Deserialize, Serialize};

use crate::model::ids::{ParseIdError, StepId};

/// Display label shared by the warm-up and cool-down steps.
pub const TREADMILL_LABEL: &str = "Бігова доріжка";
pub const WARMUP_SUBTITLE: &str = "Розминка";
pub const COOLDOWN_SUBTITLE: &str = "Заминка";

/// Kind of work a step represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepKind {
    /// Timed treadmill interval, counted down from a target duration.
    Treadmill,
    /// Strength exercise with sets/reps/weight, timed with a stopwatch.
    Exercise,
}

impl StepKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            StepKind::Treadmill => "treadmill",
            StepKind::Exercise => "exercise",
        }
    }
}

impl std::str::FromStr for StepKind {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "treadmill" => Ok(StepKind::Treadmill),
            "exercise" => Ok(StepKind::Exercise),
            _ => Err(ParseIdError::new("StepKind")),
        }
    }
}

/// Immutable description of one step in a guided session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepDefinition {
    id: StepId,
    kind: StepKind,
    label: String,
    subtitle: Option<&'static str>,
}

impl StepDefinition {
    fn warmup() -> Self {
        Self {
            id: StepId::Warmup,
            kind: StepKind::Treadmill,
            label: TREADMILL_LABEL.to_owned(),
            subtitle: Some(WARMUP_SUBTITLE),
        }
    }

    fn cooldown() -> Self {
        Self {
            id: StepId::Cooldown,
            kind: StepKind::Treadmill,
            label: TREADMILL_LABEL.to_owned(),
            subtitle: Some(COOLDOWN_SUBTITLE),
        }
    }

    fn exercise(index: usize, name: &str) -> Self {
        Self {
            id: StepId::Exercise(index),
            kind: StepKind::Exercise,
            label: name.to_owned(),
            subtitle: None,
        }
    }

    #[must_use]
    pub fn id(&self) -> StepId {
        self.id
    }

    #[must_use]
    pub fn kind(&self) -> StepKind {
        self.kind
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[must_use]
    pub fn subtitle(&self) -> Option<&'static str> {
        self.subtitle
    }
}

/// Builds the fixed step sequence for a workout:
/// `[warmup, exercise-0, …, exercise-{n-1}, cooldown]`.
#[must_use]
pub fn build_catalog<S: AsRef<str>>(exercises: &[S]) -> Vec<StepDefinition> {
    let mut steps = Vec::with_capacity(exercises.len() + 2);
    steps.push(StepDefinition::warmup());
    steps.extend(
        exercises
            .iter()
            .enumerate()
            .map(|(index, name)| StepDefinition::exercise(index, name.as_ref())),
    );
    steps.push(StepDefinition::cooldown());
    steps
}
