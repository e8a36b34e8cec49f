//! Human-readable rendering of durations and weights.

const PLACEHOLDER: &str = "—";

/// `1 год 2 хв 5 с` style duration; zero renders as a dash.
#[must_use]
pub fn duration(seconds: u64) -> String {
    if seconds == 0 {
        return PLACEHOLDER.to_owned();
    }
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let rest = seconds % 60;

    let mut parts = Vec::new();
    if hours > 0 {
        parts.push(format!("{hours} год"));
    }
    if minutes > 0 {
        parts.push(format!("{minutes} хв"));
    }
    if rest > 0 {
        parts.push(format!("{rest} с"));
    }
    parts.join(" ")
}

/// Timer face, `mm:ss`.
#[must_use]
pub fn clock(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

#[must_use]
pub fn weight(kg: Option<f64>) -> String {
    match kg {
        Some(kg) if kg > 0.0 => format!("{kg} кг"),
        _ => PLACEHOLDER.to_owned(),
    }
}
