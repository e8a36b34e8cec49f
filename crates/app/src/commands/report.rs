use services::{AppServices, RecordListItem};
use trener_core::model::{RecordId, UserId};

use crate::format;

fn print_item(item: &RecordListItem) {
    println!(
        "#{} {}  {} / {}  {}  max {}  longest {}",
        item.id,
        item.completed_at.format("%Y-%m-%d %H:%M"),
        item.muscle_group,
        item.session_name,
        format::duration(u64::from(item.total_duration_seconds)),
        format::weight(item.max_weight_kg),
        format::duration(u64::from(item.longest_exercise_seconds.unwrap_or(0))),
    );
}

/// Print the user's saved sessions, newest first.
///
/// # Errors
///
/// Returns an error if storage cannot be queried.
pub async fn history(
    services: &AppServices,
    user_id: &UserId,
    limit: Option<u32>,
) -> Result<(), Box<dyn std::error::Error>> {
    let items = services.statistics().history(user_id, limit).await?;
    if items.is_empty() {
        println!("no sessions yet");
        return Ok(());
    }
    for item in &items {
        print_item(item);
    }
    Ok(())
}

/// Print lifetime totals and the most recent sessions.
///
/// # Errors
///
/// Returns an error if storage cannot be queried.
pub async fn stats(
    services: &AppServices,
    user_id: &UserId,
) -> Result<(), Box<dyn std::error::Error>> {
    let overview = services.statistics().overview(user_id).await?;
    let totals = overview.totals;
    println!("sessions:          {}", totals.sessions);
    println!("total time:        {}", format::duration(totals.total_duration_seconds));
    println!("max weight:        {}", format::weight(Some(totals.max_weight_kg)));
    println!(
        "longest exercise:  {}",
        format::duration(u64::from(totals.longest_exercise_seconds))
    );
    if !overview.recent.is_empty() {
        println!("\nrecent:");
        for item in &overview.recent {
            print_item(item);
        }
    }
    Ok(())
}

/// Print one stored session as pretty JSON.
///
/// # Errors
///
/// Returns an error if the record is missing or cannot be serialized.
pub async fn show(services: &AppServices, id: RecordId) -> Result<(), Box<dyn std::error::Error>> {
    let row = services.statistics().record(id).await?;
    println!("{}", serde_json::to_string_pretty(&row.record)?);
    Ok(())
}
