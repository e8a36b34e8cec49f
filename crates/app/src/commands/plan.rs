use services::AppServices;
use trener_core::model::{SavedPlan, UserId};

use crate::cli::PlanAddArgs;
use crate::commands::run::load_plan;

fn describe(plan: &SavedPlan) -> String {
    let workout = plan.plan();
    let mut line = format!(
        "{}: {} / {} ({})",
        plan.name(),
        workout.muscle_group(),
        workout.session_name(),
        workout.exercises().join(", ")
    );
    if let Some(note) = plan.description() {
        line.push_str(&format!(" - {note}"));
    }
    line
}

/// Save the workout given on the command line under a name.
///
/// # Errors
///
/// Returns an error if no workout was given, it is invalid, or it cannot be
/// stored.
pub async fn add(
    services: &AppServices,
    user_id: UserId,
    args: PlanAddArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let workout = load_plan(&args.workout)?.ok_or("pass --plan <file>, or --group and --name")?;
    let saved = services
        .plans()
        .save_plan(user_id, &args.plan_name, args.description, workout)
        .await?;
    println!("saved {}", describe(&saved));
    Ok(())
}

/// Print the user's saved plans by name.
///
/// # Errors
///
/// Returns an error if storage cannot be queried.
pub async fn list(services: &AppServices, user_id: &UserId) -> Result<(), Box<dyn std::error::Error>> {
    let plans = services.plans().list_plans(user_id).await?;
    if plans.is_empty() {
        println!("no saved plans");
    }
    for plan in &plans {
        println!("{}", describe(plan));
    }
    Ok(())
}

/// # Errors
///
/// Returns an error if the plan does not exist or cannot be deleted.
pub async fn remove(
    services: &AppServices,
    user_id: &UserId,
    name: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    services.plans().remove_plan(user_id, name).await?;
    println!("removed {}", name.trim());
    Ok(())
}
