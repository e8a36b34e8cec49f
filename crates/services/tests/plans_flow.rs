use services::{AppServices, Clock, PlanError, PrefillOutcome};
use storage::repository::StorageError;
use trener_core::model::{SavedPlanError, StepId, UserId, WorkoutPlan};
use trener_core::time::fixed_now;

fn user() -> UserId {
    UserId::new("athlete-1").unwrap()
}

fn legs(exercises: &[&str]) -> WorkoutPlan {
    WorkoutPlan::new(
        "Legs",
        "Day A",
        exercises.iter().map(|name| (*name).to_owned()).collect(),
    )
    .unwrap()
}

#[tokio::test]
async fn saved_plan_drives_a_run() {
    let services = AppServices::in_memory(Clock::fixed(fixed_now()));
    let plans = services.plans();

    let saved = plans
        .save_plan(user(), " legs-a ", Some("  ".into()), legs(&["Squat", "Row"]))
        .await
        .unwrap();
    assert_eq!(saved.name(), "legs-a");
    assert_eq!(saved.description(), None);
    assert_eq!(saved.created_at(), fixed_now());

    let loaded = plans.get_plan(&user(), "legs-a").await.unwrap();
    assert_eq!(loaded, saved);

    let run = services
        .training()
        .start_run(user(), loaded.into_plan())
        .await;
    assert_eq!(run.catalog().len(), 4);
    assert_eq!(run.plan().session_id().as_str(), "legs-day-a");
    assert_eq!(run.history(), &PrefillOutcome::NoHistory);
    assert!(run.step_values(StepId::Exercise(1)).is_some());
}

#[tokio::test]
async fn saving_again_replaces_the_exercises() {
    let services = AppServices::in_memory(Clock::fixed(fixed_now()));
    let plans = services.plans();

    plans
        .save_plan(user(), "legs", None, legs(&["Squat"]))
        .await
        .unwrap();
    plans
        .save_plan(user(), "legs", Some("deload".into()), legs(&["Lunge", "Calf raise"]))
        .await
        .unwrap();

    let listed = plans.list_plans(&user()).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].plan().exercises(), ["Lunge", "Calf raise"]);
    assert_eq!(listed[0].description(), Some("deload"));
}

#[tokio::test]
async fn invalid_plans_are_not_stored() {
    let services = AppServices::in_memory(Clock::fixed(fixed_now()));
    let plans = services.plans();

    let err = plans
        .save_plan(user(), "  ", None, legs(&["Squat"]))
        .await
        .unwrap_err();
    assert!(matches!(err, PlanError::Invalid(SavedPlanError::EmptyName)));

    let err = plans
        .save_plan(user(), "empty", None, legs(&[]))
        .await
        .unwrap_err();
    assert!(matches!(err, PlanError::Invalid(SavedPlanError::NoExercises)));

    assert!(plans.list_plans(&user()).await.unwrap().is_empty());
}

#[tokio::test]
async fn removed_plan_is_gone() {
    let services = AppServices::in_memory(Clock::fixed(fixed_now()));
    let plans = services.plans();
    plans
        .save_plan(user(), "legs", None, legs(&["Squat"]))
        .await
        .unwrap();

    plans.remove_plan(&user(), "legs").await.unwrap();
    let err = plans.get_plan(&user(), "legs").await.unwrap_err();
    assert!(matches!(err, PlanError::Storage(StorageError::NotFound)));
    let err = plans.remove_plan(&user(), "legs").await.unwrap_err();
    assert!(matches!(err, PlanError::Storage(StorageError::NotFound)));

    let other = UserId::new("athlete-2").unwrap();
    assert!(plans.list_plans(&other).await.unwrap().is_empty());
}
