use std::io::Write;
use std::path::Path;
use std::time::Duration;

use services::{AppServices, RunTick, TrainingError, TrainingRun};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::MissedTickBehavior;
use trener_core::TimerMode;
use trener_core::model::{StepInputs, StepValuesPatch, UserId, WorkoutPlan};

use crate::cli::{RunArgs, WorkoutArgs};
use crate::format;

const HELP: &str = "\
commands:
  start | s               start the current step
  finish | f              finish the running step
  speed <km/h>            treadmill speed      (use `-` to clear)
  minutes <min>           treadmill duration
  weight <kg>             exercise weight
  sets <n> | reps <n>     exercise sets / repetitions
  +<kg> | -<kg>           adjust exercise weight
  status                  show progress
  retry                   save a finished run again after a failed save
  quit | q                leave (unsaved progress is discarded)";

/// One line typed during a run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Input {
    Start,
    Finish,
    Patch(StepValuesPatch),
    AdjustWeight(f64),
    Status,
    Retry,
    Help,
    Quit,
    Empty,
}

/// Numbers typed at the prompt; floats must be finite.
trait Finite: std::str::FromStr {
    fn is_finite_value(&self) -> bool;
}

impl Finite for f64 {
    fn is_finite_value(&self) -> bool {
        self.is_finite()
    }
}

impl Finite for u32 {
    fn is_finite_value(&self) -> bool {
        true
    }
}

fn parse_finite<T: Finite>(field: &str, value: &str) -> Result<T, String> {
    value
        .replace(',', ".")
        .parse::<T>()
        .ok()
        .filter(T::is_finite_value)
        .ok_or_else(|| format!("invalid {field}: {value}"))
}

fn parse_number<T: Finite>(field: &str, raw: Option<&str>) -> Result<Option<T>, String> {
    match raw {
        None => Err(format!("{field} needs a value")),
        Some("-") => Ok(None),
        Some(value) => parse_finite(field, value).map(Some),
    }
}

/// Parse a command line typed during a run.
///
/// # Errors
///
/// Returns a message for unknown commands or malformed values.
pub fn parse_input(line: &str) -> Result<Input, String> {
    let mut words = line.split_whitespace();
    let Some(head) = words.next() else {
        return Ok(Input::Empty);
    };
    let arg = words.next();
    let patch = StepValuesPatch::default();

    let input = match head {
        "start" | "s" => Input::Start,
        "finish" | "f" => Input::Finish,
        "status" => Input::Status,
        "retry" => Input::Retry,
        "help" | "?" => Input::Help,
        "quit" | "q" | "exit" => Input::Quit,
        "speed" => Input::Patch(patch.speed_kmh(parse_number("speed", arg)?)),
        "minutes" | "min" => Input::Patch(patch.duration_minutes(parse_number("minutes", arg)?)),
        "weight" | "w" => Input::Patch(patch.weight_kg(parse_number("weight", arg)?)),
        "sets" => Input::Patch(patch.sets(parse_number("sets", arg)?)),
        "reps" => Input::Patch(patch.repetitions(parse_number("reps", arg)?)),
        delta if delta.starts_with('+') || delta.starts_with('-') => {
            let value = parse_finite::<f64>("weight change", delta.trim_start_matches('+'))?;
            Input::AdjustWeight(value)
        }
        other => return Err(format!("unknown command `{other}`; type `help`")),
    };
    Ok(input)
}

/// Build the workout from a plan file or the inline flags; `None` when
/// neither was given.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or if the inline
/// workout is invalid.
pub fn load_plan(args: &WorkoutArgs) -> Result<Option<WorkoutPlan>, Box<dyn std::error::Error>> {
    if let Some(path) = &args.plan {
        return read_plan_file(path).map(Some);
    }
    match (&args.group, &args.name) {
        (Some(group), Some(name)) => Ok(Some(WorkoutPlan::new(
            group.as_str(),
            name.as_str(),
            args.exercise.clone(),
        )?)),
        _ => Ok(None),
    }
}

/// The workout to run: a saved plan by name, or one given on the command line.
///
/// # Errors
///
/// Returns an error if the saved plan cannot be loaded, the workout flags are
/// invalid, or no workout was given at all.
pub async fn resolve_plan(
    services: &AppServices,
    user_id: &UserId,
    args: &RunArgs,
) -> Result<WorkoutPlan, Box<dyn std::error::Error>> {
    if let Some(name) = &args.saved {
        let saved = services
            .plans()
            .get_plan(user_id, name)
            .await
            .map_err(|e| format!("cannot load plan `{name}`: {e}"))?;
        return Ok(saved.into_plan());
    }
    load_plan(&args.workout)?
        .ok_or_else(|| "pass --saved <name>, --plan <file>, or --group and --name".into())
}

fn read_plan_file(path: &Path) -> Result<WorkoutPlan, Box<dyn std::error::Error>> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read plan {}: {e}", path.display()))?;
    let plan = toml::from_str(&text).map_err(|e| format!("invalid plan {}: {e}", path.display()))?;
    Ok(plan)
}

fn describe_current(run: &TrainingRun) {
    let Some(step) = run.current_step() else {
        return;
    };
    let subtitle = step.subtitle().map(|s| format!(" ({s})")).unwrap_or_default();
    println!(
        "\n[{}/{}] {}{}",
        run.current_index() + 1,
        run.catalog().len(),
        step.label(),
        subtitle
    );
    match run.step_values(step.id()).map(|values| *values.inputs()) {
        Some(StepInputs::Treadmill(inputs)) => println!(
            "  speed: {}  duration: {}",
            inputs
                .speed_kmh
                .map_or_else(|| "—".to_owned(), |v| format!("{v} км/год")),
            inputs
                .duration_minutes
                .map_or_else(|| "—".to_owned(), |v| format!("{v} хв")),
        ),
        Some(StepInputs::Exercise(inputs)) => println!(
            "  weight: {}  sets: {}  reps: {}",
            format::weight(inputs.weight_kg),
            inputs.sets.map_or_else(|| "—".to_owned(), |v| v.to_string()),
            inputs
                .repetitions
                .map_or_else(|| "—".to_owned(), |v| v.to_string()),
        ),
        None => {}
    }
}

fn describe_status(run: &TrainingRun) {
    let progress = run.progress();
    println!(
        "{} of {} steps done, {} left",
        progress.completed_steps,
        progress.total_steps,
        progress.remaining_steps()
    );
    if let Some(step) = progress.active_step {
        println!("running {step}: {}", format::clock(progress.timer_seconds));
    }
    if progress.is_finished && !progress.is_saved {
        println!("finished but not saved; type `retry`");
    }
}

fn report_error(err: &TrainingError) {
    match err {
        TrainingError::Storage(_) => {
            println!("\nsaving failed: {err}. Type `retry` to try again.");
        }
        _ => println!("! {err}"),
    }
}

fn print_saved(run: &TrainingRun) {
    let Some(id) = run.record_id() else {
        return;
    };
    match run.build_record() {
        Ok(record) => println!(
            "\nsession saved as #{id}: total {}, max weight {}, longest exercise {}",
            format::duration(u64::from(record.total_duration_seconds)),
            format::weight(record.max_weight_kg),
            format::duration(u64::from(record.longest_exercise_seconds.unwrap_or(0))),
        ),
        Err(_) => println!("\nsession saved as #{id}"),
    }
}

/// Drive one run interactively from stdin, ticking once per second.
///
/// # Errors
///
/// Returns an error if stdin cannot be read.
pub async fn run(
    services: &AppServices,
    user_id: UserId,
    plan: WorkoutPlan,
) -> Result<(), Box<dyn std::error::Error>> {
    let training = services.training();
    let mut run = training.start_run(user_id, plan).await;

    println!(
        "{} / {}: {} steps. Type `help` for commands.",
        run.plan().muscle_group(),
        run.plan().session_name(),
        run.catalog().len()
    );
    if let Some(advisory) = run.history().advisory() {
        println!("warning: {advisory}");
    }
    describe_current(&run);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut ticker = tokio::time::interval(Duration::from_secs(1));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick(), if run.active_step().is_some() => {
                match training.tick(&mut run).await {
                    Ok(tick) => match tick.tick {
                        RunTick::Running { seconds, .. } => {
                            print!("\r  {}   ", format::clock(seconds));
                            std::io::stdout().flush()?;
                        }
                        RunTick::Finished(finish) => {
                            println!("\rdone in {}", format::duration(u64::from(finish.duration_seconds)));
                            if !finish.run_complete {
                                describe_current(&run);
                            }
                        }
                        RunTick::Idle => {}
                    },
                    Err(err) => report_error(&err),
                }
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                match parse_input(&line) {
                    Ok(Input::Quit) => break,
                    Ok(input) => handle_input(services, &mut run, input, &mut ticker).await,
                    Err(message) => println!("! {message}"),
                }
            }
        }

        if run.is_complete() {
            print_saved(&run);
            break;
        }
    }

    if !run.is_complete() {
        tracing::info!(run_id = %run.run_id(), "run left without saving");
        println!("leaving without saving this run");
    }
    Ok(())
}

async fn handle_input(
    services: &AppServices,
    run: &mut TrainingRun,
    input: Input,
    ticker: &mut tokio::time::Interval,
) {
    let training = services.training();
    let Some(step_id) = run.current_step().map(|step| step.id()) else {
        return;
    };

    match input {
        Input::Start => match training.start_current(run) {
            Ok(started) => {
                ticker.reset();
                match started.mode {
                    TimerMode::CountDown { .. } => {
                        println!("countdown {}", format::clock(started.seconds));
                    }
                    TimerMode::CountUp => println!("stopwatch running"),
                }
            }
            Err(err) => report_error(&err),
        },
        Input::Finish => match training.finish_active(run).await {
            Ok(outcome) => {
                println!(
                    "\rdone in {}",
                    format::duration(u64::from(outcome.finish.duration_seconds))
                );
                if !outcome.finish.run_complete {
                    describe_current(run);
                }
            }
            Err(err) => report_error(&err),
        },
        Input::Patch(patch) => {
            if run.update(step_id, &patch) {
                describe_current(run);
            } else {
                println!("! nothing to change");
            }
        }
        Input::AdjustWeight(delta) => match run.adjust_weight(step_id, delta) {
            Some(kg) => println!("weight: {}", format::weight(Some(kg))),
            None => println!("! weight applies to exercise steps only"),
        },
        Input::Status => describe_status(run),
        Input::Retry => {
            if let Err(err) = training.finalize_record(run).await {
                report_error(&err);
            }
        }
        Input::Help => println!("{HELP}"),
        Input::Quit | Input::Empty => {}
    }
}
