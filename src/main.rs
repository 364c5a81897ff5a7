//! ironlog - Personal workout tracker

use std::sync::Arc;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use ironlog::db::{Database, WorkoutSession};
use ironlog::exercises::{display_name, get_all_exercises};
use ironlog::routine::{build_sequence, RoutineExerciseSpec};
use ironlog::session::progress::sequence_from_sets;
use ironlog::session::{SessionLauncher, WorkoutEngine};
use ironlog::store::WorkoutStore;
use ironlog::summary::SessionSummary;
use ironlog::tui::{format_load, App};

#[derive(Parser)]
#[command(name = "ironlog")]
#[command(author, version, about = "Personal workout tracker")]
struct Cli {
    /// SQLite database path
    #[arg(long, global = true, env = "IRONLOG_DB", default_value = "ironlog.db")]
    db: String,

    /// User the routines and workouts belong to
    #[arg(long, global = true, env = "IRONLOG_USER", default_value = "local")]
    user: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage routines
    Routine {
        #[command(subcommand)]
        action: RoutineAction,
    },

    /// Start a workout (resumes today's active workout if there is one)
    Start {
        /// Routine to follow; omit for a custom workout
        #[arg(short, long)]
        routine: Option<i64>,
    },

    /// Resume an interrupted workout
    Resume {
        session_id: i64,
    },

    /// List past workouts
    History {
        /// Number of records to show
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },

    /// Show a workout summary
    Show {
        session_id: i64,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// List known exercise ids
    Exercises,
}

#[derive(Subcommand)]
enum RoutineAction {
    /// Create a routine
    Create {
        name: String,

        /// exercise_id:sets[:reps[:weight[:rest]]], in workout order
        #[arg(short, long = "exercise", required = true)]
        exercises: Vec<RoutineExerciseSpec>,
    },

    /// List routines
    List,

    /// Show a routine's exercises
    Show {
        routine_id: i64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let db = Arc::new(Database::open(&cli.db)?);

    match cli.command {
        Some(Commands::Routine { action }) => match action {
            RoutineAction::Create { name, exercises } => {
                let sequence = build_sequence(exercises);
                let routine = db.create_routine(&cli.user, &name, &sequence)?;
                println!(
                    "Created routine '{}' with {} exercises (id: {})",
                    routine.name,
                    sequence.len(),
                    routine.id
                );
            }

            RoutineAction::List => {
                let routines = db.list_routines(&cli.user)?;
                println!("Routines:");
                println!("{:-<50}", "");
                for r in routines {
                    let exercises = db.get_routine_exercises(r.id).await?;
                    println!("{:>4} | {:30} | {} exercises", r.id, r.name, exercises.len());
                }
            }

            RoutineAction::Show { routine_id } => {
                let Some(routine) = db
                    .get_routine(routine_id)
                    .await?
                    .filter(|r| r.user_id == cli.user)
                else {
                    bail!("routine {routine_id} not found");
                };
                println!("{}", routine.name);
                println!("{:-<60}", "");
                for ex in db.get_routine_exercises(routine_id).await? {
                    println!(
                        "{:2}. {:24} | {} sets | {} | rest {}",
                        ex.order_index + 1,
                        display_name(&ex.exercise_id),
                        ex.target_sets,
                        format_load(ex.target_weight, ex.target_reps),
                        ex.rest_seconds
                            .map(|s| format!("{s}s"))
                            .unwrap_or_else(|| "-".to_string())
                    );
                }
            }
        },

        Some(Commands::Start { routine }) => {
            let launcher = SessionLauncher::new(db.clone(), cli.user.clone());
            let engine = match routine {
                Some(routine_id) => launcher.start_routine(routine_id).await?,
                None => launcher.start_custom().await?,
            };
            run_workout(&db, engine).await?;
        }

        Some(Commands::Resume { session_id }) => {
            let launcher = SessionLauncher::new(db.clone(), cli.user.clone());
            let engine = launcher.resume(session_id).await?;
            run_workout(&db, engine).await?;
        }

        Some(Commands::Show { session_id, json }) => {
            let Some(session) = db
                .get_session(session_id)
                .await?
                .filter(|s| s.user_id == cli.user)
            else {
                bail!("session {session_id} not found");
            };
            let summary = load_summary(&db, session).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                print_summary(&summary);
            }
        }

        Some(Commands::Exercises) => {
            for ex in get_all_exercises() {
                let muscles: Vec<&str> = ex.muscle_groups.iter().map(|m| m.name()).collect();
                println!(
                    "{} {:24} {:26} {}",
                    ex.category.emoji(),
                    ex.id,
                    ex.name,
                    muscles.join(", ")
                );
            }
        }

        Some(Commands::History { limit }) => print_history(&db, &cli.user, limit)?,

        None => print_history(&db, &cli.user, 10)?,
    }

    Ok(())
}

async fn run_workout(db: &Database, engine: WorkoutEngine<Database>) -> Result<()> {
    let session_id = engine.session().id;
    match App::new(engine).run().await? {
        Some(session) => {
            let summary = load_summary(db, session).await?;
            print_summary(&summary);
        }
        None => println!("Workout {session_id} paused. Resume with: ironlog resume {session_id}"),
    }
    Ok(())
}

async fn load_summary(db: &Database, session: WorkoutSession) -> Result<SessionSummary> {
    let sets = db.get_sets_for_session(session.id).await?;
    let exercises = match session.routine_id {
        Some(routine_id) => db.get_routine_exercises(routine_id).await?,
        None => sequence_from_sets(&sets),
    };
    Ok(SessionSummary::build(session, &exercises, &sets))
}

fn print_summary(summary: &SessionSummary) {
    let session = &summary.session;
    println!(
        "{} | {} | {} | {}",
        session.name,
        session.date.format("%Y-%m-%d"),
        session.status,
        session
            .duration_minutes
            .map(|m| format!("{m} min"))
            .unwrap_or_else(|| "in progress".to_string())
    );
    println!("{:-<60}", "");
    for ex in &summary.exercises {
        println!(
            "{:24} | {:>2}/{:<2} | {:>4} reps | {:>8.1} kg",
            ex.name, ex.sets_logged, ex.target_sets, ex.total_reps, ex.volume
        );
    }
    println!("{:-<60}", "");
    println!(
        "Total: {} sets, {:.1} kg volume",
        summary.total_sets, summary.total_volume
    );

    let unfinished: Vec<String> = summary
        .unfinished()
        .map(|e| format!("{} ({}/{})", e.name, e.sets_logged, e.target_sets))
        .collect();
    if !unfinished.is_empty() {
        println!("Unfinished: {}", unfinished.join(", "));
    }
}

fn print_history(db: &Database, user_id: &str, limit: usize) -> Result<()> {
    let sessions = db.list_sessions(user_id, limit)?;
    println!("Recent workouts:");
    println!("{:-<60}", "");
    for s in sessions {
        println!(
            "{:>4} | {} | {:24} | {:9} | {}",
            s.id,
            s.date.format("%Y-%m-%d"),
            s.name,
            s.status.as_str(),
            s.duration_minutes
                .map(|m| format!("{m} min"))
                .unwrap_or_else(|| "-".to_string())
        );
    }
    Ok(())
}
