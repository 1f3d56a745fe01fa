//! Seven CLI - inspect and drive challenge progress in a data directory.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use seven_core::{TaskCatalog, Time, CHALLENGE_DAYS};
use seven_progress::{CatalogService, ProgressEngine};
use seven_storage::JsonStorage;
use tracing::{debug, Level};

#[derive(Parser)]
#[command(name = "seven")]
#[command(about = "Seven-day challenge progress tool", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Directory holding users.json and tasks.json
    #[arg(short, long, default_value = ".seven")]
    data_dir: std::path::PathBuf,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Show a user's progress
    Status {
        /// User ID
        user: String,
    },
    /// Complete a user's current day
    Complete {
        /// User ID
        user: String,
        /// Day being completed
        day: u32,
        /// Note to store with the day
        #[arg(long)]
        note: Option<String>,
    },
    /// Start a user's attempt over
    Reset {
        /// User ID
        user: String,
    },
    /// List the tasks for a day
    Tasks {
        /// Day number
        day: u32,
    },
    /// Replace the catalog with a JSON file
    ImportTasks {
        /// Path to a {"day1": [...], ...} file
        file: std::path::PathBuf,
    },
    /// Print the catalog as JSON
    ExportTasks,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::WARN })
        .with_writer(std::io::stderr)
        .init();

    let storage = Arc::new(JsonStorage::new(&cli.data_dir).await?);
    debug!("Opened {}", storage.root().display());
    let engine = ProgressEngine::new(storage.clone());
    let catalog = CatalogService::new(storage);

    match cli.command {
        Commands::Status { user } => {
            let view = engine.get_or_init(&user).await?;
            let record = &view.record;

            println!("User: {}", user);
            if view.challenge_complete {
                println!("  Challenge complete");
            } else {
                println!("  Day: {} of {}", record.current_day, CHALLENGE_DAYS);
            }
            println!("  Started: {}", format_time(record.start_time));
            println!("  Deadline: {}", format_time(view.deadline));
            println!(
                "  Completed: {:?}",
                record.completed_days.iter().collect::<Vec<_>>()
            );
            match view.next_unlock_time {
                Some(at) => println!("  Locked until: {}", format_time(at)),
                None => println!("  Locked: no"),
            }
            for (day, note) in &record.day_notes {
                println!("  Note day {}: {}", day, note);
            }
        }
        Commands::Complete { user, day, note } => {
            let outcome = engine.complete_day(&user, day, note.as_deref()).await?;
            if outcome.challenge_complete {
                println!("Day {} completed - challenge complete", day);
            } else {
                println!("Day {} completed, now on day {}", day, outcome.current_day);
                if let Some(at) = outcome.next_unlock_time {
                    println!("Next day unlocks at {}", format_time(at));
                }
            }
        }
        Commands::Reset { user } => {
            engine.reset_progress(&user).await?;
            println!("Progress reset for {}", user);
        }
        Commands::Tasks { day } => {
            let tasks = catalog.get_tasks(day).await?;
            println!("Day {} ({} tasks)", day, tasks.len());
            for (i, task) in tasks.iter().enumerate() {
                println!("  {}. {}", i + 1, task);
            }
        }
        Commands::ImportTasks { file } => {
            let raw = std::fs::read_to_string(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            let tasks: TaskCatalog = serde_json::from_str(&raw)
                .with_context(|| format!("invalid catalog in {}", file.display()))?;
            catalog.put_tasks(&tasks).await?;
            println!("Imported {} days", tasks.len());
        }
        Commands::ExportTasks => {
            let tasks = catalog.all_tasks().await?;
            println!("{}", serde_json::to_string_pretty(&tasks)?);
        }
    }

    Ok(())
}

fn format_time(at: Time) -> String {
    at.with_timezone(&chrono::Local)
        .format("%b %d %H:%M")
        .to_string()
}
