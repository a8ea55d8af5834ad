//! `sched` CLI — time-blocked tasks and week grids from the command line.
//!
//! ## Usage
//!
//! ```sh
//! # Add an auto-scheduled task (one block at its start time)
//! sched add --title "Essay draft" --start 2024-01-15T11:00 --duration 90 --auto --tag school
//!
//! # List tasks with their blocks (JSON)
//! sched list
//!
//! # Print the week containing a date
//! sched week --anchor 2024-01-15
//!
//! # Drag a task's block from Monday to Wednesday
//! sched drag <TASK_ID> --from 2024-01-15 --to 2024-01-17
//!
//! # Edit wholesale / delete
//! sched edit <TASK_ID> --title "Essay final" --start 2024-01-16T09:00 --duration 60 --auto
//! sched rm <TASK_ID>
//!
//! # Pure calculators, no task file involved
//! sched derive --start 2024-01-15T11:00 --duration 90
//! sched grid --start 2024-01-15T11:00 --end 2024-01-15T12:30
//! ```
//!
//! Settings come from `sched.toml` (see [`config`]); `--store` and `--user`
//! override the file. Logging is opt-in via `RUST_LOG` and goes to stderr.

mod config;

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate, NaiveDateTime};
use clap::{Args, Parser, Subcommand};
use schedule_engine::block::BlockSpan;
use schedule_engine::week::WeekGrid;
use schedule_engine::{
    derive_block, grid_position, parse_local_datetime, BlockId, CellKey, DragDrop, JsonFileStore,
    Planner, Principal, TaskDraft, TaskId,
};
use serde::Serialize;
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::Config;

#[derive(Parser)]
#[command(
    name = "sched",
    version,
    about = "Time-blocked tasks on a weekly calendar grid"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (defaults to ./sched.toml when present)
    #[arg(long, global = true, env = "SCHED_CONFIG")]
    config: Option<PathBuf>,

    /// Task file, overriding [store].path
    #[arg(long, global = true, env = "SCHED_STORE")]
    store: Option<PathBuf>,

    /// Principal to act as, overriding [user].principal
    #[arg(long, global = true, env = "SCHED_PRINCIPAL")]
    user: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a task
    Add(TaskArgs),
    /// List tasks and their scheduled blocks as JSON
    List,
    /// Replace a task's fields; its blocks are re-derived
    Edit {
        /// Task identifier
        id: TaskId,
        #[command(flatten)]
        task: TaskArgs,
    },
    /// Delete a task and its blocks
    Rm {
        /// Task identifier
        id: TaskId,
    },
    /// Show the week containing a date
    Week {
        /// Any date in the week (defaults to today)
        #[arg(long)]
        anchor: Option<NaiveDate>,
        /// Print the layout as JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Move a task's block from one calendar cell to another
    Drag {
        /// Task identifier
        id: TaskId,
        /// Source cell: YYYY-MM-DD or YYYY-MM-DDTHH:MM
        #[arg(long)]
        from: CellKey,
        /// Destination cell: YYYY-MM-DD or YYYY-MM-DDTHH:MM
        #[arg(long)]
        to: CellKey,
        /// Block to move when the task has several on the source day
        #[arg(long)]
        block: Option<BlockId>,
    },
    /// Print the block a task would occupy
    Derive {
        #[arg(long, value_parser = parse_local_datetime)]
        start: NaiveDateTime,
        /// Duration in minutes
        #[arg(long)]
        duration: u32,
    },
    /// Print a block's offset and height in the day column
    Grid {
        #[arg(long, value_parser = parse_local_datetime)]
        start: NaiveDateTime,
        #[arg(long, value_parser = parse_local_datetime)]
        end: NaiveDateTime,
    },
}

#[derive(Args)]
struct TaskArgs {
    #[arg(long)]
    title: String,
    #[arg(long, value_parser = parse_local_datetime)]
    start: NaiveDateTime,
    /// Duration in minutes
    #[arg(long, allow_negative_numbers = true)]
    duration: i64,
    #[arg(long, value_parser = parse_local_datetime)]
    deadline: Option<NaiveDateTime>,
    /// Longest single sitting in minutes
    #[arg(long, allow_negative_numbers = true)]
    max_sitting: Option<i64>,
    #[arg(long)]
    description: Option<String>,
    /// Tag name (repeatable)
    #[arg(long = "tag")]
    tags: Vec<String>,
    /// Place a block at the task's start time
    #[arg(long)]
    auto: bool,
}

impl From<TaskArgs> for TaskDraft {
    fn from(args: TaskArgs) -> Self {
        TaskDraft {
            title: args.title,
            start: args.start,
            deadline: args.deadline,
            duration_minutes: args.duration,
            max_minutes_per_sitting: args.max_sitting,
            description: args.description,
            tags: args.tags,
            auto_scheduled: args.auto,
        }
    }
}

#[derive(Serialize)]
struct Geometry {
    start: NaiveDateTime,
    end: NaiveDateTime,
    top: f64,
    height: f64,
    visible: bool,
}

fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let mut config = Config::resolve(cli.config.as_deref())?;
    if let Some(store) = cli.store {
        config.store.path = store;
    }
    if let Some(user) = cli.user {
        config.user.principal = user;
    }
    debug!(store = %config.store.path.display(), user = %config.user.principal, "resolved config");

    run(cli.command, &config)
}

fn run(command: Commands, config: &Config) -> Result<()> {
    let me = Principal::new(config.user.principal.clone());

    match command {
        Commands::Derive { start, duration } => {
            let block = derive_block(start, duration);
            print_json(&geometry(&block, config))?;
        }
        Commands::Grid { start, end } => {
            let block = BlockSpan::new(start, end);
            print_json(&geometry(&block, config))?;
        }
        Commands::Add(args) => {
            let created = open_planner(config)?
                .create_task(&me, args.into())
                .context("Failed to create task")?;
            print_json(&created)?;
        }
        Commands::List => {
            let tasks = open_planner(config)?
                .list_tasks(&me)
                .context("Failed to list tasks")?;
            print_json(&tasks)?;
        }
        Commands::Edit { id, task } => {
            let updated = open_planner(config)?
                .update_task(&me, id, task.into())
                .with_context(|| format!("Failed to update task {}", id))?;
            print_json(&updated)?;
        }
        Commands::Rm { id } => {
            open_planner(config)?
                .delete_task(&me, id)
                .with_context(|| format!("Failed to delete task {}", id))?;
            println!("Deleted task {}", id);
        }
        Commands::Week { anchor, json } => {
            let anchor = anchor.unwrap_or_else(|| Local::now().date_naive());
            let week = open_planner(config)?
                .week(&me, anchor)
                .context("Failed to lay out week")?;
            if json {
                print_json(&week)?;
            } else {
                print!("{}", render_week(&week));
            }
        }
        Commands::Drag {
            id,
            from,
            to,
            block,
        } => {
            let drop = DragDrop {
                task_id: id,
                block_id: block,
                source: from,
                destination: to,
            };
            match open_planner(config)?
                .reschedule(&me, &drop)
                .with_context(|| format!("Failed to reschedule task {}", id))?
            {
                Some(updated) => print_json(&updated)?,
                None => eprintln!("No block on {} for task {}; nothing to update", from, id),
            }
        }
    }

    Ok(())
}

/// Planner over the task file; only commands that read or write tasks open it.
fn open_planner(config: &Config) -> Result<Planner<JsonFileStore>> {
    let store = JsonFileStore::open(&config.store.path).with_context(|| {
        format!("Failed to open task file: {}", config.store.path.display())
    })?;
    Ok(Planner::new(store)
        .with_grid(config.grid)
        .with_overlap_policy(config.schedule.overlap)
        .with_week_start(config.schedule.week_start))
}

// Tracing is opt-in via RUST_LOG; stdout stays reserved for command output.
fn init_tracing() {
    let filter = std::env::var("RUST_LOG")
        .ok()
        .and_then(|raw| {
            let raw = raw.trim();
            if raw.is_empty() {
                return None;
            }
            EnvFilter::try_new(raw).ok()
        })
        .unwrap_or_else(|| EnvFilter::new("off"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn geometry(block: &BlockSpan, config: &Config) -> Geometry {
    let pos = grid_position(block, &config.grid);
    Geometry {
        start: block.start,
        end: block.end,
        top: pos.top,
        height: pos.height,
        visible: config.grid.is_visible(block),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let pretty = serde_json::to_string_pretty(value)?;
    println!("{}", pretty);
    Ok(())
}

fn render_week(week: &WeekGrid) -> String {
    let mut out = String::new();
    for day in &week.days {
        out.push_str(&format!("{}\n", day.date.format("%a %Y-%m-%d")));
        if day.placements.is_empty() {
            out.push_str("  (free)\n");
        }
        for p in &day.placements {
            out.push_str(&format!(
                "  {}-{}  top={:.1} height={:.1}  task {}\n",
                p.start.format("%H:%M"),
                p.end.format("%H:%M"),
                p.position.top,
                p.position.height,
                p.task_id
            ));
        }
    }
    out
}
