//! Command-line shell over the board core.
//!
//! Every invocation opens the local store, applies one command, then probes
//! the remote and pushes pending changes when it is reachable.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use flowboard_core::db::open_db;
use flowboard_core::{
    init_logging, BoardConfig, BoardError, ConnectivityState, FlowBoard, HttpRemoteEndpoint,
    Priority, SqliteTaskStore, SyncReport, Task, TaskId, TaskStatus,
};
use log::warn;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "flowboard", version, about = "Offline-first task board")]
struct Cli {
    /// JSON config file; `FLOWBOARD_*` variables override it.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Add a task to the end of a column.
    Add {
        column: TaskStatus,
        title: String,
        description: String,
        #[arg(long, default_value = "HIGH")]
        priority: Priority,
    },
    /// Replace a task's title, description and priority.
    Edit {
        id: TaskId,
        title: String,
        description: String,
        #[arg(long, default_value = "HIGH")]
        priority: Priority,
    },
    /// Move a task between columns.
    Move {
        id: TaskId,
        from: TaskStatus,
        to: TaskStatus,
    },
    /// Remove a task from the board.
    Delete { column: TaskStatus, id: TaskId },
    /// Print the board.
    List,
    /// Push pending changes now.
    Sync,
    /// Print counters and connectivity.
    Status,
}

fn main() -> ExitCode {
    match run(Cli::parse()) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let config = BoardConfig::load(cli.config.as_deref())?;
    if let Some(log_dir) = &config.log_dir {
        init_logging(&config.log_level, log_dir)?;
    }

    let conn = open_db(&config.db_path)
        .with_context(|| format!("cannot open board at {}", config.db_path.display()))?;
    let remote = config
        .sync_url
        .as_deref()
        .map(HttpRemoteEndpoint::new)
        .transpose()?;
    let probe = remote.clone();

    let mut board = FlowBoard::open(
        SqliteTaskStore::new(&conn),
        remote,
        config.sync_settings(),
        ConnectivityState::Offline,
    )?;

    let outcome = apply(&mut board, cli.command);
    // Pending work is pushed even when the command itself was rejected.
    let report = probe
        .as_ref()
        .and_then(|probe| board.poll_connectivity(probe));

    match outcome {
        Ok(CommandOutput::Board) => print_board(&board),
        Ok(CommandOutput::Task(task)) => println!("{}", format_task(&task)),
        Ok(CommandOutput::Moved(moved)) => {
            println!("{}", if moved { "moved" } else { "nothing to move" })
        }
        Ok(CommandOutput::Deleted) => println!("deleted"),
        Ok(CommandOutput::Sync) => print_sync(&board, report),
        Ok(CommandOutput::Status) => print_status(&board),
        Err(err) if err.is_user_facing() => {
            eprintln!("{err}");
            return Ok(ExitCode::from(2));
        }
        Err(err) => return Err(err.into()),
    }
    Ok(ExitCode::SUCCESS)
}

enum CommandOutput {
    Board,
    Task(Task),
    Moved(bool),
    Deleted,
    Sync,
    Status,
}

type CliBoard<'conn> = FlowBoard<SqliteTaskStore<'conn>, HttpRemoteEndpoint>;

fn apply(board: &mut CliBoard<'_>, command: Command) -> Result<CommandOutput, BoardError> {
    let output = match command {
        Command::Add {
            column,
            title,
            description,
            priority,
        } => CommandOutput::Task(board.create(column, &title, &description, priority)?),
        Command::Edit {
            id,
            title,
            description,
            priority,
        } => CommandOutput::Task(board.edit(id, &title, &description, priority)?),
        Command::Move { id, from, to } => CommandOutput::Moved(board.move_task(id, from, to)?),
        Command::Delete { column, id } => {
            board.soft_delete(column, id)?;
            CommandOutput::Deleted
        }
        Command::List => CommandOutput::Board,
        Command::Sync => CommandOutput::Sync,
        Command::Status => CommandOutput::Status,
    };
    Ok(output)
}

fn print_board(board: &CliBoard<'_>) {
    for status in TaskStatus::ALL {
        let column = board.column(status);
        println!("== {} ({})", column_heading(status), column.len());
        for task in column {
            println!("  {}", format_task(task));
        }
    }
}

fn print_status(board: &CliBoard<'_>) {
    let counts = board.counts();
    println!(
        "TOTAL TASKS: {}  IN PROGRESS: {}  COMPLETED: {}",
        counts.total, counts.in_progress, counts.done
    );
    println!("{}", board.connectivity().as_str().to_ascii_uppercase());
}

fn print_sync(board: &CliBoard<'_>, report: Option<SyncReport>) {
    if !board.is_sync_configured() {
        println!("sync is not configured");
        return;
    }
    match (board.connectivity(), report) {
        (ConnectivityState::Online, Some(report)) => println!(
            "pushed {} of {} pending change(s), {} failed",
            report.acknowledged, report.queued, report.failed
        ),
        _ => {
            warn!("event=cli_sync module=cli status=skip reason=offline");
            println!("offline; changes stay queued");
        }
    }
}

fn column_heading(status: TaskStatus) -> &'static str {
    match status {
        TaskStatus::Todo => "TO DO",
        TaskStatus::InProgress => "IN PROGRESS",
        TaskStatus::Done => "DONE",
    }
}

fn format_task(task: &Task) -> String {
    format!(
        "{} [{}]{} {} - {}",
        task.id,
        task.priority.as_str(),
        if task.synced { "" } else { " *" },
        task.title,
        task.description
    )
}
