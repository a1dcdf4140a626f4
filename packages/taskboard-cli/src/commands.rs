use std::sync::Arc;

use clap::Subcommand;
use taskboard_core::dnd::{DragController, DropOutcome};
use taskboard_core::draft::BoardDraft;
use taskboard_core::sync::RegistrySync;
use taskboard_core::types::BoardSummary;
use taskboard_core::{mutate, BoardDocument, BoardRegistry, Priority, ValidationError};
use tokio::sync::watch;

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Board not found: {0}")]
    BoardNotFound(String),

    #[error("List not found: {0}")]
    ListNotFound(String),

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("Failed to render JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List boards, newest first
    Boards {
        #[arg(long)]
        json: bool,
    },
    /// Board and task counts
    Totals,
    /// Create a board with the default lists
    Create {
        name: String,
        #[arg(long)]
        description: Option<String>,
    },
    /// Rename a board or set its description; omitted fields stay as they are
    Edit {
        board: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    /// Delete a board and everything on it
    Delete { board: String },
    /// Print a board's lists and tasks
    Show {
        board: String,
        #[arg(long)]
        json: bool,
    },
    /// Append a list to a board
    AddList { board: String, title: String },
    /// Append a task to a list (list id or title)
    AddTask {
        board: String,
        list: String,
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, default_value = "low")]
        priority: Priority,
    },
    /// Change a task's fields; omitted fields stay as they are
    EditTask {
        board: String,
        task: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        priority: Option<Priority>,
    },
    /// Remove a task
    DeleteTask { board: String, task: String },
    /// Drag a task onto another list (list id or title)
    Move {
        board: String,
        task: String,
        to: String,
    },
    /// Print the board list whenever another process changes it
    Watch,
}

impl Command {
    pub fn is_long_running(&self) -> bool {
        matches!(self, Command::Watch)
    }

    pub async fn execute(self, registry: Arc<BoardRegistry>) -> Result<(), CliError> {
        match self {
            Command::Boards { json } => {
                let boards = registry.list();
                if json {
                    println!("{}", serde_json::to_string_pretty(&boards)?);
                } else {
                    print_boards(&boards);
                }
            }
            Command::Totals => {
                let totals = registry.totals();
                println!("boards: {}\ntasks:  {}", totals.boards, totals.tasks);
            }
            Command::Create { name, description } => {
                let board = registry.create(&name, description.as_deref())?;
                println!("{}", board.id);
            }
            Command::Edit {
                board,
                name,
                description,
            } => {
                require_board(&registry, &board)?;
                let mut draft = BoardDraft::from_document(&registry.documents().load_or_seed(&board));
                if let Some(name) = name {
                    draft.name = name;
                }
                if let Some(description) = description {
                    draft.description = description;
                }
                let doc = draft
                    .submit(&registry, &board)
                    .ok_or_else(|| CliError::BoardNotFound(board.clone()))?;
                println!("{}", doc.name);
            }
            Command::Delete { board } => {
                require_board(&registry, &board)?;
                registry.delete(&board);
            }
            Command::Show { board, json } => {
                let summary = require_board(&registry, &board)?;
                let doc = registry.documents().load_or_seed(&board);
                if json {
                    println!("{}", serde_json::to_string_pretty(&doc)?);
                } else {
                    print_document(&summary, &doc);
                }
            }
            Command::AddList { board, title } => {
                edit_document(&registry, &board, |doc| Ok(mutate::add_list(doc, &title)?))?;
            }
            Command::AddTask {
                board,
                list,
                title,
                description,
                priority,
            } => {
                edit_document(&registry, &board, |doc| {
                    let list_id = resolve_list(doc, &list)?;
                    Ok(mutate::add_task(doc, &list_id, &title, &description, priority)?)
                })?;
            }
            Command::EditTask {
                board,
                task,
                title,
                description,
                priority,
            } => {
                edit_document(&registry, &board, |doc| {
                    let (_, current) = doc
                        .find_task(&task)
                        .ok_or_else(|| CliError::TaskNotFound(task.clone()))?;
                    let mut updated = current.clone();
                    if let Some(title) = title {
                        updated.title = title;
                    }
                    if let Some(description) = description {
                        updated.description = description;
                    }
                    if let Some(priority) = priority {
                        updated.priority = priority;
                    }
                    Ok(mutate::edit_task(doc, &updated)?)
                })?;
            }
            Command::DeleteTask { board, task } => {
                edit_document(&registry, &board, |doc| Ok(mutate::delete_task(doc, &task)))?;
            }
            Command::Move { board, task, to } => {
                edit_document(&registry, &board, |doc| drag_task(doc, &task, &to))?;
            }
            Command::Watch => watch_boards(registry).await,
        }
        Ok(())
    }
}

fn require_board(registry: &BoardRegistry, board_id: &str) -> Result<BoardSummary, CliError> {
    registry
        .get(board_id)
        .ok_or_else(|| CliError::BoardNotFound(board_id.to_string()))
}

/// Load, transform and save one board's document.
fn edit_document(
    registry: &BoardRegistry,
    board_id: &str,
    transform: impl FnOnce(&BoardDocument) -> Result<BoardDocument, CliError>,
) -> Result<(), CliError> {
    require_board(registry, board_id)?;
    let docs = registry.documents();
    let doc = docs.load_or_seed(board_id);
    let next = transform(&doc)?;
    if next != doc {
        docs.save(board_id, &next);
    }
    Ok(())
}

/// Accept a list id, or failing that an exact list title.
fn resolve_list(doc: &BoardDocument, list: &str) -> Result<String, CliError> {
    doc.find_list(list)
        .or_else(|| doc.find_list_by_title(list))
        .map(|l| l.id.clone())
        .ok_or_else(|| CliError::ListNotFound(list.to_string()))
}

/// Replay a drag of `task_id` onto `to` through the drag controller.
fn drag_task(doc: &BoardDocument, task_id: &str, to: &str) -> Result<BoardDocument, CliError> {
    let (from, _) = doc
        .find_task(task_id)
        .ok_or_else(|| CliError::TaskNotFound(task_id.to_string()))?;
    let to = resolve_list(doc, to)?;

    let mut dnd = DragController::new();
    dnd.drag_start(task_id, &from.id);
    dnd.drag_over(&to);
    Ok(match dnd.drop_on(doc, &to) {
        DropOutcome::Moved(next) => next,
        DropOutcome::SameList | DropOutcome::Unchanged | DropOutcome::NotDragging => doc.clone(),
    })
}

async fn watch_boards(registry: Arc<BoardRegistry>) {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut revisions = registry.subscribe();
    let handle = RegistrySync::new(registry.clone()).spawn(shutdown_rx);

    print_boards(&registry.list());
    loop {
        tokio::select! {
            changed = revisions.changed() => {
                if changed.is_err() {
                    break;
                }
                println!("--");
                print_boards(&registry.list());
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    let _ = shutdown_tx.send(true);
    if let Err(e) = handle.await {
        log::warn!("[taskboard.cli] Sync task ended abnormally: {}", e);
    }
}

fn print_boards(boards: &[BoardSummary]) {
    if boards.is_empty() {
        println!("No boards yet.");
        return;
    }
    for board in boards {
        match &board.description {
            Some(description) => println!("{}  {}  - {}", board.id, board.name, description),
            None => println!("{}  {}", board.id, board.name),
        }
    }
}

fn print_document(summary: &BoardSummary, doc: &BoardDocument) {
    println!("{} ({})", doc.name, summary.id);
    if let Some(description) = doc.description.as_deref().filter(|d| !d.is_empty()) {
        println!("{}", description);
    }
    for list in &doc.lists {
        println!();
        println!("== {} [{}] ({})", list.title, list.id, list.tasks.len());
        for task in &list.tasks {
            println!("  - [{}] {} ({})", task.id, task.title, task.priority);
            if !task.description.is_empty() {
                println!("      {}", task.description);
            }
        }
    }
}
