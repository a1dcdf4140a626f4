/// Board document transforms.
///
/// Every function takes the current document by reference and returns a
/// complete replacement document. The input is never modified, so a caller
/// that drops a failed or no-op result still holds a valid document and
/// nothing half-applied can reach storage.

use crate::error::{require_text, ValidationError};
use crate::ids;
use crate::types::{BoardDocument, ListEntity, Priority, TaskEntity, DEFAULT_BOARD_NAME};

/// Append a new empty list.
pub fn add_list(doc: &BoardDocument, title: &str) -> Result<BoardDocument, ValidationError> {
    let title = require_text(title, ValidationError::BlankListTitle)?;
    let mut next = doc.clone();
    let id = ids::fresh_id(|candidate| doc.contains_id(candidate));
    log::debug!("[taskboard.mutate.add_list] {} \"{}\"", id, title);
    next.lists.push(ListEntity::new(id, title));
    Ok(next)
}

/// Append a new task to the end of `list_id`.
/// The title is trimmed; the description is kept as typed.
pub fn add_task(
    doc: &BoardDocument,
    list_id: &str,
    title: &str,
    description: &str,
    priority: Priority,
) -> Result<BoardDocument, ValidationError> {
    let title = require_text(title, ValidationError::BlankTaskTitle)?;
    let mut next = doc.clone();
    let id = ids::fresh_id(|candidate| doc.contains_id(candidate));
    let list = next
        .lists
        .iter_mut()
        .find(|l| l.id == list_id)
        .ok_or_else(|| ValidationError::ListNotFound(list_id.to_string()))?;
    log::debug!("[taskboard.mutate.add_task] {} -> list {}", id, list_id);
    list.tasks.push(TaskEntity {
        id,
        title,
        description: description.to_string(),
        priority,
    });
    Ok(next)
}

/// Replace the task with `task.id` wherever it lives. No-op if it is gone.
pub fn update_task(doc: &BoardDocument, task: &TaskEntity) -> BoardDocument {
    let mut next = doc.clone();
    if let Some(slot) = next
        .lists
        .iter_mut()
        .flat_map(|l| l.tasks.iter_mut())
        .find(|t| t.id == task.id)
    {
        *slot = task.clone();
    }
    next
}

/// `update_task` for the edit dialog: the title is trimmed and must not be blank.
pub fn edit_task(doc: &BoardDocument, task: &TaskEntity) -> Result<BoardDocument, ValidationError> {
    let title = require_text(&task.title, ValidationError::BlankTaskTitle)?;
    Ok(update_task(
        doc,
        &TaskEntity {
            title,
            ..task.clone()
        },
    ))
}

/// Remove the task from whichever list holds it. No-op if it is gone.
pub fn delete_task(doc: &BoardDocument, task_id: &str) -> BoardDocument {
    let mut next = doc.clone();
    for list in &mut next.lists {
        list.tasks.retain(|t| t.id != task_id);
    }
    next
}

/// Move a task to the end of another list.
///
/// Returns `None` when nothing would change: same source and target, either
/// list missing, or the task not in the source list.
pub fn try_move_task(
    doc: &BoardDocument,
    task_id: &str,
    from_list_id: &str,
    to_list_id: &str,
) -> Option<BoardDocument> {
    if from_list_id == to_list_id {
        return None;
    }
    let from_idx = doc.lists.iter().position(|l| l.id == from_list_id)?;
    let to_idx = doc.lists.iter().position(|l| l.id == to_list_id)?;
    let task_idx = doc.lists[from_idx]
        .tasks
        .iter()
        .position(|t| t.id == task_id)?;

    let mut next = doc.clone();
    let task = next.lists[from_idx].tasks.remove(task_idx);
    next.lists[to_idx].tasks.push(task);
    log::debug!(
        "[taskboard.mutate.move_task] {} list {} -> {}",
        task_id,
        from_list_id,
        to_list_id
    );
    Some(next)
}

/// `try_move_task`, returning an unchanged copy for the no-op cases.
pub fn move_task(doc: &BoardDocument, task_id: &str, from_list_id: &str, to_list_id: &str) -> BoardDocument {
    try_move_task(doc, task_id, from_list_id, to_list_id).unwrap_or_else(|| doc.clone())
}

/// Set board name and description. A blank name becomes the default name,
/// a blank description is dropped.
pub fn rename_board(doc: &BoardDocument, name: &str, description: Option<&str>) -> BoardDocument {
    let (name, description) = normalize_board_fields(name, description);
    BoardDocument {
        name,
        description,
        ..doc.clone()
    }
}

fn normalize_board_fields(name: &str, description: Option<&str>) -> (String, Option<String>) {
    let name = match name.trim() {
        "" => DEFAULT_BOARD_NAME.to_string(),
        trimmed => trimmed.to_string(),
    };
    let description = description
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_string);
    (name, description)
}
