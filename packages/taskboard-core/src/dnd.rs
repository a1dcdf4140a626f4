/// Drag-and-drop of tasks between lists.
///
/// The controller is a state record owned by the view. It never touches
/// storage: a drop hands back the replacement document and the caller
/// decides when to save it.

use crate::mutate;
use crate::types::BoardDocument;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum DragState {
    #[default]
    Idle,
    Dragging {
        task_id: String,
        from_list_id: String,
    },
}

/// Result of dropping onto a list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DropOutcome {
    /// No drag was in progress.
    NotDragging,
    /// Dropped back onto the origin list; nothing to do.
    SameList,
    /// Task or one of the lists vanished in the meantime.
    Unchanged,
    /// The task was moved; this is the document to save.
    Moved(BoardDocument),
}

#[derive(Clone, Debug, Default)]
pub struct DragController {
    state: DragState,
    hover: Option<String>,
}

impl DragController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &DragState {
        &self.state
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging { .. })
    }

    /// List currently highlighted as drop target.
    pub fn hover_target(&self) -> Option<&str> {
        self.hover.as_deref()
    }

    pub fn is_hovered(&self, list_id: &str) -> bool {
        self.hover.as_deref() == Some(list_id)
    }

    pub fn drag_start(&mut self, task_id: &str, from_list_id: &str) {
        log::debug!("[taskboard.dnd] drag start {} from {}", task_id, from_list_id);
        self.state = DragState::Dragging {
            task_id: task_id.to_string(),
            from_list_id: from_list_id.to_string(),
        };
        self.hover = None;
    }

    /// Pointer is over `list_id`. Returns true only when the hover target changed.
    pub fn drag_over(&mut self, list_id: &str) -> bool {
        if !self.is_dragging() || self.is_hovered(list_id) {
            return false;
        }
        self.hover = Some(list_id.to_string());
        true
    }

    /// Drag cancelled or finished without a drop.
    pub fn drag_end(&mut self) {
        self.state = DragState::Idle;
        self.hover = None;
    }

    /// Drop onto `to_list_id`. Always returns the controller to `Idle`.
    pub fn drop_on(&mut self, doc: &BoardDocument, to_list_id: &str) -> DropOutcome {
        let state = std::mem::take(&mut self.state);
        self.hover = None;

        let DragState::Dragging { task_id, from_list_id } = state else {
            return DropOutcome::NotDragging;
        };
        if from_list_id == to_list_id {
            return DropOutcome::SameList;
        }
        match mutate::try_move_task(doc, &task_id, &from_list_id, to_list_id) {
            Some(next) => DropOutcome::Moved(next),
            None => {
                log::debug!(
                    "[taskboard.dnd] drop of {} onto {} had nothing to move",
                    task_id,
                    to_list_id
                );
                DropOutcome::Unchanged
            }
        }
    }
}
