/// Form drafts held by the view while the user types.

use crate::error::ValidationError;
use crate::mutate;
use crate::registry::BoardRegistry;
use crate::types::{BoardDocument, Priority};

/// The inline "add card" form. At most one list has an open form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskDraft {
    pub list_id: Option<String>,
    pub title: String,
    pub description: String,
    pub priority: Priority,
}

impl TaskDraft {
    /// Open the form on `list_id` with empty fields and low priority.
    pub fn start(&mut self, list_id: &str) {
        *self = Self {
            list_id: Some(list_id.to_string()),
            ..Self::default()
        };
    }

    pub fn cancel(&mut self) {
        self.list_id = None;
    }

    pub fn is_open_for(&self, list_id: &str) -> bool {
        self.list_id.as_deref() == Some(list_id)
    }

    /// Add the drafted task to `doc`.
    ///
    /// Returns `Ok(None)` when no form is open. On success the form closes;
    /// on a validation error it stays open with its fields intact.
    pub fn submit(&mut self, doc: &BoardDocument) -> Result<Option<BoardDocument>, ValidationError> {
        let Some(list_id) = self.list_id.as_deref() else {
            return Ok(None);
        };
        let next = mutate::add_task(doc, list_id, &self.title, &self.description, self.priority)?;
        self.list_id = None;
        Ok(Some(next))
    }
}

/// The "edit board" dialog fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoardDraft {
    pub name: String,
    pub description: String,
}

impl BoardDraft {
    /// Pre-fill from the current document.
    pub fn from_document(doc: &BoardDocument) -> Self {
        Self {
            name: doc.name.clone(),
            description: doc.description.clone().unwrap_or_default(),
        }
    }

    /// Save the dialog through [`BoardRegistry::edit_board`].
    /// `None` when the board no longer exists.
    pub fn submit(&self, registry: &BoardRegistry, board_id: &str) -> Option<BoardDocument> {
        registry.edit_board(board_id, &self.name, Some(&self.description))
    }
}
