use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::ids;

/// Name given to a board document that was opened before it was ever saved,
/// and to boards renamed to a blank name.
pub const DEFAULT_BOARD_NAME: &str = "Untitled Board";

/// Lists every freshly seeded board starts with, in display order.
pub const DEFAULT_LIST_TITLES: [&str; 3] = ["To Do", "In Progress", "Done"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    #[default]
    Low,
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown priority: {0} (expected low, medium or high)")]
pub struct ParsePriorityError(pub String);

impl FromStr for Priority {
    type Err = ParsePriorityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            other => Err(ParsePriorityError(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskEntity {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub priority: Priority,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListEntity {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub tasks: Vec<TaskEntity>,
}

impl ListEntity {
    pub fn new(id: String, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            tasks: Vec::new(),
        }
    }
}

/// Full content of one board. Always persisted as a whole.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardDocument {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub lists: Vec<ListEntity>,
}

impl BoardDocument {
    /// A document holding the three default lists, each with a fresh id.
    pub fn seeded(name: impl Into<String>, description: Option<String>) -> Self {
        let mut doc = Self {
            name: name.into(),
            description,
            lists: Vec::with_capacity(DEFAULT_LIST_TITLES.len()),
        };
        for title in DEFAULT_LIST_TITLES {
            let id = ids::fresh_id(|candidate| doc.contains_id(candidate));
            doc.lists.push(ListEntity::new(id, title));
        }
        doc
    }

    pub fn find_list(&self, list_id: &str) -> Option<&ListEntity> {
        self.lists.iter().find(|l| l.id == list_id)
    }

    pub fn find_list_by_title(&self, title: &str) -> Option<&ListEntity> {
        self.lists.iter().find(|l| l.title == title)
    }

    /// Locate a task and the list that currently owns it.
    pub fn find_task(&self, task_id: &str) -> Option<(&ListEntity, &TaskEntity)> {
        self.lists.iter().find_map(|list| {
            list.tasks
                .iter()
                .find(|t| t.id == task_id)
                .map(|task| (list, task))
        })
    }

    pub fn task_count(&self) -> usize {
        self.lists.iter().map(|l| l.tasks.len()).sum()
    }

    /// True if any list or task in this document already uses `id`.
    pub fn contains_id(&self, id: &str) -> bool {
        self.lists
            .iter()
            .any(|l| l.id == id || l.tasks.iter().any(|t| t.id == id))
    }
}

impl Default for BoardDocument {
    fn default() -> Self {
        Self::seeded(DEFAULT_BOARD_NAME, None)
    }
}

/// Registry entry for one board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardSummary {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Aggregate counts shown on the dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardTotals {
    pub boards: usize,
    pub tasks: usize,
}
