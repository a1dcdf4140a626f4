/// Per-board document persistence.

use std::sync::Arc;

use crate::storage::PersistenceGateway;
use crate::types::BoardDocument;

#[derive(Clone)]
pub struct DocumentStore {
    gateway: Arc<PersistenceGateway>,
}

impl DocumentStore {
    pub fn new(gateway: Arc<PersistenceGateway>) -> Self {
        Self { gateway }
    }

    /// The persisted document, if there is a readable one.
    pub fn load(&self, board_id: &str) -> Option<BoardDocument> {
        self.gateway.get(&self.gateway.keys().board(board_id))
    }

    /// The persisted document, or a fresh default that is NOT written back.
    /// It gets persisted by the caller's first `save`.
    pub fn load_or_seed(&self, board_id: &str) -> BoardDocument {
        self.load(board_id).unwrap_or_else(|| {
            log::debug!(
                "[taskboard.document.seed] No document for board {}, using defaults",
                board_id
            );
            BoardDocument::default()
        })
    }

    /// Write a freshly seeded document for a newly created board.
    pub(crate) fn seed(&self, board_id: &str, name: &str, description: Option<String>) -> BoardDocument {
        let doc = BoardDocument::seeded(name, description);
        self.save(board_id, &doc);
        doc
    }

    /// Overwrite the stored document with `doc`.
    pub fn save(&self, board_id: &str, doc: &BoardDocument) {
        self.gateway.set(&self.gateway.keys().board(board_id), doc);
        log::debug!(
            "[taskboard.document.save] Saved board {} ({} lists, {} tasks)",
            board_id,
            doc.lists.len(),
            doc.task_count()
        );
    }

    pub fn remove(&self, board_id: &str) {
        self.gateway.remove(&self.gateway.keys().board(board_id));
    }
}
