/// Board registry: the in-memory projection of the stored board summaries.
///
/// Every local change updates the projection and persists it before
/// returning. External changes are picked up through `resync`, which throws
/// the projection away and reloads it from storage.

use std::sync::{Arc, PoisonError, RwLock};

use tokio::sync::watch;

use crate::document::DocumentStore;
use crate::error::{require_text, ValidationError};
use crate::ids;
use crate::mutate;
use crate::storage::PersistenceGateway;
use crate::types::{BoardDocument, BoardSummary, BoardTotals};

pub struct BoardRegistry {
    gateway: Arc<PersistenceGateway>,
    documents: DocumentStore,
    boards: RwLock<Vec<BoardSummary>>,
    /// Bumped after every change to `boards`, local or external.
    revision: watch::Sender<u64>,
}

impl BoardRegistry {
    pub fn new(gateway: Arc<PersistenceGateway>) -> Self {
        let boards = Self::load_summaries(&gateway);
        let (revision, _) = watch::channel(0);
        Self {
            documents: DocumentStore::new(gateway.clone()),
            gateway,
            boards: RwLock::new(boards),
            revision,
        }
    }

    fn load_summaries(gateway: &PersistenceGateway) -> Vec<BoardSummary> {
        gateway
            .get(&gateway.keys().registry())
            .unwrap_or_default()
    }

    pub fn gateway(&self) -> &Arc<PersistenceGateway> {
        &self.gateway
    }

    pub fn documents(&self) -> &DocumentStore {
        &self.documents
    }

    pub fn registry_key(&self) -> String {
        self.gateway.keys().registry()
    }

    /// Receiver that changes whenever the list of boards does.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    /// All summaries, newest first.
    pub fn list(&self) -> Vec<BoardSummary> {
        self.boards
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn get(&self, id: &str) -> Option<BoardSummary> {
        self.boards
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|b| b.id == id)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.boards
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Create a board, persist the registry and seed its document.
    pub fn create(&self, name: &str, description: Option<&str>) -> Result<BoardSummary, ValidationError> {
        let name = require_text(name, ValidationError::BlankBoardName)?;
        let description = description
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(str::to_string);

        let summary = {
            let mut boards = self.boards.write().unwrap_or_else(PoisonError::into_inner);
            let id = ids::fresh_id(|candidate| boards.iter().any(|b| b.id == candidate));
            let summary = BoardSummary {
                id,
                name,
                description,
            };
            boards.insert(0, summary.clone());
            self.persist(&boards);
            summary
        };

        self.documents
            .seed(&summary.id, &summary.name, summary.description.clone());
        self.bump();
        log::info!(
            "[taskboard.registry.create] Created board {} \"{}\"",
            summary.id,
            summary.name
        );
        Ok(summary)
    }

    /// Apply `transform` to the summary with `id` and persist.
    /// Returns false (and does nothing) if there is no such board.
    /// The summary keeps its id whatever the transform returns.
    pub fn update(&self, id: &str, transform: impl FnOnce(BoardSummary) -> BoardSummary) -> bool {
        {
            let mut boards = self.boards.write().unwrap_or_else(PoisonError::into_inner);
            let Some(slot) = boards.iter_mut().find(|b| b.id == id) else {
                log::debug!("[taskboard.registry.update] No board {}", id);
                return false;
            };
            let mut updated = transform(slot.clone());
            updated.id = id.to_string();
            *slot = updated;
            self.persist(&boards);
        }
        self.bump();
        true
    }

    /// Remove the summary and the document. Deleting twice is harmless.
    pub fn delete(&self, id: &str) {
        let removed = {
            let mut boards = self.boards.write().unwrap_or_else(PoisonError::into_inner);
            let before = boards.len();
            boards.retain(|b| b.id != id);
            let removed = boards.len() != before;
            if removed {
                self.persist(&boards);
            }
            removed
        };

        self.documents.remove(id);
        if removed {
            self.bump();
            log::info!("[taskboard.registry.delete] Deleted board {}", id);
        }
    }

    /// Rename/describe a board: writes the document and the summary.
    /// A blank name falls back to the default board name.
    /// Returns `None`, touching nothing, when `id` is not a known board.
    pub fn edit_board(
        &self,
        id: &str,
        name: &str,
        description: Option<&str>,
    ) -> Option<BoardDocument> {
        if self.get(id).is_none() {
            log::debug!("[taskboard.registry.edit] Unknown board {}", id);
            return None;
        }
        let doc = mutate::rename_board(&self.documents.load_or_seed(id), name, description);
        self.documents.save(id, &doc);
        let (name, description) = (doc.name.clone(), doc.description.clone());
        self.update(id, move |summary| BoardSummary {
            name,
            description,
            ..summary
        });
        Some(doc)
    }

    /// Board count and the number of tasks across all stored documents.
    pub fn totals(&self) -> BoardTotals {
        let boards = self.list();
        let tasks = boards
            .iter()
            .filter_map(|b| self.documents.load(&b.id))
            .map(|doc| doc.task_count())
            .sum();
        BoardTotals {
            boards: boards.len(),
            tasks,
        }
    }

    /// Replace the projection with whatever storage holds now.
    pub fn resync(&self) {
        let fresh = Self::load_summaries(&self.gateway);
        let count = fresh.len();
        *self.boards.write().unwrap_or_else(PoisonError::into_inner) = fresh;
        self.bump();
        log::info!("[taskboard.registry.resync] Reloaded {} boards", count);
    }

    fn persist(&self, boards: &[BoardSummary]) {
        self.gateway.set(&self.gateway.keys().registry(), boards);
    }

    fn bump(&self) {
        self.revision.send_modify(|rev| *rev += 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory::MemoryStore;
    use crate::storage::KeyValueStore;
    use crate::types::{Priority, DEFAULT_BOARD_NAME};

    fn registry() -> (Arc<MemoryStore>, BoardRegistry) {
        let backend = Arc::new(MemoryStore::new());
        let gateway = Arc::new(PersistenceGateway::new(backend.clone()));
        (backend, BoardRegistry::new(gateway))
    }

    #[test]
    fn test_create_prepends_and_seeds() {
        let (backend, reg) = registry();
        let first = reg.create("Launch", None).unwrap();
        let second = reg.create("  Website ", Some("  redesign ")).unwrap();

        let names: Vec<String> = reg.list().into_iter().map(|b| b.name).collect();
        assert_eq!(names, vec!["Website", "Launch"]);
        assert_eq!(second.description.as_deref(), Some("redesign"));
        assert_ne!(first.id, second.id);

        let doc = reg.documents().load(&first.id).unwrap();
        assert_eq!(doc.name, "Launch");
        assert_eq!(doc.lists.len(), 3);
        assert!(backend.contains_key(&format!("taskboard_board_{}", second.id)));
    }

    #[test]
    fn test_create_blank_name_rejected() {
        let (backend, reg) = registry();
        assert_eq!(reg.create("   ", None), Err(ValidationError::BlankBoardName));
        assert!(reg.is_empty());
        assert!(backend.is_empty());
    }

    #[test]
    fn test_blank_description_omitted() {
        let (_, reg) = registry();
        let summary = reg.create("Launch", Some("   ")).unwrap();
        assert_eq!(summary.description, None);
    }

    #[test]
    fn test_registry_persisted_and_reloaded() {
        let backend = Arc::new(MemoryStore::new());
        let gateway = Arc::new(PersistenceGateway::new(backend.clone()));
        let created = BoardRegistry::new(gateway.clone()).create("Launch", None).unwrap();

        let reopened = BoardRegistry::new(gateway);
        assert_eq!(reopened.list(), vec![created]);
    }

    #[test]
    fn test_update_missing_is_noop() {
        let (_, reg) = registry();
        reg.create("Launch", None).unwrap();
        let before = reg.list();
        assert!(!reg.update("missing", |mut b| {
            b.name = "x".into();
            b
        }));
        assert_eq!(reg.list(), before);
    }

    #[test]
    fn test_update_keeps_id() {
        let (_, reg) = registry();
        let board = reg.create("Launch", None).unwrap();
        assert!(reg.update(&board.id, |b| BoardSummary {
            id: "hijack".into(),
            name: "Relaunch".into(),
            ..b
        }));
        let updated = reg.get(&board.id).unwrap();
        assert_eq!(updated.name, "Relaunch");
        assert!(reg.get("hijack").is_none());
    }

    #[test]
    fn test_delete_removes_both_and_is_idempotent() {
        let (backend, reg) = registry();
        let board = reg.create("Launch", None).unwrap();
        let doc_key = format!("taskboard_board_{}", board.id);

        reg.delete(&board.id);
        assert!(reg.is_empty());
        assert!(!backend.contains_key(&doc_key));
        assert_eq!(backend.read("taskboard_boards").unwrap().as_deref(), Some("[]"));

        reg.delete(&board.id);
        reg.delete("never-existed");
        assert!(reg.is_empty());
    }

    #[test]
    fn test_edit_board_updates_document_and_summary() {
        let (_, reg) = registry();
        let board = reg.create("Launch", None).unwrap();

        let doc = reg.edit_board(&board.id, "  ", Some(" Q3 plan ")).unwrap();
        assert_eq!(doc.name, DEFAULT_BOARD_NAME);
        assert_eq!(doc.description.as_deref(), Some("Q3 plan"));
        assert_eq!(doc.lists.len(), 3);

        let summary = reg.get(&board.id).unwrap();
        assert_eq!(summary.name, DEFAULT_BOARD_NAME);
        assert_eq!(summary.description.as_deref(), Some("Q3 plan"));
        assert_eq!(reg.documents().load(&board.id).unwrap(), doc);
    }

    #[test]
    fn test_edit_unknown_board_touches_nothing() {
        let (backend, reg) = registry();
        assert_eq!(reg.edit_board("ghost", "Name", None), None);
        assert!(reg.is_empty());
        assert!(backend.is_empty());

        let board = reg.create("Launch", None).unwrap();
        let stored = backend.len();
        let rev = *reg.subscribe().borrow();
        assert_eq!(reg.edit_board("ghost", "Name", Some("x")), None);
        assert_eq!(backend.len(), stored);
        assert!(!backend.contains_key("taskboard_board_ghost"));
        assert_eq!(*reg.subscribe().borrow(), rev);
        assert_eq!(reg.list(), vec![board]);
    }

    #[test]
    fn test_totals_counts_tasks_across_boards() {
        let (_, reg) = registry();
        let a = reg.create("A", None).unwrap();
        let b = reg.create("B", None).unwrap();

        let doc = reg.documents().load_or_seed(&a.id);
        let todo = doc.lists[0].id.clone();
        let doc = mutate::add_task(&doc, &todo, "one", "", Priority::Low).unwrap();
        let doc = mutate::add_task(&doc, &todo, "two", "", Priority::High).unwrap();
        reg.documents().save(&a.id, &doc);

        // A board whose document went missing counts as empty.
        reg.documents().remove(&b.id);

        assert_eq!(reg.totals(), BoardTotals { boards: 2, tasks: 2 });
    }

    #[test]
    fn test_resync_replaces_projection() {
        let (backend, reg) = registry();
        reg.create("Local", None).unwrap();

        backend.external_set("taskboard_boards", r#"[{"id":"ext0001","name":"From elsewhere"}]"#);
        assert_eq!(reg.list()[0].name, "Local");

        reg.resync();
        let boards = reg.list();
        assert_eq!(boards.len(), 1);
        assert_eq!(boards[0].id, "ext0001");
        assert_eq!(boards[0].description, None);
    }

    #[test]
    fn test_resync_with_corrupt_registry_empties() {
        let (backend, reg) = registry();
        reg.create("Local", None).unwrap();
        backend.external_set("taskboard_boards", "not json");
        reg.resync();
        assert!(reg.is_empty());
    }

    #[test]
    fn test_revision_bumps_on_change() {
        let (_, reg) = registry();
        let rx = reg.subscribe();
        let board = reg.create("Launch", None).unwrap();
        reg.delete(&board.id);
        assert_eq!(*rx.borrow(), 2);
    }

    #[test]
    fn test_works_without_storage() {
        let reg = BoardRegistry::new(Arc::new(PersistenceGateway::unavailable()));
        let board = reg.create("Ephemeral", None).unwrap();
        assert_eq!(reg.list().len(), 1);
        // Nothing was stored, so the document reads as a fresh default.
        assert_eq!(reg.documents().load_or_seed(&board.id).name, DEFAULT_BOARD_NAME);
        reg.delete(&board.id);
        assert!(reg.is_empty());
    }
}
