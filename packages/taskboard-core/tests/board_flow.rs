use std::sync::Arc;

use taskboard_core::dnd::{DragController, DropOutcome};
use taskboard_core::storage::local::LocalStore;
use taskboard_core::storage::memory::MemoryStore;
use taskboard_core::storage::{KeyValueStore, PersistenceGateway};
use taskboard_core::sync::RegistrySync;
use taskboard_core::{mutate, BoardRegistry, Priority};

fn list_id(doc: &taskboard_core::BoardDocument, title: &str) -> String {
    doc.find_list_by_title(title).unwrap().id.clone()
}

#[test]
fn launch_board_lifecycle() {
    let backend = Arc::new(MemoryStore::new());
    let gateway = Arc::new(PersistenceGateway::new(backend.clone()));
    let registry = BoardRegistry::new(gateway);

    let board = registry.create("Launch", None).unwrap();
    let boards = registry.list();
    assert_eq!(boards.len(), 1);
    assert_eq!(boards[0].name, "Launch");

    let docs = registry.documents();
    let doc = docs.load_or_seed(&board.id);
    assert_eq!(doc.lists.len(), 3);

    let todo = list_id(&doc, "To Do");
    let done = list_id(&doc, "Done");
    let doc = mutate::add_task(&doc, &todo, "Write copy", "", Priority::Low).unwrap();
    docs.save(&board.id, &doc);
    assert_eq!(doc.find_list(&todo).unwrap().tasks.len(), 1);
    let task = doc.find_list(&todo).unwrap().tasks[0].clone();

    let mut dnd = DragController::new();
    dnd.drag_start(&task.id, &todo);
    dnd.drag_over(&done);
    let DropOutcome::Moved(doc) = dnd.drop_on(&doc, &done) else {
        panic!("drop should move the task");
    };
    docs.save(&board.id, &doc);

    let reloaded = docs.load_or_seed(&board.id);
    assert_eq!(reloaded.find_list(&todo).unwrap().tasks.len(), 0);
    let done_tasks = &reloaded.find_list(&done).unwrap().tasks;
    assert_eq!(done_tasks.len(), 1);
    assert_eq!(done_tasks[0], task);

    registry.delete(&board.id);
    assert!(registry.list().is_empty());
    assert!(!backend.contains_key(&format!("taskboard_board_{}", board.id)));
}

#[test]
fn file_store_survives_restart() {
    let dir = tempfile::tempdir().unwrap();

    let (board_id, doc) = {
        let gateway = Arc::new(PersistenceGateway::new(Arc::new(LocalStore::open(dir.path()).unwrap())));
        let registry = BoardRegistry::new(gateway);
        let board = registry.create("Website", Some("redesign")).unwrap();
        let doc = registry.documents().load_or_seed(&board.id);
        let doc = mutate::add_list(&doc, "Blocked").unwrap();
        let blocked = list_id(&doc, "Blocked");
        let doc = mutate::add_task(&doc, &blocked, "Legal review", "waiting", Priority::High).unwrap();
        registry.documents().save(&board.id, &doc);
        (board.id, doc)
    };

    let gateway = Arc::new(PersistenceGateway::new(Arc::new(LocalStore::open(dir.path()).unwrap())));
    let registry = BoardRegistry::new(gateway);
    let summary = registry.get(&board_id).unwrap();
    assert_eq!(summary.name, "Website");
    assert_eq!(summary.description.as_deref(), Some("redesign"));
    assert_eq!(registry.documents().load_or_seed(&board_id), doc);
    assert_eq!(registry.totals().tasks, 1);
}

#[test]
fn registry_follows_other_window() {
    let backend = Arc::new(MemoryStore::new());
    let gateway = Arc::new(PersistenceGateway::new(backend.clone()));
    let registry = Arc::new(BoardRegistry::new(gateway.clone()));
    let mut sync = RegistrySync::new(registry.clone());

    let kept = registry.create("Kept", None).unwrap();
    let dropped = registry.create("Dropped", None).unwrap();

    // Another window deletes "Dropped" through its own registry on the same store.
    let other = BoardRegistry::new(gateway);
    other.delete(&dropped.id);
    let raw = backend.read("taskboard_boards").unwrap().unwrap();
    backend.external_set("taskboard_boards", &raw);

    assert_eq!(registry.len(), 2);
    assert!(sync.pump());
    assert_eq!(registry.list(), vec![kept]);
}
