//! Board data model and local persistence for a task board.
//!
//! Boards are listed in a [`registry::BoardRegistry`]; each board's lists and
//! tasks live in a [`types::BoardDocument`] loaded and saved whole through the
//! [`document::DocumentStore`]. Documents are changed only through the pure
//! transforms in [`mutate`], directly or via the drag controller in [`dnd`].
//! Storage sits behind [`storage::PersistenceGateway`], and [`sync`] reloads
//! the registry when another process rewrites it.

pub mod config;
pub mod dnd;
pub mod document;
pub mod draft;
pub mod error;
pub mod ids;
pub mod mutate;
pub mod registry;
pub mod storage;
pub mod sync;
pub mod types;
pub mod watcher;

pub use error::ValidationError;
pub use registry::BoardRegistry;
pub use storage::PersistenceGateway;
pub use types::{BoardDocument, BoardSummary, ListEntity, Priority, TaskEntity};
