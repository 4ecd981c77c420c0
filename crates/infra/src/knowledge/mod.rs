//! Knowledge documents on disk

mod loader;

pub use loader::{load_knowledge_file, KnowledgeFormat};
