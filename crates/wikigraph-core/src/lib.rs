pub mod backlinks;
pub mod context;
pub mod edit_blocks;
pub mod engine;
pub mod error;
pub mod graph;
pub mod import;
pub mod mentions;
pub mod note;
pub mod quick_switch;
pub mod rename;
pub mod search_index;
pub mod settings;
pub mod store;
pub mod wikilink;

pub use engine::LinkEngine;
pub use error::{GraphError, GraphResult};
pub use note::{Backlink, NewNote, Note, NoteId, NotePatch, UnlinkedMention, VaultId};
pub use store::{DocumentStore, MemoryStore, SearchIndex};
