use crate::note::{now_millis, NewNote, Note, NoteId, NotePatch, VaultId};
use crate::search_index::{SearchField, TextIndex};
use anyhow::{anyhow, Result};
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

pub trait DocumentStore {
    fn list_notes_by_vault(&self, vault: &VaultId) -> Result<Vec<Note>>;
    fn get_note(&self, id: &NoteId) -> Result<Option<Note>>;
    fn patch_note(&self, id: &NoteId, patch: &NotePatch) -> Result<()>;
    fn insert_note(&self, note: NewNote) -> Result<NoteId>;

    fn patch_notes(&self, patches: &[(NoteId, NotePatch)]) -> Result<()> {
        for (id, patch) in patches {
            self.patch_note(id, patch)?;
        }
        Ok(())
    }
}

pub trait SearchIndex {
    fn search_by_title(&self, vault: &VaultId, query: &str, limit: usize) -> Result<Vec<Note>>;
    fn search_by_content(&self, vault: &VaultId, query: &str, limit: usize) -> Result<Vec<Note>>;
}

impl<T: DocumentStore + ?Sized> DocumentStore for &T {
    fn list_notes_by_vault(&self, vault: &VaultId) -> Result<Vec<Note>> {
        (**self).list_notes_by_vault(vault)
    }

    fn get_note(&self, id: &NoteId) -> Result<Option<Note>> {
        (**self).get_note(id)
    }

    fn patch_note(&self, id: &NoteId, patch: &NotePatch) -> Result<()> {
        (**self).patch_note(id, patch)
    }

    fn insert_note(&self, note: NewNote) -> Result<NoteId> {
        (**self).insert_note(note)
    }

    fn patch_notes(&self, patches: &[(NoteId, NotePatch)]) -> Result<()> {
        (**self).patch_notes(patches)
    }
}

impl<T: SearchIndex + ?Sized> SearchIndex for &T {
    fn search_by_title(&self, vault: &VaultId, query: &str, limit: usize) -> Result<Vec<Note>> {
        (**self).search_by_title(vault, query, limit)
    }

    fn search_by_content(&self, vault: &VaultId, query: &str, limit: usize) -> Result<Vec<Note>> {
        (**self).search_by_content(vault, query, limit)
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    notes: HashMap<NoteId, Note>,
    order: Vec<NoteId>,
    index: TextIndex,
}

impl MemoryState {
    fn put(&mut self, note: Note) {
        if !self.notes.contains_key(&note.id) {
            self.order.push(note.id.clone());
        }
        self.index.upsert_note(&note);
        self.notes.insert(note.id.clone(), note);
    }

    fn patch(&mut self, id: &NoteId, patch: &NotePatch) -> Result<()> {
        let note = self
            .notes
            .get_mut(id)
            .ok_or_else(|| anyhow!("note not found: {id}"))?;
        patch.apply_to(note);
        self.index.upsert_note(note);
        Ok(())
    }

    fn search(&self, vault: &VaultId, field: SearchField, query: &str, limit: usize) -> Vec<Note> {
        self.index
            .search(vault, field, query, limit)
            .into_iter()
            .filter_map(|id| self.notes.get(&id).cloned())
            .collect()
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_note(&self, note: Note) -> Result<()> {
        self.write()?.put(note);
        Ok(())
    }

    pub fn remove_note(&self, id: &NoteId) -> Result<bool> {
        let mut state = self.write()?;
        let removed = state.notes.remove(id).is_some();
        if removed {
            state.order.retain(|existing| existing != id);
            state.index.remove_note(id);
        }
        Ok(removed)
    }

    pub fn note_count(&self) -> Result<usize> {
        Ok(self.read()?.notes.len())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, MemoryState>> {
        self.state
            .read()
            .map_err(|_| anyhow!("memory store lock poisoned"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, MemoryState>> {
        self.state
            .write()
            .map_err(|_| anyhow!("memory store lock poisoned"))
    }
}

impl DocumentStore for MemoryStore {
    fn list_notes_by_vault(&self, vault: &VaultId) -> Result<Vec<Note>> {
        let state = self.read()?;
        Ok(state
            .order
            .iter()
            .filter_map(|id| state.notes.get(id))
            .filter(|note| &note.vault_id == vault)
            .cloned()
            .collect())
    }

    fn get_note(&self, id: &NoteId) -> Result<Option<Note>> {
        Ok(self.read()?.notes.get(id).cloned())
    }

    fn patch_note(&self, id: &NoteId, patch: &NotePatch) -> Result<()> {
        self.write()?.patch(id, patch)
    }

    fn insert_note(&self, note: NewNote) -> Result<NoteId> {
        let now = now_millis();
        let id = NoteId::generate();
        self.write()?.put(Note {
            id: id.clone(),
            vault_id: note.vault_id,
            folder_id: note.folder_id,
            title: note.title,
            content: note.content,
            created_at: now,
            updated_at: now,
        });
        Ok(id)
    }

    // All-or-nothing: ids are checked before any write.
    fn patch_notes(&self, patches: &[(NoteId, NotePatch)]) -> Result<()> {
        let mut state = self.write()?;
        if let Some((missing, _)) = patches.iter().find(|(id, _)| !state.notes.contains_key(id)) {
            return Err(anyhow!("note not found: {missing}"));
        }
        for (id, patch) in patches {
            state.patch(id, patch)?;
        }
        Ok(())
    }
}

impl SearchIndex for MemoryStore {
    fn search_by_title(&self, vault: &VaultId, query: &str, limit: usize) -> Result<Vec<Note>> {
        Ok(self.read()?.search(vault, SearchField::Title, query, limit))
    }

    fn search_by_content(&self, vault: &VaultId, query: &str, limit: usize) -> Result<Vec<Note>> {
        Ok(self.read()?.search(vault, SearchField::Content, query, limit))
    }
}
