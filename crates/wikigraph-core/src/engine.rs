use crate::backlinks::get_backlinks;
use crate::context::{build_context, build_edit_context, search_notes, AssembledContext};
use crate::edit_blocks::{EditBlock, EditKind, EditStatus};
use crate::error::{GraphError, GraphResult};
use crate::graph::{build_link_graph, LinkGraph};
use crate::mentions::get_unlinked_mentions;
use crate::note::{now_millis, Backlink, NewNote, Note, NoteId, NotePatch, UnlinkedMention, VaultId};
use crate::quick_switch::quick_switch;
use crate::rename::{rename_note, RenameOutcome};
use crate::settings::EngineSettings;
use crate::store::{DocumentStore, SearchIndex};
use crate::wikilink::{complete_link_titles, LinkCompletion};
use anyhow::anyhow;

/// Unknown note ids and ids from another vault are [`GraphError::NotFound`].
pub struct LinkEngine<S> {
    store: S,
    settings: EngineSettings,
}

impl<S> LinkEngine<S>
where
    S: DocumentStore + SearchIndex,
{
    pub fn new(store: S, settings: EngineSettings) -> Self {
        Self { store, settings }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn note(&self, vault: &VaultId, note_id: &NoteId) -> GraphResult<Note> {
        self.store
            .get_note(note_id)?
            .filter(|note| &note.vault_id == vault)
            .ok_or_else(|| GraphError::note_not_found(note_id))
    }

    pub fn backlinks(&self, vault: &VaultId, note_id: &NoteId) -> GraphResult<Vec<Backlink>> {
        let target = self.note(vault, note_id)?;
        let corpus = self.store.list_notes_by_vault(vault)?;
        Ok(get_backlinks(&corpus, &target.title, Some(&target.id)))
    }

    pub fn unlinked_mentions(
        &self,
        vault: &VaultId,
        note_id: &NoteId,
    ) -> GraphResult<Vec<UnlinkedMention>> {
        let target = self.note(vault, note_id)?;
        if target.title.is_empty() {
            return Ok(Vec::new());
        }
        let corpus = self.store.list_notes_by_vault(vault)?;
        Ok(get_unlinked_mentions(&corpus, &target.title, Some(&target.id)))
    }

    pub fn rename(
        &self,
        vault: &VaultId,
        note_id: &NoteId,
        new_title: &str,
    ) -> GraphResult<RenameOutcome> {
        rename_note(
            &self.store,
            vault,
            note_id,
            new_title,
            self.settings.rename.propagation,
        )
    }

    pub fn update_content(&self, vault: &VaultId, note_id: &NoteId, content: &str) -> GraphResult<()> {
        self.note(vault, note_id)?;
        self.store
            .patch_note(note_id, &NotePatch::content(content, now_millis()))?;
        Ok(())
    }

    pub fn search(&self, vault: &VaultId, query: &str) -> GraphResult<Vec<Note>> {
        Ok(search_notes(
            &self.store,
            vault,
            query,
            self.settings.search.result_limit,
        )?)
    }

    pub fn build_context(&self, vault: &VaultId, query: &str) -> GraphResult<AssembledContext> {
        build_context(&self.store, vault, query, &self.settings.context)
    }

    pub fn build_edit_context(
        &self,
        vault: &VaultId,
        query: &str,
        active_note_id: Option<&NoteId>,
    ) -> GraphResult<AssembledContext> {
        build_edit_context(
            &self.store,
            vault,
            query,
            active_note_id,
            &self.settings.context,
        )
    }

    pub fn link_graph(&self, vault: &VaultId) -> GraphResult<LinkGraph> {
        let notes = self.store.list_notes_by_vault(vault)?;
        Ok(build_link_graph(&notes))
    }

    pub fn quick_switch(&self, vault: &VaultId, query: &str) -> GraphResult<Vec<Note>> {
        let notes = self.store.list_notes_by_vault(vault)?;
        Ok(
            quick_switch(&notes, query, self.settings.quick_switch.max_results)
                .into_iter()
                .cloned()
                .collect(),
        )
    }

    pub fn complete_link(&self, vault: &VaultId, typed: &str) -> GraphResult<Vec<LinkCompletion>> {
        let notes = self.store.list_notes_by_vault(vault)?;
        Ok(complete_link_titles(&notes, typed))
    }

    /// `edit` targets the first note whose title matches case-insensitively.
    pub fn apply_edit_block(&self, vault: &VaultId, block: &mut EditBlock) -> GraphResult<NoteId> {
        if !block.is_pending() {
            return Err(
                anyhow!("edit block for {} is already {:?}", block.note_title, block.status).into(),
            );
        }

        let id = match block.kind {
            EditKind::Edit => {
                let wanted = block.note_title.to_lowercase();
                let target = self
                    .store
                    .list_notes_by_vault(vault)?
                    .into_iter()
                    .find(|note| note.title.to_lowercase() == wanted)
                    .ok_or_else(|| GraphError::note_not_found(&block.note_title))?;
                self.store
                    .patch_note(&target.id, &NotePatch::content(block.content.clone(), now_millis()))?;
                target.id
            }
            EditKind::Create => {
                let note = NewNote::new(vault.clone(), block.note_title.clone())
                    .with_content(block.content.clone());
                self.store.insert_note(note)?
            }
        };
        block.status = EditStatus::Applied;
        Ok(id)
    }
}
