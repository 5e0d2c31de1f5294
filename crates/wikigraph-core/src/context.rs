use crate::error::{GraphError, GraphResult};
use crate::note::{Note, NoteId, VaultId};
use crate::settings::ContextSettings;
use crate::store::{DocumentStore, SearchIndex};
use anyhow::Result;
use std::collections::HashSet;
use tracing::debug;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AssembledContext {
    pub context: String,
    pub active_note_title: Option<String>,
    pub included: Vec<NoteId>,
    pub truncated: bool,
}

pub fn merge_search_results(
    title_hits: Vec<Note>,
    content_hits: Vec<Note>,
    exclude: Option<&NoteId>,
) -> Vec<Note> {
    let mut seen = HashSet::new();
    if let Some(id) = exclude {
        seen.insert(id.clone());
    }

    title_hits
        .into_iter()
        .chain(content_hits)
        .filter(|note| seen.insert(note.id.clone()))
        .collect()
}

pub fn search_notes<I: SearchIndex + ?Sized>(
    index: &I,
    vault: &VaultId,
    query: &str,
    limit: usize,
) -> Result<Vec<Note>> {
    let mut ranked = ranked_matches(index, vault, query, limit, None)?;
    ranked.truncate(limit);
    Ok(ranked)
}

fn ranked_matches<I: SearchIndex + ?Sized>(
    index: &I,
    vault: &VaultId,
    query: &str,
    limit: usize,
    exclude: Option<&NoteId>,
) -> Result<Vec<Note>> {
    if query.trim().is_empty() {
        return Ok(Vec::new());
    }

    let title_hits = index.search_by_title(vault, query, limit)?;
    let content_hits = index.search_by_content(vault, query, limit)?;
    Ok(merge_search_results(title_hits, content_hits, exclude))
}

pub fn render_full_block(note: &Note) -> String {
    format!("## {}\n\n{}\n\n---\n\n", note.title, note.content)
}

pub fn render_title_block(note: &Note) -> String {
    format!("## {} (title only)\n\n---\n\n", note.title)
}

pub fn render_active_block(note: &Note) -> String {
    format!(
        "## ACTIVE NOTE: {}\n(This is the note currently open in the editor)\n\n{}\n\n---\n\n",
        note.title, note.content
    )
}

struct ContextBuilder {
    out: AssembledContext,
    used_chars: usize,
    max_chars: usize,
}

impl ContextBuilder {
    fn new(max_chars: usize) -> Self {
        Self {
            out: AssembledContext::default(),
            used_chars: 0,
            max_chars,
        }
    }

    fn push_unbudgeted(&mut self, id: &NoteId, block: &str) {
        self.out.context.push_str(block);
        self.out.included.push(id.clone());
        self.used_chars += block.chars().count();
    }

    // The first block that does not fit closes the builder.
    fn push(&mut self, id: &NoteId, block: &str) -> bool {
        if self.out.truncated {
            return false;
        }
        let len = block.chars().count();
        if self.used_chars + len > self.max_chars {
            self.out.truncated = true;
            return false;
        }
        self.out.context.push_str(block);
        self.out.included.push(id.clone());
        self.used_chars += len;
        true
    }

    fn push_tiers(&mut self, ranked: &[Note], settings: &ContextSettings) {
        let full = settings.full_content_notes.min(ranked.len());
        let cap = settings.chat_result_limit.max(full).min(ranked.len());

        for note in &ranked[..full] {
            if !self.push(&note.id, &render_full_block(note)) {
                return;
            }
        }
        for note in &ranked[full..cap] {
            if !self.push(&note.id, &render_title_block(note)) {
                return;
            }
        }
    }

    fn finish(self) -> AssembledContext {
        self.out
    }
}

pub fn build_context<S>(
    store: &S,
    vault: &VaultId,
    query: &str,
    settings: &ContextSettings,
) -> GraphResult<AssembledContext>
where
    S: DocumentStore + SearchIndex + ?Sized,
{
    assemble(store, vault, query, None, settings)
}

/// The active note is rendered first even past `max_chars`; later blocks get what is left.
pub fn build_edit_context<S>(
    store: &S,
    vault: &VaultId,
    query: &str,
    active_note_id: Option<&NoteId>,
    settings: &ContextSettings,
) -> GraphResult<AssembledContext>
where
    S: DocumentStore + SearchIndex + ?Sized,
{
    let active = match active_note_id {
        Some(id) => Some(
            store
                .get_note(id)?
                .filter(|note| &note.vault_id == vault)
                .ok_or_else(|| GraphError::note_not_found(id))?,
        ),
        None => None,
    };
    assemble(store, vault, query, active.as_ref(), settings)
}

fn assemble<S>(
    store: &S,
    vault: &VaultId,
    query: &str,
    active: Option<&Note>,
    settings: &ContextSettings,
) -> GraphResult<AssembledContext>
where
    S: DocumentStore + SearchIndex + ?Sized,
{
    let mut builder = ContextBuilder::new(settings.max_chars);
    let active_id = active.map(|note| &note.id);

    if let Some(note) = active {
        builder.out.active_note_title = Some(note.title.clone());
        builder.push_unbudgeted(&note.id, &render_active_block(note));
    }

    let mut ranked = ranked_matches(store, vault, query, settings.chat_result_limit, active_id)?;
    let fallback = ranked.is_empty();
    if fallback {
        ranked = store
            .list_notes_by_vault(vault)?
            .into_iter()
            .take(settings.fallback_note_limit)
            .filter(|note| Some(&note.id) != active_id)
            .collect();
    }

    builder.push_tiers(&ranked, settings);
    let out = builder.finish();

    debug!(
        %vault,
        ranked = ranked.len(),
        fallback,
        included = out.included.len(),
        chars = out.context.chars().count(),
        truncated = out.truncated,
        "assembled chat context"
    );
    Ok(out)
}
