use crate::error::{GraphError, GraphResult};
use crate::note::{now_millis, Note, NoteId, NotePatch, VaultId};
use crate::settings::PropagationMode;
use crate::store::DocumentStore;
use crate::wikilink::apply_wikilink_rename;
use tracing::{debug, info};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenameOutcome {
    pub note_id: NoteId,
    pub old_title: String,
    pub new_title: String,
    pub rewritten: Vec<NoteId>,
}

pub fn plan_rename(
    corpus: &[Note],
    renamed: &NoteId,
    old_title: &str,
    new_title: &str,
) -> Vec<(NoteId, String)> {
    if old_title == new_title {
        return Vec::new();
    }

    corpus
        .iter()
        .filter(|note| &note.id != renamed)
        .filter_map(|note| {
            let updated = apply_wikilink_rename(&note.content, old_title, new_title);
            (updated != note.content).then(|| (note.id.clone(), updated))
        })
        .collect()
}

/// Fails before any write if the note is missing. With [`PropagationMode::PerNote`] a failed
/// write leaves earlier rewrites in place.
pub fn rename_note<S: DocumentStore + ?Sized>(
    store: &S,
    vault: &VaultId,
    note_id: &NoteId,
    new_title: &str,
    mode: PropagationMode,
) -> GraphResult<RenameOutcome> {
    let note = store
        .get_note(note_id)?
        .filter(|note| &note.vault_id == vault)
        .ok_or_else(|| GraphError::note_not_found(note_id))?;
    let old_title = note.title;

    info!(%note_id, %old_title, new_title, "renaming note");
    store.patch_note(note_id, &NotePatch::title(new_title, now_millis()))?;

    let mut outcome = RenameOutcome {
        note_id: note_id.clone(),
        old_title,
        new_title: new_title.to_string(),
        rewritten: Vec::new(),
    };
    if outcome.old_title == outcome.new_title {
        return Ok(outcome);
    }

    let corpus = store.list_notes_by_vault(&note.vault_id)?;
    let plan = plan_rename(&corpus, note_id, &outcome.old_title, new_title);
    debug!(scanned = corpus.len(), planned = plan.len(), "planned link rewrites");

    match mode {
        PropagationMode::PerNote => {
            for (id, content) in plan {
                store
                    .patch_note(&id, &NotePatch::content(content, now_millis()))
                    .map_err(|source| GraphError::Propagation {
                        rewritten: outcome.rewritten.len(),
                        source,
                    })?;
                outcome.rewritten.push(id);
            }
        }
        PropagationMode::Batch => {
            let now = now_millis();
            let patches = plan
                .into_iter()
                .map(|(id, content)| (id, NotePatch::content(content, now)))
                .collect::<Vec<_>>();
            store
                .patch_notes(&patches)
                .map_err(|source| GraphError::Propagation {
                    rewritten: 0,
                    source,
                })?;
            outcome.rewritten = patches.into_iter().map(|(id, _)| id).collect();
        }
    }

    info!(
        %note_id,
        rewritten = outcome.rewritten.len(),
        "rename propagated"
    );
    Ok(outcome)
}
