use crate::note::{Note, NoteId, UnlinkedMention};
use crate::wikilink::is_unlinked_mention;
use tracing::debug;

/// Only the first line containing the title is judged, so a linked first line hides later mentions.
pub fn get_unlinked_mentions(
    corpus: &[Note],
    target_title: &str,
    exclude: Option<&NoteId>,
) -> Vec<UnlinkedMention> {
    if target_title.is_empty() {
        return Vec::new();
    }

    let title_lower = target_title.to_lowercase();
    let mut out = Vec::new();
    for note in corpus {
        if exclude == Some(&note.id) {
            continue;
        }
        if !note.content.to_lowercase().contains(&title_lower) {
            continue;
        }

        let Some(line) = note
            .content
            .split('\n')
            .find(|line| line.to_lowercase().contains(&title_lower))
        else {
            continue;
        };
        if !is_unlinked_mention(line, target_title) {
            continue;
        }

        out.push(UnlinkedMention {
            note_id: note.id.clone(),
            note_title: note.title.clone(),
            context: line.trim().to_string(),
        });
    }

    debug!(
        target_title,
        scanned = corpus.len(),
        hits = out.len(),
        "computed unlinked mentions"
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::note::VaultId;

    fn note(id: &str, title: &str, content: &str) -> Note {
        Note {
            id: NoteId::new(id),
            vault_id: VaultId::new("v"),
            folder_id: None,
            title: title.to_string(),
            content: content.to_string(),
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn linked_lines_are_excluded_and_plain_lines_reported() {
        let corpus = vec![
            note("1", "Linked", "See [[Daily Log]] for details"),
            note("2", "Plain", "  I wrote about Daily Log today  "),
        ];
        let out = get_unlinked_mentions(&corpus, "Daily Log", None);
        assert_eq!(
            out,
            vec![UnlinkedMention {
                note_id: NoteId::new("2"),
                note_title: "Plain".to_string(),
                context: "I wrote about Daily Log today".to_string(),
            }]
        );
    }

    #[test]
    fn empty_title_yields_nothing() {
        let corpus = vec![note("1", "A", "anything")];
        assert!(get_unlinked_mentions(&corpus, "", None).is_empty());
    }

    #[test]
    fn match_is_case_insensitive_and_excludes_target() {
        let corpus = vec![
            note("1", "Daily Log", "daily log mentions itself"),
            note("2", "B", "DAILY LOG in caps"),
        ];
        let out = get_unlinked_mentions(&corpus, "Daily Log", Some(&NoteId::new("1")));
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].note_id, NoteId::new("2"));
    }

    #[test]
    fn first_matching_line_decides_for_the_whole_note() {
        let corpus = vec![note(
            "1",
            "A",
            "Linked: [[Daily Log]]\nLater a plain Daily Log mention",
        )];
        assert!(get_unlinked_mentions(&corpus, "Daily Log", None).is_empty());
    }

    #[test]
    fn closed_links_before_the_mention_do_not_hide_it() {
        let corpus = vec![note("1", "A", "[[Other]] then Daily Log")];
        let out = get_unlinked_mentions(&corpus, "Daily Log", None);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].context, "[[Other]] then Daily Log");
    }
}
