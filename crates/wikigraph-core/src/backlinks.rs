use crate::note::{Backlink, Note, NoteId};
use crate::wikilink::LinkPatterns;
use tracing::{debug, warn};

/// One entry per linking note; `context` is its first linking line.
pub fn get_backlinks(corpus: &[Note], target_title: &str, exclude: Option<&NoteId>) -> Vec<Backlink> {
    let patterns = LinkPatterns::new(target_title);

    let mut out = Vec::new();
    for note in corpus {
        if exclude == Some(&note.id) {
            continue;
        }
        if !patterns.matches(&note.content) {
            continue;
        }

        // `\n` split keeps `\r` on CRLF lines, which never touches a pattern.
        let context = match note.content.split('\n').find(|line| patterns.matches(line)) {
            Some(line) => line.to_string(),
            None => {
                warn!(note_id = %note.id, "backlink matched content but no single line");
                String::new()
            }
        };

        out.push(Backlink {
            note_id: note.id.clone(),
            note_title: note.title.clone(),
            context,
        });
    }

    debug!(
        target_title,
        scanned = corpus.len(),
        hits = out.len(),
        "computed backlinks"
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
    fn daily_log_scenario() {
        let corpus = vec![
            note("1", "Daily Log", "Nothing"),
            note("2", "Review", "See [[Daily Log]] today."),
        ];
        let out = get_backlinks(&corpus, "Daily Log", Some(&NoteId::new("1")));
        assert_eq!(
            out,
            vec![Backlink {
                note_id: NoteId::new("2"),
                note_title: "Review".to_string(),
                context: "See [[Daily Log]] today.".to_string(),
            }]
        );
    }

    #[test]
    fn one_entry_per_source_with_first_matching_line() {
        let corpus = vec![note(
            "2",
            "Review",
            "intro\nfirst [[Daily Log|log]]\nsecond [[Daily Log]]",
        )];
        let out = get_backlinks(&corpus, "Daily Log", None);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].context, "first [[Daily Log|log]]");
    }

    #[test]
    fn excluded_note_and_prefix_titles_do_not_match() {
        let corpus = vec![
            note("1", "Daily Log", "self [[Daily Log]]"),
            note("2", "Other", "[[Daily Log 2]] and [[Daily]]"),
            note("3", "Heading", "jump to [[Daily Log#Morning]]"),
        ];
        let out = get_backlinks(&corpus, "Daily Log", Some(&NoteId::new("1")));
        let ids = out.iter().map(|b| b.note_id.as_str()).collect::<Vec<_>>();
        assert_eq!(ids, vec!["3"]);
    }

    #[test]
    fn result_follows_corpus_order() {
        let corpus = vec![
            note("9", "Z", "[[T]]"),
            note("1", "A", "[[T]]"),
            note("5", "M", "[[T]]"),
        ];
        let ids = get_backlinks(&corpus, "T", None)
            .into_iter()
            .map(|b| b.note_id.to_string())
            .collect::<Vec<_>>();
        assert_eq!(ids, vec!["9", "1", "5"]);
    }

    #[test]
    fn dangling_links_are_not_errors() {
        let corpus = vec![note("1", "A", "[[Deleted Note]]")];
        assert!(get_backlinks(&corpus, "Missing", None).is_empty());
    }
}
