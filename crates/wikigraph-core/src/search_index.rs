use crate::note::{Note, NoteId, VaultId};
use std::collections::{HashMap, HashSet};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SearchField {
    Title,
    Content,
}

#[derive(Clone, Debug)]
struct IndexedNote {
    vault_id: VaultId,
    seq: u64,
    title_lower: String,
    content_lower: String,
    title_terms: HashMap<String, usize>,
    content_terms: HashMap<String, usize>,
}

/// Terms are OR-ed and the last one also matches as a prefix. Ties keep insertion order.
#[derive(Clone, Debug, Default)]
pub struct TextIndex {
    notes: HashMap<NoteId, IndexedNote>,
    title_inverted: HashMap<String, HashSet<NoteId>>,
    content_inverted: HashMap<String, HashSet<NoteId>>,
    next_seq: u64,
}

impl TextIndex {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn note_count(&self) -> usize {
        self.notes.len()
    }

    pub fn upsert_note(&mut self, note: &Note) {
        let seq = match self.notes.get(&note.id) {
            Some(existing) => existing.seq,
            None => {
                self.next_seq += 1;
                self.next_seq
            }
        };
        self.remove_note(&note.id);

        let title_lower = note.title.to_lowercase();
        let content_lower = note.content.to_lowercase();
        let title_terms = term_counts(&title_lower);
        let content_terms = term_counts(&content_lower);

        for term in title_terms.keys() {
            self.title_inverted
                .entry(term.clone())
                .or_default()
                .insert(note.id.clone());
        }
        for term in content_terms.keys() {
            self.content_inverted
                .entry(term.clone())
                .or_default()
                .insert(note.id.clone());
        }

        self.notes.insert(
            note.id.clone(),
            IndexedNote {
                vault_id: note.vault_id.clone(),
                seq,
                title_lower,
                content_lower,
                title_terms,
                content_terms,
            },
        );
    }

    pub fn remove_note(&mut self, id: &NoteId) {
        let Some(existing) = self.notes.remove(id) else {
            return;
        };

        for term in existing.title_terms.keys() {
            remove_posting(&mut self.title_inverted, term, id);
        }
        for term in existing.content_terms.keys() {
            remove_posting(&mut self.content_inverted, term, id);
        }
    }

    pub fn search(
        &self,
        vault: &VaultId,
        field: SearchField,
        query: &str,
        limit: usize,
    ) -> Vec<NoteId> {
        let query_lower = query.trim().to_lowercase();
        let query_terms = tokenize(&query_lower);
        if query_terms.is_empty() || limit == 0 {
            return Vec::new();
        }

        let inverted = match field {
            SearchField::Title => &self.title_inverted,
            SearchField::Content => &self.content_inverted,
        };
        let candidates = collect_candidates(inverted, &query_terms);

        let mut ranked = candidates
            .into_iter()
            .filter_map(|id| {
                let note = self.notes.get(&id)?;
                if &note.vault_id != vault {
                    return None;
                }
                let score = match field {
                    SearchField::Title => score_title(note, &query_lower, &query_terms),
                    SearchField::Content => score_content(note, &query_lower, &query_terms),
                };
                Some((score, note.seq, id))
            })
            .filter(|(score, _, _)| *score > 0)
            .collect::<Vec<_>>();

        ranked.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));
        ranked
            .into_iter()
            .take(limit)
            .map(|(_, _, id)| id)
            .collect()
    }
}

fn remove_posting(inverted: &mut HashMap<String, HashSet<NoteId>>, term: &str, id: &NoteId) {
    if let Some(ids) = inverted.get_mut(term) {
        ids.remove(id);
        if ids.is_empty() {
            inverted.remove(term);
        }
    }
}

fn collect_candidates(
    inverted: &HashMap<String, HashSet<NoteId>>,
    query_terms: &[String],
) -> HashSet<NoteId> {
    let mut out = HashSet::new();
    for term in query_terms {
        if let Some(ids) = inverted.get(term) {
            out.extend(ids.iter().cloned());
        }
    }

    if let Some(last) = query_terms.last() {
        for (term, ids) in inverted {
            if term.len() > last.len() && term.starts_with(last.as_str()) {
                out.extend(ids.iter().cloned());
            }
        }
    }
    out
}

fn term_hits(terms: &HashMap<String, usize>, query_terms: &[String]) -> (usize, usize) {
    let mut matched = 0usize;
    let mut frequency = 0usize;
    for (ix, query_term) in query_terms.iter().enumerate() {
        let is_last = ix + 1 == query_terms.len();
        let count = if is_last {
            terms
                .iter()
                .filter(|(term, _)| term.starts_with(query_term.as_str()))
                .map(|(_, count)| *count)
                .sum::<usize>()
        } else {
            terms.get(query_term).copied().unwrap_or(0)
        };
        if count > 0 {
            matched += 1;
            frequency += count;
        }
    }
    (matched, frequency)
}

fn score_title(note: &IndexedNote, query_lower: &str, query_terms: &[String]) -> usize {
    let (matched, _) = term_hits(&note.title_terms, query_terms);
    if matched == 0 {
        return 0;
    }

    let mut score = matched * 100;
    if note.title_lower == query_lower {
        score += 500;
    }
    if note.title_lower.starts_with(query_lower) {
        score += 200;
    }
    if note.title_lower.contains(query_lower) {
        score += 100;
    }
    score
}

fn score_content(note: &IndexedNote, query_lower: &str, query_terms: &[String]) -> usize {
    let (matched, frequency) = term_hits(&note.content_terms, query_terms);
    if matched == 0 {
        return 0;
    }

    let mut score = matched * 100 + frequency.min(50) * 2;
    if query_terms.len() > 1 && note.content_lower.contains(query_lower) {
        score += 150;
    }
    score
}

fn term_counts(text: &str) -> HashMap<String, usize> {
    let mut out = HashMap::new();
    for token in tokenize(text) {
        *out.entry(token).or_insert(0) += 1;
    }
    out
}

pub(crate) fn tokenize(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();

    for ch in text.chars() {
        if ch.is_alphanumeric() || ch == '_' || ch == '-' {
            current.extend(ch.to_lowercase());
        } else if !current.is_empty() {
            out.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        out.push(current);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note(id: &str, vault: &str, title: &str, content: &str) -> Note {
        Note {
            id: NoteId::new(id),
            vault_id: VaultId::new(vault),
            folder_id: None,
            title: title.to_string(),
            content: content.to_string(),
            created_at: 0,
            updated_at: 0,
        }
    }

    fn ids(out: Vec<NoteId>) -> Vec<String> {
        out.into_iter().map(|id| id.to_string()).collect()
    }

    #[test]
    fn tokenize_splits_on_punctuation_and_lowercases() {
        assert_eq!(
            tokenize("Daily-Log, [[Review]] ÄPFEL_x"),
            vec!["daily-log", "review", "äpfel_x"]
        );
    }

    #[test]
    fn title_search_prefers_exact_then_prefix() {
        let mut index = TextIndex::empty();
        index.upsert_note(&note("1", "v", "Project planning notes", ""));
        index.upsert_note(&note("2", "v", "Project", ""));
        index.upsert_note(&note("3", "v", "Unrelated", "project in body"));

        let out = index.search(&VaultId::new("v"), SearchField::Title, "project", 10);
        assert_eq!(ids(out), vec!["2", "1"]);
    }

    #[test]
    fn last_term_matches_as_prefix() {
        let mut index = TextIndex::empty();
        index.upsert_note(&note("1", "v", "Roadmap", ""));
        let out = index.search(&VaultId::new("v"), SearchField::Title, "road", 10);
        assert_eq!(ids(out), vec!["1"]);
    }

    #[test]
    fn search_is_scoped_to_vault_and_limited() {
        let mut index = TextIndex::empty();
        index.upsert_note(&note("1", "a", "", "rust rust"));
        index.upsert_note(&note("2", "b", "", "rust"));
        index.upsert_note(&note("3", "a", "", "rust"));

        let out = index.search(&VaultId::new("a"), SearchField::Content, "rust", 10);
        assert_eq!(ids(out), vec!["1", "3"]);

        let limited = index.search(&VaultId::new("a"), SearchField::Content, "rust", 1);
        assert_eq!(ids(limited), vec!["1"]);
    }

    #[test]
    fn upsert_replaces_terms_and_remove_drops_note() {
        let mut index = TextIndex::empty();
        index.upsert_note(&note("1", "v", "Alpha", "first body"));
        index.upsert_note(&note("1", "v", "Beta", "second body"));
        let vault = VaultId::new("v");

        assert!(index.search(&vault, SearchField::Title, "alpha", 10).is_empty());
        assert_eq!(ids(index.search(&vault, SearchField::Title, "beta", 10)), vec!["1"]);
        assert_eq!(index.note_count(), 1);

        index.remove_note(&NoteId::new("1"));
        assert!(index.search(&vault, SearchField::Content, "second", 10).is_empty());
        assert_eq!(index.note_count(), 0);
    }

    #[test]
    fn blank_query_returns_nothing() {
        let mut index = TextIndex::empty();
        index.upsert_note(&note("1", "v", "Alpha", "body"));
        assert!(index.search(&VaultId::new("v"), SearchField::Title, "  ", 10).is_empty());
    }
}
