use crate::note::Note;

/// Substring hits score `1000 - position`; in-order fuzzy hits add `10 + 5 * run` per char; -1 when unmatched.
pub fn fuzzy_score(query: &str, title: &str) -> i64 {
    let query = query.to_lowercase();
    let title = title.to_lowercase();

    if let Some(byte_ix) = title.find(&query) {
        return 1000 - title[..byte_ix].chars().count() as i64;
    }

    let query_chars = query.chars().collect::<Vec<_>>();
    let mut qi = 0usize;
    let mut score = 0i64;
    let mut consecutive = 0i64;

    for ch in title.chars() {
        if qi >= query_chars.len() {
            break;
        }
        if ch == query_chars[qi] {
            score += 10 + consecutive * 5;
            consecutive += 1;
            qi += 1;
        } else {
            consecutive = 0;
        }
    }

    if qi < query_chars.len() {
        return -1;
    }
    score
}

pub fn quick_switch<'a>(notes: &'a [Note], query: &str, max_results: usize) -> Vec<&'a Note> {
    if query.trim().is_empty() {
        return notes.iter().take(max_results).collect();
    }

    let mut ranked = notes
        .iter()
        .map(|note| (fuzzy_score(query, &note.title), note))
        .filter(|(score, _)| *score > 0)
        .collect::<Vec<_>>();
    ranked.sort_by(|a, b| b.0.cmp(&a.0));
    ranked
        .into_iter()
        .take(max_results)
        .map(|(_, note)| note)
        .collect()
}
