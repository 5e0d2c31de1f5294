use crate::note::Note;
use regex::Regex;
use std::sync::OnceLock;

/// The first `|` wins: `Title|Alias#Heading` has alias `Alias#Heading` and no heading.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WikiLinkParts {
    pub title: String,
    pub alias: Option<String>,
    pub heading: Option<String>,
}

impl WikiLinkParts {
    pub fn display_text(&self) -> String {
        if let Some(alias) = &self.alias {
            return alias.clone();
        }
        if let Some(heading) = &self.heading {
            return format!("{}#{}", self.title, heading);
        }
        self.title.clone()
    }
}

pub fn parse_link_inner(inner: &str) -> WikiLinkParts {
    if let Some((title, alias)) = inner.split_once('|') {
        return WikiLinkParts {
            title: title.to_string(),
            alias: Some(alias.to_string()),
            heading: None,
        };
    }

    if let Some((title, heading)) = inner.split_once('#') {
        return WikiLinkParts {
            title: title.to_string(),
            alias: None,
            heading: Some(heading.to_string()),
        };
    }

    WikiLinkParts {
        title: inner.to_string(),
        alias: None,
        heading: None,
    }
}

/// Byte offsets, brackets included.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WikiLinkSpan {
    pub start: usize,
    pub end: usize,
    pub inner: String,
}

impl WikiLinkSpan {
    pub fn parts(&self) -> WikiLinkParts {
        parse_link_inner(&self.inner)
    }

    pub fn contains(&self, offset: usize) -> bool {
        offset >= self.start && offset < self.end
    }
}

fn wikilink_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\[\[([^\]]+)\]\]").expect("wikilink pattern compiles"))
}

fn link_target_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\[\[([^\]|#]+)").expect("link target pattern compiles"))
}

pub fn find_wikilink_spans(text: &str) -> Vec<WikiLinkSpan> {
    wikilink_regex()
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let inner = caps.get(1)?;
            Some(WikiLinkSpan {
                start: whole.start(),
                end: whole.end(),
                inner: inner.as_str().to_string(),
            })
        })
        .collect()
}

pub fn link_targets(text: &str) -> Vec<String> {
    link_target_regex()
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|title| !title.is_empty())
        .collect()
}

/// Literal substring forms `[[T]]`, `[[T|`, `[[T#`; `[[T 2]]` is not a link to `T`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LinkPatterns {
    plain: String,
    alias: String,
    heading: String,
}

impl LinkPatterns {
    pub fn new(title: &str) -> Self {
        Self {
            plain: format!("[[{title}]]"),
            alias: format!("[[{title}|"),
            heading: format!("[[{title}#"),
        }
    }

    pub fn matches(&self, text: &str) -> bool {
        text.contains(&self.plain) || text.contains(&self.alias) || text.contains(&self.heading)
    }

    fn pairs<'a>(&'a self, to: &'a LinkPatterns) -> [(&'a str, &'a str); 3] {
        [
            (self.plain.as_str(), to.plain.as_str()),
            (self.alias.as_str(), to.alias.as_str()),
            (self.heading.as_str(), to.heading.as_str()),
        ]
    }
}

pub fn content_has_backlink_to(content: &str, title: &str) -> bool {
    LinkPatterns::new(title).matches(content)
}

pub fn apply_wikilink_rename(content: &str, old_title: &str, new_title: &str) -> String {
    let from = LinkPatterns::new(old_title);
    let to = LinkPatterns::new(new_title);

    let mut result = content.to_string();
    for (find, replace) in from.pairs(&to) {
        if result.contains(find) {
            result = result.replace(find, replace);
        }
    }
    result
}

/// Only the first case-insensitive occurrence on the line is judged.
pub fn is_unlinked_mention(line: &str, title: &str) -> bool {
    let line_lower = line.to_lowercase();
    let title_lower = title.to_lowercase();
    let Some(idx) = line_lower.find(&title_lower) else {
        return false;
    };

    // Brackets are ASCII, so the lowercased prefix has them at the same places.
    let before = &line_lower[..idx];
    before.rfind("[[") <= before.rfind("]]")
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LinkCompletion {
    pub label: String,
    pub apply: String,
}

pub fn complete_link_titles(notes: &[Note], typed: &str) -> Vec<LinkCompletion> {
    let query = typed.to_lowercase();
    notes
        .iter()
        .filter(|note| note.title.to_lowercase().contains(&query))
        .map(|note| LinkCompletion {
            label: note.title.clone(),
            apply: format!("{}]]", note.title),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::note::{NoteId, VaultId};

    fn parts(title: &str, alias: Option<&str>, heading: Option<&str>) -> WikiLinkParts {
        WikiLinkParts {
            title: title.to_string(),
            alias: alias.map(str::to_string),
            heading: heading.map(str::to_string),
        }
    }

    #[test]
    fn parse_plain_title() {
        assert_eq!(parse_link_inner("My Note"), parts("My Note", None, None));
    }

    #[test]
    fn parse_alias_and_heading() {
        assert_eq!(
            parse_link_inner("My Note|display text"),
            parts("My Note", Some("display text"), None)
        );
        assert_eq!(
            parse_link_inner("My Note#Section"),
            parts("My Note", None, Some("Section"))
        );
    }

    #[test]
    fn pipe_takes_precedence_over_hash() {
        assert_eq!(
            parse_link_inner("A|B#C"),
            parts("A", Some("B#C"), None)
        );
        assert_eq!(
            parse_link_inner("A#B|C"),
            parts("A#B", Some("C"), None)
        );
    }

    #[test]
    fn parse_empty_inner() {
        assert_eq!(parse_link_inner(""), parts("", None, None));
    }

    #[test]
    fn display_text_follows_editor_convention() {
        assert_eq!(parse_link_inner("Note|Shown").display_text(), "Shown");
        assert_eq!(parse_link_inner("Note#Part").display_text(), "Note#Part");
        assert_eq!(parse_link_inner("Note").display_text(), "Note");
    }

    #[test]
    fn spans_are_ordered_and_skip_malformed_links() {
        let text = "a [[One]] b [[Two|2]] c [[]] empty [[ unterminated";
        let spans = find_wikilink_spans(text);
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].inner, "One");
        assert_eq!(&text[spans[0].start..spans[0].end], "[[One]]");
        assert_eq!(spans[1].inner, "Two|2");
        assert_eq!(spans[1].parts().alias.as_deref(), Some("2"));
        assert!(spans[0].contains(spans[0].start));
        assert!(!spans[0].contains(spans[0].end));
    }

    #[test]
    fn link_targets_stop_at_separators() {
        let text = "[[Alpha]] [[ Beta |b]] [[Gamma#h]] [[Alpha]]";
        assert_eq!(link_targets(text), vec!["Alpha", "Beta", "Gamma", "Alpha"]);
    }

    #[test]
    fn backlink_detection_uses_exact_title_prefix() {
        assert!(content_has_backlink_to("See [[Daily Log]] for details.", "Daily Log"));
        assert!(content_has_backlink_to("See [[Daily Log|log]] here.", "Daily Log"));
        assert!(content_has_backlink_to("See [[Daily Log#Heading]].", "Daily Log"));
        assert!(!content_has_backlink_to("No links here.", "Daily Log"));
        assert!(!content_has_backlink_to("See [[Daily]] here.", "Daily Log"));
        assert!(!content_has_backlink_to("See [[Daily Log 2]] here.", "Daily Log"));
    }

    #[test]
    fn rename_rewrites_all_three_forms() {
        let content = "[[Foo]] and [[Foo|alias]] and [[Foo#H]]";
        assert_eq!(
            apply_wikilink_rename(content, "Foo", "Baz"),
            "[[Baz]] and [[Baz|alias]] and [[Baz#H]]"
        );
    }

    #[test]
    fn rename_rewrites_every_occurrence_and_leaves_others() {
        let content = "[[Old Name]] x [[Old Name]] y [[Old Names]] z [[old name]]";
        assert_eq!(
            apply_wikilink_rename(content, "Old Name", "New Name"),
            "[[New Name]] x [[New Name]] y [[Old Names]] z [[old name]]"
        );
        let untouched = "Nothing to change here.";
        assert_eq!(apply_wikilink_rename(untouched, "Old Name", "New Name"), untouched);
    }

    #[test]
    fn unlinked_mention_rules() {
        assert!(is_unlinked_mention("I wrote about Daily Log today.", "Daily Log"));
        assert!(is_unlinked_mention("I wrote about daily log today.", "Daily Log"));
        assert!(!is_unlinked_mention("See [[Daily Log]] for details.", "Daily Log"));
        assert!(!is_unlinked_mention("Nothing relevant here.", "Daily Log"));
        assert!(is_unlinked_mention("[[Other]] then Daily Log", "Daily Log"));
    }

    #[test]
    fn unlinked_mention_only_checks_first_occurrence() {
        // First hit sits inside a link, so the later plain mention is not considered.
        assert!(!is_unlinked_mention("[[Daily Log]] and Daily Log", "Daily Log"));
    }

    #[test]
    fn completion_filters_case_insensitively() {
        let note = |id: &str, title: &str| Note {
            id: NoteId::new(id),
            vault_id: VaultId::new("v"),
            folder_id: None,
            title: title.to_string(),
            content: String::new(),
            created_at: 0,
            updated_at: 0,
        };
        let notes = vec![note("1", "Daily Log"), note("2", "Review"), note("3", "Log Book")];
        let out = complete_link_titles(&notes, "log");
        let labels = out.iter().map(|c| c.label.as_str()).collect::<Vec<_>>();
        assert_eq!(labels, vec!["Daily Log", "Log Book"]);
        assert_eq!(out[0].apply, "Daily Log]]");
    }
}
