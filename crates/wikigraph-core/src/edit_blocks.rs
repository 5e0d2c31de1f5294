use regex::Regex;
use std::sync::OnceLock;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EditKind {
    Edit,
    Create,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum EditStatus {
    #[default]
    Pending,
    Applied,
    Dismissed,
}

/// Opened by a four-backtick `edit:<title>` or `create:<title>` line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EditBlock {
    pub kind: EditKind,
    pub note_title: String,
    pub content: String,
    pub status: EditStatus,
}

impl EditBlock {
    pub fn is_pending(&self) -> bool {
        self.status == EditStatus::Pending
    }

    pub fn dismiss(&mut self) {
        if self.is_pending() {
            self.status = EditStatus::Dismissed;
        }
    }
}

fn edit_block_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"````(edit|create):(.+?)\n((?s:.*?))````").expect("edit block pattern compiles")
    })
}

pub fn parse_edit_blocks(text: &str) -> Vec<EditBlock> {
    edit_block_regex()
        .captures_iter(text)
        .filter_map(|caps| {
            let kind = match caps.get(1)?.as_str() {
                "edit" => EditKind::Edit,
                _ => EditKind::Create,
            };
            Some(EditBlock {
                kind,
                note_title: caps.get(2)?.as_str().trim().to_string(),
                content: caps.get(3)?.as_str().to_string(),
                status: EditStatus::Pending,
            })
        })
        .collect()
}

pub fn strip_edit_blocks(text: &str) -> String {
    edit_block_regex().replace_all(text, "").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_edit_and_create_blocks_in_order() {
        let reply = "Here you go.\n````edit: Daily Log \nline one\nline two\n````\nand\n````create:New Idea\nfresh\n````\nDone.";
        let blocks = parse_edit_blocks(reply);
        assert_eq!(blocks.len(), 2);

        assert_eq!(blocks[0].kind, EditKind::Edit);
        assert_eq!(blocks[0].note_title, "Daily Log");
        assert_eq!(blocks[0].content, "line one\nline two\n");
        assert_eq!(blocks[0].status, EditStatus::Pending);

        assert_eq!(blocks[1].kind, EditKind::Create);
        assert_eq!(blocks[1].note_title, "New Idea");
        assert_eq!(blocks[1].content, "fresh\n");
    }

    #[test]
    fn ignores_unknown_or_unterminated_blocks() {
        assert!(parse_edit_blocks("````delete:X\nbody\n````").is_empty());
        assert!(parse_edit_blocks("````edit:X\nnever closed").is_empty());
        assert!(parse_edit_blocks("```edit:X\nthree ticks\n```").is_empty());
    }

    #[test]
    fn strip_removes_blocks_and_trims() {
        let reply = "Intro\n````edit:A\nx\n````\nOutro  ";
        assert_eq!(strip_edit_blocks(reply), "Intro\n\nOutro");
        assert_eq!(strip_edit_blocks("plain answer"), "plain answer");
    }

    #[test]
    fn dismiss_only_moves_pending_blocks() {
        let mut blocks = parse_edit_blocks("````edit:A\nx\n````\n````create:B\ny\n````");
        blocks[0].dismiss();
        assert_eq!(blocks[0].status, EditStatus::Dismissed);
        assert!(!blocks[0].is_pending());

        blocks[1].status = EditStatus::Applied;
        blocks[1].dismiss();
        assert_eq!(blocks[1].status, EditStatus::Applied);
    }
}
