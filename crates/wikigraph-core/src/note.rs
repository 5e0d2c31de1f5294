use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

static NOTE_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoteId(String);

impl NoteId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn generate() -> Self {
        let seq = NOTE_ID_COUNTER.fetch_add(1, Ordering::Relaxed);
        Self(format!("N{:05X}{seq:08X}", std::process::id()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NoteId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VaultId(String);

impl VaultId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VaultId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for VaultId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: NoteId,
    pub vault_id: VaultId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder_id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub updated_at: i64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewNote {
    pub vault_id: VaultId,
    pub folder_id: Option<String>,
    pub title: String,
    pub content: String,
}

impl NewNote {
    pub fn new(vault_id: VaultId, title: impl Into<String>) -> Self {
        Self {
            vault_id,
            folder_id: None,
            title: title.into(),
            content: String::new(),
        }
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NotePatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub updated_at: Option<i64>,
}

impl NotePatch {
    pub fn title(title: impl Into<String>, now: i64) -> Self {
        Self {
            title: Some(title.into()),
            updated_at: Some(now),
            ..Self::default()
        }
    }

    pub fn content(content: impl Into<String>, now: i64) -> Self {
        Self {
            content: Some(content.into()),
            updated_at: Some(now),
            ..Self::default()
        }
    }

    pub fn apply_to(&self, note: &mut Note) {
        if let Some(title) = &self.title {
            note.title = title.clone();
        }
        if let Some(content) = &self.content {
            note.content = content.clone();
        }
        if let Some(updated_at) = self.updated_at {
            note.updated_at = updated_at;
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Backlink {
    pub note_id: NoteId,
    pub note_title: String,
    pub context: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnlinkedMention {
    pub note_id: NoteId,
    pub note_title: String,
    pub context: String,
}

pub fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_millis() as i64)
        .unwrap_or_default()
}
