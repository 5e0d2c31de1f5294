use crate::note::{NewNote, NoteId, VaultId};
use crate::store::DocumentStore;
use anyhow::{bail, Context as _, Result};
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub imported: Vec<NoteId>,
    pub skipped: Vec<String>,
}

struct MarkdownFile {
    full: PathBuf,
    rel_posix: String,
}

fn to_posix_path(path: &Path) -> Result<String> {
    let s = path
        .to_str()
        .ok_or_else(|| anyhow::anyhow!("path is not valid UTF-8"))?;
    Ok(s.replace('\\', "/"))
}

fn scan_markdown_files(root: &Path) -> Result<Vec<MarkdownFile>> {
    let mut files = Vec::new();

    let mut builder = WalkBuilder::new(root);
    builder
        .hidden(true)
        .follow_links(false)
        .ignore(false)
        .require_git(false)
        .git_ignore(true)
        .git_exclude(true)
        .git_global(true);

    for result in builder.build() {
        let dent = match result {
            Ok(d) => d,
            Err(err) => {
                warn!(error = %err, "skipping unreadable directory entry");
                continue;
            }
        };

        if !dent.file_type().is_some_and(|t| t.is_file()) {
            continue;
        }
        let path = dent.path();
        if path
            .extension()
            .is_none_or(|ext| ext.to_string_lossy().to_lowercase() != "md")
        {
            continue;
        }

        let rel = path.strip_prefix(root).unwrap_or(path);
        files.push(MarkdownFile {
            full: path.to_path_buf(),
            rel_posix: to_posix_path(rel)?,
        });
    }

    files.sort_by(|a, b| a.rel_posix.cmp(&b.rel_posix));
    Ok(files)
}

fn title_and_folder(rel_posix: &str) -> (String, Option<String>) {
    let (folder, file) = match rel_posix.rsplit_once('/') {
        Some((folder, file)) => (Some(folder.to_string()), file),
        None => (None, rel_posix),
    };
    let title = match file.rfind('.') {
        Some(ix) if ix > 0 => &file[..ix],
        _ => file,
    };
    (title.to_string(), folder)
}

pub fn import_markdown_dir<S: DocumentStore + ?Sized>(
    store: &S,
    vault: &VaultId,
    root: &Path,
) -> Result<ImportReport> {
    if !root.is_dir() {
        bail!("import root is not a directory: {}", root.display());
    }

    let mut report = ImportReport::default();
    for file in scan_markdown_files(root)? {
        let content = match std::fs::read_to_string(&file.full) {
            Ok(content) => content,
            Err(err) => {
                warn!(path = %file.rel_posix, error = %err, "skipping unreadable note");
                report.skipped.push(file.rel_posix);
                continue;
            }
        };

        let (title, folder_id) = title_and_folder(&file.rel_posix);
        let id = store
            .insert_note(NewNote {
                vault_id: vault.clone(),
                folder_id,
                title,
                content,
            })
            .with_context(|| format!("import note: {}", file.rel_posix))?;
        report.imported.push(id);
    }

    info!(
        %vault,
        imported = report.imported.len(),
        skipped = report.skipped.len(),
        "imported markdown directory"
    );
    Ok(report)
}
