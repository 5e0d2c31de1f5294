use anyhow::{Context as _, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct EngineSettings {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    #[serde(default)]
    pub context: ContextSettings,
    #[serde(default)]
    pub search: SearchSettings,
    #[serde(default)]
    pub rename: RenameSettings,
    #[serde(default)]
    pub quick_switch: QuickSwitchSettings,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContextSettings {
    #[serde(default = "default_max_chars")]
    pub max_chars: usize,
    #[serde(default = "default_full_content_notes")]
    pub full_content_notes: usize,
    #[serde(default = "default_chat_result_limit")]
    pub chat_result_limit: usize,
    #[serde(default = "default_fallback_note_limit")]
    pub fallback_note_limit: usize,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchSettings {
    #[serde(default = "default_search_result_limit")]
    pub result_limit: usize,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum PropagationMode {
    #[default]
    PerNote,
    Batch,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct RenameSettings {
    #[serde(default)]
    pub propagation: PropagationMode,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuickSwitchSettings {
    #[serde(default = "default_quick_switch_max_results")]
    pub max_results: usize,
}

impl Default for ContextSettings {
    fn default() -> Self {
        Self {
            max_chars: default_max_chars(),
            full_content_notes: default_full_content_notes(),
            chat_result_limit: default_chat_result_limit(),
            fallback_note_limit: default_fallback_note_limit(),
        }
    }
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            result_limit: default_search_result_limit(),
        }
    }
}

impl Default for QuickSwitchSettings {
    fn default() -> Self {
        Self {
            max_results: default_quick_switch_max_results(),
        }
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            context: ContextSettings::default(),
            search: SearchSettings::default(),
            rename: RenameSettings::default(),
            quick_switch: QuickSwitchSettings::default(),
        }
    }
}

impl EngineSettings {
    pub fn merge_overlay(&self, overlay: &EngineSettings) -> EngineSettings {
        let mut merged = self.clone();
        merged.schema_version = self.schema_version.max(overlay.schema_version);

        merged.context.max_chars = overlay.context.max_chars.max(1);
        merged.context.full_content_notes = overlay.context.full_content_notes.max(1);
        merged.context.chat_result_limit = overlay.context.chat_result_limit.max(1);
        merged.context.fallback_note_limit = overlay.context.fallback_note_limit.max(1);
        merged.search.result_limit = overlay.search.result_limit.max(1);
        merged.rename.propagation = overlay.rename.propagation;
        merged.quick_switch.max_results = overlay.quick_switch.max_results.max(1);
        merged
    }
}

pub fn settings_path(config_dir: &Path) -> PathBuf {
    config_dir.join("settings.json")
}

pub fn vault_settings_path(vault_root: &Path) -> PathBuf {
    vault_root.join(".wikigraph").join("settings.json")
}

pub fn load_settings(config_dir: &Path) -> Result<EngineSettings> {
    load_settings_from_path(&settings_path(config_dir))
}

pub fn load_vault_settings(vault_root: &Path) -> Result<Option<EngineSettings>> {
    let path = vault_settings_path(vault_root);
    if !path.exists() {
        return Ok(None);
    }
    let settings = load_settings_from_path(&path)?;
    Ok(Some(settings))
}

pub fn load_effective_settings(
    config_dir: &Path,
    vault_root: Option<&Path>,
) -> Result<EngineSettings> {
    let user = load_settings(config_dir).unwrap_or_default();
    if let Some(vault_root) = vault_root {
        if let Some(vault) = load_vault_settings(vault_root)? {
            return Ok(user.merge_overlay(&vault));
        }
    }
    Ok(user)
}

pub fn save_settings(config_dir: &Path, settings: &EngineSettings) -> Result<()> {
    save_settings_to_path(&settings_path(config_dir), settings)
}

pub fn save_vault_settings(vault_root: &Path, settings: &EngineSettings) -> Result<()> {
    save_settings_to_path(&vault_settings_path(vault_root), settings)
}

fn load_settings_from_path(path: &Path) -> Result<EngineSettings> {
    if !path.exists() {
        return Ok(EngineSettings::default());
    }

    let raw = fs::read_to_string(path)
        .with_context(|| format!("read settings file: {}", path.display()))?;
    let settings: EngineSettings = serde_json::from_str(&raw)
        .with_context(|| format!("parse settings file: {}", path.display()))?;
    Ok(settings)
}

fn save_settings_to_path(path: &Path, settings: &EngineSettings) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create config dir: {}", parent.display()))?;
    }

    let json = serde_json::to_string_pretty(settings)?;
    fs::write(path, json).with_context(|| format!("write settings file: {}", path.display()))?;
    Ok(())
}

const fn default_schema_version() -> u32 {
    1
}

const fn default_max_chars() -> usize {
    80_000
}

const fn default_full_content_notes() -> usize {
    5
}

const fn default_chat_result_limit() -> usize {
    15
}

const fn default_fallback_note_limit() -> usize {
    15
}

const fn default_search_result_limit() -> usize {
    20
}

const fn default_quick_switch_max_results() -> usize {
    20
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "wikigraph_core_settings_test_{}_{}",
            name,
            std::process::id()
        ))
    }

    #[test]
    fn load_defaults_when_missing() {
        let dir = temp_dir("missing");
        if dir.exists() {
            let _ = fs::remove_dir_all(&dir);
        }

        let settings = load_settings(&dir).expect("load defaults");
        assert_eq!(settings.context.max_chars, 80_000);
        assert_eq!(settings.context.full_content_notes, 5);
        assert_eq!(settings.context.chat_result_limit, 15);
        assert_eq!(settings.search.result_limit, 20);
        assert_eq!(settings.rename.propagation, PropagationMode::PerNote);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let settings: EngineSettings =
            serde_json::from_str(r#"{"context":{"max_chars":1000},"rename":{"propagation":"batch"}}"#)
                .expect("parse partial settings");
        assert_eq!(settings.context.max_chars, 1000);
        assert_eq!(settings.context.full_content_notes, 5);
        assert_eq!(settings.rename.propagation, PropagationMode::Batch);
        assert_eq!(settings.quick_switch.max_results, 20);
    }

    #[test]
    fn save_then_load_roundtrip() {
        let dir = temp_dir("roundtrip");
        if dir.exists() {
            let _ = fs::remove_dir_all(&dir);
        }

        let mut settings = EngineSettings::default();
        settings.context.max_chars = 4_000;
        settings.search.result_limit = 7;
        settings.rename.propagation = PropagationMode::Batch;

        save_settings(&dir, &settings).expect("save settings");
        let loaded = load_settings(&dir).expect("load settings");
        assert_eq!(loaded, settings);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn vault_settings_override_user_and_clamp_limits() {
        let user_dir = temp_dir("layered_user");
        let vault_dir = temp_dir("layered_vault");
        let _ = fs::remove_dir_all(&user_dir);
        let _ = fs::remove_dir_all(&vault_dir);

        let mut user = EngineSettings::default();
        user.context.max_chars = 50_000;
        save_settings(&user_dir, &user).expect("save user settings");

        let mut vault = EngineSettings::default();
        vault.context.max_chars = 12_000;
        vault.search.result_limit = 0;
        vault.rename.propagation = PropagationMode::Batch;
        save_vault_settings(&vault_dir, &vault).expect("save vault settings");

        let effective =
            load_effective_settings(&user_dir, Some(&vault_dir)).expect("load effective settings");
        assert_eq!(effective.context.max_chars, 12_000);
        assert_eq!(effective.search.result_limit, 1);
        assert_eq!(effective.rename.propagation, PropagationMode::Batch);

        let user_only = load_effective_settings(&user_dir, None).expect("load user settings");
        assert_eq!(user_only.context.max_chars, 50_000);

        let _ = fs::remove_dir_all(&user_dir);
        let _ = fs::remove_dir_all(&vault_dir);
    }
}
