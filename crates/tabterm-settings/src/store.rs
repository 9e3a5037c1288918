use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::settings::{Settings, SettingsAction, SettingsPatch};

/// Environment variable that points the store at a different settings file.
pub const SETTINGS_PATH_VAR: &str = "TABTERM_SETTINGS";

/// Loading or saving the settings document failed.
///
/// Never fatal: a failed load falls back to defaults, a failed save keeps the
/// settings in memory only.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("failed to read {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error("malformed settings in {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("failed to encode settings: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("failed to write {}: {source}", path.display())]
    Write { path: PathBuf, source: io::Error },
}

/// Where the settings document lives for the current user.
pub fn default_settings_path() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os(SETTINGS_PATH_VAR) {
        return Some(PathBuf::from(path));
    }
    dirs::config_dir().map(|dir| dir.join("tabterm").join("settings.json"))
}

/// Holds the one live copy of [`Settings`].
///
/// Owned by the session router, which broadcasts every change to the UI.
pub struct SettingsStore {
    path: Option<PathBuf>,
    live: Settings,
}

impl SettingsStore {
    /// Load the document at `path`, falling back to defaults when it is
    /// missing or malformed. A malformed file is left as it is.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let live = load_settings(&path);
        Self {
            path: Some(path),
            live,
        }
    }

    /// Load from [`default_settings_path`], or keep settings in memory when
    /// no config directory exists.
    pub fn load_default() -> Self {
        match default_settings_path() {
            Some(path) => Self::load(path),
            None => {
                log::warn!("no config directory found, settings will not be persisted");
                Self::in_memory(Settings::default())
            }
        }
    }

    /// A store that never touches the disk.
    pub fn in_memory(settings: Settings) -> Self {
        Self {
            path: None,
            live: settings,
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn get(&self) -> Settings {
        self.live.clone()
    }

    /// Merge `patch` into the live settings and persist them.
    /// Returns the merged settings.
    pub fn set(&mut self, patch: SettingsPatch) -> Settings {
        self.live.apply(patch);
        self.persist();
        self.live.clone()
    }

    /// Apply an edit that depends on the current values.
    pub fn update(&mut self, action: SettingsAction) -> Settings {
        let patch = action.to_patch(&self.live);
        self.set(patch)
    }

    fn persist(&self) {
        let Some(path) = self.path.as_deref() else {
            return;
        };
        match write_settings(path, &self.live) {
            Ok(()) => log::info!("settings saved to {}", path.display()),
            Err(e) => log::warn!("{e}; keeping settings in memory only"),
        }
    }
}

/// Read settings from `path`, degrading every failure to defaults.
pub fn load_settings(path: &Path) -> Settings {
    match read_settings(path) {
        Ok(Some(settings)) => settings,
        Ok(None) => {
            log::debug!("no settings at {}, using defaults", path.display());
            Settings::default()
        }
        Err(e) => {
            log::warn!("{e}; using defaults");
            Settings::default()
        }
    }
}

/// Read and merge the document at `path` over the defaults.
///
/// `Ok(None)` means there is no document yet.
pub fn read_settings(path: &Path) -> Result<Option<Settings>, PersistenceError> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(PersistenceError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    let patch: SettingsPatch =
        serde_json::from_str(&text).map_err(|source| PersistenceError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(Some(Settings::from_patch(patch)))
}

/// Overwrite `path` with `settings`, via a sibling temp file.
pub fn write_settings(path: &Path, settings: &Settings) -> Result<(), PersistenceError> {
    let json = serde_json::to_string_pretty(settings)?;
    let write_err = |source| PersistenceError::Write {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(write_err)?;
    }
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json).map_err(write_err)?;
    fs::rename(&tmp, path).map_err(write_err)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{CursorStyle, ThemeId};
    use tempfile::TempDir;

    fn settings_path(dir: &TempDir) -> PathBuf {
        dir.path().join("tabterm").join("settings.json")
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let store = SettingsStore::load(settings_path(&dir));

        assert_eq!(store.get(), Settings::default());
        assert!(!settings_path(&dir).exists(), "load must not create the file");
    }

    #[test]
    fn test_malformed_file_yields_defaults_and_is_untouched() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{ not json").unwrap();

        let store = SettingsStore::load(&path);

        assert_eq!(store.get(), Settings::default());
        assert_eq!(fs::read_to_string(&path).unwrap(), "{ not json");
        assert!(matches!(read_settings(&path), Err(PersistenceError::Parse { .. })));
    }

    #[test]
    fn test_partial_file_merges_over_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{"appearance": {"cursorStyle": "underline"}}"#).unwrap();

        let settings = SettingsStore::load(&path).get();

        assert_eq!(settings.appearance.cursor_style, CursorStyle::Underline);
        assert_eq!(settings.appearance.font_size, 14);
        assert_eq!(settings.terminal, Settings::default().terminal);
    }

    #[test]
    fn test_save_then_load_round_trips() {
        let dir = TempDir::new().unwrap();
        let path = settings_path(&dir);

        let mut store = SettingsStore::load(&path);
        store.set(SettingsPatch::theme(ThemeId::Light));
        assert!(path.exists(), "set must persist");

        let reloaded = SettingsStore::load(&path);
        assert_eq!(reloaded.get(), store.get());
        assert_eq!(reloaded.get().appearance.theme, ThemeId::Light);
    }

    #[test]
    fn test_set_persists_and_returns_merged() {
        let dir = TempDir::new().unwrap();
        let path = settings_path(&dir);
        let mut store = SettingsStore::load(&path);

        let merged = store.set(SettingsPatch::font_size(20));

        assert_eq!(merged.appearance.font_size, 20);
        assert_eq!(store.get(), merged);

        let on_disk = read_settings(&path).unwrap().unwrap();
        assert_eq!(on_disk, merged);
    }

    #[test]
    fn test_write_failure_keeps_memory_copy() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("not-a-dir");
        fs::write(&blocker, "").unwrap();

        let mut store = SettingsStore::load(blocker.join("settings.json"));
        let merged = store.set(SettingsPatch::font_size(22));

        assert_eq!(merged.appearance.font_size, 22);
        assert_eq!(store.get().appearance.font_size, 22);
    }

    #[test]
    fn test_update_uses_live_values() {
        let mut store = SettingsStore::in_memory(Settings::default());

        store.update(SettingsAction::AdjustFontSize(1));
        store.update(SettingsAction::AdjustFontSize(1));
        store.update(SettingsAction::ToggleTheme);

        let settings = store.get();
        assert_eq!(settings.appearance.font_size, 16);
        assert_eq!(settings.appearance.theme, ThemeId::Light);
        assert!(store.path().is_none());
    }
}
