//! tabterm-settings: the process-wide configuration record.
//!
//! Settings are loaded once at start-up from a JSON document, merged over
//! built-in defaults field by field, and persisted again on every change.
//! [`SettingsStore`] holds the single live copy; everyone else sees it
//! through the session router's settings-changed events.

pub mod settings;
pub mod store;
pub mod themes;

pub use settings::{
    AppearancePatch, AppearanceSettings, CursorStyle, Settings, SettingsAction, SettingsPatch,
    TerminalPatch, TerminalSettings, ThemeId, FONT_SIZE_MAX, FONT_SIZE_MIN, SCROLLBACK_MAX,
};
pub use store::{default_settings_path, PersistenceError, SettingsStore, SETTINGS_PATH_VAR};
pub use themes::Palette;
