use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

/// Smallest font size the renderer is allowed to use.
pub const FONT_SIZE_MIN: u16 = 8;
/// Largest font size the renderer is allowed to use.
pub const FONT_SIZE_MAX: u16 = 32;
/// Upper bound on scrollback lines kept per session.
pub const SCROLLBACK_MAX: u32 = 100_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CursorStyle {
    #[default]
    Block,
    Underline,
    Bar,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeId {
    #[default]
    Dark,
    Light,
}

impl ThemeId {
    pub fn toggled(self) -> Self {
        match self {
            ThemeId::Dark => ThemeId::Light,
            ThemeId::Light => ThemeId::Dark,
        }
    }
}

/// The whole configuration record, as persisted and as served to the UI.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Settings {
    pub appearance: AppearanceSettings,
    pub terminal: TerminalSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppearanceSettings {
    pub font_family: String,
    pub font_size: u16,
    pub cursor_style: CursorStyle,
    pub cursor_blink: bool,
    pub theme: ThemeId,
}

impl Default for AppearanceSettings {
    fn default() -> Self {
        Self {
            font_family: default_font_family().to_string(),
            font_size: 14,
            cursor_style: CursorStyle::Block,
            cursor_blink: true,
            theme: ThemeId::Dark,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TerminalSettings {
    pub scrollback: u32,
    pub auto_line_height: bool,
    pub enable_bell: bool,
}

impl Default for TerminalSettings {
    fn default() -> Self {
        Self {
            scrollback: 1000,
            auto_line_height: true,
            enable_bell: false,
        }
    }
}

fn default_font_family() -> &'static str {
    if cfg!(windows) {
        "Consolas, 'Courier New', monospace"
    } else if cfg!(target_os = "macos") {
        "Menlo, Monaco, monospace"
    } else {
        "'DejaVu Sans Mono', 'Liberation Mono', monospace"
    }
}

/// A partial update. Absent fields leave the current value alone.
///
/// Parsing is lenient per field: unknown keys are ignored and a value of the
/// wrong type is treated as absent, so one bad field never discards the rest.
/// The persisted document is read through this type as well.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SettingsPatch {
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub appearance: Option<AppearancePatch>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub terminal: Option<TerminalPatch>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppearancePatch {
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub font_size: Option<u16>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub cursor_style: Option<CursorStyle>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub cursor_blink: Option<bool>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub theme: Option<ThemeId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TerminalPatch {
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub scrollback: Option<u32>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub auto_line_height: Option<bool>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub enable_bell: Option<bool>,
}

fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(T::deserialize(value).ok())
}

impl SettingsPatch {
    pub fn is_empty(&self) -> bool {
        self.appearance.is_none() && self.terminal.is_none()
    }

    pub fn font_size(size: u16) -> Self {
        Self {
            appearance: Some(AppearancePatch {
                font_size: Some(size),
                ..Default::default()
            }),
            terminal: None,
        }
    }

    pub fn theme(theme: ThemeId) -> Self {
        Self {
            appearance: Some(AppearancePatch {
                theme: Some(theme),
                ..Default::default()
            }),
            terminal: None,
        }
    }
}

impl Settings {
    /// Merge `patch` group by group, field by field, clamping out-of-range
    /// values.
    pub fn apply(&mut self, patch: SettingsPatch) {
        if let Some(appearance) = patch.appearance {
            let current = &mut self.appearance;
            if let Some(family) = appearance.font_family.filter(|f| !f.trim().is_empty()) {
                current.font_family = family;
            }
            if let Some(size) = appearance.font_size {
                current.font_size = size.clamp(FONT_SIZE_MIN, FONT_SIZE_MAX);
            }
            if let Some(style) = appearance.cursor_style {
                current.cursor_style = style;
            }
            if let Some(blink) = appearance.cursor_blink {
                current.cursor_blink = blink;
            }
            if let Some(theme) = appearance.theme {
                current.theme = theme;
            }
        }

        if let Some(terminal) = patch.terminal {
            let current = &mut self.terminal;
            if let Some(lines) = terminal.scrollback {
                current.scrollback = lines.min(SCROLLBACK_MAX);
            }
            if let Some(auto) = terminal.auto_line_height {
                current.auto_line_height = auto;
            }
            if let Some(bell) = terminal.enable_bell {
                current.enable_bell = bell;
            }
        }
    }

    /// Defaults with `patch` merged on top.
    pub fn from_patch(patch: SettingsPatch) -> Self {
        let mut settings = Settings::default();
        settings.apply(patch);
        settings
    }
}

/// Edits expressed relative to the current settings.
///
/// These are resolved against the live copy inside the store, so two of them
/// arriving back to back never lose an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", content = "value", rename_all = "kebab-case")]
pub enum SettingsAction {
    ToggleTheme,
    AdjustFontSize(i16),
}

impl SettingsAction {
    pub fn to_patch(self, current: &Settings) -> SettingsPatch {
        match self {
            SettingsAction::ToggleTheme => SettingsPatch::theme(current.appearance.theme.toggled()),
            SettingsAction::AdjustFontSize(delta) => {
                let size = i32::from(current.appearance.font_size) + i32::from(delta);
                let size = size.clamp(i32::from(FONT_SIZE_MIN), i32::from(FONT_SIZE_MAX));
                SettingsPatch::font_size(u16::try_from(size).unwrap_or(FONT_SIZE_MIN))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.appearance.font_size, 14);
        assert_eq!(settings.appearance.cursor_style, CursorStyle::Block);
        assert!(settings.appearance.cursor_blink);
        assert_eq!(settings.appearance.theme, ThemeId::Dark);
        assert_eq!(settings.terminal.scrollback, 1000);
        assert!(!settings.terminal.enable_bell);
    }

    #[test]
    fn test_serialized_field_names() {
        let value = serde_json::to_value(Settings::default()).unwrap();
        for key in ["fontFamily", "fontSize", "cursorStyle", "cursorBlink", "theme"] {
            assert!(value["appearance"].get(key).is_some(), "missing appearance.{key}");
        }
        for key in ["scrollback", "autoLineHeight", "enableBell"] {
            assert!(value["terminal"].get(key).is_some(), "missing terminal.{key}");
        }
        assert_eq!(value["appearance"]["cursorStyle"], "block");
        assert_eq!(value["appearance"]["theme"], "dark");
    }

    #[test]
    fn test_partial_patch_touches_one_field() {
        let mut settings = Settings::default();
        let before = settings.clone();

        let patch: SettingsPatch =
            serde_json::from_value(json!({"appearance": {"fontSize": 20}})).unwrap();
        settings.apply(patch);

        assert_eq!(settings.appearance.font_size, 20);
        assert_eq!(settings.appearance.font_family, before.appearance.font_family);
        assert_eq!(settings.appearance.cursor_style, before.appearance.cursor_style);
        assert_eq!(settings.appearance.cursor_blink, before.appearance.cursor_blink);
        assert_eq!(settings.appearance.theme, before.appearance.theme);
        assert_eq!(settings.terminal, before.terminal);
    }

    #[test]
    fn test_lenient_fields_fall_back_individually() {
        let patch: SettingsPatch = serde_json::from_value(json!({
            "appearance": {"fontSize": "huge", "cursorStyle": "bar", "sparkles": true},
            "terminal": {"scrollback": 5000, "enableBell": "loud"},
            "window": {"width": 800}
        }))
        .unwrap();

        let settings = Settings::from_patch(patch);
        assert_eq!(settings.appearance.font_size, 14);
        assert_eq!(settings.appearance.cursor_style, CursorStyle::Bar);
        assert_eq!(settings.terminal.scrollback, 5000);
        assert!(!settings.terminal.enable_bell);
    }

    #[test]
    fn test_wrongly_typed_group_is_ignored() {
        let patch: SettingsPatch = serde_json::from_value(json!({
            "appearance": "solarized",
            "terminal": {"enableBell": true}
        }))
        .unwrap();

        assert!(patch.appearance.is_none());
        let settings = Settings::from_patch(patch);
        assert_eq!(settings.appearance, AppearanceSettings::default());
        assert!(settings.terminal.enable_bell);
    }

    #[test]
    fn test_apply_clamps_values() {
        let mut settings = Settings::default();
        settings.apply(SettingsPatch::font_size(100));
        assert_eq!(settings.appearance.font_size, FONT_SIZE_MAX);
        settings.apply(SettingsPatch::font_size(1));
        assert_eq!(settings.appearance.font_size, FONT_SIZE_MIN);

        settings.apply(SettingsPatch {
            terminal: Some(TerminalPatch {
                scrollback: Some(u32::MAX),
                ..Default::default()
            }),
            ..Default::default()
        });
        assert_eq!(settings.terminal.scrollback, SCROLLBACK_MAX);
    }

    #[test]
    fn test_blank_font_family_is_ignored() {
        let mut settings = Settings::default();
        settings.apply(SettingsPatch {
            appearance: Some(AppearancePatch {
                font_family: Some("   ".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        });
        assert_eq!(settings.appearance.font_family, default_font_family());
    }

    #[test]
    fn test_actions() {
        let mut settings = Settings::default();

        settings.apply(SettingsAction::ToggleTheme.to_patch(&settings));
        assert_eq!(settings.appearance.theme, ThemeId::Light);

        settings.apply(SettingsAction::AdjustFontSize(2).to_patch(&settings));
        assert_eq!(settings.appearance.font_size, 16);

        settings.apply(SettingsAction::AdjustFontSize(-100).to_patch(&settings));
        assert_eq!(settings.appearance.font_size, FONT_SIZE_MIN);
    }

    #[test]
    fn test_empty_patch_serializes_to_empty_object() {
        assert!(SettingsPatch::default().is_empty());
        assert_eq!(serde_json::to_value(SettingsPatch::default()).unwrap(), json!({}));
    }
}
