//! Tauri commands for reading and changing settings.

use tabterm_settings::{Palette, Settings, SettingsPatch, ThemeId};

use crate::state::AppState;

#[tauri::command]
pub async fn get_settings(state: tauri::State<'_, AppState>) -> Result<Settings, String> {
    state
        .router()
        .get_settings()
        .await
        .map_err(|e| e.to_string())
}

/// Merge a partial update. Fields that are missing or of the wrong type are
/// left as they are; the merged result reaches every window through the
/// `settings-changed` event.
#[tauri::command]
pub fn set_settings(
    state: tauri::State<'_, AppState>,
    patch: SettingsPatch,
) -> Result<(), String> {
    state
        .router()
        .set_settings(patch)
        .map_err(|e| e.to_string())
}

/// Colours for `theme`, or for the current theme when none is given.
#[tauri::command]
pub async fn theme_palette(
    state: tauri::State<'_, AppState>,
    theme: Option<ThemeId>,
) -> Result<Palette, String> {
    let theme = match theme {
        Some(theme) => theme,
        None => {
            state
                .router()
                .get_settings()
                .await
                .map_err(|e| e.to_string())?
                .appearance
                .theme
        }
    };
    Ok(*theme.palette())
}
