//! Tauri commands for session management.
//!
//! Creation waits for the shell to spawn. The fire-and-forget commands are
//! synchronous so Tauri runs them on the main thread in the order they were
//! invoked, which keeps input for one session in order on the router's queue.

use tabterm_pty::{SessionId, SessionInfo};

use crate::state::AppState;

/// Open a new session. It becomes the active tab.
#[tauri::command]
pub async fn create_session(state: tauri::State<'_, AppState>) -> Result<SessionId, String> {
    state
        .workspace
        .open_session()
        .await
        .map_err(|e| format!("Failed to create session: {e}"))
}

/// Close a session. Closing the last one opens a fresh session.
#[tauri::command]
pub async fn close_session(
    state: tauri::State<'_, AppState>,
    session_id: SessionId,
) -> Result<(), String> {
    state
        .workspace
        .close_session(session_id)
        .await
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub fn write_input(
    state: tauri::State<'_, AppState>,
    session_id: SessionId,
    data: String,
) -> Result<(), String> {
    state
        .router()
        .write(session_id, data)
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub fn resize_session(
    state: tauri::State<'_, AppState>,
    session_id: SessionId,
    cols: u16,
    rows: u16,
) -> Result<(), String> {
    state
        .router()
        .resize(session_id, cols, rows)
        .map_err(|e| e.to_string())
}

/// Record a title the renderer decoded from the shell's output.
#[tauri::command]
pub fn set_title(
    state: tauri::State<'_, AppState>,
    session_id: SessionId,
    title: String,
) -> Result<(), String> {
    state
        .router()
        .set_title(session_id, title)
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub fn focus_session(
    state: tauri::State<'_, AppState>,
    session_id: SessionId,
) -> Result<(), String> {
    state.router().focus(session_id).map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn list_sessions(state: tauri::State<'_, AppState>) -> Result<Vec<SessionInfo>, String> {
    state
        .router()
        .list_sessions()
        .await
        .map_err(|e| e.to_string())
}

/// Forward a raw notification (`{"type": "session-input", ...}`) to the
/// router. Malformed messages are rejected here and never reach it.
#[tauri::command]
pub fn notify(
    state: tauri::State<'_, AppState>,
    message: serde_json::Value,
) -> Result<(), String> {
    state
        .router()
        .dispatch_json(&message)
        .map_err(|e| e.to_string())
}
