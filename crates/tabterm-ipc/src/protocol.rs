//! IPC types for communication between the controller and the presentation
//! layer.
//!
//! Everything crosses the boundary as JSON tagged with a kebab-case `type`.
//! Notifications flow UI -> controller and never get a reply; events flow
//! controller -> UI and carry the session they belong to, so one channel
//! serves every tab.

use serde::{Deserialize, Serialize};
use tabterm_pty::{ExitStatus, SessionId};
use tabterm_settings::{Settings, SettingsPatch};

/// Errors at the IPC boundary.
#[derive(Debug, thiserror::Error)]
pub enum IpcError {
    /// The message was not valid JSON for any known notification.
    #[error("malformed IPC message: {0}")]
    Malformed(#[from] serde_json::Error),
    /// The router loop has stopped.
    #[error("session router is not running")]
    RouterClosed,
}

/// Keystrokes from the renderer, either as text or as raw bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InputData {
    Text(String),
    Bytes(Vec<u8>),
}

impl InputData {
    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            InputData::Text(text) => text.into_bytes(),
            InputData::Bytes(bytes) => bytes,
        }
    }
}

/// Fire-and-forget messages from the UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Notification {
    #[serde(rename_all = "camelCase")]
    SessionInput {
        session_id: SessionId,
        data: InputData,
    },
    #[serde(rename_all = "camelCase")]
    SessionResize {
        session_id: SessionId,
        cols: u16,
        rows: u16,
    },
    /// The renderer saw a title-change sequence from the shell.
    #[serde(rename_all = "camelCase")]
    SessionTitle { session_id: SessionId, title: String },
    #[serde(rename_all = "camelCase")]
    SessionFocus { session_id: SessionId },
    #[serde(rename_all = "camelCase")]
    CloseSession { session_id: SessionId },
    SetSettings(SettingsPatch),
}

/// Parse one raw notification.
pub fn parse_notification(value: &serde_json::Value) -> Result<Notification, IpcError> {
    Ok(Notification::deserialize(value)?)
}

/// Events pushed from the controller to the UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum SessionEvent {
    #[serde(rename_all = "camelCase")]
    SessionData { session_id: SessionId, data: Vec<u8> },
    #[serde(rename_all = "camelCase")]
    SessionExit {
        session_id: SessionId,
        exit_code: Option<u32>,
        signal: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    SessionTitle { session_id: SessionId, title: String },
    #[serde(rename_all = "camelCase")]
    ActiveChanged { session_id: Option<SessionId> },
    SettingsChanged { settings: Settings },
}

impl SessionEvent {
    pub(crate) fn exit(session_id: SessionId, status: ExitStatus) -> Self {
        SessionEvent::SessionExit {
            session_id,
            exit_code: status.code,
            signal: status.signal,
        }
    }

    /// Channel name the presentation bridge emits this event under.
    pub fn name(&self) -> &'static str {
        match self {
            SessionEvent::SessionData { .. } => "session-data",
            SessionEvent::SessionExit { .. } => "session-exit",
            SessionEvent::SessionTitle { .. } => "session-title",
            SessionEvent::ActiveChanged { .. } => "active-changed",
            SessionEvent::SettingsChanged { .. } => "settings-changed",
        }
    }

    pub fn session_id(&self) -> Option<SessionId> {
        match self {
            SessionEvent::SessionData { session_id, .. }
            | SessionEvent::SessionExit { session_id, .. }
            | SessionEvent::SessionTitle { session_id, .. } => Some(*session_id),
            SessionEvent::ActiveChanged { session_id } => *session_id,
            SessionEvent::SettingsChanged { .. } => None,
        }
    }
}
