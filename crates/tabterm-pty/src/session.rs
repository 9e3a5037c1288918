use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::pty::{ExitStatus, ProcessHandle, DEFAULT_COLS, DEFAULT_ROWS};

/// Unique identifier for a terminal session.
pub type SessionId = u64;

/// Terminal dimensions in character cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminalSize {
    pub cols: u16,
    pub rows: u16,
}

impl TerminalSize {
    pub fn new(cols: u16, rows: u16) -> Self {
        Self { cols, rows }
    }
}

impl Default for TerminalSize {
    fn default() -> Self {
        Self::new(DEFAULT_COLS, DEFAULT_ROWS)
    }
}

/// One terminal tab: an identifier paired with the process it owns.
///
/// Once the process has exited the session stays around (so its final output
/// can still be shown) but ignores input and resizes.
pub struct Session {
    id: SessionId,
    handle: ProcessHandle,
    title: String,
    created_at: DateTime<Utc>,
    exit_status: Option<ExitStatus>,
    size: TerminalSize,
}

impl Session {
    pub(crate) fn new(
        id: SessionId,
        handle: ProcessHandle,
        title: String,
        size: TerminalSize,
    ) -> Self {
        Self {
            id,
            handle,
            title,
            created_at: Utc::now(),
            exit_status: None,
            size,
        }
    }

    /// Returns the session's unique identifier.
    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Last size requested for this session's terminal.
    pub fn size(&self) -> TerminalSize {
        self.size
    }

    pub fn is_exited(&self) -> bool {
        self.exit_status.is_some()
    }

    pub fn exit_status(&self) -> Option<&ExitStatus> {
        self.exit_status.as_ref()
    }

    pub fn pid(&self) -> Option<u32> {
        self.handle.pid()
    }

    pub(crate) fn write(&mut self, data: &[u8]) {
        if self.is_exited() {
            log::debug!("session {} has exited, dropping input", self.id);
            return;
        }
        self.handle.write(data);
    }

    pub(crate) fn resize(&mut self, cols: u16, rows: u16) {
        if self.is_exited() {
            return;
        }
        if cols == 0 || rows == 0 {
            log::debug!("session {}: ignoring resize to {cols}x{rows}", self.id);
            return;
        }
        self.size = TerminalSize::new(cols, rows);
        self.handle.resize(cols, rows);
    }

    pub(crate) fn set_title(&mut self, title: String) {
        self.title = title;
    }

    /// Record the exit notice and release the PTY descriptors.
    ///
    /// Only the first notice counts.
    pub(crate) fn mark_exited(&mut self, status: ExitStatus) {
        if self.exit_status.is_none() {
            self.exit_status = Some(status);
            self.handle.release();
        }
    }

    pub(crate) fn terminate(&mut self) {
        self.handle.terminate();
    }

    pub fn info(&self) -> SessionInfo {
        SessionInfo {
            id: self.id,
            title: self.title.clone(),
            created_at: self.created_at,
            exited: self.is_exited(),
            exit_status: self.exit_status.clone(),
            cols: self.size.cols,
            rows: self.size.rows,
        }
    }
}

/// Serializable snapshot of a session, as listed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub id: SessionId,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub exited: bool,
    pub exit_status: Option<ExitStatus>,
    pub cols: u16,
    pub rows: u16,
}
