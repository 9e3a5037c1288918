use std::collections::BTreeMap;

use crate::pty::{ExitStatus, ProcessEvents, ProcessHandle, SpawnError};
use crate::session::{Session, SessionId, SessionInfo, TerminalSize};
use crate::shell::ShellCommand;

/// A freshly created session and the channel carrying its process events.
pub struct Spawned {
    pub id: SessionId,
    pub events: ProcessEvents,
}

/// Every live session, keyed by ID, plus the pointer to the active one.
///
/// The registry is the only owner of process handles; everyone else refers to
/// sessions by [`SessionId`]. IDs go stale between a UI event firing and the
/// registry seeing it, so every operation on an unknown ID is a no-op.
pub struct Registry {
    sessions: BTreeMap<SessionId, Session>,
    next_id: SessionId,
    active: Option<SessionId>,
}

impl Registry {
    /// Create a new, empty registry.
    pub fn new() -> Self {
        Self {
            sessions: BTreeMap::new(),
            next_id: 1,
            active: None,
        }
    }

    /// Spawn `shell` in a new session and make it the active one.
    ///
    /// The terminal starts at the active session's size (or the default size
    /// when there is none). An ID is only consumed once the spawn succeeded.
    pub fn create(&mut self, shell: &ShellCommand) -> Result<Spawned, SpawnError> {
        let size = self.default_size();
        let (handle, events) = ProcessHandle::spawn(shell, size.cols, size.rows)?;

        let id = self.next_id;
        self.next_id += 1;
        self.sessions
            .insert(id, Session::new(id, handle, shell.display_name(), size));
        self.active = Some(id);

        log::info!("session {id} created running `{}`", shell.program);
        Ok(Spawned { id, events })
    }

    /// Size a new session should start with.
    pub fn default_size(&self) -> TerminalSize {
        self.active
            .and_then(|id| self.sessions.get(&id))
            .map(Session::size)
            .unwrap_or_default()
    }

    /// Get a reference to a session by ID.
    pub fn get(&self, id: SessionId) -> Option<&Session> {
        self.sessions.get(&id)
    }

    /// Terminate a session's process and remove it.
    ///
    /// Returns `false` when the ID was unknown (already closed, or never
    /// existed). If the closed session was active, the first remaining one
    /// becomes active.
    pub fn close(&mut self, id: SessionId) -> bool {
        let Some(mut session) = self.sessions.remove(&id) else {
            log::debug!("close of unknown session {id} ignored");
            return false;
        };
        session.terminate();

        if self.active == Some(id) {
            self.active = self.sessions.keys().next().copied();
        }

        log::info!("session {id} closed");
        true
    }

    /// Forward input to a session's process, unless it is unknown or exited.
    pub fn write(&mut self, id: SessionId, data: &[u8]) {
        match self.sessions.get_mut(&id) {
            Some(session) => session.write(data),
            None => log::debug!("input for unknown session {id} dropped"),
        }
    }

    /// Resize a session's terminal, unless it is unknown or exited.
    pub fn resize(&mut self, id: SessionId, cols: u16, rows: u16) {
        if let Some(session) = self.sessions.get_mut(&id) {
            session.resize(cols, rows);
        }
    }

    /// Record that a session's process exited. The session stays registered
    /// until it is explicitly closed.
    pub fn mark_exited(&mut self, id: SessionId, status: ExitStatus) {
        if let Some(session) = self.sessions.get_mut(&id) {
            log::info!("session {id} exited: {status:?}");
            session.mark_exited(status);
        }
    }

    /// Update a session's title. Returns `false` when the ID was unknown.
    pub fn set_title(&mut self, id: SessionId, title: impl Into<String>) -> bool {
        match self.sessions.get_mut(&id) {
            Some(session) => {
                session.set_title(title.into());
                true
            }
            None => false,
        }
    }

    pub fn active(&self) -> Option<SessionId> {
        self.active
    }

    /// Point the active pointer at `id`. Returns `false` when the ID was unknown.
    pub fn set_active(&mut self, id: SessionId) -> bool {
        if self.sessions.contains_key(&id) {
            self.active = Some(id);
            true
        } else {
            false
        }
    }

    /// Move the active pointer to the next (or previous) session in tab
    /// order, wrapping around at either end.
    pub fn cycle_active(&mut self, forward: bool) -> Option<SessionId> {
        let ids = self.ids();
        if ids.is_empty() {
            return None;
        }

        let current = self
            .active
            .and_then(|id| ids.iter().position(|&other| other == id));
        let next = match (current, forward) {
            (Some(i), true) => (i + 1) % ids.len(),
            (Some(i), false) => (i + ids.len() - 1) % ids.len(),
            (None, true) => 0,
            (None, false) => ids.len() - 1,
        };

        self.active = Some(ids[next]);
        self.active
    }

    /// List all session IDs in tab order.
    pub fn ids(&self) -> Vec<SessionId> {
        self.sessions.keys().copied().collect()
    }

    /// Snapshots of every session in tab order.
    pub fn infos(&self) -> Vec<SessionInfo> {
        self.sessions.values().map(Session::info).collect()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Close every session - used during shutdown.
    pub fn close_all(&mut self) {
        for id in self.ids() {
            self.close(id);
        }
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Registry {
    fn drop(&mut self) {
        self.close_all();
    }
}
