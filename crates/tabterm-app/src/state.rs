//! Application state managed by Tauri.

use tabterm_ipc::{RouterHandle, Workspace};

pub struct AppState {
    pub workspace: Workspace,
}

impl AppState {
    pub fn new(workspace: Workspace) -> Self {
        Self { workspace }
    }

    pub fn router(&self) -> &RouterHandle {
        self.workspace.router()
    }
}
