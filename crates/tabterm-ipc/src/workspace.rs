//! Tab-level policy on top of the router: the window always shows at least
//! one session, and menu commands map onto router operations.

use tabterm_pty::SessionId;
use tabterm_settings::SettingsAction;

use crate::router::{RouterError, RouterHandle};

/// Native menu entries and keyboard shortcuts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MenuCommand {
    NewSession,
    CloseSession,
    NextSession,
    PreviousSession,
    ToggleTheme,
    IncreaseFontSize,
    DecreaseFontSize,
}

impl MenuCommand {
    pub const ALL: [MenuCommand; 7] = [
        MenuCommand::NewSession,
        MenuCommand::CloseSession,
        MenuCommand::NextSession,
        MenuCommand::PreviousSession,
        MenuCommand::ToggleTheme,
        MenuCommand::IncreaseFontSize,
        MenuCommand::DecreaseFontSize,
    ];

    /// Stable menu item id.
    pub fn id(self) -> &'static str {
        match self {
            MenuCommand::NewSession => "new-session",
            MenuCommand::CloseSession => "close-session",
            MenuCommand::NextSession => "next-session",
            MenuCommand::PreviousSession => "previous-session",
            MenuCommand::ToggleTheme => "toggle-theme",
            MenuCommand::IncreaseFontSize => "increase-font-size",
            MenuCommand::DecreaseFontSize => "decrease-font-size",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MenuCommand::NewSession => "New Tab",
            MenuCommand::CloseSession => "Close Tab",
            MenuCommand::NextSession => "Next Tab",
            MenuCommand::PreviousSession => "Previous Tab",
            MenuCommand::ToggleTheme => "Toggle Theme",
            MenuCommand::IncreaseFontSize => "Increase Font Size",
            MenuCommand::DecreaseFontSize => "Decrease Font Size",
        }
    }

    pub fn accelerator(self) -> &'static str {
        match self {
            MenuCommand::NewSession => "CmdOrCtrl+T",
            MenuCommand::CloseSession => "CmdOrCtrl+W",
            MenuCommand::NextSession => "Ctrl+Tab",
            MenuCommand::PreviousSession => "Ctrl+Shift+Tab",
            MenuCommand::ToggleTheme => "CmdOrCtrl+Shift+L",
            MenuCommand::IncreaseFontSize => "CmdOrCtrl+=",
            MenuCommand::DecreaseFontSize => "CmdOrCtrl+-",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|command| command.id() == id)
    }
}

/// The window's view of its sessions.
#[derive(Clone)]
pub struct Workspace {
    router: RouterHandle,
}

impl Workspace {
    pub fn new(router: RouterHandle) -> Self {
        Self { router }
    }

    pub fn router(&self) -> &RouterHandle {
        &self.router
    }

    /// Return the active session, creating one if there is none yet.
    pub async fn ensure_session(&self) -> Result<SessionId, RouterError> {
        match self.router.active_session().await? {
            Some(id) => Ok(id),
            None => self.router.create_session().await,
        }
    }

    pub async fn open_session(&self) -> Result<SessionId, RouterError> {
        self.router.create_session().await
    }

    /// Close a session; closing the last one opens a fresh one in its place.
    pub async fn close_session(&self, session_id: SessionId) -> Result<(), RouterError> {
        self.router.close_session(session_id)?;
        if self.router.list_sessions().await?.is_empty() {
            let id = self.router.create_session().await?;
            log::debug!("last session closed, opened session {id}");
        }
        Ok(())
    }

    pub async fn run_menu(&self, command: MenuCommand) -> Result<(), RouterError> {
        log::debug!("menu command {}", command.id());
        match command {
            MenuCommand::NewSession => {
                self.open_session().await?;
            }
            MenuCommand::CloseSession => {
                if let Some(id) = self.router.active_session().await? {
                    self.close_session(id).await?;
                }
            }
            MenuCommand::NextSession => self.router.cycle_focus(true)?,
            MenuCommand::PreviousSession => self.router.cycle_focus(false)?,
            MenuCommand::ToggleTheme => self.router.adjust_settings(SettingsAction::ToggleTheme)?,
            MenuCommand::IncreaseFontSize => {
                self.router.adjust_settings(SettingsAction::AdjustFontSize(1))?
            }
            MenuCommand::DecreaseFontSize => {
                self.router.adjust_settings(SettingsAction::AdjustFontSize(-1))?
            }
        }
        Ok(())
    }

    pub async fn shutdown(&self) -> Result<(), RouterError> {
        self.router.shutdown().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::tests::spawn_router;
    use tabterm_pty::ShellCommand;
    use tabterm_settings::{Settings, SettingsStore, ThemeId};

    fn workspace_with(shell: ShellCommand) -> Workspace {
        let (router, _events) = spawn_router(shell, SettingsStore::in_memory(Settings::default()));
        Workspace::new(router)
    }

    fn workspace() -> Workspace {
        workspace_with(ShellCommand::new("/bin/sh"))
    }

    async fn session_ids(workspace: &Workspace) -> Vec<SessionId> {
        workspace
            .router()
            .list_sessions()
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.id)
            .collect()
    }

    #[test]
    fn test_menu_ids_are_unique_and_resolvable() {
        for command in MenuCommand::ALL {
            assert_eq!(MenuCommand::from_id(command.id()), Some(command));
        }
        let mut ids: Vec<_> = MenuCommand::ALL.iter().map(|c| c.id()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), MenuCommand::ALL.len());
        assert_eq!(MenuCommand::from_id("quit"), None);
    }

    #[tokio::test]
    async fn test_ensure_session_is_idempotent() {
        let workspace = workspace();

        let first = workspace.ensure_session().await.unwrap();
        let second = workspace.ensure_session().await.unwrap();

        assert_eq!(first, second);
        assert_eq!(session_ids(&workspace).await, vec![first]);
        workspace.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_closing_last_session_opens_another() {
        let workspace = workspace();
        let first = workspace.ensure_session().await.unwrap();

        workspace.close_session(first).await.unwrap();

        let ids = session_ids(&workspace).await;
        assert_eq!(ids.len(), 1);
        assert_ne!(ids[0], first);
        assert_eq!(workspace.router().active_session().await.unwrap(), Some(ids[0]));
        workspace.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_closing_one_of_many_keeps_the_rest() {
        let workspace = workspace();
        let a = workspace.open_session().await.unwrap();
        let b = workspace.open_session().await.unwrap();

        workspace.run_menu(MenuCommand::CloseSession).await.unwrap();

        assert_eq!(session_ids(&workspace).await, vec![a]);
        assert_ne!(a, b);
        workspace.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_menu_navigation_and_settings() {
        let workspace = workspace();
        let a = workspace.open_session().await.unwrap();
        workspace.run_menu(MenuCommand::NewSession).await.unwrap();
        let ids = session_ids(&workspace).await;
        assert_eq!(ids.len(), 2);
        let b = ids[1];
        let router = workspace.router();

        // The newest session is active, so "next" wraps around to the first.
        workspace.run_menu(MenuCommand::NextSession).await.unwrap();
        assert_eq!(router.active_session().await.unwrap(), Some(a));
        workspace.run_menu(MenuCommand::PreviousSession).await.unwrap();
        assert_eq!(router.active_session().await.unwrap(), Some(b));

        workspace.run_menu(MenuCommand::ToggleTheme).await.unwrap();
        workspace.run_menu(MenuCommand::IncreaseFontSize).await.unwrap();
        workspace.run_menu(MenuCommand::IncreaseFontSize).await.unwrap();
        workspace.run_menu(MenuCommand::DecreaseFontSize).await.unwrap();

        let settings = router.get_settings().await.unwrap();
        assert_eq!(settings.appearance.theme, ThemeId::Light);
        assert_eq!(settings.appearance.font_size, 15);
        workspace.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_spawn_failure_surfaces_to_caller() {
        let workspace = workspace_with(ShellCommand::new("/nonexistent/tabterm-test-shell"));

        assert!(matches!(workspace.ensure_session().await, Err(RouterError::Spawn(_))));
        assert!(session_ids(&workspace).await.is_empty());
    }
}
