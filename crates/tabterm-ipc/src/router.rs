//! The session router: one task that owns the [`Registry`] and the
//! [`SettingsStore`], and is the only place either is mutated.
//!
//! UI intents arrive as commands on an unbounded queue; process output
//! arrives on one channel per session, merged with a [`StreamMap`]. Both are
//! drained by a single `select!` loop, so operations on a session are applied
//! strictly in the order they were sent, and never concurrently.

use std::ops::ControlFlow;

use tabterm_pty::{
    ProcessEvent, Registry, SessionId, SessionInfo, ShellCommand, SpawnError, Spawned,
};
use tabterm_settings::{Settings, SettingsAction, SettingsPatch, SettingsStore};
use tokio::sync::{mpsc, oneshot};
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_stream::{StreamExt, StreamMap};

use crate::protocol::{parse_notification, IpcError, Notification, SessionEvent};

#[derive(Debug, thiserror::Error)]
pub enum RouterError {
    #[error(transparent)]
    Spawn(#[from] SpawnError),
    #[error("session router is not running")]
    Closed,
}

enum Command {
    CreateSession {
        reply: oneshot::Sender<Result<SessionId, SpawnError>>,
    },
    CloseSession {
        session_id: SessionId,
    },
    Input {
        session_id: SessionId,
        data: Vec<u8>,
    },
    Resize {
        session_id: SessionId,
        cols: u16,
        rows: u16,
    },
    SetTitle {
        session_id: SessionId,
        title: String,
    },
    Focus {
        session_id: SessionId,
    },
    CycleFocus {
        forward: bool,
    },
    ListSessions {
        reply: oneshot::Sender<Vec<SessionInfo>>,
    },
    ActiveSession {
        reply: oneshot::Sender<Option<SessionId>>,
    },
    GetSettings {
        reply: oneshot::Sender<Settings>,
    },
    SetSettings {
        patch: SettingsPatch,
    },
    AdjustSettings {
        action: SettingsAction,
    },
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}

impl From<Notification> for Command {
    fn from(notification: Notification) -> Self {
        match notification {
            Notification::SessionInput { session_id, data } => Command::Input {
                session_id,
                data: data.into_bytes(),
            },
            Notification::SessionResize {
                session_id,
                cols,
                rows,
            } => Command::Resize {
                session_id,
                cols,
                rows,
            },
            Notification::SessionTitle { session_id, title } => {
                Command::SetTitle { session_id, title }
            }
            Notification::SessionFocus { session_id } => Command::Focus { session_id },
            Notification::CloseSession { session_id } => Command::CloseSession { session_id },
            Notification::SetSettings(patch) => Command::SetSettings { patch },
        }
    }
}

type SessionStream = UnboundedReceiverStream<ProcessEvent>;

pub struct Router {
    registry: Registry,
    settings: SettingsStore,
    shell: ShellCommand,
    commands: mpsc::UnboundedReceiver<Command>,
    streams: StreamMap<SessionId, SessionStream>,
    events: mpsc::UnboundedSender<SessionEvent>,
}

impl Router {
    /// Build a router that spawns `shell` for every new session.
    ///
    /// Nothing happens until [`Router::run`] is polled. The returned receiver
    /// carries every event for the presentation layer, for all sessions.
    pub fn new(
        shell: ShellCommand,
        settings: SettingsStore,
    ) -> (Self, RouterHandle, mpsc::UnboundedReceiver<SessionEvent>) {
        let (command_tx, commands) = mpsc::unbounded_channel();
        let (events, events_rx) = mpsc::unbounded_channel();
        let router = Self {
            registry: Registry::new(),
            settings,
            shell,
            commands,
            streams: StreamMap::new(),
            events,
        };
        (router, RouterHandle { commands: command_tx }, events_rx)
    }

    /// Serve commands and process events until shut down, or until every
    /// [`RouterHandle`] is dropped. Every session is closed on the way out.
    pub async fn run(mut self) {
        log::info!("session router started");
        loop {
            tokio::select! {
                command = self.commands.recv() => {
                    let Some(command) = command else {
                        self.shutdown();
                        break;
                    };
                    if self.handle(command).is_break() {
                        break;
                    }
                }
                Some((session_id, event)) = self.streams.next(), if !self.streams.is_empty() => {
                    self.on_process_event(session_id, event);
                }
            }
        }
        log::info!("session router stopped");
    }

    fn handle(&mut self, command: Command) -> ControlFlow<()> {
        let active_before = self.registry.active();

        match command {
            Command::CreateSession { reply } => {
                let result = self.create_session();
                if reply.send(result).is_err() {
                    log::debug!("create requester went away before the reply");
                }
            }
            Command::CloseSession { session_id } => self.close_session(session_id),
            Command::Input { session_id, data } => self.registry.write(session_id, &data),
            Command::Resize {
                session_id,
                cols,
                rows,
            } => self.registry.resize(session_id, cols, rows),
            Command::SetTitle { session_id, title } => {
                if self.registry.set_title(session_id, title.clone()) {
                    self.emit(SessionEvent::SessionTitle { session_id, title });
                }
            }
            Command::Focus { session_id } => {
                if !self.registry.set_active(session_id) {
                    log::debug!("focus of unknown session {session_id} ignored");
                }
            }
            Command::CycleFocus { forward } => {
                self.registry.cycle_active(forward);
            }
            Command::ListSessions { reply } => {
                let _ = reply.send(self.registry.infos());
            }
            Command::ActiveSession { reply } => {
                let _ = reply.send(self.registry.active());
            }
            Command::GetSettings { reply } => {
                let _ = reply.send(self.settings.get());
            }
            Command::SetSettings { patch } => {
                if patch.is_empty() {
                    log::debug!("empty settings patch ignored");
                } else {
                    let settings = self.settings.set(patch);
                    self.emit(SessionEvent::SettingsChanged { settings });
                }
            }
            Command::AdjustSettings { action } => {
                let settings = self.settings.update(action);
                self.emit(SessionEvent::SettingsChanged { settings });
            }
            Command::Shutdown { reply } => {
                self.shutdown();
                let _ = reply.send(());
                return ControlFlow::Break(());
            }
        }

        let active_after = self.registry.active();
        if active_after != active_before {
            self.emit(SessionEvent::ActiveChanged {
                session_id: active_after,
            });
        }
        ControlFlow::Continue(())
    }

    fn create_session(&mut self) -> Result<SessionId, SpawnError> {
        match self.registry.create(&self.shell) {
            Ok(Spawned { id, events }) => {
                self.streams.insert(id, UnboundedReceiverStream::new(events));
                Ok(id)
            }
            Err(e) => {
                log::warn!("failed to create session: {e}");
                Err(e)
            }
        }
    }

    fn close_session(&mut self, session_id: SessionId) {
        // Unsubscribe first so nothing already buffered for it reaches the UI.
        self.streams.remove(&session_id);
        self.registry.close(session_id);
    }

    fn on_process_event(&mut self, session_id: SessionId, event: ProcessEvent) {
        match event {
            ProcessEvent::Data(data) => self.emit(SessionEvent::SessionData { session_id, data }),
            ProcessEvent::Exit(status) => {
                self.registry.mark_exited(session_id, status.clone());
                self.emit(SessionEvent::exit(session_id, status));
            }
        }
    }

    fn shutdown(&mut self) {
        log::info!("closing {} session(s) for shutdown", self.registry.len());
        self.streams = StreamMap::new();
        self.registry.close_all();
    }

    fn emit(&self, event: SessionEvent) {
        if self.events.send(event).is_err() {
            log::debug!("no presentation layer attached, event dropped");
        }
    }
}

/// Cheap, cloneable sender side of the router.
///
/// Requests (`create_session`, `list_sessions`, ...) wait for the router's
/// answer; everything else is enqueued and returns immediately. Operations
/// naming an unknown session are silently ignored by the router.
#[derive(Clone)]
pub struct RouterHandle {
    commands: mpsc::UnboundedSender<Command>,
}

impl RouterHandle {
    fn send(&self, command: Command) -> Result<(), RouterError> {
        self.commands.send(command).map_err(|_| RouterError::Closed)
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, RouterError> {
        let (reply, rx) = oneshot::channel();
        self.send(command(reply))?;
        rx.await.map_err(|_| RouterError::Closed)
    }

    /// Start a new session; it becomes the active one.
    pub async fn create_session(&self) -> Result<SessionId, RouterError> {
        Ok(self
            .request(|reply| Command::CreateSession { reply })
            .await??)
    }

    pub async fn list_sessions(&self) -> Result<Vec<SessionInfo>, RouterError> {
        self.request(|reply| Command::ListSessions { reply }).await
    }

    pub async fn active_session(&self) -> Result<Option<SessionId>, RouterError> {
        self.request(|reply| Command::ActiveSession { reply }).await
    }

    pub async fn get_settings(&self) -> Result<Settings, RouterError> {
        self.request(|reply| Command::GetSettings { reply }).await
    }

    /// Close every session and stop the router. A router that has already
    /// stopped is not an error.
    pub async fn shutdown(&self) -> Result<(), RouterError> {
        match self.request(|reply| Command::Shutdown { reply }).await {
            Ok(()) | Err(RouterError::Closed) => Ok(()),
            Err(e) => Err(e),
        }
    }

    pub fn write(
        &self,
        session_id: SessionId,
        data: impl Into<Vec<u8>>,
    ) -> Result<(), RouterError> {
        self.send(Command::Input {
            session_id,
            data: data.into(),
        })
    }

    pub fn resize(&self, session_id: SessionId, cols: u16, rows: u16) -> Result<(), RouterError> {
        self.send(Command::Resize {
            session_id,
            cols,
            rows,
        })
    }

    pub fn set_title(
        &self,
        session_id: SessionId,
        title: impl Into<String>,
    ) -> Result<(), RouterError> {
        self.send(Command::SetTitle {
            session_id,
            title: title.into(),
        })
    }

    pub fn focus(&self, session_id: SessionId) -> Result<(), RouterError> {
        self.send(Command::Focus { session_id })
    }

    pub fn cycle_focus(&self, forward: bool) -> Result<(), RouterError> {
        self.send(Command::CycleFocus { forward })
    }

    /// Terminate a session's process and forget it. Not acknowledged.
    pub fn close_session(&self, session_id: SessionId) -> Result<(), RouterError> {
        self.send(Command::CloseSession { session_id })
    }

    pub fn set_settings(&self, patch: SettingsPatch) -> Result<(), RouterError> {
        self.send(Command::SetSettings { patch })
    }

    pub fn adjust_settings(&self, action: SettingsAction) -> Result<(), RouterError> {
        self.send(Command::AdjustSettings { action })
    }

    pub fn dispatch(&self, notification: Notification) -> Result<(), IpcError> {
        self.send(notification.into())
            .map_err(|_| IpcError::RouterClosed)
    }

    /// Parse and forward a raw notification from the UI. Malformed messages
    /// are logged and dropped; the error is returned for the caller's benefit
    /// only.
    pub fn dispatch_json(&self, raw: &serde_json::Value) -> Result<(), IpcError> {
        let notification = parse_notification(raw).inspect_err(|e| {
            log::warn!("dropping IPC message {raw}: {e}");
        })?;
        self.dispatch(notification)
    }
}
