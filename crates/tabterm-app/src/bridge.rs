//! Forwards router events to the webview.
//!
//! Every [`SessionEvent`] is emitted under its own name (`session-data`,
//! `session-exit`, ...) with the session id inside the payload, so the
//! frontend routes output to the right tab itself.

use tabterm_ipc::SessionEvent;
use tauri::{AppHandle, Emitter};
use tokio::sync::mpsc;

/// Start the forwarding task. It ends when the router drops its sender.
pub fn start_event_forwarder(app: AppHandle, mut events: mpsc::UnboundedReceiver<SessionEvent>) {
    tauri::async_runtime::spawn(async move {
        while let Some(event) = events.recv().await {
            if let SessionEvent::SessionExit {
                session_id,
                exit_code,
                signal,
            } = &event
            {
                let banner = SessionEvent::SessionData {
                    session_id: *session_id,
                    data: exit_banner(*exit_code, signal.as_deref()).into_bytes(),
                };
                forward(&app, &banner);
            }
            forward(&app, &event);
        }
        log::debug!("event forwarder stopped");
    });
}

fn forward(app: &AppHandle, event: &SessionEvent) {
    if let Err(e) = app.emit(event.name(), event) {
        log::warn!("failed to emit {}: {e}", event.name());
    }
}

/// Text written into a session's output when its process ends.
pub fn exit_banner(exit_code: Option<u32>, signal: Option<&str>) -> String {
    let code = exit_code.map_or_else(|| "unknown".to_string(), |c| c.to_string());
    match signal {
        Some(signal) => format!("\r\n\r\n[process exited, code {code}, signal {signal}]\r\n"),
        None => format!("\r\n\r\n[process exited, code {code}]\r\n"),
    }
}
