use std::io::{ErrorKind, Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc as std_mpsc, Arc, Mutex};
use std::thread;
use std::time::Duration;

use portable_pty::{native_pty_system, Child, ChildKiller, MasterPty, PtySize};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::shell::ShellCommand;

/// Terminal width used until the presentation layer reports its real size.
pub const DEFAULT_COLS: u16 = 80;
/// Terminal height used until the presentation layer reports its real size.
pub const DEFAULT_ROWS: u16 = 30;

/// How long the waiter thread lets the reader drain after the child is reaped.
const DRAIN_GRACE: Duration = Duration::from_millis(500);

const READ_BUF_SIZE: usize = 8192;

/// A process could not be started.
#[derive(Debug, thiserror::Error)]
pub enum SpawnError {
    #[error("failed to open PTY: {0}")]
    OpenPty(String),
    #[error("failed to spawn `{program}`: {reason}")]
    Command { program: String, reason: String },
    #[error("failed to attach PTY I/O: {0}")]
    Attach(String),
    #[error("failed to start PTY I/O thread: {0}")]
    Thread(#[from] std::io::Error),
}

/// How a child process ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExitStatus {
    pub code: Option<u32>,
    pub signal: Option<String>,
}

impl ExitStatus {
    pub fn with_code(code: u32) -> Self {
        Self {
            code: Some(code),
            signal: None,
        }
    }

    /// The child was reaped but its status could not be read.
    pub fn unknown() -> Self {
        Self {
            code: None,
            signal: None,
        }
    }
}

impl From<portable_pty::ExitStatus> for ExitStatus {
    fn from(status: portable_pty::ExitStatus) -> Self {
        Self {
            code: Some(status.exit_code()),
            signal: status.signal().map(str::to_string),
        }
    }
}

/// Everything a child process reports, in the order it happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessEvent {
    Data(Vec<u8>),
    /// Always the last event; the channel closes right after it.
    Exit(ExitStatus),
}

/// Receiving end of a handle's event channel.
pub type ProcessEvents = mpsc::UnboundedReceiver<ProcessEvent>;

type EventSink = Arc<Mutex<Option<mpsc::UnboundedSender<ProcessEvent>>>>;

/// Owns one PTY-backed child process.
///
/// Output and the exit notice arrive on the [`ProcessEvents`] channel returned
/// by [`ProcessHandle::spawn`]. None of the methods here return errors: the
/// child can die at any moment, so failures are logged and dropped.
pub struct ProcessHandle {
    master: Option<Box<dyn MasterPty + Send>>,
    writer: Option<Box<dyn Write + Send>>,
    killer: Box<dyn ChildKiller + Send + Sync>,
    pid: Option<u32>,
    /// Set as soon as `wait` returns; the pid may be reused from then on.
    reaped: Arc<AtomicBool>,
    /// Set once the exit notice has been sent, after the drain grace.
    exited: Arc<AtomicBool>,
    terminated: bool,
}

impl ProcessHandle {
    /// Spawn `shell` on a fresh pseudo-terminal of `cols` x `rows`.
    pub fn spawn(
        shell: &ShellCommand,
        cols: u16,
        rows: u16,
    ) -> Result<(Self, ProcessEvents), SpawnError> {
        let pty_system = native_pty_system();

        let pair = pty_system
            .openpty(pty_size(cols, rows))
            .map_err(|e| SpawnError::OpenPty(e.to_string()))?;

        let mut child = pair
            .slave
            .spawn_command(shell.to_builder())
            .map_err(|e| SpawnError::Command {
                program: shell.program.clone(),
                reason: e.to_string(),
            })?;

        // The reader only sees EOF once every slave descriptor is closed.
        drop(pair.slave);

        let io = pair
            .master
            .try_clone_reader()
            .and_then(|reader| Ok((reader, pair.master.take_writer()?)));
        let (reader, writer) = match io {
            Ok(io) => io,
            Err(e) => {
                reap(&mut child);
                return Err(SpawnError::Attach(e.to_string()));
            }
        };

        let mut killer = child.clone_killer();
        let pid = child.process_id();
        let reaped = Arc::new(AtomicBool::new(false));
        let exited = Arc::new(AtomicBool::new(false));
        let (tx, rx) = mpsc::unbounded_channel();

        let label = pid.map_or_else(|| "unknown".to_string(), |p| p.to_string());
        let flags = ExitFlags {
            reaped: Arc::clone(&reaped),
            exited: Arc::clone(&exited),
        };
        if let Err(e) = start_io_threads(&label, reader, child, tx, flags) {
            let _ = killer.kill();
            return Err(e.into());
        }

        log::debug!("spawned `{}` (pid {label}) at {cols}x{rows}", shell.program);

        Ok((
            Self {
                master: Some(pair.master),
                writer: Some(writer),
                killer,
                pid,
                reaped,
                exited,
                terminated: false,
            },
            rx,
        ))
    }

    /// Write bytes to the child's terminal (user input -> shell).
    pub fn write(&mut self, data: &[u8]) {
        if self.has_exited() {
            log::debug!("dropping {} input bytes for exited pid {:?}", data.len(), self.pid);
            return;
        }
        let Some(writer) = self.writer.as_mut() else {
            return;
        };
        if let Err(e) = writer.write_all(data).and_then(|()| writer.flush()) {
            log::warn!("PTY write to pid {:?} failed: {e}", self.pid);
        }
    }

    /// Resize the pseudo-terminal window.
    pub fn resize(&self, cols: u16, rows: u16) {
        if self.has_exited() {
            return;
        }
        if let Some(master) = self.master.as_ref() {
            if let Err(e) = master.resize(pty_size(cols, rows)) {
                log::debug!("PTY resize of pid {:?} failed: {e}", self.pid);
            }
        }
    }

    /// Ask the child to die and release the PTY. Safe to call repeatedly.
    pub fn terminate(&mut self) {
        if self.terminated {
            return;
        }
        self.terminated = true;

        if !self.is_reaped() {
            if let Err(e) = self.killer.kill() {
                log::debug!("kill of pid {:?} failed: {e}", self.pid);
            }
        }
        self.release();
    }

    /// Drop the master and writer descriptors.
    ///
    /// The reader and the child handle belong to the I/O threads and are
    /// released by them once the child is reaped.
    pub fn release(&mut self) {
        self.writer = None;
        self.master = None;
    }

    /// `true` once the exit notice has been sent.
    pub fn has_exited(&self) -> bool {
        self.exited.load(Ordering::Acquire)
    }

    fn is_reaped(&self) -> bool {
        self.reaped.load(Ordering::Acquire)
    }

    pub fn pid(&self) -> Option<u32> {
        self.pid
    }
}

impl Drop for ProcessHandle {
    fn drop(&mut self) {
        self.terminate();
    }
}

fn pty_size(cols: u16, rows: u16) -> PtySize {
    PtySize {
        rows,
        cols,
        pixel_width: 0,
        pixel_height: 0,
    }
}

fn reap(child: &mut Box<dyn Child + Send + Sync>) {
    let _ = child.kill();
    let _ = child.wait();
}

struct ExitFlags {
    reaped: Arc<AtomicBool>,
    exited: Arc<AtomicBool>,
}

/// Start the reader and waiter threads for one child.
///
/// The reader forwards output chunks as they arrive. The waiter blocks on the
/// child, gives the reader a moment to drain, then sends the single `Exit`
/// and takes the sender away so no chunk can follow it.
fn start_io_threads(
    label: &str,
    reader: Box<dyn Read + Send>,
    mut child: Box<dyn Child + Send + Sync>,
    tx: mpsc::UnboundedSender<ProcessEvent>,
    flags: ExitFlags,
) -> std::io::Result<()> {
    let sink: EventSink = Arc::new(Mutex::new(Some(tx)));
    let (drained_tx, drained_rx) = std_mpsc::channel::<()>();

    let reader_sink = Arc::clone(&sink);
    thread::Builder::new()
        .name(format!("pty-read-{label}"))
        .spawn(move || {
            read_loop(reader, &reader_sink);
            let _ = drained_tx.send(());
        })?;

    let waiter_label = label.to_string();
    thread::Builder::new()
        .name(format!("pty-wait-{label}"))
        .spawn(move || {
            let status = match child.wait() {
                Ok(status) => ExitStatus::from(status),
                Err(e) => {
                    log::warn!("waiting on pid {waiter_label} failed: {e}");
                    ExitStatus::unknown()
                }
            };
            flags.reaped.store(true, Ordering::Release);

            let _ = drained_rx.recv_timeout(DRAIN_GRACE);
            flags.exited.store(true, Ordering::Release);

            let sender = match sink.lock() {
                Ok(mut guard) => guard.take(),
                Err(poisoned) => poisoned.into_inner().take(),
            };
            if let Some(tx) = sender {
                log::debug!("pid {waiter_label} exited: {status:?}");
                let _ = tx.send(ProcessEvent::Exit(status));
            }
        })?;

    Ok(())
}

fn read_loop(mut reader: Box<dyn Read + Send>, sink: &EventSink) {
    let mut buf = [0u8; READ_BUF_SIZE];

    loop {
        // Blocks until output is available or the PTY closes.
        let n = match reader.read(&mut buf) {
            Ok(0) => return,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            // EIO on Linux once the child side is gone.
            Err(_) => return,
        };

        let guard = match sink.lock() {
            Ok(guard) => guard,
            Err(_) => return,
        };
        match guard.as_ref() {
            Some(tx) if tx.send(ProcessEvent::Data(buf[..n].to_vec())).is_ok() => {}
            _ => return,
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use tokio::time::{timeout, Instant};

    pub(crate) fn sh() -> ShellCommand {
        ShellCommand::new("/bin/sh")
    }

    /// Drain events until `marker` shows up in the output or `limit` passes.
    pub(crate) async fn read_until(
        events: &mut ProcessEvents,
        marker: &str,
        limit: Duration,
    ) -> String {
        let deadline = Instant::now() + limit;
        let mut output = Vec::new();
        while let Ok(Some(event)) =
            timeout(deadline.saturating_duration_since(Instant::now()), events.recv()).await
        {
            match event {
                ProcessEvent::Data(chunk) => {
                    output.extend_from_slice(&chunk);
                    if String::from_utf8_lossy(&output).contains(marker) {
                        break;
                    }
                }
                ProcessEvent::Exit(_) => break,
            }
        }
        String::from_utf8_lossy(&output).into_owned()
    }

    /// Drain events until the exit notice, returning it and everything after it.
    async fn wait_exit(events: &mut ProcessEvents) -> (Option<ExitStatus>, Vec<ProcessEvent>) {
        let mut status = None;
        let mut trailing = Vec::new();
        let deadline = Instant::now() + Duration::from_secs(5);
        while let Ok(Some(event)) =
            timeout(deadline.saturating_duration_since(Instant::now()), events.recv()).await
        {
            match event {
                ProcessEvent::Exit(s) if status.is_none() => status = Some(s),
                other if status.is_some() => trailing.push(other),
                _ => {}
            }
        }
        (status, trailing)
    }

    #[tokio::test]
    async fn test_spawn_pty() {
        let spawned = ProcessHandle::spawn(&sh(), 80, 24);
        assert!(spawned.is_ok(), "Failed to spawn PTY: {:?}", spawned.err());
        let (handle, _events) = spawned.unwrap();
        assert!(!handle.has_exited());
        assert!(handle.pid().is_some());
    }

    #[tokio::test]
    async fn test_write_read_echo() {
        let (mut handle, mut events) = ProcessHandle::spawn(&sh(), 80, 24).unwrap();

        handle.write(b"echo TABTERM_TEST_OK\n");

        let text = read_until(&mut events, "TABTERM_TEST_OK", Duration::from_secs(5)).await;
        assert!(
            text.contains("TABTERM_TEST_OK"),
            "Expected output to contain TABTERM_TEST_OK, got: {text}"
        );
    }

    #[tokio::test]
    async fn test_exit_is_reported_once_and_last() {
        let (mut handle, mut events) = ProcessHandle::spawn(&sh(), 80, 24).unwrap();
        handle.write(b"exit 3\n");

        let (status, trailing) = wait_exit(&mut events).await;

        assert_eq!(status, Some(ExitStatus::with_code(3)));
        assert!(trailing.is_empty(), "events after exit: {trailing:?}");
        assert!(handle.has_exited());
    }

    #[tokio::test]
    async fn test_write_after_exit_is_silent() {
        let (mut handle, mut events) = ProcessHandle::spawn(&sh(), 80, 24).unwrap();
        handle.write(b"exit 0\n");
        let (status, _) = wait_exit(&mut events).await;
        assert!(status.is_some());

        // Neither call may panic or surface an error.
        handle.write(b"echo too late\n");
        handle.resize(100, 40);
    }

    #[tokio::test]
    async fn test_terminate_is_idempotent() {
        let (mut handle, mut events) = ProcessHandle::spawn(&sh(), 80, 24).unwrap();

        handle.terminate();
        handle.terminate();

        let (status, _) = wait_exit(&mut events).await;
        assert!(status.is_some(), "terminated child should report an exit");
    }

    #[tokio::test]
    async fn test_terminate_after_reap_skips_kill() {
        // The background job keeps the PTY open, so the drain grace runs out
        // well after the shell itself has been reaped.
        let cmd = sh().arg("-c").arg("sleep 1 & exit 0");
        let (mut handle, mut events) = ProcessHandle::spawn(&cmd, 80, 24).unwrap();

        let deadline = Instant::now() + Duration::from_secs(5);
        while !handle.is_reaped() && Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(handle.is_reaped());
        assert!(!handle.has_exited(), "exit notice should wait for the drain grace");

        handle.terminate();

        let (status, _) = wait_exit(&mut events).await;
        assert_eq!(status, Some(ExitStatus::with_code(0)));
        assert!(handle.has_exited());
    }

    #[tokio::test]
    async fn test_resize() {
        let (mut handle, mut events) = ProcessHandle::spawn(&sh(), 80, 24).unwrap();
        handle.resize(120, 40);

        handle.write(b"stty size\n");
        let text = read_until(&mut events, "40 120", Duration::from_secs(5)).await;
        assert!(text.contains("40 120"), "stty should see the new size, got: {text}");
    }

    #[test]
    fn test_spawn_missing_program_fails() {
        let result = ProcessHandle::spawn(&ShellCommand::new("/nonexistent/tabterm-shell"), 80, 24);
        assert!(matches!(result, Err(SpawnError::Command { .. })));
    }
}
