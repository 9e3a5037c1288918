//! tabterm-pty: shell processes and the session registry for TabTerm.
//!
//! This crate owns every OS process the application starts. Each process is
//! attached to a pseudo-terminal and exposed as a stream of output chunks plus
//! a single exit notice; the registry pairs those processes with session
//! metadata and hands out identifiers to the rest of the app.
//!
//! # Architecture
//!
//! - [`ShellCommand`]: What to launch (program, arguments, cwd, environment).
//! - [`ProcessHandle`]: One PTY-backed child process (spawn, write, resize, terminate).
//! - [`Session`]: A `ProcessHandle` plus title, creation time, size and exit state.
//! - [`Registry`]: All live sessions keyed by [`SessionId`], plus the active pointer.

pub mod pty;
pub mod registry;
pub mod session;
pub mod shell;

pub use pty::{
    ExitStatus, ProcessEvent, ProcessEvents, ProcessHandle, SpawnError, DEFAULT_COLS,
    DEFAULT_ROWS,
};
pub use registry::{Registry, Spawned};
pub use session::{Session, SessionId, SessionInfo, TerminalSize};
pub use shell::ShellCommand;
