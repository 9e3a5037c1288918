//! tabterm-ipc: the control loop between the presentation layer and the
//! session registry.
//!
//! # Architecture
//!
//! - [`protocol`]: Wire types: notifications coming from the UI and events
//!   pushed back to it.
//! - [`Router`]: The single control loop. Owns the registry and the
//!   settings store; every mutation happens on it, one message at a time.
//! - [`RouterHandle`]: Cloneable sender side used by the presentation bridge.
//! - [`Workspace`]: UI policy on top of the router (menu commands, keeping at
//!   least one session open).

pub mod protocol;
pub mod router;
pub mod workspace;

pub use protocol::{parse_notification, InputData, IpcError, Notification, SessionEvent};
pub use router::{Router, RouterError, RouterHandle};
pub use workspace::{MenuCommand, Workspace};
