//! # slnsync-host
//!
//! The external automation host seen as a capability interface, and the
//! orchestrator that drives it through a guarded session lifecycle.
//!
//! - [`capability`]: [`AutomationHost`], [`ContainerManager`], [`HostError`]
//! - [`orchestrator`]: [`Orchestrator`], [`RunReport`], [`RunState`]
//! - [`offline`]: [`FileHost`], an in-process host backed by the solution file
//! - `scripted` (feature `testing`): `ScriptedHost` for fault injection

pub mod capability;
pub mod offline;
pub mod orchestrator;
#[cfg(any(test, feature = "testing"))]
pub mod scripted;

pub use capability::{AutomationHost, ContainerManager, HostError, HostOp};
pub use offline::FileHost;
pub use orchestrator::{ContainerTarget, OrchestrationError, Orchestrator, RunReport, RunState};
#[cfg(any(test, feature = "testing"))]
pub use scripted::ScriptedHost;
