//! Capability interface of the external automation host.
//!
//! The host is an unreliable, exclusively-owned resource (an IDE's automation
//! object model in production). Only this shape is required:
//!
//! ```text
//! start() → Session            stop(Session)
//! container_manager(Session) → Manager
//! manager.create(dir, name)    manager.open(path)
//! manager.save(path)           manager.close()
//! manager.list_entries()       manager.add_entry(path)
//! manager.contains_identity(token)
//! ```
//!
//! Any call may fail transiently; callers wrap every call in
//! [`slnsync_core::retry`].

use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;

use slnsync_core::{DescriptorError, SolutionError};

/// One capability call, used for logging and for scripted fault injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostOp {
    Start,
    Stop,
    ContainerManager,
    Create,
    Open,
    Save,
    Close,
    ListEntries,
    ContainsIdentity,
    AddEntry,
}

impl fmt::Display for HostOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            HostOp::Start => "start",
            HostOp::Stop => "stop",
            HostOp::ContainerManager => "container_manager",
            HostOp::Create => "create",
            HostOp::Open => "open",
            HostOp::Save => "save",
            HostOp::Close => "close",
            HostOp::ListEntries => "list_entries",
            HostOp::ContainsIdentity => "contains_identity",
            HostOp::AddEntry => "add_entry",
        };
        f.write_str(s)
    }
}

/// A single failed call into the host.
#[derive(Debug, Error)]
pub enum HostError {
    /// The host refused or could not service the call (busy, crashed, ...).
    #[error("host rejected {op}: {message}")]
    Rejected { op: HostOp, message: String },

    /// A container operation was issued with no container open.
    #[error("no container is open")]
    NoContainer,

    /// A container is already open in this manager.
    #[error("container already open: {path}")]
    AlreadyOpen { path: PathBuf },

    #[error(transparent)]
    Solution(#[from] SolutionError),

    #[error(transparent)]
    Descriptor(#[from] DescriptorError),
}

impl HostError {
    pub fn rejected(op: HostOp, message: impl Into<String>) -> Self {
        HostError::Rejected {
            op,
            message: message.into(),
        }
    }
}

/// Entry point of the external host.
pub trait AutomationHost {
    /// One lifetime of the host process.
    type Session;
    /// Container-management interface obtained from a session.
    type Manager: ContainerManager;

    fn start(&self) -> Result<Self::Session, HostError>;

    fn stop(&self, session: &mut Self::Session) -> Result<(), HostError>;

    fn container_manager(&self, session: &mut Self::Session) -> Result<Self::Manager, HostError>;
}

/// Operations on the container (solution) open within a session.
pub trait ContainerManager {
    /// Create `<dir>/<name>.sln` and leave it open.
    fn create(&mut self, dir: &Path, name: &str) -> Result<(), HostError>;

    fn open(&mut self, path: &Path) -> Result<(), HostError>;

    fn save(&mut self, path: &Path) -> Result<(), HostError>;

    fn close(&mut self) -> Result<(), HostError>;

    /// Paths of every project the open container references.
    fn list_entries(&mut self) -> Result<Vec<PathBuf>, HostError>;

    /// Whether any referenced project carries `identity`, whatever its path.
    fn contains_identity(&mut self, identity: &str) -> Result<bool, HostError>;

    fn add_entry(&mut self, path: &Path) -> Result<(), HostError>;
}
