//! Error types for slnsync-sync.

use std::path::PathBuf;

use thiserror::Error;

use slnsync_core::SolutionError;
use slnsync_host::OrchestrationError;

/// Hard failures; each aborts the remaining work of a run.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Reading or writing the solution file failed.
    #[error("solution error: {0}")]
    Solution(#[from] SolutionError),

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The automation host could not create the missing solution.
    #[error("failed to bootstrap solution {path}")]
    Bootstrap {
        path: PathBuf,
        #[source]
        source: OrchestrationError,
    },

    /// An automation-strategy run aborted.
    #[error("automation run failed for {path}")]
    Automation {
        path: PathBuf,
        #[source]
        source: OrchestrationError,
    },

    #[error("dry run is only supported by the text strategy")]
    DryRunUnsupported,
}

/// Convenience constructor for [`SyncError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Io {
        path: path.into(),
        source,
    }
}
