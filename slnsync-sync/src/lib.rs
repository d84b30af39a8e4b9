//! # slnsync-sync
//!
//! Merges a list of project files into a solution.
//!
//! Call [`pipeline::run`] with a [`Strategy`]: `Text` edits the `.sln` directly
//! with [`SolutionFileEditor`] (bootstrapping a missing solution through the
//! automation host), `Automation` drives the host for the whole run.

pub mod editor;
pub mod engine;
pub mod error;
pub mod pipeline;

pub use editor::SolutionFileEditor;
pub use engine::{read_project_list, SyncEngine, SyncRequest, SyncSummary};
pub use error::SyncError;
pub use pipeline::Strategy;
