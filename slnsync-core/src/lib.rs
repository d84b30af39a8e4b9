//! slnsync core library: domain types, retry combinator, project descriptor
//! reader, solution text model and configuration.
//!
//! - [`types`]: [`ProjectEntry`], [`MergeOutcome`], [`SkipReason`]
//! - [`retry`]: [`RetryPolicy`], [`retry()`](retry::retry), [`RetryError`]
//! - [`descriptor`]: identity extraction from project definition files
//! - [`solution`]: [`SolutionDocument`] and the record format
//! - [`config`]: YAML configuration with defaults
//! - [`error`]: [`SolutionError`], [`ConfigError`]

pub mod config;
pub mod descriptor;
pub mod error;
pub mod retry;
pub mod solution;
pub mod types;

pub use config::{Config, RetrySettings};
pub use descriptor::DescriptorError;
pub use error::{ConfigError, SolutionError};
pub use retry::{retry, RetryError, RetryPolicy};
pub use solution::{Insertion, SolutionDocument, SolutionFormat};
pub use types::{MergeOutcome, ProjectEntry, SkipReason};
