//! Shared sync entrypoint used by the CLI.

use std::fmt;
use std::str::FromStr;

use slnsync_host::AutomationHost;

use crate::engine::{SyncEngine, SyncRequest, SyncSummary};
use crate::error::SyncError;

/// How projects get merged into the solution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strategy {
    /// Edit the `.sln` text directly; the host is only used to create it.
    #[default]
    Text,
    /// Drive the automation host for the whole run.
    Automation,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Text => write!(f, "text"),
            Strategy::Automation => write!(f, "automation"),
        }
    }
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(Strategy::Text),
            "automation" => Ok(Strategy::Automation),
            other => Err(format!(
                "unknown strategy '{other}'; expected: text, automation"
            )),
        }
    }
}

/// Run one sync with the chosen strategy.
pub fn run<H: AutomationHost>(
    engine: &SyncEngine<'_, H>,
    request: &SyncRequest,
    strategy: Strategy,
) -> Result<SyncSummary, SyncError> {
    tracing::debug!(%strategy, solution = %request.solution_path().display(), "sync run");
    match strategy {
        Strategy::Text => engine.run_text(request),
        Strategy::Automation => engine.run_automation(request),
    }
}
