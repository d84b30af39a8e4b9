//! Sync coordination.
//!
//! [`SyncEngine::run_text`] is the fast path: bootstrap the solution through
//! the automation host only if it does not exist yet, then merge every listed
//! project by editing the text. [`SyncEngine::run_automation`] does the whole
//! run through the host.

use std::fs;
use std::path::{Path, PathBuf};

use slnsync_core::{Config, MergeOutcome, SolutionDocument};
use slnsync_host::{AutomationHost, ContainerTarget, Orchestrator};

use crate::editor::SolutionFileEditor;
use crate::error::{io_err, SyncError};

// ---------------------------------------------------------------------------
// Request / summary
// ---------------------------------------------------------------------------

/// The three inputs of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncRequest {
    /// Newline-delimited list of project file paths.
    pub project_list: PathBuf,
    pub target: ContainerTarget,
}

impl SyncRequest {
    pub fn new(
        project_list: impl Into<PathBuf>,
        solution_dir: impl Into<PathBuf>,
        solution_name: impl Into<String>,
    ) -> Self {
        Self {
            project_list: project_list.into(),
            target: ContainerTarget::new(solution_dir, solution_name),
        }
    }

    pub fn solution_path(&self) -> PathBuf {
        self.target.path()
    }
}

/// Outcome of a completed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncSummary {
    pub solution: PathBuf,
    /// The solution did not exist before this run.
    pub created: bool,
    pub merges: Vec<MergeOutcome>,
}

impl SyncSummary {
    pub fn added(&self) -> usize {
        self.merges.iter().filter(|m| m.is_addition()).count()
    }

    pub fn skipped(&self) -> usize {
        self.merges.len() - self.added()
    }
}

/// Read the project list: trimmed lines, blanks dropped.
///
/// Returns `None` if the list file does not exist.
pub fn read_project_list(path: &Path) -> Result<Option<Vec<PathBuf>>, SyncError> {
    if !path.exists() {
        tracing::warn!(path = %path.display(), "project list not found; nothing to merge");
        return Ok(None);
    }
    let contents = fs::read_to_string(path).map_err(|e| io_err(path, e))?;
    Ok(Some(
        contents
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(PathBuf::from)
            .collect(),
    ))
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Top-level coordinator over an injected [`AutomationHost`].
pub struct SyncEngine<'h, H: AutomationHost> {
    host: &'h H,
    config: Config,
    dry_run: bool,
}

impl<'h, H: AutomationHost> SyncEngine<'h, H> {
    pub fn new(host: &'h H, config: Config) -> Self {
        Self {
            host,
            config,
            dry_run: false,
        }
    }

    /// Write nothing and never start the host.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    fn orchestrator(&self) -> Orchestrator<'h, H> {
        Orchestrator::new(self.host, self.config.retry_policy())
            .with_identity_element(self.config.format.identity_element.as_str())
    }

    /// Text strategy. Aborts without merging if the bootstrap fails.
    pub fn run_text(&self, request: &SyncRequest) -> Result<SyncSummary, SyncError> {
        let path = request.solution_path();
        let created = !path.exists();

        let mut doc = if !created {
            SolutionDocument::load(&path)?
        } else if self.dry_run {
            tracing::info!("[dry-run] would create solution: {}", path.display());
            SolutionDocument::empty(&path)
        } else {
            tracing::info!(path = %path.display(), "solution not found; creating it through the automation host");
            self.orchestrator()
                .bootstrap(&request.target)
                .into_result()
                .map_err(|source| SyncError::Bootstrap {
                    path: path.clone(),
                    source,
                })?;
            SolutionDocument::load(&path)?
        };

        let mut summary = SyncSummary {
            solution: path,
            created,
            merges: Vec::new(),
        };
        let Some(projects) = read_project_list(&request.project_list)? else {
            return Ok(summary);
        };

        let editor = SolutionFileEditor::new(&self.config.format).dry_run(self.dry_run);
        for project in &projects {
            summary.merges.push(editor.merge(&mut doc, project)?);
        }
        Ok(summary)
    }

    /// Automation strategy: create-or-open, add, save, close, all via the host.
    pub fn run_automation(&self, request: &SyncRequest) -> Result<SyncSummary, SyncError> {
        if self.dry_run {
            return Err(SyncError::DryRunUnsupported);
        }
        let path = request.solution_path();
        let created = !path.exists();
        let projects = read_project_list(&request.project_list)?.unwrap_or_default();

        let merges = self
            .orchestrator()
            .run(&request.target, &projects)
            .into_result()
            .map_err(|source| SyncError::Automation {
                path: path.clone(),
                source,
            })?;

        Ok(SyncSummary {
            solution: path,
            created,
            merges,
        })
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn list_is_trimmed_and_blank_lines_dropped() {
        let dir = TempDir::new().unwrap();
        let list = dir.path().join("projects.txt");
        fs::write(&list, "  a.csproj \r\n\r\n\t\n b/c.csproj\n   \n").unwrap();

        let projects = read_project_list(&list).unwrap().unwrap();
        assert_eq!(projects, vec![PathBuf::from("a.csproj"), PathBuf::from("b/c.csproj")]);
    }

    #[test]
    fn missing_list_is_none() {
        let dir = TempDir::new().unwrap();
        assert!(read_project_list(&dir.path().join("nope.txt")).unwrap().is_none());
    }

    #[test]
    fn request_builds_solution_path() {
        let request = SyncRequest::new("list.txt", "/work/out", "App");
        assert_eq!(request.solution_path(), PathBuf::from("/work/out/App.sln"));
    }

    #[test]
    fn summary_counts() {
        let summary = SyncSummary {
            solution: PathBuf::from("a.sln"),
            created: false,
            merges: vec![
                MergeOutcome::Added { path: "a".into() },
                MergeOutcome::WouldAdd { path: "b".into() },
                MergeOutcome::skipped(Path::new("c"), slnsync_core::SkipReason::Missing),
            ],
        };
        assert_eq!(summary.added(), 2);
        assert_eq!(summary.skipped(), 1);
    }
}
