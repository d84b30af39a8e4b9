//! Direct text merge of project records into a solution.
//!
//! ## `merge`: per-project protocol
//!
//! 1. Missing project file → skip.
//! 2. Extract the identity token → skip on any descriptor error.
//! 3. Identity already occurs verbatim in the solution text → skip.
//! 4. Build the record and splice it before the global section marker
//!    (append when the marker is absent).
//! 5. Persist the whole document atomically (skipped in dry-run).
//!
//! Nothing here touches the automation host and nothing is retried: an I/O
//! error while persisting is a hard failure.

use std::path::Path;

use slnsync_core::{
    descriptor, Insertion, MergeOutcome, SkipReason, SolutionDocument, SolutionFormat,
};

use crate::error::SyncError;

/// Text strategy: splices records into an in-memory [`SolutionDocument`].
#[derive(Debug, Clone)]
pub struct SolutionFileEditor<'a> {
    format: &'a SolutionFormat,
    dry_run: bool,
}

impl<'a> SolutionFileEditor<'a> {
    pub fn new(format: &'a SolutionFormat) -> Self {
        Self {
            format,
            dry_run: false,
        }
    }

    /// Splice in memory only; report `WouldAdd` instead of writing.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Merge one project into `doc`, persisting `doc` if a record was added.
    pub fn merge(
        &self,
        doc: &mut SolutionDocument,
        project: &Path,
    ) -> Result<MergeOutcome, SyncError> {
        if !project.exists() {
            tracing::warn!(path = %project.display(), "could not find project file");
            return Ok(MergeOutcome::skipped(project, SkipReason::Missing));
        }

        let entry = match descriptor::read_entry(project, &self.format.identity_element) {
            Ok(entry) => entry,
            Err(err) => {
                tracing::warn!(
                    path = %project.display(),
                    error = %err,
                    "could not find project identity"
                );
                return Ok(MergeOutcome::skipped(
                    project,
                    SkipReason::NoIdentity(err.to_string()),
                ));
            }
        };

        if doc.contains_identity(&entry.identity) {
            tracing::info!(
                path = %project.display(),
                identity = %entry.identity,
                "already added project file"
            );
            return Ok(MergeOutcome::skipped(project, SkipReason::AlreadyPresent));
        }

        let record = self.format.record(&entry);
        if doc.insert_record(&record, &self.format.global_marker) == Insertion::Appended {
            tracing::warn!(
                solution = %doc.path().display(),
                marker = %self.format.global_marker,
                "global section marker not found; appending record"
            );
        }

        if self.dry_run {
            tracing::info!("[dry-run] would add project file: {}", project.display());
            return Ok(MergeOutcome::WouldAdd {
                path: project.to_path_buf(),
            });
        }

        doc.persist()?;
        tracing::info!(path = %project.display(), "added project file");
        Ok(MergeOutcome::Added {
            path: project.to_path_buf(),
        })
    }

    /// Load `solution`, merge `project`, persist. One-shot form of [`merge`](Self::merge).
    pub fn merge_into(&self, solution: &Path, project: &Path) -> Result<MergeOutcome, SyncError> {
        let mut doc = SolutionDocument::load(solution)?;
        self.merge(&mut doc, project)
    }
}
