//! In-process host backed directly by the solution file.
//!
//! Stands in for an IDE automation server: sessions are free, the container is
//! a [`SolutionDocument`] held in memory between `create`/`open` and `close`,
//! and `save` persists it atomically. Lets the binary bootstrap a solution on
//! machines without an IDE.

use std::path::{Path, PathBuf};

use slnsync_core::{descriptor, SolutionDocument, SolutionFormat};

use crate::capability::{AutomationHost, ContainerManager, HostError};

/// File-backed [`AutomationHost`].
#[derive(Debug, Clone, Default)]
pub struct FileHost {
    format: SolutionFormat,
}

impl FileHost {
    pub fn new(format: SolutionFormat) -> Self {
        Self { format }
    }
}

/// Session handle; carries nothing.
#[derive(Debug)]
pub struct FileSession;

/// Manager over one in-memory solution document.
#[derive(Debug)]
pub struct FileContainer {
    format: SolutionFormat,
    document: Option<SolutionDocument>,
}

impl FileContainer {
    fn document(&mut self) -> Result<&mut SolutionDocument, HostError> {
        self.document.as_mut().ok_or(HostError::NoContainer)
    }

    fn ensure_closed(&self) -> Result<(), HostError> {
        match &self.document {
            Some(doc) => Err(HostError::AlreadyOpen {
                path: doc.path().to_path_buf(),
            }),
            None => Ok(()),
        }
    }
}

impl AutomationHost for FileHost {
    type Session = FileSession;
    type Manager = FileContainer;

    fn start(&self) -> Result<FileSession, HostError> {
        Ok(FileSession)
    }

    fn stop(&self, _session: &mut FileSession) -> Result<(), HostError> {
        Ok(())
    }

    fn container_manager(&self, _session: &mut FileSession) -> Result<FileContainer, HostError> {
        Ok(FileContainer {
            format: self.format.clone(),
            document: None,
        })
    }
}

impl ContainerManager for FileContainer {
    fn create(&mut self, dir: &Path, name: &str) -> Result<(), HostError> {
        self.ensure_closed()?;
        self.document = Some(SolutionDocument::empty(dir.join(format!("{name}.sln"))));
        Ok(())
    }

    fn open(&mut self, path: &Path) -> Result<(), HostError> {
        self.ensure_closed()?;
        self.document = Some(SolutionDocument::load(path)?);
        Ok(())
    }

    fn save(&mut self, path: &Path) -> Result<(), HostError> {
        self.document()?.save_as(path)?;
        Ok(())
    }

    fn close(&mut self) -> Result<(), HostError> {
        self.document = None;
        Ok(())
    }

    fn list_entries(&mut self) -> Result<Vec<PathBuf>, HostError> {
        Ok(self
            .document()?
            .project_paths()
            .into_iter()
            .map(PathBuf::from)
            .collect())
    }

    fn contains_identity(&mut self, identity: &str) -> Result<bool, HostError> {
        Ok(self.document()?.contains_identity(identity))
    }

    /// Adding a project whose identity is already referenced is a no-op.
    fn add_entry(&mut self, path: &Path) -> Result<(), HostError> {
        let entry = descriptor::read_entry(path, &self.format.identity_element)?;
        let record = self.format.record(&entry);
        let marker = self.format.global_marker.clone();
        let document = self.document()?;
        if document.contains_identity(&entry.identity) {
            tracing::debug!(
                path = %path.display(),
                identity = %entry.identity,
                "identity already referenced; not adding"
            );
            return Ok(());
        }
        document.insert_record(&record, &marker);
        Ok(())
    }
}
