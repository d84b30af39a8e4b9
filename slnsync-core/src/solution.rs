//! In-memory model of a `.sln` container file.
//!
//! ## Record format
//!
//! ```text
//! Project("{<type guid>}") = "<display name>", "<path>", "<identity>"
//! EndProject
//! ```
//!
//! New records are spliced in front of the first occurrence of the global
//! section marker (`Global`), or appended when the marker is absent. The marker
//! is located by plain substring search: a project name or path that contains
//! `Global` ahead of the real section moves the insertion point too.
//!
//! ## `persist`: write protocol
//!
//! 1. Ensure the parent directory exists.
//! 2. Write the full text to `<path>.slnsync.tmp`.
//! 3. Rename over `<path>` (atomic on POSIX). On failure the tmp is removed
//!    and the original file is left untouched.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::descriptor::DEFAULT_IDENTITY_ELEMENT;
use crate::error::{io_err, SolutionError};
use crate::types::ProjectEntry;

/// C# project type classifier.
pub const CSHARP_PROJECT_TYPE: &str = "{FAE04EC0-301F-11D3-BF4B-00C04F79EFBC}";
/// Start of the solution-wide configuration block.
pub const GLOBAL_SECTION_MARKER: &str = "Global";
pub const LINE_ENDING: &str = "\r\n";

/// What a freshly created solution looks like before any project is added.
pub const EMPTY_SOLUTION: &str = "\r\n\
Microsoft Visual Studio Solution File, Format Version 12.00\r\n\
# Visual Studio 2013\r\n\
VisualStudioVersion = 12.0.31101.0\r\n\
MinimumVisualStudioVersion = 10.0.40219.1\r\n\
Global\r\n\
\tGlobalSection(SolutionProperties) = preSolution\r\n\
\t\tHideSolutionNode = FALSE\r\n\
\tEndGlobalSection\r\n\
EndGlobal\r\n";

// ---------------------------------------------------------------------------
// Format
// ---------------------------------------------------------------------------

/// Constants that shape generated records. Overridable through config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolutionFormat {
    pub project_type_guid: String,
    pub global_marker: String,
    pub identity_element: String,
}

impl Default for SolutionFormat {
    fn default() -> Self {
        Self {
            project_type_guid: CSHARP_PROJECT_TYPE.to_string(),
            global_marker: GLOBAL_SECTION_MARKER.to_string(),
            identity_element: DEFAULT_IDENTITY_ELEMENT.to_string(),
        }
    }
}

impl SolutionFormat {
    /// Render the record block for `entry`, including its trailing line ending.
    pub fn record(&self, entry: &ProjectEntry) -> String {
        format!(
            "Project(\"{}\") = \"{}\", \"{}\", \"{}\"{eol}EndProject{eol}",
            self.project_type_guid,
            entry.display_name,
            entry.path.display(),
            entry.identity,
            eol = LINE_ENDING,
        )
    }
}

// ---------------------------------------------------------------------------
// Document
// ---------------------------------------------------------------------------

/// Where a record landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Insertion {
    /// Spliced at this byte offset, right before the global section marker.
    BeforeGlobal { offset: usize },
    /// Marker absent; appended at end of file.
    Appended,
}

/// Full text of a solution file, owned by the operation mutating it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolutionDocument {
    path: PathBuf,
    text: String,
}

impl SolutionDocument {
    /// Load the solution at `path`.
    pub fn load(path: &Path) -> Result<Self, SolutionError> {
        let text = fs::read_to_string(path).map_err(|e| io_err(path, e))?;
        Ok(Self {
            path: path.to_path_buf(),
            text,
        })
    }

    /// A new, unsaved solution with no projects.
    pub fn empty(path: impl Into<PathBuf>) -> Self {
        Self::from_text(path, EMPTY_SOLUTION)
    }

    pub fn from_text(path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            text: text.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// `true` if `identity` occurs verbatim anywhere in the text.
    pub fn contains_identity(&self, identity: &str) -> bool {
        self.text.contains(identity)
    }

    /// Splice `record` before the first `marker`, or append it.
    ///
    /// When appending to text that does not end in a newline, a line ending
    /// is inserted first so the record starts on its own line.
    pub fn insert_record(&mut self, record: &str, marker: &str) -> Insertion {
        match self.text.find(marker) {
            Some(offset) => {
                self.text.insert_str(offset, record);
                Insertion::BeforeGlobal { offset }
            }
            None => {
                if !self.text.is_empty() && !self.text.ends_with('\n') {
                    self.text.push_str(LINE_ENDING);
                }
                self.text.push_str(record);
                Insertion::Appended
            }
        }
    }

    /// Path field of every `Project(...) = ...` record, in file order.
    pub fn project_paths(&self) -> Vec<String> {
        self.text.lines().filter_map(parse_record_path).collect()
    }

    /// Atomically write the full text back to [`path`](Self::path).
    pub fn persist(&self) -> Result<(), SolutionError> {
        let tmp = PathBuf::from(format!("{}.slnsync.tmp", self.path.display()));
        write_atomic(&self.path, &self.text, &tmp)
    }

    /// Retarget the document to `path`, then [`persist`](Self::persist).
    pub fn save_as(&mut self, path: &Path) -> Result<(), SolutionError> {
        self.path = path.to_path_buf();
        self.persist()
    }
}

fn write_atomic(path: &Path, content: &str, tmp: &Path) -> Result<(), SolutionError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
    }
    fs::write(tmp, content).map_err(|e| io_err(tmp, e))?;

    if let Err(e) = fs::rename(tmp, path) {
        let _ = fs::remove_file(tmp);
        return Err(io_err(path, e));
    }

    tracing::debug!("wrote: {}", path.display());
    Ok(())
}

/// `Project("{T}") = "Name", "dir\Name.csproj", "{G}"` → `dir\Name.csproj`.
fn parse_record_path(line: &str) -> Option<String> {
    let rest = line.trim_start().strip_prefix("Project(")?;
    let (_, fields) = rest.split_once('=')?;
    fields
        .split(',')
        .nth(1)
        .map(|f| f.trim().trim_matches('"').to_string())
}
