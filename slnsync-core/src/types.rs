//! Domain types shared by both merge strategies.

use std::fmt;
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Project entry
// ---------------------------------------------------------------------------

/// A project about to be merged into a solution.
///
/// Built transiently per merge attempt from the project's definition file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectEntry {
    /// Path exactly as it appeared in the project list.
    pub path: PathBuf,
    /// Globally-unique token from the project's own definition (its GUID).
    pub identity: String,
    /// File base name with the extension stripped.
    pub display_name: String,
}

impl ProjectEntry {
    /// Build an entry, deriving the display name from `path`.
    pub fn new(path: impl Into<PathBuf>, identity: impl Into<String>) -> Self {
        let path = path.into();
        let display_name = display_name_of(&path);
        Self {
            path,
            identity: identity.into(),
            display_name,
        }
    }
}

/// `src/Foo.Bar.csproj` → `Foo.Bar`.
///
/// Both `/` and `\` separate directories, whatever the host platform.
pub fn display_name_of(path: &Path) -> String {
    let text = path.to_string_lossy();
    let file_name = text.rsplit(|c| c == '/' || c == '\\').next().unwrap_or_default();
    Path::new(file_name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Merge outcome
// ---------------------------------------------------------------------------

/// Why a project was not added.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The project file does not exist on disk.
    Missing,
    /// The solution already references the project.
    AlreadyPresent,
    /// No usable identity token could be extracted; carries the reason.
    NoIdentity(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Missing => write!(f, "project file not found"),
            SkipReason::AlreadyPresent => write!(f, "already in solution"),
            SkipReason::NoIdentity(why) => write!(f, "no project identity: {why}"),
        }
    }
}

/// Outcome of merging a single project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
    /// A record was added and persisted.
    Added { path: PathBuf },
    /// Dry-run: a record *would* have been added.
    WouldAdd { path: PathBuf },
    /// Soft skip; never aborts the run.
    Skipped { path: PathBuf, reason: SkipReason },
}

impl MergeOutcome {
    pub fn path(&self) -> &Path {
        match self {
            MergeOutcome::Added { path }
            | MergeOutcome::WouldAdd { path }
            | MergeOutcome::Skipped { path, .. } => path,
        }
    }

    /// `true` for `Added` and `WouldAdd`.
    pub fn is_addition(&self) -> bool {
        matches!(
            self,
            MergeOutcome::Added { .. } | MergeOutcome::WouldAdd { .. }
        )
    }

    pub fn skipped(path: &Path, reason: SkipReason) -> Self {
        MergeOutcome::Skipped {
            path: path.to_path_buf(),
            reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_strips_directory_and_extension() {
        assert_eq!(display_name_of(Path::new("src/Foo.Bar.csproj")), "Foo.Bar");
        assert_eq!(display_name_of(Path::new("App.csproj")), "App");
        assert_eq!(display_name_of(Path::new("")), "");
    }

    #[test]
    fn display_name_splits_on_backslash() {
        assert_eq!(display_name_of(Path::new(r"src\Foo.csproj")), "Foo");
        assert_eq!(display_name_of(Path::new(r"C:\work\lib/Core.Api.csproj")), "Core.Api");
        let entry = ProjectEntry::new(r"lib\Core.csproj", "{1}");
        assert_eq!(entry.display_name, "Core");
    }

    #[test]
    fn entry_derives_display_name() {
        let entry = ProjectEntry::new("lib/Core.csproj", "{1}");
        assert_eq!(entry.display_name, "Core");
        assert_eq!(entry.identity, "{1}");
    }

    #[test]
    fn skip_reason_display() {
        assert_eq!(SkipReason::AlreadyPresent.to_string(), "already in solution");
        assert!(SkipReason::NoIdentity("x".into()).to_string().ends_with(": x"));
    }
}
