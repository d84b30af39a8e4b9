//! Project descriptor reader.
//!
//! `read_entry(path, element)` parses a project definition file (MSBuild XML)
//! and extracts its identity token from the single `<element>` it contains.
//! Every [`DescriptorError`] is a *soft* failure: callers log it and skip the
//! project.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::types::ProjectEntry;

/// Element holding a project's identity in MSBuild project files.
pub const DEFAULT_IDENTITY_ELEMENT: &str = "ProjectGuid";

/// Why an identity token could not be extracted.
#[derive(Debug, Error)]
pub enum DescriptorError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: roxmltree::Error,
    },

    #[error("no <{element}> element in {path}")]
    Missing { path: PathBuf, element: String },

    #[error("{count} <{element}> elements in {path}; expected exactly one")]
    Ambiguous {
        path: PathBuf,
        element: String,
        count: usize,
    },

    #[error("<{element}> is empty in {path}")]
    Empty { path: PathBuf, element: String },
}

/// Read `path` and build a [`ProjectEntry`] from its identity element.
pub fn read_entry(path: &Path, element: &str) -> Result<ProjectEntry, DescriptorError> {
    let xml = fs::read_to_string(path).map_err(|source| DescriptorError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let identity = extract_identity(path, &xml, element)?;
    Ok(ProjectEntry::new(path, identity))
}

/// Find exactly one non-empty `<element>` in `xml`.
///
/// Matching is on the local name, so namespaced MSBuild documents
/// (`xmlns="http://schemas.microsoft.com/developer/msbuild/2003"`) work.
/// Surrounding whitespace in the value is ignored.
pub fn extract_identity(path: &Path, xml: &str, element: &str) -> Result<String, DescriptorError> {
    let xml = xml.strip_prefix('\u{feff}').unwrap_or(xml);
    let doc = roxmltree::Document::parse(xml).map_err(|source| DescriptorError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    let matches: Vec<_> = doc
        .descendants()
        .filter(|n| n.is_element() && n.tag_name().name() == element)
        .collect();

    let node = match matches.as_slice() {
        [node] => node,
        [] => {
            return Err(DescriptorError::Missing {
                path: path.to_path_buf(),
                element: element.to_string(),
            })
        }
        many => {
            return Err(DescriptorError::Ambiguous {
                path: path.to_path_buf(),
                element: element.to_string(),
                count: many.len(),
            })
        }
    };

    match node.text().map(str::trim) {
        Some(value) if !value.is_empty() => Ok(value.to_string()),
        _ => Err(DescriptorError::Empty {
            path: path.to_path_buf(),
            element: element.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(xml: &str) -> Result<String, DescriptorError> {
        extract_identity(Path::new("p.csproj"), xml, DEFAULT_IDENTITY_ELEMENT)
    }

    #[test]
    fn namespaced_msbuild_document() {
        let xml = r#"<?xml version="1.0" encoding="utf-8"?>
<Project ToolsVersion="12.0" xmlns="http://schemas.microsoft.com/developer/msbuild/2003">
  <PropertyGroup>
    <ProjectGuid>{6A5C1E0B-6F7C-4C0E-9F55-0D7E6C7A1B01}</ProjectGuid>
    <OutputType>Library</OutputType>
  </PropertyGroup>
</Project>"#;
        assert_eq!(extract(xml).unwrap(), "{6A5C1E0B-6F7C-4C0E-9F55-0D7E6C7A1B01}");
    }

    #[test]
    fn byte_order_mark_is_tolerated() {
        let xml = "\u{feff}<Project><ProjectGuid>{A}</ProjectGuid></Project>";
        assert_eq!(extract(xml).unwrap(), "{A}");
    }

    #[test]
    fn whitespace_only_value_is_empty() {
        let err = extract("<Project><ProjectGuid>  </ProjectGuid></Project>").unwrap_err();
        assert!(matches!(err, DescriptorError::Empty { .. }), "got: {err}");
    }

    #[test]
    fn malformed_xml_is_a_parse_error() {
        let err = extract("<Project><ProjectGuid>").unwrap_err();
        assert!(matches!(err, DescriptorError::Parse { .. }), "got: {err}");
        assert!(err.to_string().contains("p.csproj"));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = read_entry(Path::new("/definitely/not/here.csproj"), "ProjectGuid").unwrap_err();
        assert!(matches!(err, DescriptorError::Io { .. }));
    }
}
