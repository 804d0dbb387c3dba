//! Error types for the manifest converter
//!
//! Only genuine failures live here. A missing webhook manifest or an absent
//! category directory is "nothing to do" and never surfaces as an error, and a
//! malformed webhook document is logged and skipped by the extractor.

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Converter error
#[derive(Debug, Error, Diagnostic)]
pub enum ConvertError {
    #[error("Failed to read {path}: {source}")]
    #[diagnostic(code(chartforge::convert::read))]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    #[diagnostic(
        code(chartforge::convert::write),
        help("Check that the chart directory is writable")
    )]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to create directory {path}: {source}")]
    #[diagnostic(code(chartforge::convert::create_dir))]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid file pattern '{pattern}': {source}")]
    #[diagnostic(code(chartforge::convert::pattern))]
    Pattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    #[error("Failed to list files matching '{pattern}': {source}")]
    #[diagnostic(code(chartforge::convert::glob))]
    Glob {
        pattern: String,
        #[source]
        source: glob::GlobError,
    },

    #[error("Failed to parse project file {path}: {source}")]
    #[diagnostic(
        code(chartforge::convert::project),
        help("The project file must be a YAML document with a 'projectName' field")
    )]
    ProjectParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("No project name configured")]
    #[diagnostic(
        code(chartforge::convert::project_name),
        help("Pass --project-name or set 'projectName' in the PROJECT file")
    )]
    MissingProjectName,
}

impl ConvertError {
    pub(crate) fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Write {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn create_dir(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::CreateDir {
            path: path.into(),
            source,
        }
    }
}

/// Result type for conversion operations
pub type Result<T> = std::result::Result<T, ConvertError>;
