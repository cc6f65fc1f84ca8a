//! Error types for entry-point resolution.

use std::path::PathBuf;
use thiserror::Error;

use crate::classfile::ClassFileError;

pub type Result<T> = std::result::Result<T, Error>;

/// Coarse failure category reported to the calling build step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    IoFailure,
    ParseFailure,
    NoEntryPointFound,
    AmbiguousEntryPoint,
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to walk output directory {}: {source}", .root.display())]
    Walk {
        root: PathBuf,
        #[source]
        source: ignore::Error,
    },

    #[error("failed to read archive {}: {source}", .path.display())]
    Archive {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("class bytes not found on classpath: {class_name}")]
    ClassNotFound { class_name: String },

    #[error(
        "malformed class file for {class_name}{}: {source}",
        .path.as_ref().map(|p| format!(" ({})", p.display())).unwrap_or_default()
    )]
    Parse {
        class_name: String,
        /// File or `jar!/entry` the bytes were read from, when known.
        path: Option<PathBuf>,
        #[source]
        source: ClassFileError,
    },

    #[error("no class annotated with {marker} found ({examined} candidates examined)")]
    NoEntryPoint { examined: usize, marker: String },

    #[error("multiple classes annotated with {marker}: {}", .candidates.join(", "))]
    Ambiguous {
        marker: String,
        candidates: Vec<String>,
    },
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Io { .. }
            | Self::Walk { .. }
            | Self::Archive { .. }
            | Self::ClassNotFound { .. } => ErrorKind::IoFailure,
            Self::Parse { .. } => ErrorKind::ParseFailure,
            Self::NoEntryPoint { .. } => ErrorKind::NoEntryPointFound,
            Self::Ambiguous { .. } => ErrorKind::AmbiguousEntryPoint,
        }
    }
}
