use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Which configured input a path belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Migrations,
    Types,
    Modules,
}

impl fmt::Display for InputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            InputKind::Migrations => "migrations directory",
            InputKind::Types => "type file",
            InputKind::Modules => "modules directory",
        };
        write!(f, "{s}")
    }
}

/// Execution faults. Drift is never an error: it is reported through
/// [`crate::drift::DriftReport`].
#[derive(Debug, Error)]
pub enum Error {
    #[error("{kind} not found: {}", path.display())]
    MissingInput { kind: InputKind, path: PathBuf },

    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid file pattern {pattern}: {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("Invalid table filter pattern: {pattern}")]
    InvalidFilter { pattern: String },
}

impl Error {
    pub fn missing_input(kind: InputKind, path: impl Into<PathBuf>) -> Self {
        Self::MissingInput {
            kind,
            path: path.into(),
        }
    }

    pub fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }

    pub fn invalid_pattern(pattern: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidPattern {
            pattern: pattern.into(),
            message: message.into(),
        }
    }

    pub fn invalid_filter(pattern: impl Into<String>) -> Self {
        Self::InvalidFilter {
            pattern: pattern.into(),
        }
    }

    pub fn is_missing_input(&self) -> bool {
        matches!(self, Self::MissingInput { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
