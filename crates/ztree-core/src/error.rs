//! Error types for tree building and mutation.

use std::path::PathBuf;

use thiserror::Error;

use crate::node::NodeId;

/// Errors that can occur while building or mutating a tree.
#[derive(Debug, Error)]
pub enum TreeError {
    /// Permission denied for a path.
    #[error("Permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    /// Path not found.
    #[error("Path not found: {path}")]
    NotFound { path: PathBuf },

    /// Generic I/O error.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Path is expected to be a directory but is not.
    #[error("Not a directory: {path}")]
    NotADirectory { path: PathBuf },

    /// A file or directory name failed validation.
    #[error("Invalid name '{name}': {reason}")]
    InvalidName { name: String, reason: String },

    /// A sibling with the same name already exists.
    #[error("'{name}' already exists in {parent}")]
    NameExists { name: String, parent: PathBuf },

    /// Sort method string did not match any known method.
    #[error("Unknown sort method: {method}")]
    UnknownSortMethod { method: String },

    /// Settings could not be decoded into their typed form.
    #[error("Invalid settings: {message}")]
    InvalidSettings { message: String },

    /// A move or rename would clash with existing disk state.
    #[error("Cannot place {source_path} at {destination}: {reason}")]
    Conflict {
        source_path: PathBuf,
        destination: PathBuf,
        reason: String,
    },

    /// Node id is not (or no longer) present in the tree.
    #[error("Unknown node: {id:?}")]
    UnknownNode { id: NodeId },

    /// Invalid configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },
}

impl TreeError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied { path },
            std::io::ErrorKind::NotFound => Self::NotFound { path },
            _ => Self::Io { path, source },
        }
    }

    /// Create an invalid name error.
    pub fn invalid_name(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidName {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Whether this error was caused by caller input rather than disk state.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidName { .. }
                | Self::NameExists { .. }
                | Self::UnknownSortMethod { .. }
                | Self::InvalidSettings { .. }
                | Self::Conflict { .. }
        )
    }
}
