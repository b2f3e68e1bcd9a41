//! Conflict detection for moves.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::fs;

use ztree_core::TreeError;

/// A conflict detected before relocating an entry.
#[derive(Debug, Clone)]
pub struct Conflict {
    /// The source path being operated on.
    pub source: PathBuf,
    /// The destination path where the conflict exists.
    pub destination: PathBuf,
    /// The kind of conflict.
    pub kind: ConflictKind,
}

impl Conflict {
    /// Create a new conflict.
    pub fn new(source: PathBuf, destination: PathBuf, kind: ConflictKind) -> Self {
        Self {
            source,
            destination,
            kind,
        }
    }

    /// Check whether `source` can be moved to `destination`.
    ///
    /// Looks at the disk, not the tree: the destination must not exist and a
    /// directory cannot be moved into itself.
    pub async fn detect(source: &Path, destination: &Path, source_is_dir: bool) -> Option<Self> {
        let kind = if destination == source {
            ConflictKind::SameFile
        } else if source_is_dir && destination.starts_with(source) {
            ConflictKind::SourceIsAncestor
        } else if let Ok(metadata) = fs::symlink_metadata(destination).await {
            if metadata.is_dir() {
                ConflictKind::DirectoryExists
            } else {
                ConflictKind::FileExists
            }
        } else {
            return None;
        };

        Some(Self::new(
            source.to_path_buf(),
            destination.to_path_buf(),
            kind,
        ))
    }
}

impl From<Conflict> for TreeError {
    fn from(conflict: Conflict) -> Self {
        TreeError::Conflict {
            source_path: conflict.source,
            destination: conflict.destination,
            reason: conflict.kind.to_string(),
        }
    }
}

/// The kind of conflict encountered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConflictKind {
    /// A file already exists at the destination.
    FileExists,
    /// A directory already exists at the destination.
    DirectoryExists,
    /// Cannot move a directory into itself.
    SourceIsAncestor,
    /// Source and destination are the same path.
    SameFile,
}

impl std::fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FileExists => write!(f, "File already exists"),
            Self::DirectoryExists => write!(f, "Directory already exists"),
            Self::SourceIsAncestor => write!(f, "Cannot move a directory into itself"),
            Self::SameFile => write!(f, "Source and destination are the same path"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_detect_conflicts() {
        let temp = TempDir::new().unwrap();
        let a = temp.path().join("a");
        let b = temp.path().join("b");
        std::fs::create_dir(&a).unwrap();
        std::fs::create_dir(&b).unwrap();
        std::fs::write(b.join("x.md"), "x").unwrap();

        let into_self = Conflict::detect(&a, &a.join("a"), true).await.unwrap();
        assert_eq!(into_self.kind, ConflictKind::SourceIsAncestor);

        let same = Conflict::detect(&a, &a, true).await.unwrap();
        assert_eq!(same.kind, ConflictKind::SameFile);

        let taken = Conflict::detect(&a.join("x.md"), &b.join("x.md"), false)
            .await
            .unwrap();
        assert_eq!(taken.kind, ConflictKind::FileExists);

        assert!(Conflict::detect(&a, &b.join("a"), true).await.is_none());
    }

    #[test]
    fn test_conflict_into_error() {
        let err: TreeError =
            Conflict::new("/a".into(), "/b/a".into(), ConflictKind::DirectoryExists).into();
        assert!(err.is_input_error());
        assert!(err.to_string().contains("Directory already exists"));
    }
}
