//! Default collaborators backed by `stat`, glob patterns and BLAKE3.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use globset::{Glob, GlobSet, GlobSetBuilder};
use tokio::fs;

use ztree_core::{
    AttachmentNode, Identifier, LeafKind, LeafNode, NodeId, TreeConfig, TreeError, display_name,
    dotted_extension, unix_millis,
};

use crate::collaborators::{AttachmentParser, LeafParser, ParseCache, PathClassifier, PathHasher};

/// Identifier from the first eight bytes of the BLAKE3 hash of the path.
#[derive(Debug, Clone, Copy, Default)]
pub struct Blake3Hasher;

impl PathHasher for Blake3Hasher {
    fn hash(&self, path: &Path) -> Identifier {
        let digest = blake3::hash(path.to_string_lossy().as_bytes());
        let mut prefix = [0u8; 8];
        prefix.copy_from_slice(&digest.as_bytes()[..8]);
        Identifier::new(u64::from_le_bytes(prefix))
    }
}

/// Leaf parser that only records file system metadata.
pub struct StatLeafParser {
    kind: LeafKind,
    hasher: Arc<dyn PathHasher>,
}

impl StatLeafParser {
    pub fn new(kind: LeafKind, hasher: Arc<dyn PathHasher>) -> Self {
        Self { kind, hasher }
    }
}

#[async_trait]
impl LeafParser for StatLeafParser {
    async fn parse(
        &self,
        path: &Path,
        cache: &ParseCache,
        parent: NodeId,
    ) -> Result<LeafNode, TreeError> {
        let metadata = fs::metadata(path)
            .await
            .map_err(|e| TreeError::io(path, e))?;
        let size = metadata.len();
        let modtime = metadata.modified().map(unix_millis).unwrap_or(0);

        if let Some(mut cached) = cache.get(path, size, modtime) {
            cached.parent = Some(parent);
            return Ok(cached);
        }

        let leaf = LeafNode {
            kind: self.kind,
            identifier: self.hasher.hash(path),
            path: path.to_path_buf(),
            name: display_name(path),
            dir: parent_dir(path),
            ext: dotted_extension(path),
            parent: Some(parent),
            size,
            modtime,
            creationtime: metadata.created().map(unix_millis).unwrap_or(0),
        };
        cache.insert(leaf.clone());
        Ok(leaf)
    }
}

/// Attachment parser that only records file system metadata.
pub struct StatAttachmentParser {
    hasher: Arc<dyn PathHasher>,
}

impl StatAttachmentParser {
    pub fn new(hasher: Arc<dyn PathHasher>) -> Self {
        Self { hasher }
    }
}

#[async_trait]
impl AttachmentParser for StatAttachmentParser {
    async fn parse(&self, path: &Path, _parent: NodeId) -> Result<AttachmentNode, TreeError> {
        let metadata = fs::metadata(path)
            .await
            .map_err(|e| TreeError::io(path, e))?;

        Ok(AttachmentNode {
            identifier: self.hasher.hash(path),
            path: path.to_path_buf(),
            name: display_name(path),
            dir: parent_dir(path),
            ext: dotted_extension(path),
            size: metadata.len(),
            modtime: metadata.modified().map(unix_millis).unwrap_or(0),
        })
    }
}

/// Classifier matching entry names against glob lists.
#[derive(Debug)]
pub struct GlobClassifier {
    ignore_dirs: GlobSet,
    ignore_files: GlobSet,
    attachment_extensions: Vec<String>,
}

impl GlobClassifier {
    pub fn new(config: &TreeConfig) -> Result<Self, TreeError> {
        Ok(Self {
            ignore_dirs: glob_set(&config.ignore_dirs)?,
            ignore_files: glob_set(&config.ignore_files)?,
            attachment_extensions: config.attachment_extensions.clone(),
        })
    }

    fn name_matches(set: &GlobSet, path: &Path) -> bool {
        path.file_name().is_some_and(|name| set.is_match(name))
    }
}

impl PathClassifier for GlobClassifier {
    fn is_ignored_dir(&self, path: &Path) -> bool {
        Self::name_matches(&self.ignore_dirs, path)
    }

    fn is_ignored_file(&self, path: &Path) -> bool {
        Self::name_matches(&self.ignore_files, path)
    }

    fn is_attachment(&self, path: &Path) -> bool {
        let ext = dotted_extension(path);
        !ext.is_empty()
            && self
                .attachment_extensions
                .iter()
                .any(|a| a.eq_ignore_ascii_case(&ext))
    }
}

fn glob_set(patterns: &[String]) -> Result<GlobSet, TreeError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|e| TreeError::InvalidConfig {
            message: format!("bad ignore pattern '{pattern}': {e}"),
        })?;
        builder.add(glob);
    }
    builder.build().map_err(|e| TreeError::InvalidConfig {
        message: e.to_string(),
    })
}

fn parent_dir(path: &Path) -> PathBuf {
    path.parent().map(Path::to_path_buf).unwrap_or_default()
}
