//! Directory, leaf and attachment node types.

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

use crate::settings::DirSettings;

/// Arena slot of a node within a [`DirTree`](crate::DirTree).
///
/// Slots are never reused, so a stale id can only miss, never alias.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u64);

impl NodeId {
    /// Create a new NodeId from a u64.
    pub fn new(id: u64) -> Self {
        Self(id)
    }
}

/// Externally visible key of a node, a pure function of its path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identifier(pub u64);

impl Identifier {
    /// Create an identifier from a raw hash value.
    pub fn new(hash: u64) -> Self {
        Self(hash)
    }
}

impl std::fmt::Display for Identifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Milliseconds since the Unix epoch, `0` when the time is unknown.
pub fn unix_millis(time: SystemTime) -> u64 {
    time.duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Basename of a path, falling back to the whole path for roots.
pub fn display_name(path: &Path) -> CompactString {
    path.file_name()
        .map(|n| CompactString::new(n.to_string_lossy()))
        .unwrap_or_else(|| CompactString::new(path.to_string_lossy()))
}

/// Lowercased extension of a path including the leading dot, or empty.
pub fn dotted_extension(path: &Path) -> CompactString {
    path.extension()
        .map(|e| CompactString::new(format!(".{}", e.to_string_lossy().to_lowercase())))
        .unwrap_or_default()
}

/// Kind of leaf document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeafKind {
    /// Markdown-like document.
    File,
    /// Code document (e.g. LaTeX).
    Code,
}

/// A document file inside a directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeafNode {
    /// Document or code file.
    pub kind: LeafKind,
    /// Hash of the path.
    pub identifier: Identifier,
    /// Absolute path.
    pub path: PathBuf,
    /// Basename.
    pub name: CompactString,
    /// Containing directory.
    pub dir: PathBuf,
    /// Lowercased extension with leading dot.
    pub ext: CompactString,
    /// Owning directory.
    pub parent: Option<NodeId>,
    /// Size in bytes.
    pub size: u64,
    /// Modification time in ms.
    pub modtime: u64,
    /// Creation time in ms.
    pub creationtime: u64,
}

/// A non-document file co-located with documents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttachmentNode {
    pub identifier: Identifier,
    pub path: PathBuf,
    pub name: CompactString,
    pub dir: PathBuf,
    pub ext: CompactString,
    pub size: u64,
    pub modtime: u64,
}

/// A directory mirrored from disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryNode {
    /// Hash of the path.
    pub identifier: Identifier,

    /// Absolute path.
    pub path: PathBuf,

    /// Basename.
    pub name: CompactString,

    /// Containing directory.
    pub dir: PathBuf,

    /// Owning directory, used for navigation only.
    pub parent: Option<NodeId>,

    /// Directories and leaves, kept ordered by `settings.sorting`.
    pub children: Vec<NodeId>,

    /// Attachments in listing order.
    pub attachments: Vec<AttachmentNode>,

    /// Modification time in ms, `0` if unknown.
    pub modtime: u64,

    /// Creation time in ms, `0` if unknown.
    pub creationtime: u64,

    /// Settings hydrated from the sidecar file.
    pub settings: DirSettings,

    /// Marks a placeholder for a root that could not be found.
    pub not_found: bool,
}

impl DirectoryNode {
    /// Create a bare directory node with default settings and sentinel timestamps.
    pub fn new(path: impl Into<PathBuf>, identifier: Identifier, parent: Option<NodeId>) -> Self {
        let path = path.into();
        Self {
            identifier,
            name: display_name(&path),
            dir: path.parent().map(Path::to_path_buf).unwrap_or_default(),
            path,
            parent,
            children: Vec::new(),
            attachments: Vec::new(),
            modtime: 0,
            creationtime: 0,
            settings: DirSettings::default(),
            not_found: false,
        }
    }

    /// Create a placeholder for a directory that does not exist on disk.
    pub fn placeholder(path: impl Into<PathBuf>, identifier: Identifier) -> Self {
        let mut node = Self::new(path, identifier, None);
        node.not_found = true;
        node
    }

    /// Whether a project is configured on this directory.
    pub fn is_project(&self) -> bool {
        self.settings.project.is_some()
    }
}

/// An entry of the tree arena.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Node {
    /// A directory with children.
    Directory(DirectoryNode),
    /// A document or code file.
    Leaf(LeafNode),
}

impl Node {
    /// Check if this node is a directory.
    pub fn is_dir(&self) -> bool {
        matches!(self, Node::Directory(_))
    }

    pub fn name(&self) -> &str {
        match self {
            Node::Directory(d) => &d.name,
            Node::Leaf(l) => &l.name,
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            Node::Directory(d) => &d.path,
            Node::Leaf(l) => &l.path,
        }
    }

    pub fn modtime(&self) -> u64 {
        match self {
            Node::Directory(d) => d.modtime,
            Node::Leaf(l) => l.modtime,
        }
    }

    pub fn identifier(&self) -> Identifier {
        match self {
            Node::Directory(d) => d.identifier,
            Node::Leaf(l) => l.identifier,
        }
    }

    pub fn parent(&self) -> Option<NodeId> {
        match self {
            Node::Directory(d) => d.parent,
            Node::Leaf(l) => l.parent,
        }
    }

    pub(crate) fn set_parent(&mut self, parent: Option<NodeId>) {
        match self {
            Node::Directory(d) => d.parent = parent,
            Node::Leaf(l) => l.parent = parent,
        }
    }

    /// Get the directory payload, if any.
    pub fn as_dir(&self) -> Option<&DirectoryNode> {
        match self {
            Node::Directory(d) => Some(d),
            Node::Leaf(_) => None,
        }
    }

    /// Get the leaf payload, if any.
    pub fn as_leaf(&self) -> Option<&LeafNode> {
        match self {
            Node::Leaf(l) => Some(l),
            Node::Directory(_) => None,
        }
    }
}
