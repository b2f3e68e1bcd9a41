//! Seams to the parsers, classifiers and hash the builder delegates to.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;

use ztree_core::{
    AttachmentMeta, AttachmentNode, Identifier, LeafKind, LeafMeta, LeafNode, NodeId, TreeConfig,
    TreeError,
};

use crate::parsers::{Blake3Hasher, GlobClassifier, StatAttachmentParser, StatLeafParser};

/// Parses document files into leaf nodes.
#[async_trait]
pub trait LeafParser: Send + Sync {
    /// Parse the file at `path` as a child of `parent`.
    async fn parse(
        &self,
        path: &Path,
        cache: &ParseCache,
        parent: NodeId,
    ) -> Result<LeafNode, TreeError>;

    /// Snapshot a parsed leaf.
    fn metadata(&self, leaf: &LeafNode) -> LeafMeta {
        LeafMeta {
            identifier: leaf.identifier,
            path: leaf.path.clone(),
            name: leaf.name.clone(),
            dir: leaf.dir.clone(),
            ext: leaf.ext.clone(),
            size: leaf.size,
            modtime: leaf.modtime,
            creationtime: leaf.creationtime,
        }
    }
}

/// Parses non-document files into attachment records.
#[async_trait]
pub trait AttachmentParser: Send + Sync {
    async fn parse(&self, path: &Path, parent: NodeId) -> Result<AttachmentNode, TreeError>;

    fn metadata(&self, attachment: &AttachmentNode) -> AttachmentMeta {
        AttachmentMeta {
            identifier: attachment.identifier,
            path: attachment.path.clone(),
            name: attachment.name.clone(),
            dir: attachment.dir.clone(),
            ext: attachment.ext.clone(),
            size: attachment.size,
            modtime: attachment.modtime,
        }
    }
}

/// Pure predicates deciding what the builder skips.
pub trait PathClassifier: Send + Sync {
    fn is_ignored_dir(&self, path: &Path) -> bool;
    fn is_ignored_file(&self, path: &Path) -> bool;
    fn is_attachment(&self, path: &Path) -> bool;
}

/// Stable, deterministic path hash used for node identifiers.
pub trait PathHasher: Send + Sync {
    fn hash(&self, path: &Path) -> Identifier;
}

/// Leaf parse results shared across builds, keyed by path.
///
/// Entries are reused only while size and modification time still match.
#[derive(Debug, Default)]
pub struct ParseCache {
    entries: DashMap<PathBuf, LeafNode>,
}

impl ParseCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a cached leaf that is still current.
    pub fn get(&self, path: &Path, size: u64, modtime: u64) -> Option<LeafNode> {
        self.entries
            .get(path)
            .filter(|leaf| leaf.size == size && leaf.modtime == modtime)
            .map(|leaf| leaf.value().clone())
    }

    pub fn insert(&self, leaf: LeafNode) {
        self.entries.insert(leaf.path.clone(), leaf);
    }

    /// Drop the entry for `path`, if any.
    pub fn invalidate(&self, path: &Path) {
        self.entries.remove(path);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The set of collaborators a [`TreeBuilder`](crate::TreeBuilder) delegates to.
#[derive(Clone)]
pub struct Collaborators {
    pub markdown: Arc<dyn LeafParser>,
    pub code: Arc<dyn LeafParser>,
    pub attachments: Arc<dyn AttachmentParser>,
    pub classifier: Arc<dyn PathClassifier>,
    pub hasher: Arc<dyn PathHasher>,
}

impl Collaborators {
    /// Default stat-based collaborators configured from `config`.
    pub fn from_config(config: &TreeConfig) -> Result<Self, TreeError> {
        let hasher: Arc<dyn PathHasher> = Arc::new(Blake3Hasher);
        Ok(Self {
            markdown: Arc::new(StatLeafParser::new(LeafKind::File, hasher.clone())),
            code: Arc::new(StatLeafParser::new(LeafKind::Code, hasher.clone())),
            attachments: Arc::new(StatAttachmentParser::new(hasher.clone())),
            classifier: Arc::new(GlobClassifier::new(config)?),
            hasher,
        })
    }

    /// Parser responsible for a leaf kind.
    pub fn leaf_parser(&self, kind: LeafKind) -> &dyn LeafParser {
        match kind {
            LeafKind::File => self.markdown.as_ref(),
            LeafKind::Code => self.code.as_ref(),
        }
    }

    /// Replace the classifier.
    pub fn with_classifier(mut self, classifier: Arc<dyn PathClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    /// Replace the markdown parser.
    pub fn with_markdown_parser(mut self, parser: Arc<dyn LeafParser>) -> Self {
        self.markdown = parser;
        self
    }

    /// Replace the code parser.
    pub fn with_code_parser(mut self, parser: Arc<dyn LeafParser>) -> Self {
        self.code = parser;
        self
    }
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators").finish_non_exhaustive()
    }
}
