//! Recursive directory tree builder.

use std::fs::Metadata;
use std::path::{Path, PathBuf};
use std::time::Instant;

use futures::future::{BoxFuture, FutureExt};
use tokio::fs;
use tracing::{debug, warn};

use ztree_core::{
    DirMeta, DirTree, DirectoryNode, LeafKind, LeafNode, Node, NodeId, SETTINGS_FILE, TreeConfig,
    TreeError, dotted_extension,
};

use crate::collaborators::{Collaborators, ParseCache};
use crate::{projector, sidecar};

/// Builds directory nodes from disk into a [`DirTree`].
///
/// Entries of a directory are processed one at a time in listing order;
/// the final order of `children` is decided by the directory's sort setting.
#[derive(Debug, Clone)]
pub struct TreeBuilder {
    config: TreeConfig,
    collaborators: Collaborators,
}

impl TreeBuilder {
    /// Create a builder using the default collaborators.
    pub fn new(config: TreeConfig) -> Result<Self, TreeError> {
        let collaborators = Collaborators::from_config(&config)?;
        Ok(Self::with_collaborators(config, collaborators))
    }

    /// Create a builder with custom collaborators.
    pub fn with_collaborators(config: TreeConfig, collaborators: Collaborators) -> Self {
        Self {
            config,
            collaborators,
        }
    }

    pub fn config(&self) -> &TreeConfig {
        &self.config
    }

    pub fn collaborators(&self) -> &Collaborators {
        &self.collaborators
    }

    /// Build the directory at `path` and everything below it.
    ///
    /// Any stat or listing failure aborts the whole build and leaves no
    /// partial subtree in the arena.
    pub async fn build(
        &self,
        tree: &mut DirTree,
        path: &Path,
        parent: Option<NodeId>,
        cache: &ParseCache,
    ) -> Result<NodeId, TreeError> {
        let started = Instant::now();
        let id = self
            .build_dir(tree, path.to_path_buf(), parent, cache)
            .await?;
        debug!(
            path = %path.display(),
            nodes = tree.descendants(id).len() + 1,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "built directory tree"
        );
        Ok(id)
    }

    /// Insert a placeholder for a root that cannot be found, without disk access.
    pub fn placeholder(&self, tree: &mut DirTree, path: &Path) -> NodeId {
        let identifier = self.collaborators.hasher.hash(path);
        tree.insert(Node::Directory(DirectoryNode::placeholder(path, identifier)))
    }

    /// Project a directory into its serializable snapshot.
    pub fn project(&self, tree: &DirTree, id: NodeId) -> Result<DirMeta, TreeError> {
        projector::project(tree, id, &self.collaborators)
    }

    /// Leaf kind for a file path, or `None` if it is not a document.
    pub fn leaf_kind(&self, path: &Path) -> Option<LeafKind> {
        let ext = dotted_extension(path);
        if self.config.is_code_ext(&ext) {
            Some(LeafKind::Code)
        } else if self.config.is_markdown_ext(&ext) {
            Some(LeafKind::File)
        } else {
            None
        }
    }

    /// Parse a document file with the parser matching its extension.
    pub async fn parse_leaf(
        &self,
        path: &Path,
        cache: &ParseCache,
        parent: NodeId,
    ) -> Result<Option<LeafNode>, TreeError> {
        match self.leaf_kind(path) {
            Some(kind) => {
                let leaf = self
                    .collaborators
                    .leaf_parser(kind)
                    .parse(path, cache, parent)
                    .await?;
                Ok(Some(leaf))
            }
            None => Ok(None),
        }
    }

    fn build_dir<'a>(
        &'a self,
        tree: &'a mut DirTree,
        path: PathBuf,
        parent: Option<NodeId>,
        cache: &'a ParseCache,
    ) -> BoxFuture<'a, Result<NodeId, TreeError>> {
        async move {
            let identifier = self.collaborators.hasher.hash(&path);
            let id = tree.insert(Node::Directory(DirectoryNode::new(
                &path, identifier, parent,
            )));

            match self.populate(tree, id, &path, cache).await {
                Ok(()) => Ok(id),
                Err(e) => {
                    tree.remove_subtree(id);
                    Err(e)
                }
            }
        }
        .boxed()
    }

    async fn populate(
        &self,
        tree: &mut DirTree,
        id: NodeId,
        path: &Path,
        cache: &ParseCache,
    ) -> Result<(), TreeError> {
        let metadata = fs::metadata(path)
            .await
            .map_err(|e| TreeError::io(path, e))?;
        if !metadata.is_dir() {
            return Err(TreeError::NotADirectory {
                path: path.to_path_buf(),
            });
        }

        {
            let dir = tree.dir_mut(id)?;
            dir.modtime = metadata.modified().map(ztree_core::unix_millis).unwrap_or(0);
            dir.creationtime = metadata.created().map(ztree_core::unix_millis).unwrap_or(0);
        }

        let mut entries = fs::read_dir(path)
            .await
            .map_err(|e| TreeError::io(path, e))?;
        let threshold = self.config.slow_entry_threshold();

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| TreeError::io(path, e))?
        {
            let started = Instant::now();
            let entry_path = entry.path();
            self.add_entry(tree, id, &entry_path, cache).await?;

            let elapsed = started.elapsed();
            if elapsed > threshold {
                warn!(
                    path = %entry_path.display(),
                    elapsed_ms = elapsed.as_millis() as u64,
                    "slow entry while building tree"
                );
            }
        }

        tree.sort(id)
    }

    async fn add_entry(
        &self,
        tree: &mut DirTree,
        dir: NodeId,
        path: &Path,
        cache: &ParseCache,
    ) -> Result<(), TreeError> {
        if path.file_name().is_some_and(|name| name == SETTINGS_FILE) {
            sidecar::parse_settings(tree.dir_mut(dir)?).await;
            return Ok(());
        }

        let Some((metadata, is_link)) = self.entry_metadata(path).await else {
            return Ok(());
        };
        let classifier = &self.collaborators.classifier;

        if metadata.is_dir() {
            if classifier.is_ignored_dir(path) {
                return Ok(());
            }
            if is_link && self.links_to_ancestor(tree, dir, path).await {
                warn!(path = %path.display(), "skipping symlink to an enclosing directory");
                return Ok(());
            }
            let child = self
                .build_dir(tree, path.to_path_buf(), Some(dir), cache)
                .await?;
            tree.dir_mut(dir)?.children.push(child);
        } else if metadata.is_file() {
            if classifier.is_attachment(path) {
                let attachment = self.collaborators.attachments.parse(path, dir).await?;
                tree.dir_mut(dir)?.attachments.push(attachment);
            } else if classifier.is_ignored_file(path) {
                return Ok(());
            } else if let Some(leaf) = self.parse_leaf(path, cache, dir).await? {
                let child = tree.insert(Node::Leaf(leaf));
                tree.dir_mut(dir)?.children.push(child);
            }
        }

        Ok(())
    }

    /// Stat an entry without following symlinks unless the config allows it.
    ///
    /// Returns `None` for entries to skip: unreadable ones, dangling links
    /// and links when `follow_symlinks` is off.
    async fn entry_metadata(&self, path: &Path) -> Option<(Metadata, bool)> {
        let metadata = match fs::symlink_metadata(path).await {
            Ok(metadata) => metadata,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "skipping unreadable entry");
                return None;
            }
        };
        if !metadata.file_type().is_symlink() {
            return Some((metadata, false));
        }
        if !self.config.follow_symlinks {
            debug!(path = %path.display(), "skipping symlink");
            return None;
        }

        match fs::metadata(path).await {
            Ok(target) => Some((target, true)),
            Err(e) => {
                debug!(path = %path.display(), error = %e, "skipping broken symlink");
                None
            }
        }
    }

    /// Whether the symlinked directory `path` resolves to the same directory
    /// as `dir` or any node above it in the tree.
    async fn links_to_ancestor(&self, tree: &DirTree, dir: NodeId, path: &Path) -> bool {
        let Ok(target) = fs::canonicalize(path).await else {
            return true;
        };

        let mut current = Some(dir);
        while let Some(id) = current {
            let Ok(node) = tree.dir(id) else {
                break;
            };
            match fs::canonicalize(&node.path).await {
                Ok(resolved) if resolved == target => return true,
                Ok(_) => {}
                Err(_) => return true,
            }
            current = node.parent;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs as stdfs;
    use tempfile::TempDir;
    use ztree_core::SortMethod;

    fn create_test_tree() -> TempDir {
        let temp = TempDir::new().unwrap();
        let root = temp.path();

        stdfs::create_dir(root.join("chapters")).unwrap();
        stdfs::create_dir(root.join("chapters/drafts")).unwrap();
        stdfs::create_dir(root.join(".git")).unwrap();

        stdfs::write(root.join("index.md"), "# Index").unwrap();
        stdfs::write(root.join("paper.tex"), "\\documentclass{article}").unwrap();
        stdfs::write(root.join("figure.png"), [0u8; 16]).unwrap();
        stdfs::write(root.join("binary.exe"), [0u8; 4]).unwrap();
        stdfs::write(root.join(".hidden.md"), "secret").unwrap();
        stdfs::write(root.join("chapters/one.md"), "one").unwrap();
        stdfs::write(root.join("chapters/drafts/two.txt"), "two").unwrap();

        temp
    }

    fn builder() -> TreeBuilder {
        TreeBuilder::new(TreeConfig::default()).unwrap()
    }

    fn child_names(tree: &DirTree, id: NodeId) -> Vec<String> {
        tree.dir(id)
            .unwrap()
            .children
            .iter()
            .map(|c| tree.node(*c).unwrap().name().to_string())
            .collect()
    }

    #[tokio::test]
    async fn test_basic_build() {
        let temp = create_test_tree();
        let mut tree = DirTree::new();
        let cache = ParseCache::new();

        let root = builder()
            .build(&mut tree, temp.path(), None, &cache)
            .await
            .unwrap();

        assert_eq!(
            child_names(&tree, root),
            vec!["chapters", "index.md", "paper.tex"]
        );
        let dir = tree.dir(root).unwrap();
        assert_eq!(dir.attachments.len(), 1);
        assert_eq!(dir.attachments[0].name.as_str(), "figure.png");
        assert!(dir.modtime > 0);
        assert!(!dir.not_found);

        let chapters = tree.child_named(root, "chapters").unwrap();
        assert_eq!(tree.parent_of(chapters), Some(root));
        let drafts = tree.child_named(chapters, "drafts").unwrap();
        assert_eq!(child_names(&tree, drafts), vec!["two.txt"]);
        assert_eq!(
            tree.leaf(tree.child_named(root, "paper.tex").unwrap())
                .unwrap()
                .kind,
            LeafKind::Code
        );
    }

    #[tokio::test]
    async fn test_build_applies_sidecar_sorting() {
        let temp = create_test_tree();
        stdfs::write(
            temp.path().join(SETTINGS_FILE),
            r#"{"sorting":"name-down"}"#,
        )
        .unwrap();

        let mut tree = DirTree::new();
        let root = builder()
            .build(&mut tree, temp.path(), None, &ParseCache::new())
            .await
            .unwrap();

        assert_eq!(tree.dir(root).unwrap().settings.sorting, SortMethod::NameDown);
        assert_eq!(
            child_names(&tree, root),
            vec!["paper.tex", "index.md", "chapters"]
        );
    }

    #[tokio::test]
    async fn test_build_missing_path_fails_cleanly() {
        let temp = TempDir::new().unwrap();
        let mut tree = DirTree::new();
        let err = builder()
            .build(&mut tree, &temp.path().join("nope"), None, &ParseCache::new())
            .await
            .unwrap_err();

        assert!(matches!(err, TreeError::NotFound { .. }));
        assert!(tree.is_empty());
    }

    #[tokio::test]
    async fn test_build_file_path_is_not_a_directory() {
        let temp = create_test_tree();
        let mut tree = DirTree::new();
        let err = builder()
            .build(&mut tree, &temp.path().join("index.md"), None, &ParseCache::new())
            .await
            .unwrap_err();
        assert!(matches!(err, TreeError::NotADirectory { .. }));
        assert!(tree.is_empty());
    }

    #[test]
    fn test_placeholder_touches_nothing() {
        let mut tree = DirTree::new();
        let id = builder().placeholder(&mut tree, Path::new("/missing"));
        let dir = tree.dir(id).unwrap();
        assert!(dir.not_found);
        assert!(dir.children.is_empty());
        assert!(dir.attachments.is_empty());
        assert_eq!((dir.modtime, dir.creationtime), (0, 0));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_symlinks_are_skipped_by_default() {
        let temp = TempDir::new().unwrap();
        stdfs::write(temp.path().join("a.md"), "a").unwrap();
        stdfs::write(temp.path().join("target.md"), "t").unwrap();
        std::os::unix::fs::symlink(temp.path(), temp.path().join("loop")).unwrap();
        std::os::unix::fs::symlink(temp.path().join("target.md"), temp.path().join("link.md"))
            .unwrap();

        let mut tree = DirTree::new();
        let root = builder()
            .build(&mut tree, temp.path(), None, &ParseCache::new())
            .await
            .unwrap();

        assert_eq!(child_names(&tree, root), vec!["a.md", "target.md"]);
        assert_eq!(tree.len(), 3);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_followed_symlink_loops_stop_at_ancestors() {
        let temp = TempDir::new().unwrap();
        stdfs::create_dir(temp.path().join("a")).unwrap();
        stdfs::create_dir(temp.path().join("b")).unwrap();
        stdfs::create_dir(temp.path().join("shared")).unwrap();
        stdfs::write(temp.path().join("shared/s.md"), "s").unwrap();
        std::os::unix::fs::symlink(temp.path(), temp.path().join("a/up")).unwrap();
        std::os::unix::fs::symlink(temp.path().join("b"), temp.path().join("a/to-b")).unwrap();
        std::os::unix::fs::symlink(temp.path().join("a"), temp.path().join("b/to-a")).unwrap();
        std::os::unix::fs::symlink(temp.path().join("shared"), temp.path().join("b/shared"))
            .unwrap();

        let config = TreeConfig::builder().follow_symlinks(true).build().unwrap();
        let mut tree = DirTree::new();
        let root = TreeBuilder::new(config)
            .unwrap()
            .build(&mut tree, temp.path(), None, &ParseCache::new())
            .await
            .unwrap();

        let a = tree.child_named(root, "a").unwrap();
        assert!(tree.child_named(a, "up").is_none());

        // a/to-b is followed once; its link back to `a` is not.
        let to_b = tree.child_named(a, "to-b").unwrap();
        assert!(tree.child_named(to_b, "to-a").is_none());
        let shared = tree.child_named(to_b, "shared").unwrap();
        assert_eq!(child_names(&tree, shared), vec!["s.md"]);
    }
}
