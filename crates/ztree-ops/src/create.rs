//! File and directory creation operations.

use std::path::PathBuf;

use tokio::fs;
use tracing::debug;

use ztree_core::{DirTree, Node, NodeId, SETTINGS_FILE, TreeError};
use ztree_scan::ParseCache;

use crate::MutationEngine;
use crate::rename::validate_filename;

impl MutationEngine {
    /// Create a subdirectory `name` in `dir` and add it to the tree.
    ///
    /// The name is checked against the tree's children and the ignore
    /// patterns before the disk is touched. The new node is built from disk
    /// so an existing sidecar or content (e.g. from a concurrent writer) is
    /// picked up.
    pub async fn create(
        &self,
        tree: &mut DirTree,
        dir: NodeId,
        name: &str,
        cache: &ParseCache,
    ) -> Result<NodeId, TreeError> {
        let path = self.new_child_path(tree, dir, name)?;
        if self.builder.collaborators().classifier.is_ignored_dir(&path) {
            return Err(TreeError::invalid_name(name, "name is ignored by the tree"));
        }

        fs::create_dir(&path)
            .await
            .map_err(|e| TreeError::io(&path, e))?;

        let child = self.builder.build(tree, &path, Some(dir), cache).await?;
        tree.attach(dir, child)?;

        debug!(path = %path.display(), "created directory");
        Ok(child)
    }

    /// Write a new document `name` with `content` into `dir` and add it to
    /// the tree.
    ///
    /// Only names with a document extension are accepted; anything else
    /// would never show up as a child.
    pub async fn create_file(
        &self,
        tree: &mut DirTree,
        dir: NodeId,
        name: &str,
        content: &str,
        cache: &ParseCache,
    ) -> Result<NodeId, TreeError> {
        let path = self.new_child_path(tree, dir, name)?;
        if self.builder.collaborators().classifier.is_ignored_file(&path) {
            return Err(TreeError::invalid_name(name, "name is ignored by the tree"));
        }
        if self.builder.leaf_kind(&path).is_none() {
            return Err(TreeError::invalid_name(name, "unsupported document type"));
        }

        fs::write(&path, content)
            .await
            .map_err(|e| TreeError::io(&path, e))?;

        let Some(leaf) = self.builder.parse_leaf(&path, cache, dir).await? else {
            return Err(TreeError::invalid_name(name, "unsupported document type"));
        };
        let child = tree.insert(Node::Leaf(leaf));
        tree.attach(dir, child)?;

        debug!(path = %path.display(), bytes = content.len(), "created file");
        Ok(child)
    }

    /// Validate `name` and return the path it would get inside `dir`.
    fn new_child_path(&self, tree: &DirTree, dir: NodeId, name: &str) -> Result<PathBuf, TreeError> {
        validate_filename(name).map_err(|reason| TreeError::invalid_name(name, reason))?;
        if name == SETTINGS_FILE {
            return Err(TreeError::invalid_name(name, "reserved for directory settings"));
        }

        let parent = tree.dir(dir)?;
        if tree.child_named(dir, name).is_some() {
            return Err(TreeError::NameExists {
                name: name.to_string(),
                parent: parent.path.clone(),
            });
        }

        Ok(parent.path.join(name))
    }
}
