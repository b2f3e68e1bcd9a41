//! Move operation.

use tokio::fs;
use tracing::{debug, warn};

use ztree_core::{DirTree, Node, NodeId, TreeError};
use ztree_scan::ParseCache;

use crate::conflict::Conflict;
use crate::{MoveOutcome, MutationEngine};

impl MutationEngine {
    /// Move a file or directory into `target` and rebuild it there.
    ///
    /// Conflicts are detected on disk before anything moves. After the disk
    /// rename the source is dropped from the arena even when its old parent
    /// no longer listed it; [`MoveOutcome::detached`] reports which case
    /// happened.
    pub async fn move_node(
        &self,
        tree: &mut DirTree,
        source: NodeId,
        target: NodeId,
        cache: &ParseCache,
    ) -> Result<MoveOutcome, TreeError> {
        let (source_path, source_is_dir) = {
            let node = tree.node(source)?;
            (node.path().to_path_buf(), node.is_dir())
        };
        let name = source_path
            .file_name()
            .ok_or_else(|| {
                TreeError::invalid_name(source_path.display().to_string(), "no file name")
            })?
            .to_os_string();
        let destination = tree.dir(target)?.path.join(&name);

        if let Some(conflict) = Conflict::detect(&source_path, &destination, source_is_dir).await {
            return Err(conflict.into());
        }

        fs::rename(&source_path, &destination)
            .await
            .map_err(|e| TreeError::io(&source_path, e))?;

        let detached = tree.detach(source).is_some();
        if !detached {
            warn!(
                path = %source_path.display(),
                "moved node was missing from its parent"
            );
        }

        for id in std::iter::once(source).chain(tree.descendants(source)) {
            if let Some(leaf) = tree.leaf(id) {
                cache.invalidate(&leaf.path);
            }
        }
        tree.remove_subtree(source);

        let node = if source_is_dir {
            self.builder
                .build(tree, &destination, Some(target), cache)
                .await?
        } else {
            let leaf = self
                .builder
                .parse_leaf(&destination, cache, target)
                .await?
                .ok_or_else(|| {
                    TreeError::invalid_name(
                        name.to_string_lossy().into_owned(),
                        "unsupported document type",
                    )
                })?;
            tree.insert(Node::Leaf(leaf))
        };
        tree.attach(target, node)?;

        debug!(
            from = %source_path.display(),
            to = %destination.display(),
            detached,
            "moved node"
        );
        Ok(MoveOutcome { node, detached })
    }
}
