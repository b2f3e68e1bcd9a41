//! Remove operation.

use std::path::PathBuf;

use tokio::fs;
use tracing::{debug, warn};

use ztree_core::{DirTree, NodeId};
use ztree_scan::ParseCache;

use crate::{MutationEngine, RemoveOutcome};

impl MutationEngine {
    /// Remove a file or directory from disk and from the tree.
    ///
    /// Tries the trash first (unless disabled in the config) and falls back
    /// to deleting outright. Never fails: when the entry survives on disk a
    /// warning is logged and the tree is left as it was.
    pub async fn remove(
        &self,
        tree: &mut DirTree,
        id: NodeId,
        cache: &ParseCache,
    ) -> RemoveOutcome {
        let Some(node) = tree.get(id) else {
            return RemoveOutcome::Failed;
        };
        let path = node.path().to_path_buf();
        let is_dir = node.is_dir();

        let outcome = if self.builder.config().use_trash && move_to_trash(path.clone()).await {
            RemoveOutcome::Trashed
        } else {
            let deleted = if is_dir {
                fs::remove_dir_all(&path).await
            } else {
                fs::remove_file(&path).await
            };
            match deleted {
                Ok(()) => RemoveOutcome::Deleted,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "could not remove entry");
                    return RemoveOutcome::Failed;
                }
            }
        };

        for child in std::iter::once(id).chain(tree.descendants(id)) {
            if let Some(leaf) = tree.leaf(child) {
                cache.invalidate(&leaf.path);
            }
        }
        tree.detach(id);
        let removed = tree.remove_subtree(id);

        debug!(path = %path.display(), ?outcome, nodes = removed, "removed entry");
        outcome
    }
}

async fn move_to_trash(path: PathBuf) -> bool {
    let shown = path.display().to_string();
    match tokio::task::spawn_blocking(move || trash::delete(&path)).await {
        Ok(Ok(())) => true,
        Ok(Err(e)) => {
            debug!(path = %shown, error = %e, "trash failed, deleting instead");
            false
        }
        Err(e) => {
            debug!(path = %shown, error = %e, "trash task failed, deleting instead");
            false
        }
    }
}
