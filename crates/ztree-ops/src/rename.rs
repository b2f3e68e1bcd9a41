//! Rename operation.

use std::path::Path;

use tokio::fs;
use tracing::{debug, warn};

use ztree_core::{DirTree, NodeId, TreeError};
use ztree_scan::ParseCache;

use crate::MutationEngine;

impl MutationEngine {
    /// Rename a directory and rebuild its whole subtree at the new path.
    ///
    /// Uniqueness is checked against the live listing of the parent
    /// directory on disk. The rebuilt node takes the old node's place in its
    /// parent and the old subtree is dropped; callers holding the old id
    /// must switch to the returned one. A failed rebuild after a successful
    /// disk rename is not rolled back.
    pub async fn rename(
        &self,
        tree: &mut DirTree,
        dir: NodeId,
        new_name: &str,
        cache: &ParseCache,
    ) -> Result<NodeId, TreeError> {
        validate_filename(new_name).map_err(|reason| TreeError::invalid_name(new_name, reason))?;

        let old_path = tree.dir(dir)?.path.clone();
        let parent_path = old_path
            .parent()
            .ok_or_else(|| TreeError::invalid_name(new_name, "cannot rename a root"))?
            .to_path_buf();

        if name_taken_on_disk(&parent_path, new_name).await? {
            return Err(TreeError::NameExists {
                name: new_name.to_string(),
                parent: parent_path,
            });
        }

        let new_path = parent_path.join(new_name);
        fs::rename(&old_path, &new_path)
            .await
            .map_err(|e| TreeError::io(&old_path, e))?;

        for id in tree.descendants(dir) {
            if let Some(leaf) = tree.leaf(id) {
                cache.invalidate(&leaf.path);
            }
        }

        let parent = tree.parent_of(dir);
        let renamed = self.builder.build(tree, &new_path, parent, cache).await?;

        if let Some(parent) = parent {
            if tree.replace_child(dir, renamed).is_none() {
                warn!(
                    path = %old_path.display(),
                    "renamed directory was missing from its parent, appending"
                );
                tree.attach(parent, renamed)?;
            }
        }
        tree.remove_subtree(dir);

        debug!(from = %old_path.display(), to = %new_path.display(), "renamed directory");
        Ok(renamed)
    }
}

async fn name_taken_on_disk(parent: &Path, name: &str) -> Result<bool, TreeError> {
    let mut entries = fs::read_dir(parent)
        .await
        .map_err(|e| TreeError::io(parent, e))?;
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| TreeError::io(parent, e))?
    {
        if entry.file_name() == name {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Validate a file or directory name for cross-platform compatibility.
pub fn validate_filename(name: &str) -> Result<(), String> {
    if name.trim().is_empty() {
        return Err("Name cannot be empty".into());
    }

    if name.len() > 255 {
        return Err("Name is too long (max 255 bytes)".into());
    }

    for c in ['/', '\0'] {
        if name.contains(c) {
            return Err(format!("Name cannot contain '{}'", c.escape_default()));
        }
    }

    #[cfg(target_os = "windows")]
    {
        let windows_invalid = ['\\', ':', '*', '?', '"', '<', '>', '|'];
        for c in windows_invalid {
            if name.contains(c) {
                return Err(format!("Name cannot contain '{}'", c));
            }
        }
    }

    if name.starts_with(' ') || name.ends_with(' ') {
        return Err("Name cannot start or end with spaces".into());
    }

    if name == "." || name == ".." {
        return Err("'.' and '..' are reserved names".into());
    }

    if name.ends_with('.') {
        return Err("Name cannot end with a dot".into());
    }

    Ok(())
}
