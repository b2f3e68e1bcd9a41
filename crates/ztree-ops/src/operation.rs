//! Mutation engine and operation outcomes.

use serde::{Deserialize, Serialize};

use ztree_core::NodeId;
use ztree_scan::TreeBuilder;

/// Applies mutations to a [`DirTree`](ztree_core::DirTree) and the disk.
///
/// Every structural operation re-derives the affected subtree from disk
/// after the disk change instead of patching nodes in place. Callers must
/// serialize operations per tree; each one borrows the arena mutably.
#[derive(Debug, Clone)]
pub struct MutationEngine {
    pub(crate) builder: TreeBuilder,
}

impl MutationEngine {
    /// Create an engine rebuilding subtrees with `builder`.
    pub fn new(builder: TreeBuilder) -> Self {
        Self { builder }
    }

    pub fn builder(&self) -> &TreeBuilder {
        &self.builder
    }
}

/// How a removal ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RemoveOutcome {
    /// Moved to the trash and dropped from the tree.
    Trashed,
    /// Deleted outright and dropped from the tree.
    Deleted,
    /// Still on disk; the tree is unchanged.
    Failed,
}

impl RemoveOutcome {
    /// Whether the entry is gone from disk and tree.
    pub fn is_removed(&self) -> bool {
        !matches!(self, Self::Failed)
    }
}

/// Result of moving a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveOutcome {
    /// The node rebuilt at the new location.
    pub node: NodeId,
    /// Whether the source was found in (and removed from) its old parent.
    pub detached: bool,
}
