//! Directory tree builder for ztree.
//!
//! This crate turns a directory on disk into nodes of a
//! [`DirTree`](ztree_core::DirTree) and back into serializable snapshots.
//!
//! # Overview
//!
//! - **TreeBuilder** walks a directory depth first, classifies each entry
//!   and delegates document and attachment parsing to [`Collaborators`].
//! - **Sidecar store** ([`parse_settings`], [`persist_settings`],
//!   [`set_setting`]) hydrates and persists per-directory settings, deleting
//!   sidecar files that only hold defaults.
//! - **Projector** ([`project`]) produces an acyclic [`DirMeta`] snapshot.
//!
//! # Example
//!
//! ```rust,no_run
//! use ztree_scan::{DirTree, ParseCache, TreeBuilder, TreeConfig};
//!
//! # async fn run() -> Result<(), ztree_scan::TreeError> {
//! let builder = TreeBuilder::new(TreeConfig::default())?;
//! let mut tree = DirTree::new();
//! let cache = ParseCache::new();
//!
//! let root = builder.build(&mut tree, "/path/to/notes".as_ref(), None, &cache).await?;
//! let snapshot = builder.project(&tree, root)?;
//! println!("{} entries", snapshot.children.len());
//! # Ok(())
//! # }
//! ```

mod builder;
mod collaborators;
mod parsers;
mod projector;
mod sidecar;

pub use builder::TreeBuilder;
pub use collaborators::{
    AttachmentParser, Collaborators, LeafParser, ParseCache, PathClassifier, PathHasher,
};
pub use parsers::{Blake3Hasher, GlobClassifier, StatAttachmentParser, StatLeafParser};
pub use projector::project;
pub use sidecar::{parse_settings, persist_settings, set_setting, sidecar_path};

// Re-export core types for convenience
pub use ztree_core::{
    DirMeta, DirSettings, DirTree, DirectoryNode, LeafKind, LeafNode, Node, NodeId, SortMethod,
    TreeConfig, TreeError,
};
