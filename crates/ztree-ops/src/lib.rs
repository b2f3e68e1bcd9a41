//! Mutation engine for ztree.
//!
//! This crate applies structural and settings changes to a directory on disk
//! and keeps the in-memory [`DirTree`](ztree_core::DirTree) and the sidecar
//! settings files consistent with it. After a structural change the affected
//! subtree is rebuilt from disk rather than patched.
//!
//! # Example
//!
//! ```rust,no_run
//! use ztree_ops::MutationEngine;
//! use ztree_scan::{DirTree, ParseCache, TreeBuilder, TreeConfig};
//!
//! # async fn run() -> Result<(), ztree_scan::TreeError> {
//! let engine = MutationEngine::new(TreeBuilder::new(TreeConfig::default())?);
//! let mut tree = DirTree::new();
//! let cache = ParseCache::new();
//!
//! let root = engine.builder().build(&mut tree, "/path/to/notes".as_ref(), None, &cache).await?;
//! let chapter = engine.create(&mut tree, root, "chapter-1", &cache).await?;
//! engine.create_file(&mut tree, chapter, "intro.md", "# Intro\n", &cache).await?;
//! engine.sort(&mut tree, root, Some("time-down")).await?;
//! # Ok(())
//! # }
//! ```

mod conflict;
mod create;
mod move_op;
mod operation;
mod remove;
mod rename;
mod settings;

pub use conflict::{Conflict, ConflictKind};
pub use operation::{MoveOutcome, MutationEngine, RemoveOutcome};
pub use rename::validate_filename;
