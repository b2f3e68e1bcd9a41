//! Core types for ztree.
//!
//! This crate provides the data model shared by the builder and the mutation
//! engine: the node arena, per-directory settings with their sidecar JSON
//! shape, the sort policy, configuration and the snapshot types produced
//! for consumers.

mod config;
mod error;
mod meta;
mod node;
mod settings;
mod sort;
mod tree;

pub use config::{TreeConfig, TreeConfigBuilder};
pub use error::TreeError;
pub use meta::{AttachmentMeta, ChildMeta, DirMeta, LeafMeta, SettingsMeta};
pub use node::{
    AttachmentNode, DirectoryNode, Identifier, LeafKind, LeafNode, Node, NodeId, display_name,
    dotted_extension, unix_millis,
};
pub use settings::{
    DirSettings, OutputFormat, PdfSettings, ProjectSettings, SETTINGS_FILE, SortMethod,
    merge_known_keys,
};
pub use sort::{natural_cmp, sort_children};
pub use tree::DirTree;
