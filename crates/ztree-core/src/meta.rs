//! Acyclic snapshot types handed to consumers of a tree.

use std::path::PathBuf;

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

use crate::node::Identifier;
use crate::settings::SortMethod;

/// Settings as seen by snapshot consumers: only whether a project exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingsMeta {
    pub sorting: SortMethod,
    pub project: bool,
    pub icon: Option<String>,
}

/// Snapshot of a leaf document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeafMeta {
    pub identifier: Identifier,
    pub path: PathBuf,
    pub name: CompactString,
    pub dir: PathBuf,
    pub ext: CompactString,
    pub size: u64,
    pub modtime: u64,
    pub creationtime: u64,
}

/// Snapshot of an attachment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttachmentMeta {
    pub identifier: Identifier,
    pub path: PathBuf,
    pub name: CompactString,
    pub dir: PathBuf,
    pub ext: CompactString,
    pub size: u64,
    pub modtime: u64,
}

/// One entry of a directory snapshot's children.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ChildMeta {
    Directory(DirMeta),
    File(LeafMeta),
    Code(LeafMeta),
}

impl ChildMeta {
    pub fn name(&self) -> &str {
        match self {
            ChildMeta::Directory(d) => &d.name,
            ChildMeta::File(l) | ChildMeta::Code(l) => &l.name,
        }
    }
}

/// Serializable snapshot of a directory and everything below it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirMeta {
    pub identifier: Identifier,
    pub path: PathBuf,
    pub name: CompactString,
    pub dir: PathBuf,
    /// Identifier of the parent directory, `None` for roots.
    pub parent: Option<Identifier>,
    pub children: Vec<ChildMeta>,
    pub attachments: Vec<AttachmentMeta>,
    pub modtime: u64,
    pub creationtime: u64,
    #[serde(rename = "_settings")]
    pub settings: SettingsMeta,
    #[serde(rename = "dirNotFoundFlag", skip_serializing_if = "std::ops::Not::not", default)]
    pub not_found: bool,
}
