//! Projection of arena nodes into acyclic snapshots.

use ztree_core::{
    ChildMeta, DirMeta, DirTree, LeafKind, Node, NodeId, SettingsMeta, TreeError,
};

use crate::collaborators::Collaborators;

/// Snapshot the directory `id` and everything below it.
///
/// Parent links are replaced by the parent's identifier and never followed,
/// so the walk only descends. Child ids missing from the arena are skipped.
pub fn project(
    tree: &DirTree,
    id: NodeId,
    collaborators: &Collaborators,
) -> Result<DirMeta, TreeError> {
    let dir = tree.dir(id)?;

    let parent = dir
        .parent
        .and_then(|p| tree.get(p))
        .map(Node::identifier);

    let children = dir
        .children
        .iter()
        .filter_map(|child| match tree.get(*child)? {
            Node::Directory(_) => project(tree, *child, collaborators)
                .ok()
                .map(ChildMeta::Directory),
            Node::Leaf(leaf) => {
                let meta = collaborators.leaf_parser(leaf.kind).metadata(leaf);
                Some(match leaf.kind {
                    LeafKind::File => ChildMeta::File(meta),
                    LeafKind::Code => ChildMeta::Code(meta),
                })
            }
        })
        .collect();

    let attachments = dir
        .attachments
        .iter()
        .map(|a| collaborators.attachments.metadata(a))
        .collect();

    Ok(DirMeta {
        identifier: dir.identifier,
        path: dir.path.clone(),
        name: dir.name.clone(),
        dir: dir.dir.clone(),
        parent,
        children,
        attachments,
        modtime: dir.modtime,
        creationtime: dir.creationtime,
        settings: SettingsMeta {
            sorting: dir.settings.sorting,
            project: dir.settings.project.is_some(),
            icon: dir.settings.icon.clone(),
        },
        not_found: dir.not_found,
    })
}
