//! Settings operations: sorting, generic settings and projects.

use std::str::FromStr;

use serde_json::Value;
use tracing::debug;

use ztree_core::{DirSettings, DirTree, NodeId, ProjectSettings, SortMethod, TreeError};
use ztree_scan::{persist_settings, set_setting};

use crate::MutationEngine;

impl MutationEngine {
    /// Change the sort method of `dir`, persist it and re-sort its children.
    ///
    /// `None` or an empty string keeps the current method but still
    /// re-sorts and persists.
    pub async fn sort(
        &self,
        tree: &mut DirTree,
        dir: NodeId,
        method: Option<&str>,
    ) -> Result<SortMethod, TreeError> {
        let method = match method.map(str::trim).filter(|m| !m.is_empty()) {
            Some(m) => SortMethod::from_str(m).map_err(|_| TreeError::UnknownSortMethod {
                method: m.to_string(),
            })?,
            None => tree.dir(dir)?.settings.sorting,
        };

        update_settings(tree, dir, |settings| {
            settings.sorting = method;
            Ok(())
        })
        .await?;

        debug!(dir = ?dir, %method, "sorted directory");
        Ok(method)
    }

    /// Merge a partial settings object onto `dir` and persist it.
    pub async fn set_setting(
        &self,
        tree: &mut DirTree,
        dir: NodeId,
        partial: &Value,
    ) -> Result<(), TreeError> {
        set_setting(tree.dir_mut(dir)?, partial).await?;
        tree.sort(dir)?;
        debug!(dir = ?dir, "updated directory settings");
        Ok(())
    }

    /// Set or clear the icon of `dir`.
    pub async fn set_icon(
        &self,
        tree: &mut DirTree,
        dir: NodeId,
        icon: Option<&str>,
    ) -> Result<(), TreeError> {
        update_settings(tree, dir, |settings| {
            settings.icon = icon.map(str::to_string);
            Ok(())
        })
        .await
    }

    /// Merge project properties onto the project of `dir`.
    ///
    /// A directory without a project gets the properties merged onto the
    /// project template, which turns it into a project.
    pub async fn update_project_properties(
        &self,
        tree: &mut DirTree,
        dir: NodeId,
        properties: &Value,
    ) -> Result<(), TreeError> {
        update_settings(tree, dir, |settings| {
            let project = settings
                .project
                .clone()
                .unwrap_or_default()
                .merged(properties)?;
            settings.project = Some(project);
            Ok(())
        })
        .await?;

        debug!(dir = ?dir, "updated project properties");
        Ok(())
    }

    /// Turn `dir` into a project with the default project settings.
    pub async fn make_project(&self, tree: &mut DirTree, dir: NodeId) -> Result<(), TreeError> {
        update_settings(tree, dir, |settings| {
            settings.project = Some(ProjectSettings::default());
            Ok(())
        })
        .await?;

        debug!(dir = ?dir, "created project");
        Ok(())
    }

    /// Drop the project settings of `dir`.
    pub async fn remove_project(&self, tree: &mut DirTree, dir: NodeId) -> Result<(), TreeError> {
        update_settings(tree, dir, |settings| {
            settings.project = None;
            Ok(())
        })
        .await?;

        debug!(dir = ?dir, "removed project");
        Ok(())
    }
}

/// Apply `change` to a copy of the settings of `dir`, persist it and
/// re-sort the children.
///
/// The node keeps its old settings when `change` or the write fails, so
/// `children` always matches `settings.sorting`.
async fn update_settings<F>(tree: &mut DirTree, dir: NodeId, change: F) -> Result<(), TreeError>
where
    F: FnOnce(&mut DirSettings) -> Result<(), TreeError>,
{
    let node = tree.dir_mut(dir)?;
    let mut updated = node.settings.clone();
    change(&mut updated)?;

    let previous = std::mem::replace(&mut node.settings, updated);
    if let Err(e) = persist_settings(node).await {
        node.settings = previous;
        return Err(e);
    }
    tree.sort(dir)
}
