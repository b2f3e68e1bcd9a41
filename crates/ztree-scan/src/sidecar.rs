//! Sidecar settings store.
//!
//! Each directory may carry a `.ztr-directory` JSON file holding its
//! non-default settings. A missing file means "all defaults", so the store
//! never leaves a file behind whose content equals the defaults.

use std::path::{Path, PathBuf};

use serde_json::Value;
use tokio::fs;
use tracing::{debug, warn};

use ztree_core::{DirSettings, DirectoryNode, SETTINGS_FILE, TreeError};

/// Path of the sidecar file for a directory.
pub fn sidecar_path(dir: &Path) -> PathBuf {
    dir.join(SETTINGS_FILE)
}

/// Hydrate `dir.settings` from its sidecar file.
///
/// Read and decode failures are logged and leave the current settings in
/// place. A file that only encodes defaults is deleted.
pub async fn parse_settings(dir: &mut DirectoryNode) {
    let path = sidecar_path(&dir.path);

    let content = match fs::read_to_string(&path).await {
        Ok(content) => content,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "could not read directory settings");
            return;
        }
    };

    let settings = serde_json::from_str::<Value>(&content)
        .map_err(|e| TreeError::InvalidSettings {
            message: e.to_string(),
        })
        .and_then(|value| DirSettings::from_json(&value));

    match settings {
        Ok(settings) => {
            dir.settings = settings;
            if dir.settings.is_default() {
                remove_sidecar(&path).await;
            }
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "ignoring malformed directory settings");
        }
    }
}

/// Write `dir.settings` to its sidecar file.
///
/// Default settings are never written; an existing file is removed instead
/// (a failed removal is only logged).
pub async fn persist_settings(dir: &DirectoryNode) -> Result<(), TreeError> {
    let path = sidecar_path(&dir.path);

    if dir.settings.is_default() {
        if fs::try_exists(&path).await.unwrap_or(false) {
            remove_sidecar(&path).await;
        }
        return Ok(());
    }

    let content = serde_json::to_string(&dir.settings.to_json()).map_err(|e| {
        TreeError::InvalidSettings {
            message: e.to_string(),
        }
    })?;
    fs::write(&path, content)
        .await
        .map_err(|e| TreeError::io(&path, e))
}

/// Merge `partial` onto the directory's settings and persist them.
///
/// The in-memory settings only change when the merged result decodes and
/// has been persisted.
pub async fn set_setting(dir: &mut DirectoryNode, partial: &Value) -> Result<(), TreeError> {
    let merged = dir.settings.merged(partial)?;
    let previous = std::mem::replace(&mut dir.settings, merged);
    if let Err(e) = persist_settings(dir).await {
        dir.settings = previous;
        return Err(e);
    }
    Ok(())
}

async fn remove_sidecar(path: &Path) {
    match fs::remove_file(path).await {
        Ok(()) => debug!(path = %path.display(), "removed default directory settings"),
        Err(e) => warn!(path = %path.display(), error = %e, "could not remove directory settings"),
    }
}
