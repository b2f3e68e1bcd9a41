//! Tree configuration types.

use std::time::Duration;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::error::TreeError;

/// Configuration for building and mutating trees.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
#[serde(default)]
pub struct TreeConfig {
    /// Extensions (with leading dot) parsed as markdown-like documents.
    #[builder(default = "default_markdown_extensions()")]
    pub markdown_extensions: Vec<String>,

    /// Extensions (with leading dot) parsed as code documents.
    #[builder(default = "default_code_extensions()")]
    pub code_extensions: Vec<String>,

    /// Extensions (with leading dot) kept as attachments.
    #[builder(default = "default_attachment_extensions()")]
    pub attachment_extensions: Vec<String>,

    /// Directory names to skip (glob syntax).
    #[builder(default = "default_ignore_dirs()")]
    pub ignore_dirs: Vec<String>,

    /// File names to skip unless they are attachments (glob syntax).
    #[builder(default = "default_ignore_files()")]
    pub ignore_files: Vec<String>,

    /// Entries slower than this to classify and parse are logged.
    #[builder(default = "100")]
    pub slow_entry_threshold_ms: u64,

    /// Move removed entries to the trash before deleting them outright.
    #[builder(default = "true")]
    pub use_trash: bool,

    /// Descend into symlinked directories and parse symlinked documents.
    #[builder(default = "false")]
    pub follow_symlinks: bool,
}

fn default_markdown_extensions() -> Vec<String> {
    [".md", ".rmd", ".markdown", ".txt"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_code_extensions() -> Vec<String> {
    vec![".tex".to_string()]
}

fn default_attachment_extensions() -> Vec<String> {
    [
        ".pdf", ".png", ".jpg", ".jpeg", ".gif", ".svg", ".webp", ".docx", ".odt", ".xlsx",
        ".pptx", ".csv", ".bib", ".json",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_ignore_dirs() -> Vec<String> {
    vec![".*".to_string(), "node_modules".to_string()]
}

fn default_ignore_files() -> Vec<String> {
    vec![".*".to_string()]
}

impl TreeConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        check_extensions([
            ("markdown", self.markdown_extensions.as_deref()),
            ("code", self.code_extensions.as_deref()),
            ("attachment", self.attachment_extensions.as_deref()),
        ])
    }
}

fn check_extensions(lists: [(&str, Option<&[String]>); 3]) -> Result<(), String> {
    for (label, list) in lists {
        if let Some(bad) = list.into_iter().flatten().find(|ext| !ext.starts_with('.')) {
            return Err(format!("{label} extension '{bad}' must start with a dot"));
        }
    }
    Ok(())
}

impl TreeConfig {
    /// Create a new config builder.
    pub fn builder() -> TreeConfigBuilder {
        TreeConfigBuilder::default()
    }

    /// Check a config that did not go through the builder, e.g. one
    /// deserialized from a file.
    pub fn validate(&self) -> Result<(), TreeError> {
        check_extensions([
            ("markdown", Some(self.markdown_extensions.as_slice())),
            ("code", Some(self.code_extensions.as_slice())),
            ("attachment", Some(self.attachment_extensions.as_slice())),
        ])
        .map_err(|message| TreeError::InvalidConfig { message })
    }

    /// Slow-entry threshold as a duration.
    pub fn slow_entry_threshold(&self) -> Duration {
        Duration::from_millis(self.slow_entry_threshold_ms)
    }

    /// Check an extension (with leading dot) against the markdown list.
    pub fn is_markdown_ext(&self, ext: &str) -> bool {
        contains_ext(&self.markdown_extensions, ext)
    }

    /// Check an extension (with leading dot) against the code list.
    pub fn is_code_ext(&self, ext: &str) -> bool {
        contains_ext(&self.code_extensions, ext)
    }

    /// Check an extension (with leading dot) against the attachment list.
    pub fn is_attachment_ext(&self, ext: &str) -> bool {
        contains_ext(&self.attachment_extensions, ext)
    }
}

fn contains_ext(list: &[String], ext: &str) -> bool {
    !ext.is_empty() && list.iter().any(|e| e.eq_ignore_ascii_case(ext))
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            markdown_extensions: default_markdown_extensions(),
            code_extensions: default_code_extensions(),
            attachment_extensions: default_attachment_extensions(),
            ignore_dirs: default_ignore_dirs(),
            ignore_files: default_ignore_files(),
            slow_entry_threshold_ms: 100,
            use_trash: true,
            follow_symlinks: false,
        }
    }
}
