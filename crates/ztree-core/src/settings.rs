//! Per-directory settings and the known-keys merge used to hydrate them.
//!
//! Settings are stored as JSON in a sidecar file. Decoding never trusts the
//! file's shape: every level is merged onto its default template first, so
//! unknown keys are dropped and missing keys take the default value.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum::{AsRefStr, Display, EnumIter, EnumString};

use crate::error::TreeError;

/// Name of the sidecar settings file placed inside each directory.
pub const SETTINGS_FILE: &str = ".ztr-directory";

/// Ordering of a directory's children.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum SortMethod {
    /// Name A-Z.
    #[default]
    NameUp,
    /// Name Z-A.
    NameDown,
    /// Oldest modification first.
    TimeUp,
    /// Newest modification first.
    TimeDown,
}

/// Export format of a project.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Pdf,
    Html,
    Docx,
    Odt,
}

/// PDF export configuration of a project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PdfSettings {
    pub author: String,
    pub keywords: String,
    pub papertype: String,
    pub pagenumbering: String,
    pub tmargin: f64,
    pub rmargin: f64,
    pub bmargin: f64,
    pub lmargin: f64,
    pub margin_unit: String,
    pub lineheight: f64,
    pub mainfont: String,
    pub sansfont: String,
    pub fontsize: u32,
    pub toc: bool,
    #[serde(rename = "tocDepth")]
    pub toc_depth: u8,
    pub titlepage: bool,
    /// Custom template path.
    pub textpl: Option<String>,
}

impl Default for PdfSettings {
    fn default() -> Self {
        Self {
            author: String::new(),
            keywords: String::new(),
            papertype: "a4paper".to_string(),
            pagenumbering: "arabic".to_string(),
            tmargin: 3.0,
            rmargin: 3.0,
            bmargin: 3.0,
            lmargin: 3.0,
            margin_unit: "cm".to_string(),
            lineheight: 1.2,
            mainfont: "Times New Roman".to_string(),
            sansfont: "Arial".to_string(),
            fontsize: 12,
            toc: true,
            toc_depth: 2,
            titlepage: true,
            textpl: None,
        }
    }
}

/// Project configuration attached to a directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectSettings {
    pub title: String,
    pub format: OutputFormat,
    #[serde(rename = "cslStyle")]
    pub csl_style: Option<String>,
    pub pdf: PdfSettings,
}

impl Default for ProjectSettings {
    fn default() -> Self {
        Self {
            title: "Untitled".to_string(),
            format: OutputFormat::Pdf,
            csl_style: None,
            pdf: PdfSettings::default(),
        }
    }
}

impl ProjectSettings {
    /// Merge a partial JSON object onto this project.
    pub fn merged(&self, partial: &Value) -> Result<Self, TreeError> {
        decode(merge_project(partial, &to_json(self)))
    }
}

/// Settings of one directory, as persisted in its sidecar file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirSettings {
    pub sorting: SortMethod,
    pub project: Option<ProjectSettings>,
    pub icon: Option<String>,
}

impl Default for DirSettings {
    fn default() -> Self {
        Self {
            sorting: SortMethod::NameUp,
            project: None,
            icon: None,
        }
    }
}

impl DirSettings {
    /// Decode sidecar JSON, filling gaps from the default template.
    pub fn from_json(source: &Value) -> Result<Self, TreeError> {
        Self::default().merged(source)
    }

    /// Merge a partial JSON object onto these settings.
    ///
    /// A partial `project` object is merged onto the existing project, or
    /// onto the project template when none is set.
    pub fn merged(&self, partial: &Value) -> Result<Self, TreeError> {
        let base = to_json(self);
        let mut merged = merge_known_keys(partial, &base);

        if let Some(project) = merged.get("project").filter(|p| !p.is_null()).cloned() {
            let project_base = match &self.project {
                Some(existing) => to_json(existing),
                None => to_json(&ProjectSettings::default()),
            };
            merged["project"] = merge_project(&project, &project_base);
        }

        decode(merged)
    }

    /// Whether these settings only encode defaults.
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }

    /// Serialize to the sidecar JSON representation.
    pub fn to_json(&self) -> Value {
        to_json(self)
    }
}

/// Restrict `source` to the keys of `template`.
///
/// Keys missing from `source` take the template's value; keys unknown to the
/// template are dropped. A non-object template yields `source` unchanged and
/// a non-object source yields the template.
pub fn merge_known_keys(source: &Value, template: &Value) -> Value {
    let Some(template) = template.as_object() else {
        return source.clone();
    };
    let source = source.as_object();

    let merged: Map<String, Value> = template
        .iter()
        .map(|(key, default)| {
            let value = source
                .and_then(|s| s.get(key))
                .unwrap_or(default)
                .clone();
            (key.clone(), value)
        })
        .collect();

    Value::Object(merged)
}

fn merge_project(source: &Value, base: &Value) -> Value {
    let mut merged = merge_known_keys(source, base);
    let pdf_base = base.get("pdf").cloned().unwrap_or(Value::Null);
    let pdf_source = merged.get("pdf").cloned().unwrap_or(Value::Null);
    if pdf_base.is_object() {
        merged["pdf"] = merge_known_keys(&pdf_source, &pdf_base);
    }
    merged
}

fn to_json<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or_default()
}

fn decode<T: for<'de> Deserialize<'de>>(value: Value) -> Result<T, TreeError> {
    serde_json::from_value(value).map_err(|e| TreeError::InvalidSettings {
        message: e.to_string(),
    })
}
