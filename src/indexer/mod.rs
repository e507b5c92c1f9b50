//! Builds the two catalog files served next to bundled templates:
//! `templates.json` (templates grouped by directory) and `templateFields.json`
//! (sample-data keys and OData types per template).

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

pub const TEMPLATES_FILE: &str = "templates.json";
pub const TEMPLATE_FIELDS_FILE: &str = "templateFields.json";

/// Only files inside at least one subdirectory are indexed.
const TEMPLATE_PATTERN: &str = "**/*/*.json";

#[derive(Debug, thiserror::Error)]
pub enum IndexerError {
    #[error("Invalid templates directory {0}")]
    InvalidDirectory(String),
    #[error("Invalid scan pattern: {0}")]
    Pattern(#[from] glob::PatternError),
    #[error("Failed to serialize {file}: {source}")]
    Serialize {
        file: &'static str,
        source: serde_json::Error,
    },
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateEntry {
    pub file: String,
    pub full_path: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TemplateGroup {
    pub templates: Vec<TemplateEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateFields {
    pub template_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub odata_type: Option<String>,
}

impl TemplateFields {
    /// Fields of one template document, `None` when it carries neither.
    pub fn from_template(template_path: &str, template: &Value) -> Option<Self> {
        let odata_type = template
            .get("$odata.type")
            .and_then(Value::as_str)
            .filter(|odata_type| !odata_type.is_empty())
            .map(str::to_string);
        let properties = template
            .get("$sampleData")
            .and_then(Value::as_object)
            .map(|sample| sample.keys().cloned().collect::<Vec<_>>());

        if properties.is_none() && odata_type.is_none() {
            return None;
        }

        Some(Self {
            template_path: template_path.to_string(),
            properties,
            odata_type,
        })
    }
}

#[derive(Debug, Default, PartialEq)]
pub struct Index {
    pub templates: IndexMap<String, TemplateGroup>,
    pub fields: Vec<TemplateFields>,
}

fn relative_path(dir: &Path, file: &Path) -> Option<String> {
    let relative = file.strip_prefix(dir).ok()?;
    let parts = relative
        .components()
        .map(|part| part.as_os_str().to_str())
        .collect::<Option<Vec<_>>>()?;

    Some(parts.join("/"))
}

/// Reads every template under `dir`. Unreadable or malformed files are skipped.
#[tracing::instrument(name = "Scan templates.")]
pub fn scan(dir: &Path) -> Result<Index, IndexerError> {
    if !dir.is_dir() {
        return Err(IndexerError::InvalidDirectory(dir.display().to_string()));
    }

    let root = dir
        .to_str()
        .ok_or_else(|| IndexerError::InvalidDirectory(dir.display().to_string()))?;
    let pattern = format!("{}/{}", glob::Pattern::escape(root), TEMPLATE_PATTERN);

    let mut index = Index::default();
    for entry in glob::glob(&pattern)? {
        let file = match entry {
            Ok(file) => file,
            Err(err) => {
                tracing::warn!("Failed to read {}: {}", err.path().display(), err);
                continue;
            }
        };
        let Some(full_path) = relative_path(dir, &file) else {
            tracing::warn!("Skipping non UTF-8 path {}", file.display());
            continue;
        };

        let template = match fs::read_to_string(&file)
            .map_err(|err| err.to_string())
            .and_then(|content| {
                serde_json::from_str::<Value>(&content).map_err(|err| err.to_string())
            }) {
            Ok(template) => template,
            Err(err) => {
                tracing::warn!("Failed to read file {}: {}", full_path, err);
                continue;
            }
        };

        let (group, name) = match full_path.rsplit_once('/') {
            Some((group, name)) => (group.to_string(), name.to_string()),
            None => continue,
        };
        index
            .templates
            .entry(group)
            .or_default()
            .templates
            .push(TemplateEntry {
                file: name,
                full_path: full_path.clone(),
            });

        if let Some(fields) = TemplateFields::from_template(&full_path, &template) {
            index.fields.push(fields);
        }
    }

    tracing::info!(
        groups = index.templates.len(),
        with_fields = index.fields.len(),
        "Scanned templates"
    );
    Ok(index)
}

fn write_json<T: Serialize>(dir: &Path, file: &'static str, value: &T) -> Result<(), IndexerError> {
    let body = serde_json::to_string(value)
        .map_err(|source| IndexerError::Serialize { file, source })?;
    let path = dir.join(file);
    fs::write(&path, body).map_err(|source| IndexerError::Write { path, source })
}

/// Writes `templates.json` and `templateFields.json` into `dir`.
pub fn write(dir: &Path, index: &Index) -> Result<(), IndexerError> {
    write_json(dir, TEMPLATES_FILE, &index.templates)?;
    write_json(dir, TEMPLATE_FIELDS_FILE, &index.fields)
}

pub fn generate(dir: &Path) -> Result<Index, IndexerError> {
    let index = scan(dir)?;
    write(dir, &index)?;
    Ok(index)
}
