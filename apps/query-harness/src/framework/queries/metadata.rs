//! Schema checks for query metadata documents.
//!
//! A metadata document is a YAML mapping describing one catalog query:
//! required `title`, `description`, `keywords` and `sql`, plus optional
//! `difficulty`, `estimated_cost`, `author`, `idc_version`, `modality`,
//! `notes` and `related_queries`. Validation never fails outright; every
//! problem becomes a line in the returned [`ValidationReport`].
//!
//! `estimated_cost` here is the categorical [`CostTier`] an author assigns.
//! It is unrelated to the dollar estimate the executor computes from bytes
//! scanned.

use std::path::{Path, PathBuf};

use serde_yaml::Value;
use walkdir::WalkDir;

use crate::utilities::constants::METADATA_FILE_EXTENSIONS;

const REQUIRED_FIELDS: [&str; 4] = ["title", "description", "keywords", "sql"];
const TEXT_FIELDS: [&str; 6] = ["title", "description", "sql", "author", "idc_version", "notes"];
const LIST_FIELDS: [&str; 3] = ["keywords", "modality", "related_queries"];
const MAX_TITLE_CHARS: usize = 80;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Difficulty {
    Basic,
    Intermediate,
    Advanced,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Self::Basic, Self::Intermediate, Self::Advanced];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Intermediate => "intermediate",
            Self::Advanced => "advanced",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.as_str() == value)
    }
}

/// Author-assigned cost bucket of a catalog query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CostTier {
    Low,
    Medium,
    High,
}

impl CostTier {
    pub const ALL: [CostTier; 3] = [Self::Low, Self::Medium, Self::High];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == value)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationReport {
    fn single_error(message: String) -> Self {
        Self {
            errors: vec![message],
            warnings: Vec::new(),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

pub fn validate_file(path: &Path) -> ValidationReport {
    match std::fs::read_to_string(path) {
        Ok(source) => validate_source(&source),
        Err(e) => ValidationReport::single_error(format!(
            "Failed to read {}: {e}",
            path.display()
        )),
    }
}

pub fn validate_source(source: &str) -> ValidationReport {
    match serde_yaml::from_str::<Value>(source) {
        Ok(document) => validate_document(&document),
        Err(e) => ValidationReport::single_error(format!("Failed to parse YAML: {e}")),
    }
}

pub fn validate_document(document: &Value) -> ValidationReport {
    if !document.is_mapping() {
        return ValidationReport::single_error(
            "Metadata document must be a mapping of fields".to_string(),
        );
    }

    let mut report = ValidationReport::default();

    for field in REQUIRED_FIELDS {
        match document.get(field) {
            None => report
                .errors
                .push(format!("Missing required field: {field}")),
            Some(value) if is_falsy(value) => report
                .errors
                .push(format!("Required field '{field}' is empty")),
            Some(_) => {}
        }
    }

    for field in TEXT_FIELDS {
        if document.get(field).is_some_and(|v| !v.is_string()) {
            report.errors.push(format!("'{field}' must be a string"));
        }
    }

    for field in LIST_FIELDS {
        if document.get(field).is_some_and(|v| !v.is_sequence()) {
            report.errors.push(format!("'{field}' must be a list"));
        }
    }

    if document
        .get("keywords")
        .and_then(Value::as_sequence)
        .is_some_and(|keywords| keywords.is_empty())
    {
        report
            .errors
            .push("'keywords' must contain at least one keyword".to_string());
    }

    if let Some(value) = document.get("difficulty") {
        if value.as_str().and_then(Difficulty::parse).is_none() {
            let allowed: Vec<&str> = Difficulty::ALL.iter().map(Difficulty::as_str).collect();
            report.errors.push(format!(
                "'difficulty' must be one of [{}], got '{}'",
                allowed.join(", "),
                render_value(value)
            ));
        }
    }

    if let Some(value) = document.get("estimated_cost") {
        if value.as_str().and_then(CostTier::parse).is_none() {
            let allowed: Vec<&str> = CostTier::ALL.iter().map(CostTier::as_str).collect();
            report.errors.push(format!(
                "'estimated_cost' must be one of [{}], got '{}'",
                allowed.join(", "),
                render_value(value)
            ));
        }
    }

    if let Some(title) = document.get("title").and_then(Value::as_str) {
        let length = title.chars().count();
        if length > MAX_TITLE_CHARS {
            report.warnings.push(format!(
                "Title is {length} characters, consider keeping it under {MAX_TITLE_CHARS} characters"
            ));
        }
    }

    if let Some(sql) = document.get("sql").and_then(Value::as_str) {
        if !sql.to_uppercase().contains("LIMIT") {
            report.warnings.push(
                "Query does not contain a LIMIT clause, consider adding one to prevent large result sets"
                    .to_string(),
            );
        }
    }

    if document.get("difficulty").is_none() {
        report
            .warnings
            .push("Consider adding 'difficulty' field".to_string());
    }

    if document.get("estimated_cost").is_none() {
        report
            .warnings
            .push("Consider adding 'estimated_cost' field".to_string());
    }

    report
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Sequence(items) => items.is_empty(),
        Value::Mapping(map) => map.is_empty(),
        Value::Tagged(tagged) => is_falsy(&tagged.value),
    }
}

fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim().to_string())
            .unwrap_or_default(),
    }
}

/// Expands file and directory arguments into the metadata documents they
/// name. Directories are searched recursively; missing paths are skipped.
pub fn metadata_files(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_file() {
            files.push(path.clone());
        } else if path.is_dir() {
            let mut found: Vec<PathBuf> = WalkDir::new(path)
                .sort_by_file_name()
                .into_iter()
                .filter_map(Result::ok)
                .filter(|entry| entry.file_type().is_file() && is_metadata_file(entry.path()))
                .map(|entry| entry.into_path())
                .collect();
            files.append(&mut found);
        }
    }
    files
}

fn is_metadata_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| METADATA_FILE_EXTENSIONS.contains(&ext))
}
