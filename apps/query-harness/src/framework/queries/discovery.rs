//! Finds query files under a root directory and groups them by category.
//!
//! The category of a query is the first directory below the root
//! (`queries/basic/x.sql` is in `basic`); files directly under the root fall
//! into `root`. Any query below a directory named `pending` belongs to the
//! `pending` category, however deep it sits, and is never executed.

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

use super::header::HeaderStats;
use crate::utilities::constants::{PENDING_CATEGORY, QUERY_FILE_EXTENSION, ROOT_CATEGORY};

#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    #[error("Query directory {} does not exist", .0.display())]
    MissingRoot(PathBuf),

    #[error("Failed to walk query directory: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A query file as found on disk, with the header values recorded in it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRecord {
    pub name: String,
    pub path: PathBuf,
    pub category: String,
    pub content: String,
    pub complexity: String,
    pub recorded_cost: String,
    pub is_pending: bool,
}

impl QueryRecord {
    pub fn from_content(root: &Path, path: PathBuf, content: String) -> Self {
        let category = category_for(root, &path);
        let stats = HeaderStats::parse(&content);
        Self {
            name: query_name(&path),
            is_pending: category == PENDING_CATEGORY,
            category,
            path,
            content,
            complexity: stats.complexity,
            recorded_cost: stats.estimated_cost,
        }
    }
}

/// Category of `file` relative to the query `root`. A `pending` directory
/// anywhere in the file's path, the root included, wins over the first
/// segment.
pub fn category_for(root: &Path, file: &Path) -> String {
    let in_pending = file.parent().is_some_and(|parent| {
        parent.components().any(|component| {
            matches!(component, Component::Normal(name) if name == PENDING_CATEGORY)
        })
    });
    if in_pending {
        return PENDING_CATEGORY.to_string();
    }

    let relative = file.strip_prefix(root).unwrap_or(file);
    relative
        .parent()
        .and_then(|parent| {
            parent.components().find_map(|component| match component {
                Component::Normal(name) => name.to_str(),
                _ => None,
            })
        })
        .map(str::to_string)
        .unwrap_or_else(|| ROOT_CATEGORY.to_string())
}

fn query_name(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// All query files below `root`, in a stable order.
pub fn query_files(root: &Path) -> Result<Vec<PathBuf>, DiscoveryError> {
    if !root.is_dir() {
        return Err(DiscoveryError::MissingRoot(root.to_path_buf()));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry?;
        let is_query = entry.file_type().is_file()
            && entry
                .path()
                .extension()
                .is_some_and(|ext| ext == QUERY_FILE_EXTENSION);
        if is_query {
            files.push(entry.into_path());
        }
    }

    debug!("Found {} query files under {}", files.len(), root.display());
    Ok(files)
}

/// Query names grouped by category, each list sorted.
pub fn discover_by_category(root: &Path) -> Result<BTreeMap<String, Vec<String>>, DiscoveryError> {
    let mut by_category: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for path in query_files(root)? {
        by_category
            .entry(category_for(root, &path))
            .or_default()
            .push(query_name(&path));
    }

    for names in by_category.values_mut() {
        names.sort();
    }

    Ok(by_category)
}

/// Reads every query file below `root`, keyed by its path.
pub fn load_queries(root: &Path) -> Result<BTreeMap<PathBuf, QueryRecord>, DiscoveryError> {
    let mut queries = BTreeMap::new();
    for path in query_files(root)? {
        let bytes = std::fs::read(&path).map_err(|source| DiscoveryError::Read {
            path: path.clone(),
            source,
        })?;
        let content = match String::from_utf8(bytes) {
            Ok(content) => content,
            Err(e) => {
                warn!("{} is not valid UTF-8, invalid bytes replaced", path.display());
                String::from_utf8_lossy(e.as_bytes()).into_owned()
            }
        };
        let record = QueryRecord::from_content(root, path.clone(), content);
        queries.insert(path, record);
    }
    Ok(queries)
}
