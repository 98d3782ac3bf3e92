//! Built-in and External Catalogs
//!
//! Parts are read from:
//! 1. JSON files supplied at startup (a single file or a directory of files)
//! 2. The JSON catalog compiled into the library (fallback)
//!
//! A catalog file is either a bare array of parts or an object with a
//! `parts` array.

use std::path::Path;

use serde::Deserialize;

use crate::core::CapBankError;

use super::schema::CapacitorPart;

const EMBEDDED_CATALOG: &str = include_str!("../../catalog/murata_mlcc.json");

#[derive(Deserialize)]
#[serde(untagged)]
enum CatalogDocument {
    Parts(Vec<CapacitorPart>),
    Wrapped { parts: Vec<CapacitorPart> },
}

impl CatalogDocument {
    fn into_parts(self) -> Vec<CapacitorPart> {
        match self {
            CatalogDocument::Parts(parts) => parts,
            CatalogDocument::Wrapped { parts } => parts,
        }
    }
}

/// Parse catalog JSON text.
pub fn parse_catalog(json: &str) -> Result<Vec<CapacitorPart>, CapBankError> {
    let doc: CatalogDocument = serde_json::from_str(json)?;
    Ok(doc.into_parts())
}

/// Parts of the embedded catalog
pub fn builtin_parts() -> Result<Vec<CapacitorPart>, CapBankError> {
    parse_catalog(EMBEDDED_CATALOG)
}

/// Load a single catalog file
pub fn load_catalog_from_file(path: &Path) -> Result<Vec<CapacitorPart>, CapBankError> {
    let content = std::fs::read_to_string(path)?;
    let parts = parse_catalog(&content)?;
    tracing::info!("Loaded {} parts from {:?}", parts.len(), path.file_name());
    Ok(parts)
}

/// Load every `*.json` catalog file in a directory.
/// Returns both the parts that loaded and a message per file that did not.
pub fn load_catalog_from_directory(dir: &Path) -> (Vec<CapacitorPart>, Vec<String>) {
    let mut parts = Vec::new();
    let mut errors = Vec::new();

    if !dir.is_dir() {
        errors.push(format!("Not a directory: {}", dir.display()));
        return (parts, errors);
    }

    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            errors.push(format!("Failed to read directory {:?}: {}", dir, e));
            return (parts, errors);
        }
    };

    let mut paths: Vec<_> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.extension().map(|e| e == "json").unwrap_or(false))
        .collect();
    paths.sort();

    for path in paths {
        match load_catalog_from_file(&path) {
            Ok(mut loaded) => parts.append(&mut loaded),
            Err(e) => {
                let error_msg = format!("Failed to load {:?}: {}", path.file_name(), e);
                tracing::warn!("{}", error_msg);
                errors.push(error_msg);
            }
        }
    }

    (parts, errors)
}

/// Load a catalog from a file or directory, or the embedded one when `path` is `None`.
pub fn load_catalog(path: Option<&Path>) -> Result<Vec<CapacitorPart>, CapBankError> {
    match path {
        None => builtin_parts(),
        Some(p) if p.is_dir() => {
            let (parts, errors) = load_catalog_from_directory(p);
            if parts.is_empty() && !errors.is_empty() {
                return Err(CapBankError::Catalog(errors.join("; ")));
            }
            Ok(parts)
        }
        Some(p) => load_catalog_from_file(p),
    }
}
