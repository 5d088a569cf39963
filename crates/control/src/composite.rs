use crate::glob::{glob, relative_slash_path};
use sdk_models::SdkError;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Documents listed by a composite file, relative to the REST repository
/// root. GitHub URLs are cut after their `/master/` segment.
pub fn documents_in_composite_file(composite_file: &Path) -> Result<Vec<String>, SdkError> {
    let content = std::fs::read_to_string(composite_file)?;
    let composite: serde_json::Value = serde_json::from_str(&content)?;

    let documents = composite
        .get("documents")
        .and_then(|d| d.as_array())
        .ok_or_else(|| SdkError::ConfigError {
            reason: format!("{} has no 'documents' list", composite_file.display()),
        })?;

    Ok(documents
        .iter()
        .filter_map(|d| d.as_str())
        .map(document_path)
        .collect())
}

fn document_path(document: &str) -> String {
    if document.starts_with("https") {
        if let Some((_, path)) = document.split_once("/master/") {
            return path.to_string();
        }
    }
    document.to_string()
}

/// `*/composite*.json` files of the REST repository.
pub fn find_composite_files(base_dir: &Path) -> Result<Vec<PathBuf>, SdkError> {
    Ok(glob(base_dir, "*/composite*.json")?
        .into_iter()
        .filter(|p| p.is_file())
        .collect())
}

/// Reverse index: swagger document → composite file listing it, both
/// relative to `base_dir`.
pub fn swagger_index_from_composite(base_dir: &Path) -> Result<BTreeMap<String, String>, SdkError> {
    let mut index = BTreeMap::new();
    for composite_file in find_composite_files(base_dir)? {
        let composite = relative_slash_path(base_dir, &composite_file);
        for document in documents_in_composite_file(&composite_file)? {
            debug!("{} is part of {}", document, composite);
            index.insert(document, composite.clone());
        }
    }
    Ok(index)
}
