//! Reading compiled type trees from JSON.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use crate::error::CoreError;
use crate::types::Specification;

/// Load a type tree from a JSON file, or from every `*.json` file under a
/// directory in file-name order with their modules concatenated.
pub fn load_specification(path: impl AsRef<Path>) -> Result<Specification, CoreError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(CoreError::MissingInput(path.to_path_buf()));
    }
    if path.is_file() {
        return read_file(path);
    }

    let mut spec = Specification::default();
    for file in json_files(path) {
        let loaded = read_file(&file)?;
        debug!(path = %file.display(), modules = loaded.modules.len(), "loaded type tree");
        spec.modules.extend(loaded.modules);
    }
    Ok(spec)
}

pub fn parse_specification(text: &str) -> Result<Specification, CoreError> {
    serde_json::from_str(text).map_err(CoreError::Parse)
}

fn read_file(path: &Path) -> Result<Specification, CoreError> {
    let text = fs::read_to_string(path)?;
    serde_json::from_str(&text).map_err(|source| CoreError::Json {
        path: path.to_path_buf(),
        source,
    })
}

fn json_files(root: &Path) -> Vec<PathBuf> {
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .map(|entry| entry.into_path())
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "json"))
        .collect()
}
