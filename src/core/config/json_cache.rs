use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use once_cell::sync::Lazy;
use serde_json::Value;

use crate::core::error::ScanError;

static CACHE: Lazy<Mutex<HashMap<PathBuf, Arc<Value>>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

/// Load a JSON document, returning the cached copy after the first read.
pub fn load(path: &Path) -> Result<Arc<Value>, ScanError> {
    if let Some(cached) = CACHE.lock().unwrap().get(path) {
        return Ok(cached.clone());
    }
    refresh(path)
}

/// Re-read a document from disk, replacing the cached copy.
pub fn refresh(path: &Path) -> Result<Arc<Value>, ScanError> {
    let text = std::fs::read_to_string(path)?;
    let value: Arc<Value> = Arc::new(serde_json::from_str(&text)?);
    CACHE
        .lock()
        .unwrap()
        .insert(path.to_path_buf(), value.clone());
    Ok(value)
}

/// Persist a document and update the cached copy in one step.
pub fn update(path: &Path, value: Value) -> Result<(), ScanError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, serde_json::to_string_pretty(&value)?)?;
    CACHE
        .lock()
        .unwrap()
        .insert(path.to_path_buf(), Arc::new(value));
    Ok(())
}

/// Drop one cached entry.
pub fn invalidate(path: &Path) {
    CACHE.lock().unwrap().remove(path);
}

pub fn clear() {
    CACHE.lock().unwrap().clear();
}
