use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use log::warn;
use serde::{Deserialize, Serialize};

use crate::core::error::ScanError;

/// One classified video: which game governs it and where its content
/// begins. `game` is `None` when identification was attempted and failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryEntry {
    pub game: Option<String>,
    pub first_frame: Option<u64>,
}

/// Flat JSON record of which videos were already classified, so batch runs
/// skip re-identification.
#[derive(Debug)]
pub struct MediaRegistry {
    path: PathBuf,
    entries: BTreeMap<String, RegistryEntry>,
}

impl MediaRegistry {
    /// Open (or start) the registry at `path`. A corrupted or unreadable
    /// file starts fresh rather than blocking the batch.
    pub fn open(path: &Path) -> Self {
        let entries = match std::fs::read_to_string(path) {
            Ok(text) => match serde_json::from_str(&text) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!("⚠️ corrupted registry at {}: {e}; starting fresh", path.display());
                    BTreeMap::new()
                }
            },
            Err(_) => BTreeMap::new(),
        };
        Self {
            path: path.to_path_buf(),
            entries,
        }
    }

    pub fn is_registered(&self, video_id: &str) -> bool {
        self.entries.contains_key(video_id)
    }

    pub fn lookup(&self, video_id: &str) -> Option<&RegistryEntry> {
        self.entries.get(video_id)
    }

    /// Add or overwrite an entry and persist immediately.
    pub fn register(
        &mut self,
        video_id: &str,
        game: Option<&str>,
        first_frame: Option<u64>,
    ) -> Result<(), ScanError> {
        self.entries.insert(
            video_id.to_string(),
            RegistryEntry {
                game: game.map(String::from),
                first_frame,
            },
        );
        self.save()
    }

    fn save(&self) -> Result<(), ScanError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_json::to_string_pretty(&self.entries)?)?;
        Ok(())
    }
}
