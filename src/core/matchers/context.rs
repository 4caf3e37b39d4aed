use std::path::{Path, PathBuf};

use image::RgbImage;
use log::debug;

use crate::core::error::ScanError;

/// Per-scan mutable context handed to every matcher invocation. Owns the
/// artifact counter so numbering restarts per video instead of living in
/// process-wide state.
#[derive(Debug)]
pub struct ScanContext {
    data_root: PathBuf,
    artifact_root: PathBuf,
    video_id: String,
    counter: u64,
    dry_run: bool,
}

impl ScanContext {
    pub fn new(data_root: &Path, artifact_root: &Path, video_id: &str) -> Self {
        Self {
            data_root: data_root.to_path_buf(),
            artifact_root: artifact_root.to_path_buf(),
            video_id: video_id.to_string(),
            counter: 1,
            dry_run: false,
        }
    }

    /// Matchers score but never write artifacts. Used by game
    /// identification probes and matcher test harnesses.
    pub fn dry_run(data_root: &Path) -> Self {
        Self {
            data_root: data_root.to_path_buf(),
            artifact_root: PathBuf::new(),
            video_id: String::new(),
            counter: 1,
            dry_run: true,
        }
    }

    pub fn data_root(&self) -> &Path {
        &self.data_root
    }

    pub fn video_id(&self) -> &str {
        &self.video_id
    }

    /// Artifacts saved so far in this scan.
    pub fn artifact_count(&self) -> u64 {
        self.counter - 1
    }

    /// Restart artifact numbering; invoked once per full video scan.
    pub fn reset(&mut self) {
        self.counter = 1;
    }

    /// Drop artifacts left over from a previous scan of the same video.
    pub fn clear_artifacts(&self) -> Result<(), ScanError> {
        if self.dry_run {
            return Ok(());
        }
        let dir = self.artifact_root.join(&self.video_id);
        if dir.exists() {
            debug!("🗑 deleting previous artifacts in {}", dir.display());
            std::fs::remove_dir_all(&dir)?;
        }
        Ok(())
    }

    /// Save a matched crop for post-hoc true/false-positive audit.
    pub(crate) fn save_artifact(
        &mut self,
        crop: &RgbImage,
        event: &str,
        score: f32,
    ) -> Result<(), ScanError> {
        if self.dry_run {
            return Ok(());
        }
        let dir = self.artifact_root.join(&self.video_id);
        std::fs::create_dir_all(&dir)?;
        let path = dir.join(format!("{event}_{}_{score:.4}.png", self.counter));
        crop.save(&path)?;
        self.counter += 1;
        Ok(())
    }
}
