use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use image::{GrayImage, RgbImage};
use once_cell::sync::Lazy;

use crate::core::error::ScanError;

// Read-mostly template/mask cache shared across scans; writes from the
// authoring side invalidate single entries.
static RGB_CACHE: Lazy<Mutex<HashMap<PathBuf, Arc<RgbImage>>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));
static GRAY_CACHE: Lazy<Mutex<HashMap<PathBuf, Arc<GrayImage>>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

pub fn unique_template_path(data_root: &Path, game: &str, qualified: &str) -> PathBuf {
    data_root
        .join(game)
        .join("templates")
        .join("unique")
        .join(format!("{qualified}_template.png"))
}

pub fn mask_path(data_root: &Path, game: &str, qualified: &str) -> PathBuf {
    data_root
        .join(game)
        .join("masks")
        .join(format!("{qualified}_mask.png"))
}

pub fn switch_template_path(
    data_root: &Path,
    game: &str,
    qualified: &str,
    switch: &str,
) -> PathBuf {
    data_root
        .join(game)
        .join("templates")
        .join("switch")
        .join(qualified)
        .join(format!("{switch}_template.png"))
}

pub fn load_rgb(path: &Path) -> Result<Arc<RgbImage>, ScanError> {
    if let Some(hit) = RGB_CACHE.lock().unwrap().get(path) {
        return Ok(hit.clone());
    }
    let image = image::open(path)
        .map_err(|_| ScanError::AssetMissing(path.to_path_buf()))?
        .to_rgb8();
    let image = Arc::new(image);
    RGB_CACHE
        .lock()
        .unwrap()
        .insert(path.to_path_buf(), image.clone());
    Ok(image)
}

pub fn load_gray(path: &Path) -> Result<Arc<GrayImage>, ScanError> {
    if let Some(hit) = GRAY_CACHE.lock().unwrap().get(path) {
        return Ok(hit.clone());
    }
    let image = image::open(path)
        .map_err(|_| ScanError::AssetMissing(path.to_path_buf()))?
        .to_luma8();
    let image = Arc::new(image);
    GRAY_CACHE
        .lock()
        .unwrap()
        .insert(path.to_path_buf(), image.clone());
    Ok(image)
}

/// Drop both cached variants of one asset.
pub fn invalidate(path: &Path) {
    RGB_CACHE.lock().unwrap().remove(path);
    GRAY_CACHE.lock().unwrap().remove(path);
}

pub fn clear() {
    RGB_CACHE.lock().unwrap().clear();
    GRAY_CACHE.lock().unwrap().clear();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_asset_is_asset_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent_template.png");
        let err = load_rgb(&path).unwrap_err();
        assert!(matches!(err, ScanError::AssetMissing(p) if p == path));
    }

    #[test]
    fn test_cache_hit_after_first_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t_template.png");
        RgbImage::from_pixel(2, 2, image::Rgb([9, 9, 9]))
            .save(&path)
            .unwrap();

        let first = load_rgb(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        // Still served from cache after the file is gone.
        let second = load_rgb(&path).unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        invalidate(&path);
        assert!(load_rgb(&path).is_err());
    }

    #[test]
    fn test_asset_path_layout() {
        let root = Path::new("data");
        assert_eq!(
            unique_template_path(root, "bf2", "bf2_kill"),
            Path::new("data/bf2/templates/unique/bf2_kill_template.png")
        );
        assert_eq!(
            mask_path(root, "bf2", "bf2_kill"),
            Path::new("data/bf2/masks/bf2_kill_mask.png")
        );
        assert_eq!(
            switch_template_path(root, "bf2", "bf2_loadout", "assault"),
            Path::new("data/bf2/templates/switch/bf2_loadout/assault_template.png")
        );
    }
}
