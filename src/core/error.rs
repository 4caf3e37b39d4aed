use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("invalid configuration: {}", .0.join("; "))]
    ConfigInvalid(Vec<String>),

    #[error("cannot open video source '{path}': {reason}")]
    SourceUnavailable { path: PathBuf, reason: String },

    #[error("missing reference asset: {0}")]
    AssetMissing(PathBuf),

    #[error("shape mismatch for '{event}': crop is {crop_w}x{crop_h}, template is {template_w}x{template_h}")]
    ShapeMismatch {
        event: String,
        crop_w: u32,
        crop_h: u32,
        template_w: u32,
        template_h: u32,
    },

    #[error("cross match for '{event}': {}", .candidates.join(", "))]
    CrossMatchAmbiguity {
        event: String,
        candidates: Vec<String>,
    },

    #[error("multiple splash screens detected in the same frame: {}", .games.join(", "))]
    AmbiguousGameDetection { games: Vec<String> },

    #[error("dead end: no allowed events at {timestamp} for state '{state}'")]
    DeadEnd { state: String, timestamp: String },

    #[error("could not detect game for '{0}'")]
    GameNotDetected(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
}
