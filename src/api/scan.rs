//! Single-video and batch scan entry points.

use std::path::{Path, PathBuf};
use std::time::Instant;

use log::{error, info, warn};

use crate::core::config::GameProfile;
use crate::core::constants::GAME_SEARCH_FRAME_STEP;
use crate::core::error::ScanError;
use crate::core::matchers::ScanContext;
use crate::core::registry::MediaRegistry;
use crate::core::scan::{EventHit, EventScanner, GameDetection, GameIdentifier};
use crate::core::video::VideoFrameSource;

/// Completed scan of one video.
#[derive(Debug)]
pub struct ScanReport {
    pub video: String,
    pub game: String,
    pub hits: Vec<EventHit>,
}

/// Run the game-identification bootstrap alone.
pub fn identify_game(
    video_path: &Path,
    data_root: &Path,
) -> Result<Option<GameDetection>, ScanError> {
    let identifier = GameIdentifier::load(data_root)?;
    let mut source = VideoFrameSource::open_with_step(video_path, GAME_SEARCH_FRAME_STEP)?;
    let mut ctx = ScanContext::dry_run(data_root);
    identifier.identify(&mut source, &mut ctx)
}

/// Identify the game, then scan. Fails with `GameNotDetected` when the
/// bootstrap finds nothing; callers with out-of-band knowledge use
/// [`scan_video_as`] instead.
pub fn scan_video(
    video_path: &Path,
    data_root: &Path,
    artifact_root: &Path,
) -> Result<ScanReport, ScanError> {
    match identify_game(video_path, data_root)? {
        Some(detection) => scan_video_as(
            video_path,
            data_root,
            artifact_root,
            &detection.game,
            detection.first_frame,
        ),
        None => Err(ScanError::GameNotDetected(video_id(video_path))),
    }
}

/// Scan with a known game and starting frame (manual override, or a
/// registry entry from an earlier identification).
pub fn scan_video_as(
    video_path: &Path,
    data_root: &Path,
    artifact_root: &Path,
    game: &str,
    first_frame: u64,
) -> Result<ScanReport, ScanError> {
    let id = video_id(video_path);
    info!("🎞 Detecting events for {id}");
    let started = Instant::now();

    let profile = GameProfile::load(data_root, game)?;
    let mut source = VideoFrameSource::open(video_path)?;
    let mut ctx = ScanContext::new(data_root, artifact_root, &id);

    let sink = EventScanner::new(&profile).scan(&mut source, first_frame, None, &mut ctx)?;

    info!(
        "⏱ Runtime for {id}: {:.3} seconds",
        started.elapsed().as_secs_f64()
    );
    if sink.is_empty() {
        warn!("⚠️ No events detected in {id}");
    } else {
        info!("✅ {} event(s) detected in {id}", sink.len());
    }

    Ok(ScanReport {
        video: id,
        game: game.to_string(),
        hits: sink.into_hits(),
    })
}

/// Scan every `*.mp4` under `media_dir`. One video's failure is reported
/// and isolated; the remaining videos continue. When a registry path is
/// given, identification results are remembered across runs.
pub fn scan_directory(
    media_dir: &Path,
    data_root: &Path,
    artifact_root: &Path,
    registry_path: Option<&Path>,
) -> Result<Vec<ScanReport>, ScanError> {
    info!("🔍 Detecting events in all videos...");

    let mut videos: Vec<PathBuf> = std::fs::read_dir(media_dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "mp4"))
        .collect();
    videos.sort();

    let mut registry = registry_path.map(MediaRegistry::open);
    let mut reports = Vec::new();

    for path in videos {
        let id = video_id(&path);
        info!("🎞 Processing {id}...");
        match scan_one(&path, data_root, artifact_root, registry.as_mut()) {
            Ok(Some(report)) => reports.push(report),
            Ok(None) => warn!("❌ Skipping detection for {id}: could not detect game"),
            Err(e) => error!("❌ Scan failed for {id}: {e}"),
        }
    }

    if reports.iter().all(|report| report.hits.is_empty()) {
        warn!("⚠️ No events detected.");
    }
    Ok(reports)
}

fn scan_one(
    path: &Path,
    data_root: &Path,
    artifact_root: &Path,
    registry: Option<&mut MediaRegistry>,
) -> Result<Option<ScanReport>, ScanError> {
    let id = video_id(path);

    let detection = match &registry {
        Some(reg) if reg.is_registered(&id) => {
            let entry = reg.lookup(&id).cloned();
            entry.and_then(|entry| {
                entry.game.map(|game| GameDetection {
                    game,
                    first_frame: entry.first_frame.unwrap_or(0),
                })
            })
        }
        _ => {
            let detection = identify_game(path, data_root)?;
            if let Some(reg) = registry {
                reg.register(
                    &id,
                    detection.as_ref().map(|d| d.game.as_str()),
                    detection.as_ref().map(|d| d.first_frame),
                )?;
            }
            detection
        }
    };

    match detection {
        Some(detection) => scan_video_as(
            path,
            data_root,
            artifact_root,
            &detection.game,
            detection.first_frame,
        )
        .map(Some),
        None => Ok(None),
    }
}

fn video_id(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}
