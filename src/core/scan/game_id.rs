use std::collections::BTreeSet;
use std::path::Path;

use log::{info, warn};
use serde::Deserialize;

use crate::core::config::{json_cache, EventCatalog, EventDefinition};
use crate::core::constants::{full_game_name, GAME_SEARCH_HORIZON};
use crate::core::error::ScanError;
use crate::core::matchers::ScanContext;
use crate::core::video::FrameSource;

/// Which game governs a video and where its recognized content begins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameDetection {
    pub game: String,
    pub first_frame: u64,
}

#[derive(Debug)]
struct Starter {
    game: String,
    qualified: String,
    def: EventDefinition,
}

/// Bootstraps unclassified videos by probing every game's designated
/// starter events against coarsely sampled frames.
#[derive(Debug)]
pub struct GameIdentifier {
    starters: Vec<Starter>,
    horizon: u64,
}

impl GameIdentifier {
    /// Collect starter events from every game directory under `data_root`
    /// (a directory qualifies by carrying a `starter.json`).
    pub fn load(data_root: &Path) -> Result<Self, ScanError> {
        let mut starters = Vec::new();
        let mut issues = Vec::new();

        let mut game_dirs: Vec<_> = std::fs::read_dir(data_root)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_dir() && path.join("starter.json").is_file())
            .collect();
        game_dirs.sort();

        for dir in game_dirs {
            let Some(game) = dir.file_name().and_then(|n| n.to_str()).map(String::from) else {
                continue;
            };
            let starter_path = dir.join("starter.json");
            let value = json_cache::load(&starter_path).map_err(|e| {
                ScanError::ConfigInvalid(vec![format!(
                    "cannot read starter list at {}: {e}",
                    starter_path.display()
                )])
            })?;
            let names = Vec::<String>::deserialize(value.as_ref()).map_err(|e| {
                ScanError::ConfigInvalid(vec![format!(
                    "malformed starter list at {}: {e}",
                    starter_path.display()
                )])
            })?;

            let catalog = EventCatalog::load(data_root, &game)?;
            for name in names {
                match catalog.id_of(&name) {
                    Some(id) => {
                        let entry = catalog.entry(id);
                        starters.push(Starter {
                            game: game.clone(),
                            qualified: entry.qualified.clone(),
                            def: entry.def.clone(),
                        });
                    }
                    None => issues.push(format!("'{game}_{name}' is not an event for {game}")),
                }
            }
        }

        if !issues.is_empty() {
            return Err(ScanError::ConfigInvalid(issues));
        }
        if starters.is_empty() {
            return Err(ScanError::ConfigInvalid(vec![
                "no starter events found".to_string(),
            ]));
        }

        Ok(Self {
            starters,
            horizon: GAME_SEARCH_HORIZON,
        })
    }

    pub fn with_horizon(mut self, horizon: u64) -> Self {
        self.horizon = horizon;
        self
    }

    /// Probe sampled frames until exactly one game's starter matches.
    /// Starters from two games matching the same frame is fatal; an
    /// exhausted horizon is a plain "not detected".
    pub fn identify<S: FrameSource>(
        &self,
        source: &mut S,
        ctx: &mut ScanContext,
    ) -> Result<Option<GameDetection>, ScanError> {
        while let Some(frame) = source.next_frame()? {
            if frame.index > self.horizon {
                warn!(
                    "❌ no starter screen within the first {} frames",
                    self.horizon
                );
                return Ok(None);
            }

            let mut detected: BTreeSet<&str> = BTreeSet::new();
            for starter in &self.starters {
                let crop = frame.crop(&starter.def.roi);
                let result =
                    starter
                        .def
                        .match_kind
                        .evaluate(&crop, &starter.qualified, &starter.def, ctx)?;
                if result.matched {
                    detected.insert(starter.game.as_str());
                }
            }

            if detected.len() > 1 {
                return Err(ScanError::AmbiguousGameDetection {
                    games: detected.into_iter().map(String::from).collect(),
                });
            }
            if let Some(game) = detected.into_iter().next() {
                info!("✅ Game detected: {}", full_game_name(game));
                return Ok(Some(GameDetection {
                    game: game.to_string(),
                    first_frame: frame.index,
                }));
            }
        }
        Ok(None)
    }
}
