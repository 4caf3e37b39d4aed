pub mod catalog;
pub mod fsm;
pub mod json_cache;

use std::path::Path;

pub use catalog::{CatalogEntry, EventCatalog, EventDefinition, EventId, MatchKind, Region};
pub use fsm::{FsmState, FsmTable};

use crate::core::error::ScanError;

/// One game's validated scan profile: event catalog plus FSM table.
#[derive(Debug, Clone)]
pub struct GameProfile {
    pub game: String,
    pub catalog: EventCatalog,
    pub fsm: FsmTable,
}

impl GameProfile {
    /// Per-game layout: `<data_root>/<game>/{<game>_events.json, fsm_<game>.json}`.
    pub fn load(data_root: &Path, game: &str) -> Result<Self, ScanError> {
        let catalog = EventCatalog::load(data_root, game)?;
        let fsm = FsmTable::load(data_root, game, &catalog)?;
        Ok(Self {
            game: game.to_string(),
            catalog,
            fsm,
        })
    }

    /// Merged layout: one catalog shared across games, filtered by the
    /// `<game>_` name prefix.
    pub fn load_merged(
        events_path: &Path,
        fsm_path: &Path,
        game: &str,
    ) -> Result<Self, ScanError> {
        let catalog = EventCatalog::load_merged(events_path, game)?;
        let fsm = FsmTable::load_from(fsm_path, &catalog)?;
        Ok(Self {
            game: game.to_string(),
            catalog,
            fsm,
        })
    }
}
