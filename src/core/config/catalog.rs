use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::{Deserialize, Deserializer};

use crate::core::config::json_cache;
use crate::core::constants::{DEFAULT_EVENT_COOLDOWN, DEFAULT_EVENT_THRESHOLD};
use crate::core::error::ScanError;

/// Rectangular frame region, `[x1, y1, x2, y2]` in pixels, half-open on the
/// right/bottom edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub x1: u32,
    pub y1: u32,
    pub x2: u32,
    pub y2: u32,
}

impl Region {
    pub fn width(&self) -> u32 {
        self.x2.saturating_sub(self.x1)
    }

    pub fn height(&self) -> u32 {
        self.y2.saturating_sub(self.y1)
    }
}

impl<'de> Deserialize<'de> for Region {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let [x1, y1, x2, y2] = <[u32; 4]>::deserialize(deserializer)?;
        Ok(Region { x1, y1, x2, y2 })
    }
}

/// Matching strategy id as written in the event catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum MatchKind {
    #[serde(rename = "fixtemplate_rgb")]
    MaskedAbsDiff,
    #[serde(rename = "fixtemplate_rgb_ccorr")]
    MaskedCorr,
    #[serde(rename = "fixtemplate_gray")]
    GraySqdiff,
    #[serde(rename = "switch")]
    Switch,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventDefinition {
    pub roi: Region,
    #[serde(rename = "match")]
    pub match_kind: MatchKind,
    #[serde(default = "default_threshold")]
    pub threshold: f32,
    #[serde(default)]
    pub trigger_interval: u64,
    #[serde(default = "default_cooldown")]
    pub fcooldown: u64,
    #[serde(default)]
    pub min_frames: Option<u32>,
    #[serde(default)]
    pub switches: Vec<String>,
}

fn default_threshold() -> f32 {
    DEFAULT_EVENT_THRESHOLD
}

fn default_cooldown() -> u64 {
    DEFAULT_EVENT_COOLDOWN
}

pub type EventId = usize;

#[derive(Debug, Clone)]
pub struct CatalogEntry {
    /// Short name, game prefix stripped.
    pub name: String,
    /// Globally-unique `<game>_<event>` name, as keyed in the catalog file.
    pub qualified: String,
    pub def: EventDefinition,
}

/// Validated, immutable per-game event table.
#[derive(Debug, Clone)]
pub struct EventCatalog {
    game: String,
    events: Vec<CatalogEntry>,
    index: HashMap<String, EventId>,
}

impl EventCatalog {
    /// Load `<data_root>/<game>/<game>_events.json`.
    pub fn load(data_root: &Path, game: &str) -> Result<Self, ScanError> {
        let path = data_root.join(game).join(format!("{game}_events.json"));
        Self::load_merged(&path, game)
    }

    /// Load from a shared all-games catalog, keeping only `<game>_` entries.
    /// The per-game layout goes through the same path, so both validate to
    /// the same table shape.
    pub fn load_merged(events_path: &Path, game: &str) -> Result<Self, ScanError> {
        let value = json_cache::load(events_path).map_err(|e| {
            ScanError::ConfigInvalid(vec![format!(
                "cannot read event catalog at {}: {e}",
                events_path.display()
            )])
        })?;
        let defs = BTreeMap::<String, EventDefinition>::deserialize(value.as_ref()).map_err(
            |e| {
                ScanError::ConfigInvalid(vec![format!(
                    "malformed event catalog at {}: {e}",
                    events_path.display()
                )])
            },
        )?;
        Self::from_defs(game, defs)
    }

    pub fn from_defs(
        game: &str,
        defs: BTreeMap<String, EventDefinition>,
    ) -> Result<Self, ScanError> {
        let prefix = format!("{game}_");
        let mut issues = Vec::new();
        let mut events = Vec::new();
        let mut index = HashMap::new();

        for (qualified, def) in defs {
            let Some(name) = qualified.strip_prefix(&prefix) else {
                continue;
            };
            if name.is_empty() {
                issues.push(format!("event '{qualified}' has an empty name"));
                continue;
            }
            if !(0.0..=1.0).contains(&def.threshold) {
                issues.push(format!(
                    "event '{qualified}' threshold {} is outside [0, 1]",
                    def.threshold
                ));
            }
            match def.match_kind {
                MatchKind::Switch if def.switches.is_empty() => {
                    issues.push(format!("event '{qualified}' has no switches"));
                }
                _ => {}
            }
            index.insert(name.to_string(), events.len());
            events.push(CatalogEntry {
                name: name.to_string(),
                qualified,
                def,
            });
        }

        if !issues.is_empty() {
            return Err(ScanError::ConfigInvalid(issues));
        }

        Ok(Self {
            game: game.to_string(),
            events,
            index,
        })
    }

    pub fn game(&self) -> &str {
        &self.game
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn entry(&self, id: EventId) -> &CatalogEntry {
        &self.events[id]
    }

    pub fn id_of(&self, name: &str) -> Option<EventId> {
        self.index.get(name).copied()
    }

    pub fn entries(&self) -> impl Iterator<Item = (EventId, &CatalogEntry)> {
        self.events.iter().enumerate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defs(json: serde_json::Value) -> BTreeMap<String, EventDefinition> {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_defaults_applied() {
        let catalog = EventCatalog::from_defs(
            "bf2",
            defs(serde_json::json!({
                "bf2_kill": {"roi": [0, 0, 10, 10], "match": "fixtemplate_rgb"}
            })),
        )
        .unwrap();

        let id = catalog.id_of("kill").unwrap();
        let def = &catalog.entry(id).def;
        assert_eq!(def.threshold, 0.9);
        assert_eq!(def.trigger_interval, 0);
        assert_eq!(def.fcooldown, 1);
        assert_eq!(def.min_frames, None);
        assert_eq!(catalog.entry(id).qualified, "bf2_kill");
    }

    #[test]
    fn test_prefix_filter_drops_other_games() {
        let catalog = EventCatalog::from_defs(
            "bf2",
            defs(serde_json::json!({
                "bf2_kill": {"roi": [0, 0, 10, 10], "match": "fixtemplate_gray"},
                "valo_kill": {"roi": [0, 0, 10, 10], "match": "fixtemplate_gray"}
            })),
        )
        .unwrap();

        assert_eq!(catalog.len(), 1);
        assert!(catalog.id_of("kill").is_some());
    }

    #[test]
    fn test_switch_without_switches_rejected() {
        let err = EventCatalog::from_defs(
            "bf2",
            defs(serde_json::json!({
                "bf2_loadout": {"roi": [0, 0, 10, 10], "match": "switch"}
            })),
        )
        .unwrap_err();

        match err {
            ScanError::ConfigInvalid(issues) => {
                assert!(issues[0].contains("bf2_loadout"));
            }
            other => panic!("expected ConfigInvalid, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_strategy_rejected() {
        let raw = serde_json::json!({
            "bf2_kill": {"roi": [0, 0, 10, 10], "match": "ocr"}
        });
        assert!(
            serde_json::from_value::<BTreeMap<String, EventDefinition>>(raw).is_err()
        );
    }

    #[test]
    fn test_region_dimensions() {
        let region = Region {
            x1: 4,
            y1: 8,
            x2: 14,
            y2: 13,
        };
        assert_eq!(region.width(), 10);
        assert_eq!(region.height(), 5);
    }
}
