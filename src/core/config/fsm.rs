use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use crate::core::config::catalog::{EventCatalog, EventId};
use crate::core::config::json_cache;
use crate::core::constants::FSM_GROUP_PREFIX;
use crate::core::error::ScanError;

/// Scanner position: the pseudo-state `start` or the last accepted event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsmState {
    Start,
    Event(EventId),
}

/// Flat adjacency table over interned event ids. Group indirection is
/// resolved at load time; the per-frame lookup is a plain slice access.
#[derive(Debug, Clone)]
pub struct FsmTable {
    start: Vec<EventId>,
    transitions: Vec<Vec<EventId>>,
}

impl FsmTable {
    /// Load `<data_root>/<game>/fsm_<game>.json` and validate it against
    /// the catalog.
    pub fn load(data_root: &Path, game: &str, catalog: &EventCatalog) -> Result<Self, ScanError> {
        let path = data_root.join(game).join(format!("fsm_{game}.json"));
        Self::load_from(&path, catalog)
    }

    pub fn load_from(path: &Path, catalog: &EventCatalog) -> Result<Self, ScanError> {
        let value = json_cache::load(path).map_err(|e| {
            ScanError::ConfigInvalid(vec![format!(
                "cannot read FSM table at {}: {e}",
                path.display()
            )])
        })?;
        let raw = BTreeMap::<String, Vec<String>>::deserialize(value.as_ref()).map_err(|e| {
            ScanError::ConfigInvalid(vec![format!(
                "malformed FSM table at {}: {e}",
                path.display()
            )])
        })?;
        Self::build(&raw, catalog)
    }

    /// Validate every state and transition, then flatten one level of group
    /// indirection. All violations are reported together.
    pub fn build(
        raw: &BTreeMap<String, Vec<String>>,
        catalog: &EventCatalog,
    ) -> Result<Self, ScanError> {
        let mut issues = Vec::new();

        for (state, targets) in raw {
            let is_group = state.starts_with(FSM_GROUP_PREFIX);
            if state != "start" && !is_group && catalog.id_of(state).is_none() {
                issues.push(format!("FSM state '{state}' is not a known event"));
            }
            for target in targets {
                if target.starts_with(FSM_GROUP_PREFIX) {
                    if is_group {
                        issues.push(format!(
                            "group '{state}' targets group '{target}': only one level of indirection is allowed"
                        ));
                    } else if !raw.contains_key(target) {
                        issues.push(format!(
                            "FSM state '{state}' targets undefined group '{target}'"
                        ));
                    }
                } else if catalog.id_of(target).is_none() {
                    issues.push(format!(
                        "FSM transition from '{state}' targets unknown event '{target}'"
                    ));
                }
            }
        }

        if !issues.is_empty() {
            return Err(ScanError::ConfigInvalid(issues));
        }

        let resolve = |targets: &[String]| -> Vec<EventId> {
            let mut out = Vec::new();
            for target in targets {
                if target.starts_with(FSM_GROUP_PREFIX) {
                    for sub in &raw[target] {
                        out.push(catalog.id_of(sub).unwrap());
                    }
                } else {
                    out.push(catalog.id_of(target).unwrap());
                }
            }
            out
        };

        let start = raw.get("start").map(|t| resolve(t)).unwrap_or_default();
        let mut transitions = vec![Vec::new(); catalog.len()];
        for (state, targets) in raw {
            if state == "start" || state.starts_with(FSM_GROUP_PREFIX) {
                continue;
            }
            transitions[catalog.id_of(state).unwrap()] = resolve(targets);
        }

        Ok(Self { start, transitions })
    }

    /// Events attemptable from `state`. An empty slice is a dead end.
    pub fn allowed(&self, state: FsmState) -> &[EventId] {
        match state {
            FsmState::Start => &self.start,
            FsmState::Event(id) => &self.transitions[id],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog(names: &[&str]) -> EventCatalog {
        let defs = names
            .iter()
            .map(|name| {
                (
                    format!("bf2_{name}"),
                    serde_json::json!({"roi": [0, 0, 10, 10], "match": "fixtemplate_gray"}),
                )
            })
            .collect::<serde_json::Map<_, _>>();
        EventCatalog::from_defs("bf2", serde_json::from_value(defs.into()).unwrap()).unwrap()
    }

    fn table(json: serde_json::Value) -> BTreeMap<String, Vec<String>> {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_group_expanded_flat() {
        let catalog = catalog(&["kill", "death", "respawn"]);
        let fsm = FsmTable::build(
            &table(serde_json::json!({
                "start": ["fsm_combat"],
                "kill": ["fsm_combat"],
                "death": ["respawn"],
                "respawn": ["fsm_combat"],
                "fsm_combat": ["kill", "death"]
            })),
            &catalog,
        )
        .unwrap();

        let kill = catalog.id_of("kill").unwrap();
        let death = catalog.id_of("death").unwrap();
        assert_eq!(fsm.allowed(FsmState::Start), &[kill, death]);
        assert_eq!(fsm.allowed(FsmState::Event(kill)), &[kill, death]);
    }

    #[test]
    fn test_unknown_target_rejected_with_state_and_target() {
        let catalog = catalog(&["kill"]);
        let err = FsmTable::build(
            &table(serde_json::json!({"start": ["kill"], "kill": ["teleport"]})),
            &catalog,
        )
        .unwrap_err();

        match err {
            ScanError::ConfigInvalid(issues) => {
                assert_eq!(issues.len(), 1);
                assert!(issues[0].contains("'kill'"));
                assert!(issues[0].contains("'teleport'"));
            }
            other => panic!("expected ConfigInvalid, got {other:?}"),
        }
    }

    #[test]
    fn test_every_violation_reported() {
        let catalog = catalog(&["kill"]);
        let err = FsmTable::build(
            &table(serde_json::json!({
                "start": ["ghost"],
                "warp": ["kill"],
                "kill": ["fsm_missing"]
            })),
            &catalog,
        )
        .unwrap_err();

        match err {
            ScanError::ConfigInvalid(issues) => assert_eq!(issues.len(), 3),
            other => panic!("expected ConfigInvalid, got {other:?}"),
        }
    }

    #[test]
    fn test_nested_group_rejected() {
        let catalog = catalog(&["kill"]);
        let err = FsmTable::build(
            &table(serde_json::json!({
                "start": ["fsm_outer"],
                "fsm_outer": ["fsm_inner"],
                "fsm_inner": ["kill"]
            })),
            &catalog,
        )
        .unwrap_err();

        match err {
            ScanError::ConfigInvalid(issues) => {
                assert!(issues.iter().any(|i| i.contains("one level")));
            }
            other => panic!("expected ConfigInvalid, got {other:?}"),
        }
    }

    #[test]
    fn test_state_without_entry_is_dead_end() {
        let catalog = catalog(&["kill", "death"]);
        let fsm = FsmTable::build(
            &table(serde_json::json!({"start": ["kill"], "kill": ["death"]})),
            &catalog,
        )
        .unwrap();

        let death = catalog.id_of("death").unwrap();
        assert!(fsm.allowed(FsmState::Event(death)).is_empty());
    }
}
