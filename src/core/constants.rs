pub const DEFAULT_EVENT_THRESHOLD: f32 = 0.9;
pub const DEFAULT_EVENT_COOLDOWN: u64 = 1;

/// Cooldown seed for events that never triggered; always past any window.
pub const COOLDOWN_NEVER: u64 = u64::MAX;

/// Sample every Nth frame while searching for a game's starter screen.
pub const GAME_SEARCH_FRAME_STEP: u64 = 30;

/// Give up game identification past this frame (10 min at 30 fps).
pub const GAME_SEARCH_HORIZON: u64 = 10 * 60 * 30;

/// Decimal places kept on reported confidence scores.
pub const CONFIDENCE_PRECISION: i32 = 4;

/// Reserved prefix marking an FSM group state.
pub const FSM_GROUP_PREFIX: &str = "fsm_";

pub const MAX_EVENT_NAME_LEN: usize = 12;

pub fn full_game_name(game: &str) -> &str {
    match game {
        "bf2" => "Star Wars Battlefront II",
        "fn" => "Fortnite",
        "lol" => "League of Legends",
        "r6" => "Rainbow Six Siege",
        "valo" => "Valorant",
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_game_name_falls_back_to_id() {
        assert_eq!(full_game_name("bf2"), "Star Wars Battlefront II");
        assert_eq!(full_game_name("unknown_game"), "unknown_game");
    }
}
