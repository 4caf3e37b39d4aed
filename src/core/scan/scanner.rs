use log::{debug, info};

use crate::core::config::{FsmState, GameProfile};
use crate::core::constants::{COOLDOWN_NEVER, MAX_EVENT_NAME_LEN};
use crate::core::error::ScanError;
use crate::core::matchers::ScanContext;
use crate::core::scan::hits::{round_confidence, EventHit, HitSink};
use crate::core::video::FrameSource;

/// Mutable per-scan state: current FSM position plus the per-event
/// cooldown and debounce counters.
struct ScanState {
    current: FsmState,
    since_trigger: Vec<u64>,
    consecutive: Vec<u32>,
}

impl ScanState {
    fn new(event_count: usize, initial: FsmState) -> Self {
        Self {
            current: initial,
            since_trigger: vec![COOLDOWN_NEVER; event_count],
            consecutive: vec![0; event_count],
        }
    }
}

/// The main loop: FSM-gated, timing-gated, per-frame matcher dispatch with
/// state transition and hit recording.
pub struct EventScanner<'a> {
    profile: &'a GameProfile,
}

impl<'a> EventScanner<'a> {
    pub fn new(profile: &'a GameProfile) -> Self {
        Self { profile }
    }

    /// Scan a frame sequence starting at `first_frame`. `first_state`
    /// overrides the entry state when resuming after a manual game
    /// identification.
    pub fn scan<S: FrameSource>(
        &self,
        source: &mut S,
        first_frame: u64,
        first_state: Option<&str>,
        ctx: &mut ScanContext,
    ) -> Result<HitSink, ScanError> {
        let catalog = &self.profile.catalog;
        let fsm = &self.profile.fsm;

        let initial = match first_state {
            None | Some("start") => FsmState::Start,
            Some(name) => FsmState::Event(catalog.id_of(name).ok_or_else(|| {
                ScanError::ConfigInvalid(vec![format!(
                    "initial state '{name}' is not a known event"
                )])
            })?),
        };

        ctx.reset();
        ctx.clear_artifacts()?;

        let mut state = ScanState::new(catalog.len(), initial);
        let mut sink = HitSink::new();

        while let Some(frame) = source.next_frame()? {
            if frame.index < first_frame {
                continue;
            }

            let allowed = fsm.allowed(state.current);
            if allowed.is_empty() {
                return Err(ScanError::DeadEnd {
                    state: self.state_name(state.current),
                    timestamp: frame.timestamp,
                });
            }

            for &event_id in allowed {
                let entry = catalog.entry(event_id);
                let def = &entry.def;

                // Trigger-interval gate: polling throttle for slow UI.
                if def.trigger_interval > 0 && frame.index % def.trigger_interval != 0 {
                    continue;
                }

                // Cooldown gate: an indicator staying on screen must not
                // re-fire the same transition on adjacent frames.
                if def.fcooldown > 0 && state.since_trigger[event_id] < def.fcooldown {
                    state.since_trigger[event_id] += 1;
                    continue;
                }

                let crop = frame.crop(&def.roi);
                let result = def.match_kind.evaluate(&crop, &entry.qualified, def, ctx)?;

                // Debounce gate: min_frames consecutive positives before
                // acceptance; any gap resets.
                if let Some(min_frames) = def.min_frames {
                    if result.matched {
                        state.consecutive[event_id] += 1;
                    } else {
                        state.consecutive[event_id] = 0;
                    }
                    if state.consecutive[event_id] < min_frames {
                        continue;
                    }
                }

                if result.matched {
                    let resolved = result.resolved.unwrap_or_else(|| entry.name.clone());
                    info!(
                        "✅ Detected {resolved:<w$} at {} with score {:.2}",
                        frame.timestamp,
                        result.score,
                        w = MAX_EVENT_NAME_LEN
                    );
                    state.since_trigger[event_id] = 0;
                    state.consecutive[event_id] = 0;
                    state.current = FsmState::Event(event_id);
                    sink.push(EventHit {
                        game: self.profile.game.clone(),
                        event: resolved,
                        timestamp: frame.timestamp.clone(),
                        confidence: round_confidence(result.score),
                        video: ctx.video_id().to_string(),
                    });
                }
            }
        }

        debug!("🏁 scan complete: {} hit(s)", sink.len());
        Ok(sink)
    }

    fn state_name(&self, state: FsmState) -> String {
        match state {
            FsmState::Start => "start".to_string(),
            FsmState::Event(id) => self.profile.catalog.entry(id).name.clone(),
        }
    }
}
