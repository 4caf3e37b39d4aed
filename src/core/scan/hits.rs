use serde::Serialize;

use crate::core::constants::CONFIDENCE_PRECISION;

/// One accepted event occurrence. Immutable once created; appended in
/// timestamp order.
#[derive(Debug, Clone, Serialize)]
pub struct EventHit {
    pub game: String,
    pub event: String,
    pub timestamp: String,
    pub confidence: f32,
    pub video: String,
}

/// Ordered, append-only accumulator for one scan. Exposed to export
/// tooling as a finished collection once the scan completes.
#[derive(Debug, Default)]
pub struct HitSink {
    hits: Vec<EventHit>,
}

impl HitSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, hit: EventHit) {
        self.hits.push(hit);
    }

    pub fn hits(&self) -> &[EventHit] {
        &self.hits
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    pub fn into_hits(self) -> Vec<EventHit> {
        self.hits
    }
}

pub fn round_confidence(score: f32) -> f32 {
    let factor = 10f32.powi(CONFIDENCE_PRECISION);
    (score * factor).round() / factor
}
