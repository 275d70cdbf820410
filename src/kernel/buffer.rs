use std::collections::HashMap;
use std::time::Duration;

use super::event::Vote;
use super::time::Timestamp;

/// Sliding window over the latest vote of each participant.
/// At most one entry per participant; a newer vote replaces the older one.
#[derive(Debug, Clone)]
pub struct ActivityBuffer {
    window: Duration,
    entries: HashMap<String, Vote>,
}

impl ActivityBuffer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            entries: HashMap::new(),
        }
    }

    /// Upsert, then drop everything older than `now - window`.
    pub fn ingest(&mut self, vote: Vote, now: Timestamp) {
        self.entries.insert(vote.participant.clone(), vote);
        let limit = now.minus(self.window);
        self.entries.retain(|_, v| v.sent_at >= limit);
    }

    /// Re-filters at call time; entries may have aged out since the last prune.
    pub fn activity_count(&self, now: Timestamp) -> usize {
        let limit = now.minus(self.window);
        self.entries.values().filter(|v| v.sent_at >= limit).count()
    }

    pub fn live_entries(&self, now: Timestamp) -> Vec<&Vote> {
        let limit = now.minus(self.window);
        self.entries.values().filter(|v| v.sent_at >= limit).collect()
    }

    /// Entries held, live or not yet pruned.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
