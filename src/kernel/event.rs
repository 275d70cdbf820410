use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

use super::time::Timestamp;

/// One validated pick from one participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    pub participant: String,
    pub value: u64,
    pub sent_at: Timestamp,
}

impl Vote {
    pub fn new(participant: &str, value: u64, sent_at: Timestamp) -> Self {
        Self {
            participant: participant.to_string(),
            value,
            sent_at,
        }
    }
}

/// Kernel inputs. Timer firings are not events here; the reactor polls them.
#[derive(Debug, Clone)]
pub enum Event {
    Vote(Vote),
    /// Administrative stop: silent reset, no `Closed`.
    Kill,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        SessionId(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// value -> number of participants currently holding that value.
/// Derived from a tally on demand, never stored by the session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Histogram {
    buckets: BTreeMap<u64, usize>,
}

impl Histogram {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_values<I: IntoIterator<Item = u64>>(values: I) -> Self {
        let mut histogram = Self::new();
        for value in values {
            histogram.add(value);
        }
        histogram
    }

    pub fn add(&mut self, value: u64) {
        *self.buckets.entry(value).or_insert(0) += 1;
    }

    pub fn count(&self, value: u64) -> usize {
        self.buckets.get(&value).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.buckets.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Ascending by value.
    pub fn iter(&self) -> impl Iterator<Item = (u64, usize)> + '_ {
        self.buckets.iter().map(|(v, c)| (*v, *c))
    }
}

impl FromIterator<(u64, usize)> for Histogram {
    fn from_iter<I: IntoIterator<Item = (u64, usize)>>(iter: I) -> Self {
        let mut histogram = Self::new();
        for (value, count) in iter {
            if count > 0 {
                *histogram.buckets.entry(value).or_insert(0) += count;
            }
        }
        histogram
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CloseReason {
    /// An incoming vote found activity at or below the end threshold.
    ActivityDropped,
    /// The liveness timer found activity at or below the end threshold.
    Silence,
    /// Hard ceiling on session length.
    MaxDuration,
}

/// Lifecycle notifications for the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SessionEvent {
    Started {
        session: SessionId,
        histogram: Histogram,
    },
    Progress {
        session: SessionId,
        histogram: Histogram,
    },
    Closed {
        session: SessionId,
        histogram: Histogram,
        reason: CloseReason,
    },
}

impl SessionEvent {
    pub fn session(&self) -> SessionId {
        match self {
            SessionEvent::Started { session, .. }
            | SessionEvent::Progress { session, .. }
            | SessionEvent::Closed { session, .. } => *session,
        }
    }

    pub fn histogram(&self) -> &Histogram {
        match self {
            SessionEvent::Started { histogram, .. }
            | SessionEvent::Progress { histogram, .. }
            | SessionEvent::Closed { histogram, .. } => histogram,
        }
    }
}
