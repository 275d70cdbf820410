use std::collections::HashMap;
use std::time::Duration;

use super::time::Timestamp;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// Re-checks activity every buffer window so silence still ends a session.
    Liveness,
    /// Periodic result snapshot.
    Progress,
    /// One-shot ceiling on session length.
    MaxDuration,
}

/// Identifies one arming of one timer. `generation` ties it to the
/// `TimerSet` that issued it, so ids never match across resets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId {
    pub generation: u64,
    pub slot: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerFired {
    pub id: TimerId,
    pub kind: TimerKind,
    pub deadline: Timestamp,
}

#[derive(Debug, Clone)]
struct Armed {
    kind: TimerKind,
    deadline: Timestamp,
    period: Option<Duration>,
}

/// Deadline-based timers owned by a session and polled by the reactor.
/// Nothing here runs on its own: `due` hands back what expired and the
/// caller decides whether each firing still applies.
#[derive(Debug, Default)]
pub struct TimerSet {
    generation: u64,
    next_slot: u32,
    armed: HashMap<TimerId, Armed>,
}

impl TimerSet {
    pub fn new(generation: u64) -> Self {
        Self {
            generation,
            next_slot: 0,
            armed: HashMap::new(),
        }
    }

    pub fn arm_interval(&mut self, kind: TimerKind, now: Timestamp, period: Duration) -> TimerId {
        // A zero period would never advance past `now`.
        let period = period.max(Duration::from_millis(1));
        self.arm(kind, now.plus(period), Some(period))
    }

    pub fn arm_once(&mut self, kind: TimerKind, now: Timestamp, after: Duration) -> TimerId {
        self.arm(kind, now.plus(after), None)
    }

    fn arm(&mut self, kind: TimerKind, deadline: Timestamp, period: Option<Duration>) -> TimerId {
        let id = TimerId {
            generation: self.generation,
            slot: self.next_slot,
        };
        self.next_slot += 1;
        self.armed.insert(id, Armed { kind, deadline, period });
        id
    }

    /// Idempotent. Returns whether anything was actually disarmed.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        self.armed.remove(&id).is_some()
    }

    pub fn cancel_all(&mut self) {
        self.armed.clear();
    }

    pub fn is_armed(&self, id: TimerId) -> bool {
        self.armed.contains_key(&id)
    }

    pub fn armed_count(&self) -> usize {
        self.armed.len()
    }

    pub fn next_deadline(&self) -> Option<Timestamp> {
        self.armed.values().map(|a| a.deadline).min()
    }

    /// Collects every timer whose deadline is at or before `now`, ordered by
    /// deadline then arming order. One-shots are disarmed; intervals move to
    /// their next deadline after `now` (missed periods coalesce).
    pub fn due(&mut self, now: Timestamp) -> Vec<TimerFired> {
        let mut fired = Vec::new();

        for (id, armed) in self.armed.iter_mut() {
            if armed.deadline > now {
                continue;
            }
            fired.push(TimerFired {
                id: *id,
                kind: armed.kind,
                deadline: armed.deadline,
            });
            if let Some(period) = armed.period {
                let period_ms = period.as_millis() as u64;
                let behind = now.millis - armed.deadline.millis;
                let steps = behind / period_ms + 1;
                armed.deadline = Timestamp::from_millis(armed.deadline.millis + steps * period_ms);
            }
        }

        for f in &fired {
            if self.armed.get(&f.id).is_some_and(|a| a.period.is_none()) {
                self.armed.remove(&f.id);
            }
        }

        fired.sort_by_key(|f| (f.deadline, f.id.slot));
        fired
    }
}
