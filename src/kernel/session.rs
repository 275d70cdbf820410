use std::collections::HashMap;
use std::time::Duration;

use tracing::{debug, info};

use super::buffer::ActivityBuffer;
use super::event::{CloseReason, Histogram, SessionEvent, SessionId, Vote};
use super::time::Timestamp;
use super::timer::{TimerFired, TimerId, TimerKind, TimerSet};

/// Immutable engine parameters, fixed for the session's lifetime.
/// Not validated here; `Config::validate` rejects inverted thresholds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Activity buffer window, also the liveness check period.
    pub window: Duration,
    pub start_threshold: usize,
    pub end_threshold: usize,
    pub max_duration: Duration,
    pub result_interval: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    Active,
}

#[derive(Debug, Clone)]
struct ActiveSession {
    id: SessionId,
    opened_at: Timestamp,
    liveness: TimerId,
    progress: TimerId,
    ceiling: TimerId,
}

impl ActiveSession {
    fn owns(&self, timer: TimerId) -> bool {
        timer == self.liveness || timer == self.progress || timer == self.ceiling
    }
}

/// Idle/Active state machine over an activity buffer and a per-session tally.
///
/// Opens when a vote lifts live activity to `start_threshold`, closes when
/// activity falls to `end_threshold` (checked on every vote and on every
/// liveness tick) or when `max_duration` runs out.
#[derive(Debug)]
pub struct VotingSession {
    config: SessionConfig,
    buffer: ActivityBuffer,
    // participant -> latest value, for the whole session (not windowed)
    tally: HashMap<String, u64>,
    timers: TimerSet,
    active: Option<ActiveSession>,
    generation: u64,
}

impl VotingSession {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            buffer: ActivityBuffer::new(config.window),
            config,
            tally: HashMap::new(),
            timers: TimerSet::new(0),
            active: None,
            generation: 0,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn phase(&self) -> SessionPhase {
        if self.active.is_some() {
            SessionPhase::Active
        } else {
            SessionPhase::Idle
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn current(&self) -> Option<SessionId> {
        self.active.as_ref().map(|a| a.id)
    }

    pub fn opened_at(&self) -> Option<Timestamp> {
        self.active.as_ref().map(|a| a.opened_at)
    }

    pub fn activity_count(&self, now: Timestamp) -> usize {
        self.buffer.activity_count(now)
    }

    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    pub fn participants(&self) -> usize {
        self.tally.len()
    }

    pub fn timers(&self) -> &TimerSet {
        &self.timers
    }

    pub fn histogram(&self) -> Histogram {
        Histogram::from_values(self.tally.values().copied())
    }

    pub fn handle_vote(&mut self, vote: Vote, now: Timestamp) -> Option<SessionEvent> {
        let participant = vote.participant.clone();
        let value = vote.value;
        self.buffer.ingest(vote, now);
        let activity = self.buffer.activity_count(now);

        if self.active.is_some() {
            self.tally.insert(participant, value);
            if activity <= self.config.end_threshold {
                return Some(self.close(CloseReason::ActivityDropped));
            }
            None
        } else if activity >= self.config.start_threshold {
            Some(self.open(now))
        } else {
            None
        }
    }

    /// Expired timers, for callers that dispatch firings one by one.
    pub fn due_timers(&mut self, now: Timestamp) -> Vec<TimerFired> {
        self.timers.due(now)
    }

    /// Whether a firing still belongs to the running session.
    pub fn owns_timer(&self, timer: TimerId) -> bool {
        self.active.as_ref().is_some_and(|a| a.owns(timer))
    }

    /// Fires every due timer in deadline order. A close part-way through
    /// invalidates the remaining firings of the batch.
    pub fn poll_timers(&mut self, now: Timestamp) -> Vec<SessionEvent> {
        let fired = self.timers.due(now);
        fired
            .into_iter()
            .filter_map(|f| self.on_timer(f, now))
            .collect()
    }

    /// Applies one timer firing. Firings from a set that has since been
    /// cancelled or replaced are dropped without touching state.
    pub fn on_timer(&mut self, fired: TimerFired, now: Timestamp) -> Option<SessionEvent> {
        if !self.owns_timer(fired.id) {
            debug!("Discarded stale timer {:?} (generation {} vs {})", fired.kind, fired.id.generation, self.generation);
            return None;
        }

        match fired.kind {
            TimerKind::Liveness => {
                if self.buffer.activity_count(now) <= self.config.end_threshold {
                    Some(self.close(CloseReason::Silence))
                } else {
                    None
                }
            }
            TimerKind::Progress => {
                let session = self.current()?;
                Some(SessionEvent::Progress {
                    session,
                    histogram: self.histogram(),
                })
            }
            TimerKind::MaxDuration => Some(self.close(CloseReason::MaxDuration)),
        }
    }

    /// Silent stop. No-op when idle; returns the killed session if there was one.
    pub fn kill(&mut self) -> Option<SessionId> {
        let killed = self.current();
        if let Some(id) = killed {
            info!(session = %id, "Vote session killed");
        }
        self.reset();
        killed
    }

    fn open(&mut self, now: Timestamp) -> SessionEvent {
        let id = SessionId::new();

        // Whoever is already live counts from the start.
        for vote in self.buffer.live_entries(now) {
            self.tally.insert(vote.participant.clone(), vote.value);
        }

        let progress = self
            .timers
            .arm_interval(TimerKind::Progress, now, self.config.result_interval);
        let liveness = self
            .timers
            .arm_interval(TimerKind::Liveness, now, self.config.window);
        let ceiling = self
            .timers
            .arm_once(TimerKind::MaxDuration, now, self.config.max_duration);

        self.active = Some(ActiveSession {
            id,
            opened_at: now,
            liveness,
            progress,
            ceiling,
        });

        info!(session = %id, participants = self.tally.len(), "Vote session started");

        SessionEvent::Started {
            session: id,
            histogram: self.histogram(),
        }
    }

    fn close(&mut self, reason: CloseReason) -> SessionEvent {
        let histogram = self.histogram();
        let session = self.current().unwrap_or_default();
        info!(session = %session, ?reason, participants = self.tally.len(), "Vote session closed");
        self.reset();
        SessionEvent::Closed {
            session,
            histogram,
            reason,
        }
    }

    /// Cancels timers first, then swaps in fresh structures rather than
    /// clearing in place: a firing issued before this point can only ever see
    /// the old generation.
    fn reset(&mut self) {
        self.timers.cancel_all();
        self.generation += 1;
        self.timers = TimerSet::new(self.generation);
        self.tally = HashMap::new();
        self.buffer = ActivityBuffer::new(self.config.window);
        self.active = None;
    }
}
