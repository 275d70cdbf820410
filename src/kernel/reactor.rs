use tracing::debug;

use super::event::{Event, SessionEvent};
use super::session::{SessionConfig, VotingSession};
use super::telemetry::event::TelemetryEvent;
use super::telemetry::recorder::TelemetryRecorder;
use super::time::Timestamp;

/// Single-threaded front of the kernel. Inputs and timer firings both pass
/// through here one at a time, so no handler ever observes another half-done.
pub struct Reactor {
    pub session: VotingSession,
    pub telemetry: TelemetryRecorder,
}

impl Reactor {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            session: VotingSession::new(config),
            telemetry: TelemetryRecorder::new(),
        }
    }

    /// Pure step: fire due timers, then apply `events` in delivery order.
    /// MUST NOT await I/O.
    pub fn tick_step(&mut self, events: Vec<Event>, now: Timestamp) -> Vec<SessionEvent> {
        let mut emitted = self.poll_timers(now);
        for event in events {
            emitted.extend(self.dispatch(event, now));
        }
        emitted
    }

    pub fn poll_timers(&mut self, now: Timestamp) -> Vec<SessionEvent> {
        let fired = self.session.due_timers(now);
        let mut emitted = Vec::new();
        let mut stale = 0;

        for timer in fired {
            // An earlier firing in this batch may already have closed the session.
            if !self.session.owns_timer(timer.id) {
                stale += 1;
                continue;
            }
            let opened_at = self.session.opened_at();
            if let Some(event) = self.session.on_timer(timer, now) {
                self.observe(&event, opened_at, now);
                emitted.push(event);
            }
        }

        if stale > 0 {
            debug!("Discarded {} stale timer firing(s)", stale);
            self.telemetry.record(TelemetryEvent::StaleTimersDiscarded { count: stale });
        }

        emitted
    }

    pub fn dispatch(&mut self, event: Event, now: Timestamp) -> Option<SessionEvent> {
        let opened_at = self.session.opened_at();
        match event {
            Event::Vote(vote) => {
                let emitted = self.session.handle_vote(vote, now)?;
                self.observe(&emitted, opened_at, now);
                Some(emitted)
            }
            Event::Kill => {
                if let Some(session) = self.session.kill() {
                    let duration_ms = opened_at.map(|t| now.elapsed_since(t).as_millis() as u64).unwrap_or(0);
                    self.telemetry.record(TelemetryEvent::SessionKilled { session, duration_ms });
                }
                None
            }
        }
    }

    fn observe(&mut self, event: &SessionEvent, opened_at: Option<Timestamp>, now: Timestamp) {
        match event {
            SessionEvent::Started { session, histogram } => {
                self.telemetry.record(TelemetryEvent::SessionOpened {
                    session: *session,
                    participants: histogram.total(),
                });
            }
            SessionEvent::Closed { session, histogram, reason } => {
                let duration_ms = opened_at.map(|t| now.elapsed_since(t).as_millis() as u64).unwrap_or(0);
                self.telemetry.record(TelemetryEvent::SessionClosed {
                    session: *session,
                    reason: *reason,
                    duration_ms,
                    participants: histogram.total(),
                });
            }
            SessionEvent::Progress { .. } => {}
        }
    }
}
