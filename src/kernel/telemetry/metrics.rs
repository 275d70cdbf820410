use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use super::event::TelemetryEvent;
use crate::kernel::event::CloseReason;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySnapshot {
    pub sessions: SessionStats,
    pub closes: CloseStats,
    pub stale_timers_discarded: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionStats {
    pub opened: u64,
    pub killed: u64,
    pub total_duration_ms: u64,
    pub avg_duration_ms: f64,
    pub max_duration_ms: u64,
    pub peak_participants: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CloseStats {
    pub activity_dropped: u64,
    pub silence: u64,
    pub max_duration: u64,
}

impl CloseStats {
    pub fn total(&self) -> u64 {
        self.activity_dropped + self.silence + self.max_duration
    }
}

pub fn compute_snapshot(events: &VecDeque<TelemetryEvent>) -> TelemetrySnapshot {
    let mut snap = TelemetrySnapshot::default();
    let mut ended = 0u64;

    let mut track_duration = |snap: &mut TelemetrySnapshot, duration_ms: u64| {
        snap.sessions.total_duration_ms += duration_ms;
        snap.sessions.max_duration_ms = snap.sessions.max_duration_ms.max(duration_ms);
        ended += 1;
    };

    for event in events {
        match event {
            TelemetryEvent::SessionOpened { participants, .. } => {
                snap.sessions.opened += 1;
                snap.sessions.peak_participants = snap.sessions.peak_participants.max(*participants);
            }
            TelemetryEvent::SessionClosed { reason, duration_ms, participants, .. } => {
                match reason {
                    CloseReason::ActivityDropped => snap.closes.activity_dropped += 1,
                    CloseReason::Silence => snap.closes.silence += 1,
                    CloseReason::MaxDuration => snap.closes.max_duration += 1,
                }
                snap.sessions.peak_participants = snap.sessions.peak_participants.max(*participants);
                track_duration(&mut snap, *duration_ms);
            }
            TelemetryEvent::SessionKilled { duration_ms, .. } => {
                snap.sessions.killed += 1;
                track_duration(&mut snap, *duration_ms);
            }
            TelemetryEvent::StaleTimersDiscarded { count } => {
                snap.stale_timers_discarded += *count as u64;
            }
        }
    }

    if ended > 0 {
        snap.sessions.avg_duration_ms = snap.sessions.total_duration_ms as f64 / ended as f64;
    }

    snap
}
