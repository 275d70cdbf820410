use std::time::Duration;

use votebot::kernel::event::{CloseReason, Event, SessionEvent, Vote};
use votebot::kernel::reactor::Reactor;
use votebot::kernel::session::SessionConfig;
use votebot::kernel::time::Timestamp;

fn at(millis: u64) -> Timestamp {
    Timestamp::from_millis(millis)
}

fn vote(who: &str, value: u64, millis: u64) -> Event {
    Event::Vote(Vote::new(who, value, at(millis)))
}

fn reactor() -> Reactor {
    Reactor::new(SessionConfig {
        window: Duration::from_secs(5),
        start_threshold: 3,
        end_threshold: 1,
        max_duration: Duration::from_secs(5),
        result_interval: Duration::from_secs(5),
    })
}

#[test]
fn test_tick_step_applies_events_in_order() {
    let mut reactor = reactor();
    let emitted = reactor.tick_step(vec![vote("a", 1, 0), vote("b", 2, 0), vote("c", 3, 0)], at(0));

    assert_eq!(emitted.len(), 1);
    assert!(matches!(emitted[0], SessionEvent::Started { .. }));
    assert_eq!(reactor.telemetry.snapshot().sessions.opened, 1);
}

#[test]
fn test_close_discards_rest_of_timer_batch() {
    let mut reactor = reactor();
    reactor.tick_step(vec![vote("a", 1, 0), vote("b", 2, 0), vote("c", 3, 0)], at(0));

    // Progress, liveness and the ceiling are all due by 6s. Liveness closes
    // first (silence), so the ceiling firing belongs to nobody.
    let emitted = reactor.tick_step(vec![], at(6_000));
    assert_eq!(emitted.len(), 2);
    assert!(matches!(emitted[0], SessionEvent::Progress { .. }));
    assert!(matches!(
        emitted[1],
        SessionEvent::Closed { reason: CloseReason::Silence, .. }
    ));

    let snap = reactor.telemetry.snapshot();
    assert_eq!(snap.closes.silence, 1);
    assert_eq!(snap.closes.max_duration, 0, "Ceiling must not fire on a closed session");
    assert_eq!(snap.stale_timers_discarded, 1);
    assert_eq!(snap.sessions.max_duration_ms, 6_000);
}

#[test]
fn test_timers_fire_before_new_events() {
    let mut reactor = reactor();
    reactor.tick_step(vec![vote("a", 1, 0), vote("b", 2, 0), vote("c", 3, 0)], at(0));

    // The ceiling (5s) closes the old session before these votes land,
    // so they count toward a brand new one.
    let emitted = reactor.tick_step(vec![vote("x", 2, 5_000), vote("y", 2, 5_000), vote("z", 2, 5_000)], at(5_000));

    let kinds: Vec<_> = emitted
        .iter()
        .map(|e| match e {
            SessionEvent::Started { .. } => "started",
            SessionEvent::Progress { .. } => "progress",
            SessionEvent::Closed { .. } => "closed",
        })
        .collect();
    assert_eq!(kinds, vec!["progress", "closed", "started"]);
    assert_eq!(emitted[2].histogram().count(2), 3);
}

#[test]
fn test_kill_records_telemetry_without_event() {
    let mut reactor = reactor();
    reactor.tick_step(vec![vote("a", 1, 0), vote("b", 2, 0), vote("c", 3, 0)], at(0));

    let emitted = reactor.tick_step(vec![Event::Kill], at(2_000));
    assert!(emitted.is_empty(), "Kill never emits Closed");
    assert!(!reactor.session.is_active());

    let snap = reactor.telemetry.snapshot();
    assert_eq!(snap.sessions.killed, 1);
    assert_eq!(snap.closes.total(), 0);

    // Killing again is harmless and records nothing
    reactor.tick_step(vec![Event::Kill], at(3_000));
    assert_eq!(reactor.telemetry.snapshot().sessions.killed, 1);
}

#[test]
fn test_overdue_ceiling_closes_before_late_vote() {
    let mut reactor = Reactor::new(SessionConfig {
        window: Duration::from_secs(10),
        start_threshold: 3,
        end_threshold: 1,
        max_duration: Duration::from_secs(5),
        result_interval: Duration::from_secs(2),
    });
    reactor.tick_step(vec![vote("a", 1, 0), vote("b", 2, 0), vote("c", 3, 0)], at(0));

    // The ceiling was due at 5s, but nothing polled until the vote arrived.
    let emitted = reactor.tick_step(vec![vote("late", 9, 5_050)], at(5_050));

    assert_eq!(emitted.len(), 2);
    assert!(matches!(emitted[0], SessionEvent::Progress { .. }));
    match &emitted[1] {
        SessionEvent::Closed { histogram, reason, .. } => {
            assert_eq!(*reason, CloseReason::MaxDuration);
            assert_eq!(histogram.count(9), 0, "Vote after the ceiling must not be counted");
            assert_eq!(histogram.total(), 3);
        }
        other => panic!("Expected Closed, got {:?}", other),
    }

    assert!(!reactor.session.is_active(), "A single late vote does not reopen");
    assert_eq!(reactor.session.buffered(), 1, "The late vote seeds the next session's buffer");
}
