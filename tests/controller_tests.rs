use votebot::bot::controller::{normalize, Controller};
use votebot::chat::ChatMessage;
use votebot::config::Config;
use votebot::kernel::classifier::DisplayMode;
use votebot::kernel::event::{CloseReason, Event, Histogram, SessionEvent, SessionId};
use votebot::kernel::time::Timestamp;

const MINUTE: u64 = 60_000;

fn at(millis: u64) -> Timestamp {
    Timestamp::from_millis(millis)
}

fn config() -> Config {
    let mut config = Config::default();
    config.voting.admin = "boss".to_string();
    config.voting.command = "!vote".to_string();
    config.voting.lifetime = 3600;
    config.voting.pause = 30;
    config.voting.median_threshold = 0.5;
    config.voting.allow_mods = true;
    config
}

fn say(controller: &mut Controller, who: &str, text: &str, millis: u64) -> (Option<Event>, Vec<String>) {
    let outcome = controller.handle_message(&ChatMessage::new(who, text, at(millis)), at(millis));
    (outcome.event, outcome.replies)
}

fn activated() -> Controller {
    let mut controller = Controller::new(&config());
    let (_, replies) = say(&mut controller, "boss", "!vote", 0);
    assert_eq!(replies.len(), 1);
    controller
}

fn histogram(pairs: &[(u64, usize)]) -> Histogram {
    pairs.iter().copied().collect()
}

#[test]
fn test_votes_ignored_until_activated() {
    let mut controller = Controller::new(&config());
    let (event, replies) = say(&mut controller, "alice", "2", 0);
    assert!(event.is_none());
    assert!(replies.is_empty());
}

#[test]
fn test_init_requires_privileges() {
    let mut controller = Controller::new(&config());
    let (_, replies) = say(&mut controller, "alice", "!vote", 0);
    assert!(replies.is_empty(), "Regular chatters cannot activate");
    assert!(!controller.is_activated(at(0)));

    let (_, replies) = say(&mut controller, "boss", "!vote", 0);
    assert!(controller.is_activated(at(0)));
    assert!(replies[0].starts_with("@boss "));
    assert!(replies[0].contains("\"!vote help\""));
}

#[test]
fn test_moderators_and_broadcaster_are_privileged() {
    let mut controller = Controller::new(&config());
    let outcome = controller.handle_message(&ChatMessage::new("modjoe", "!vote", at(0)).as_moderator(), at(0));
    assert_eq!(outcome.replies.len(), 1);

    let mut strict = config();
    strict.voting.allow_mods = false;
    let mut controller = Controller::new(&strict);
    let outcome = controller.handle_message(&ChatMessage::new("streamer", "!vote", at(0)).as_broadcaster(), at(0));
    assert!(outcome.replies.is_empty(), "Mods only count when allowed");
}

#[test]
fn test_valid_votes_become_events() {
    let mut controller = activated();

    match say(&mut controller, "alice", " 2 ", 1_000) {
        (Some(Event::Vote(vote)), replies) => {
            assert_eq!(vote.participant, "alice");
            assert_eq!(vote.value, 2);
            assert_eq!(vote.sent_at, at(1_000));
            assert!(replies.is_empty());
        }
        other => panic!("Expected a vote, got {:?}", other),
    }

    assert!(say(&mut controller, "bob", "2!", 1_000).0.is_none());
    assert!(say(&mut controller, "bob", "02", 1_000).0.is_none());
}

#[test]
fn test_activation_expires() {
    let mut controller = activated();
    assert!(controller.is_activated(at(60 * MINUTE)));
    assert!(!controller.is_activated(at(60 * MINUTE + 1)));
    assert!(say(&mut controller, "alice", "1", 60 * MINUTE + 2).0.is_none());
    let (_, replies) = say(&mut controller, "boss", "!vote status", 60 * MINUTE + 2);
    assert!(replies.is_empty(), "Directives other than init need activation");
}

#[test]
fn test_pause_after_result() {
    let mut controller = activated();
    let closed = SessionEvent::Closed {
        session: SessionId::new(),
        histogram: histogram(&[(1, 2)]),
        reason: CloseReason::Silence,
    };
    let lines = controller.on_session_event(&closed, at(10_000));
    assert_eq!(lines, vec!["Result: ① 2".to_string()]);

    assert!(say(&mut controller, "alice", "1", 11_000).0.is_none(), "Votes are ignored during the pause");
    assert!(say(&mut controller, "alice", "1", 39_999).0.is_none());
    assert!(say(&mut controller, "alice", "1", 40_000).0.is_some());
}

#[test]
fn test_progress_switches_to_median_once() {
    let mut controller = activated();
    let session = SessionId::new();
    let numeric = histogram(&[(1, 1), (7, 2)]);

    let lines = controller.on_session_event(&SessionEvent::Progress { session, histogram: numeric.clone() }, at(1_000));
    assert_eq!(lines, vec!["Vote converted to median mode!".to_string()]);
    assert_eq!(controller.mode(), DisplayMode::Median);

    let lines = controller.on_session_event(&SessionEvent::Progress { session, histogram: numeric.clone() }, at(2_000));
    assert_eq!(lines, vec!["Vote running: 7".to_string()]);

    let lines = controller.on_session_event(
        &SessionEvent::Closed { session, histogram: numeric, reason: CloseReason::MaxDuration },
        at(3_000),
    );
    assert_eq!(lines, vec!["Result: 7".to_string()]);
    assert_eq!(controller.mode(), DisplayMode::Normal, "Mode resets when the session closes");
}

#[test]
fn test_started_in_normal_mode() {
    let mut controller = activated();
    let lines = controller.on_session_event(
        &SessionEvent::Started { session: SessionId::new(), histogram: histogram(&[(1, 1), (2, 2)]) },
        at(1_000),
    );
    assert_eq!(lines, vec!["Vote started: ① 1 ② 2".to_string()]);
    assert_eq!(controller.mode(), DisplayMode::Normal);
}

#[test]
fn test_status_minutes() {
    let mut controller = activated();
    let (_, replies) = say(&mut controller, "boss", "!vote status", 0);
    assert_eq!(replies, vec!["@boss The vote bot stays activated for 60 minutes.".to_string()]);

    let (_, replies) = say(&mut controller, "boss", "!vote info", 59 * MINUTE + 1);
    assert_eq!(replies, vec!["@boss The vote bot stays activated for 1 minute.".to_string()]);
}

#[test]
fn test_directive_errors_are_reported() {
    let mut controller = activated();
    let (_, replies) = say(&mut controller, "boss", "!vote mode loud", 0);
    assert_eq!(replies, vec!["@boss Unknown mode \"loud\"! NotLikeThis".to_string()]);
}

#[test]
fn test_mode_directive_sets_mode() {
    let mut controller = activated();
    let (_, replies) = say(&mut controller, "boss", "!vote mode median", 0);
    assert_eq!(controller.mode(), DisplayMode::Median);
    assert_eq!(replies.len(), 1);
}

#[test]
fn test_kill_deactivates() {
    let mut controller = activated();
    say(&mut controller, "boss", "!vote mode median", 0);

    let (event, replies) = say(&mut controller, "boss", "!vote kill", 1_000);
    assert!(matches!(event, Some(Event::Kill)));
    assert_eq!(replies, vec!["@boss The vote bot is now deactivated.".to_string()]);
    assert_eq!(controller.mode(), DisplayMode::Normal);
    assert!(!controller.is_activated(at(1_000)));
}

#[test]
fn test_empty_median_line_is_skipped() {
    let mut controller = activated();
    say(&mut controller, "boss", "!vote mode median", 0);
    let lines = controller.on_session_event(
        &SessionEvent::Closed { session: SessionId::new(), histogram: Histogram::new(), reason: CloseReason::Silence },
        at(1_000),
    );
    assert!(lines.is_empty());
}

#[test]
fn test_normalize_whitespace() {
    assert_eq!(normalize("  @boss   The  vote\n bot "), "@boss The vote bot");
}
