use votebot::bot::action::{parse_action, Action, ActionError};
use votebot::kernel::classifier::DisplayMode;

const CMD: &str = "!vote";

#[test]
fn test_unaddressed_text_is_not_an_action() {
    assert_eq!(parse_action("2", CMD), None);
    assert_eq!(parse_action("!votes", CMD), None, "Prefix must be followed by a space");
    assert_eq!(parse_action("hello !vote", CMD), None);
}

#[test]
fn test_bare_command_is_init() {
    assert_eq!(parse_action("!vote", CMD), Some(Ok(Action::Init)));
}

#[test]
fn test_simple_directives() {
    assert_eq!(parse_action("!vote help", CMD), Some(Ok(Action::Help)));
    assert_eq!(parse_action("!vote version", CMD), Some(Ok(Action::Version)));
    assert_eq!(parse_action("!vote info", CMD), Some(Ok(Action::Status)));
    assert_eq!(parse_action("!vote status", CMD), Some(Ok(Action::Status)));
    assert_eq!(parse_action("!vote kill", CMD), Some(Ok(Action::Kill)));
}

#[test]
fn test_mode_directive() {
    assert_eq!(parse_action("!vote mode median", CMD), Some(Ok(Action::Mode(DisplayMode::Median))));
    assert_eq!(parse_action("!vote mode normal", CMD), Some(Ok(Action::Mode(DisplayMode::Normal))));
    assert_eq!(
        parse_action("!vote mode loud", CMD),
        Some(Err(ActionError::UnknownMode("loud".to_string())))
    );
    assert_eq!(parse_action("!vote mode", CMD), Some(Err(ActionError::ArgumentCount)));
}

#[test]
fn test_argument_count_errors() {
    assert_eq!(parse_action("!vote kill now", CMD), Some(Err(ActionError::ArgumentCount)));
    assert_eq!(parse_action("!vote mode median now", CMD), Some(Err(ActionError::ArgumentCount)));
}

#[test]
fn test_unknown_directive() {
    let parsed = parse_action("!vote dance", CMD);
    assert_eq!(parsed, Some(Err(ActionError::UnknownCommand("dance".to_string()))));
    assert_eq!(
        ActionError::UnknownCommand("dance".to_string()).to_string(),
        "Unknown command \"dance\"!"
    );
}
