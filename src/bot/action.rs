use thiserror::Error;

use crate::kernel::classifier::DisplayMode;

/// Administrative directives, addressed by the configured command prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Bare command: activate the bot.
    Init,
    Help,
    Version,
    Status,
    Kill,
    Mode(DisplayMode),
}

/// Display text is what the bot replies with.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ActionError {
    #[error("Invalid number of arguments!")]
    ArgumentCount,
    #[error("Unknown command \"{0}\"!")]
    UnknownCommand(String),
    #[error("Unknown mode \"{0}\"!")]
    UnknownMode(String),
}

/// `None` when `text` is not addressed to `command` at all.
pub fn parse_action(text: &str, command: &str) -> Option<Result<Action, ActionError>> {
    if text != command && !text.starts_with(&format!("{} ", command)) {
        return None;
    }

    let mut parts = text.split(' ');
    parts.next();
    let action = parts.next();
    let args: Vec<&str> = parts.collect();

    let parsed = match action {
        None => Ok(Action::Init),
        Some("help") => no_args(&args, Action::Help),
        Some("version") => no_args(&args, Action::Version),
        Some("info") | Some("status") => no_args(&args, Action::Status),
        Some("kill") => no_args(&args, Action::Kill),
        Some("mode") => match args.as_slice() {
            ["median"] => Ok(Action::Mode(DisplayMode::Median)),
            ["normal"] => Ok(Action::Mode(DisplayMode::Normal)),
            [other] => Err(ActionError::UnknownMode(other.to_string())),
            _ => Err(ActionError::ArgumentCount),
        },
        Some(other) => Err(ActionError::UnknownCommand(other.to_string())),
    };

    Some(parsed)
}

fn no_args(args: &[&str], action: Action) -> Result<Action, ActionError> {
    if args.is_empty() {
        Ok(action)
    } else {
        Err(ActionError::ArgumentCount)
    }
}
