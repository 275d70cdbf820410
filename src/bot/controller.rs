use std::time::Duration;

use tracing::{info, warn};

use super::action::{parse_action, Action};
use crate::chat::ChatMessage;
use crate::config::Config;
use crate::kernel::classifier::{format_result, parse_vote, should_switch_mode, DisplayMode};
use crate::kernel::event::{Event, Histogram, SessionEvent, Vote};
use crate::kernel::time::Timestamp;

pub const HELP_URL: &str = "https://github.com/virtuaCode/bonjwa-votebot/blob/master/README.md";
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// What one chat message turned into.
#[derive(Debug, Clone, Default)]
pub struct Outcome {
    pub event: Option<Event>,
    pub replies: Vec<String>,
}

impl Outcome {
    fn reply(text: String) -> Self {
        Self {
            event: None,
            replies: vec![normalize(&text)],
        }
    }

    fn event(event: Event) -> Self {
        Self {
            event: Some(event),
            replies: Vec::new(),
        }
    }
}

/// Chat-facing side of the bot: decides which messages are votes or
/// directives, owns the display mode, and turns session events into text.
#[derive(Debug)]
pub struct Controller {
    command: String,
    admin: String,
    allow_mods: bool,
    pause: Duration,
    lifetime: Duration,
    median_threshold: f64,

    mode: DisplayMode,
    active_until: Option<Timestamp>,
    // start of the post-result pause
    last_result_at: Option<Timestamp>,
}

impl Controller {
    pub fn new(config: &Config) -> Self {
        Self {
            command: config.voting.command.clone(),
            admin: config.voting.admin.clone(),
            allow_mods: config.voting.allow_mods,
            pause: config.pause(),
            lifetime: config.lifetime(),
            median_threshold: config.median_threshold(),
            mode: DisplayMode::Normal,
            active_until: None,
            last_result_at: None,
        }
    }

    pub fn mode(&self) -> DisplayMode {
        self.mode
    }

    /// Expires the activation window lazily.
    pub fn is_activated(&mut self, now: Timestamp) -> bool {
        match self.active_until {
            Some(until) if now <= until => true,
            Some(_) => {
                info!("Activation expired");
                self.active_until = None;
                false
            }
            None => false,
        }
    }

    pub fn is_paused(&self, now: Timestamp) -> bool {
        self.last_result_at
            .is_some_and(|at| now.elapsed_since(at) < self.pause)
    }

    fn is_privileged(&self, message: &ChatMessage) -> bool {
        message.username == self.admin || (self.allow_mods && (message.moderator || message.broadcaster))
    }

    pub fn handle_message(&mut self, message: &ChatMessage, now: Timestamp) -> Outcome {
        let action = parse_action(&message.text, &self.command);
        let user = &message.username;

        let action = match action {
            None => {
                if self.is_activated(now) && !self.is_paused(now) {
                    if let Some(value) = parse_vote(&message.text) {
                        return Outcome::event(Event::Vote(Vote::new(user, value, message.sent_at)));
                    }
                }
                return Outcome::default();
            }
            Some(action) => action,
        };

        if !self.is_privileged(message) {
            return Outcome::default();
        }

        if action == Ok(Action::Init) {
            info!("Executing Init for {}", user);
            self.active_until = Some(now.plus(self.lifetime));
            return Outcome::reply(format!(
                "@{} The vote bot is now activated and available for a while. \
                 Type \"{} help\" for more info.",
                user, self.command
            ));
        }

        if !self.is_activated(now) {
            return Outcome::default();
        }

        let action = match action {
            Ok(action) => action,
            Err(e) => return Outcome::reply(format!("@{} {} NotLikeThis", user, e)),
        };

        info!("Executing {:?} for {}", action, user);

        match action {
            Action::Init => Outcome::default(),
            Action::Status => {
                let remaining = self
                    .active_until
                    .map(|until| until.elapsed_since(now))
                    .unwrap_or_default();
                let minutes = remaining.as_millis().div_ceil(60_000);
                let span = if minutes == 1 {
                    "1 minute".to_string()
                } else {
                    format!("{} minutes", minutes)
                };
                Outcome::reply(format!("@{} The vote bot stays activated for {}.", user, span))
            }
            Action::Version => Outcome::reply(format!("@{} Vote bot version: {}", user, VERSION)),
            Action::Help => Outcome::reply(format!("/w {} [Vote bot help] {}", user, HELP_URL)),
            Action::Mode(mode) => {
                self.mode = mode;
                let name = match mode {
                    DisplayMode::Normal => "normal",
                    DisplayMode::Median => "median",
                };
                Outcome::reply(format!("@{} Display mode set to {}.", user, name))
            }
            Action::Kill => {
                self.mode = DisplayMode::Normal;
                self.active_until = None;
                self.last_result_at = None;
                Outcome {
                    event: Some(Event::Kill),
                    replies: vec![normalize(&format!("@{} The vote bot is now deactivated.", user))],
                }
            }
        }
    }

    pub fn on_session_event(&mut self, event: &SessionEvent, now: Timestamp) -> Vec<String> {
        let line = match event {
            SessionEvent::Started { histogram, .. } => {
                self.maybe_switch(histogram);
                self.render("Vote started:", histogram)
            }
            SessionEvent::Progress { histogram, .. } => {
                if self.maybe_switch(histogram) {
                    Some("Vote converted to median mode!".to_string())
                } else {
                    self.render("Vote running:", histogram)
                }
            }
            SessionEvent::Closed { histogram, .. } => {
                let line = self.render("Result:", histogram);
                self.mode = DisplayMode::Normal;
                self.last_result_at = Some(now);
                line
            }
        };

        line.map(|l| normalize(&l)).into_iter().collect()
    }

    /// Flips Normal -> Median when the tally looks numeric. Never flips back.
    fn maybe_switch(&mut self, histogram: &Histogram) -> bool {
        if self.mode == DisplayMode::Normal && should_switch_mode(histogram, self.median_threshold) {
            info!("Switching to median mode");
            self.mode = DisplayMode::Median;
            return true;
        }
        false
    }

    fn render(&self, prefix: &str, histogram: &Histogram) -> Option<String> {
        match format_result(histogram, self.mode) {
            Ok(result) => Some(format!("{} {}", prefix, result)),
            Err(e) => {
                warn!("Skipping '{}' line: {}", prefix, e);
                None
            }
        }
    }
}

/// Trims and collapses whitespace runs to single spaces.
pub fn normalize(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
