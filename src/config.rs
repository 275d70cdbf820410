//! Configuration, layered: built-in defaults < `votebot.toml` < `BOT_*` env vars.

use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::providers::{Env, Format, Serialized, Toml};
use figment::value::{Uncased, UncasedStr};
use figment::Figment;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::kernel::session::SessionConfig;

pub const DEFAULT_CONFIG_FILE: &str = "votebot.toml";
pub const ENV_PREFIX: &str = "BOT_";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] Box<figment::Error>),

    #[error("{field} must be greater or equal {min}")]
    TooSmall { field: &'static str, min: u64 },

    #[error("{field} must be between 0 and 1")]
    OutOfRange { field: &'static str },

    #[error("{field} must not be empty")]
    Missing { field: &'static str },

    #[error("voting.end_count ({end}) must not exceed voting.start_count ({start})")]
    ThresholdOrder { start: usize, end: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    #[default]
    Irc,
    Console,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    pub transport: TransportKind,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Chat account name.
    pub username: String,
    /// `oauth:...` token.
    pub oauth: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VotingConfig {
    pub channel: String,
    /// Activity window in seconds.
    pub buffer_size: u64,
    /// Hard session ceiling in seconds.
    pub max_time: u64,
    /// Seconds between progress results.
    pub result_interval: u64,
    pub start_count: usize,
    pub end_count: usize,
    pub admin: String,
    pub allow_mods: bool,
    pub command: String,
    /// Seconds after a result during which votes are ignored.
    pub pause: u64,
    /// Seconds the bot stays activated after the init directive.
    pub lifetime: u64,
    pub median_threshold: f64,
}

impl Default for VotingConfig {
    fn default() -> Self {
        Self {
            channel: String::new(),
            buffer_size: 5,
            max_time: 60,
            result_interval: 5,
            start_count: 5,
            end_count: 2,
            admin: String::new(),
            allow_mods: true,
            command: "!vote".to_string(),
            pause: 30,
            lifetime: 3600,
            median_threshold: 0.5,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log outbound lines without sending them.
    pub debug: bool,
    pub chat: ChatConfig,
    pub auth: AuthConfig,
    pub voting: VotingConfig,
}

impl Config {
    /// Provider stack. `path` overrides the default file name.
    pub fn figment(path: Option<&Path>) -> Figment {
        let file = path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(file))
            .merge(Env::prefixed(ENV_PREFIX).map(env_key))
    }

    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::from_figment(Self::figment(path))
    }

    pub fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        let config: Config = figment.extract().map_err(Box::new)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let v = &self.voting;

        at_least("voting.buffer_size", v.buffer_size, 1)?;
        at_least("voting.max_time", v.max_time, 10)?;
        at_least("voting.result_interval", v.result_interval, 1)?;
        at_least("voting.start_count", v.start_count as u64, 1)?;
        at_least("voting.end_count", v.end_count as u64, 1)?;

        if !(0.0..=1.0).contains(&v.median_threshold) {
            return Err(ConfigError::OutOfRange { field: "voting.median_threshold" });
        }
        if v.end_count > v.start_count {
            return Err(ConfigError::ThresholdOrder {
                start: v.start_count,
                end: v.end_count,
            });
        }

        not_empty("voting.channel", &v.channel)?;
        not_empty("voting.admin", &v.admin)?;
        not_empty("voting.command", &v.command)?;

        if self.chat.transport == TransportKind::Irc {
            not_empty("auth.username", &self.auth.username)?;
            not_empty("auth.oauth", &self.auth.oauth)?;
        }

        Ok(())
    }

    pub fn session(&self) -> SessionConfig {
        SessionConfig {
            window: Duration::from_secs(self.voting.buffer_size),
            start_threshold: self.voting.start_count,
            end_threshold: self.voting.end_count,
            max_duration: Duration::from_secs(self.voting.max_time),
            result_interval: Duration::from_secs(self.voting.result_interval),
        }
    }

    pub fn median_threshold(&self) -> f64 {
        self.voting.median_threshold
    }

    pub fn pause(&self) -> Duration {
        Duration::from_secs(self.voting.pause)
    }

    pub fn lifetime(&self) -> Duration {
        Duration::from_secs(self.voting.lifetime)
    }
}

fn at_least(field: &'static str, value: u64, min: u64) -> Result<(), ConfigError> {
    if value < min {
        return Err(ConfigError::TooSmall { field, min });
    }
    Ok(())
}

fn not_empty(field: &'static str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Missing { field });
    }
    Ok(())
}

/// `BOT_VOTING_BUFFER_SIZE` -> `voting.buffer_size`; only the first
/// underscore after a section name becomes a dot.
fn env_key(key: &UncasedStr) -> Uncased<'_> {
    let lower = key.as_str().to_ascii_lowercase();
    for section in ["auth", "chat", "voting"] {
        if let Some(rest) = lower.strip_prefix(section).and_then(|r| r.strip_prefix('_')) {
            return format!("{}.{}", section, rest).into();
        }
    }
    lower.into()
}
