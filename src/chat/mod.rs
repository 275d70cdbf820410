//! Chat transports. Each runs as its own task and talks to the runtime
//! through a pair of channels: inbound `ChatMessage`s, outbound lines.

pub mod console;
pub mod irc;

use thiserror::Error;

use crate::kernel::time::Timestamp;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub username: String,
    pub text: String,
    pub sent_at: Timestamp,
    pub moderator: bool,
    pub broadcaster: bool,
}

impl ChatMessage {
    pub fn new(username: &str, text: &str, sent_at: Timestamp) -> Self {
        Self {
            username: username.to_string(),
            text: text.to_string(),
            sent_at,
            moderator: false,
            broadcaster: false,
        }
    }

    pub fn as_moderator(mut self) -> Self {
        self.moderator = true;
        self
    }

    pub fn as_broadcaster(mut self) -> Self {
        self.broadcaster = true;
        self
    }
}

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("chat I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("chat connection closed by server")]
    Disconnected,
    #[error("runtime channel closed")]
    ChannelClosed,
    #[error("malformed chat line: {0}")]
    Malformed(String),
}

impl ChatError {
    /// Connection-level failures worth redialing for.
    pub fn is_transient(&self) -> bool {
        matches!(self, ChatError::Io(_) | ChatError::Disconnected)
    }
}
