use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tracing::{info, warn};

use super::{ChatError, ChatMessage};
use crate::kernel::time::Timestamp;

/// `user: text`, where a leading `@` on the user marks a moderator.
pub fn parse_line(line: &str, now: Timestamp) -> Option<ChatMessage> {
    let (user, text) = line.split_once(':')?;
    let user = user.trim();
    let (user, moderator) = match user.strip_prefix('@') {
        Some(name) => (name, true),
        None => (user, false),
    };
    if user.is_empty() || user.contains(char::is_whitespace) {
        return None;
    }

    let mut message = ChatMessage::new(user, text.trim_start(), now);
    message.moderator = moderator;
    Some(message)
}

/// Reads stdin until EOF, writes replies to stdout.
pub async fn run(inbound: mpsc::Sender<ChatMessage>, mut outbound: mpsc::Receiver<String>) -> Result<(), ChatError> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    info!("Console chat ready. Type 'user: message' ('@user' for a moderator).");

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    info!("Console input closed");
                    return Ok(());
                };
                if line.trim().is_empty() {
                    continue;
                }
                match parse_line(&line, Timestamp::now()) {
                    Some(message) => inbound.send(message).await.map_err(|_| ChatError::ChannelClosed)?,
                    None => warn!("Ignoring console line without 'user:' prefix: '{}'", line),
                }
            }
            reply = outbound.recv() => {
                let Some(reply) = reply else { return Ok(()) };
                stdout.write_all(format!("{}\n", reply).as_bytes()).await?;
                stdout.flush().await?;
            }
        }
    }
}
