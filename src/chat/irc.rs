use std::collections::HashMap;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::time::{sleep, Duration};
use tracing::{debug, info, warn};

use super::{ChatError, ChatMessage};
use crate::config::AuthConfig;
use crate::kernel::time::Timestamp;

pub const TWITCH_IRC_ADDR: &str = "irc.chat.twitch.tv:6667";

/// Pause before dialing again after a dropped connection.
pub const RECONNECT_DELAY: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IrcLine {
    Ping(String),
    Joined(String),
    Privmsg { channel: String, message: ChatMessage },
    Reconnect,
    Other,
}

/// Parses one server line: `[@tags] [:prefix] COMMAND params [:trailing]`.
/// `now` stands in when the server sent no `tmi-sent-ts`.
pub fn parse_line(line: &str, now: Timestamp) -> Result<IrcLine, ChatError> {
    let mut rest = line.trim_end_matches(['\r', '\n']);

    let mut tags = HashMap::new();
    if let Some(stripped) = rest.strip_prefix('@') {
        let (raw_tags, tail) = stripped
            .split_once(' ')
            .ok_or_else(|| ChatError::Malformed(line.to_string()))?;
        for tag in raw_tags.split(';') {
            let (key, value) = tag.split_once('=').unwrap_or((tag, ""));
            tags.insert(key, value);
        }
        rest = tail;
    }

    let mut nick = "";
    if let Some(stripped) = rest.strip_prefix(':') {
        let (prefix, tail) = stripped
            .split_once(' ')
            .ok_or_else(|| ChatError::Malformed(line.to_string()))?;
        nick = prefix.split('!').next().unwrap_or(prefix);
        rest = tail;
    }

    let (head, trailing) = match rest.split_once(" :") {
        Some((head, trailing)) => (head, Some(trailing)),
        None => (rest, None),
    };
    let mut params = head.split_whitespace();
    let command = params.next().ok_or_else(|| ChatError::Malformed(line.to_string()))?;

    match command {
        "PING" => Ok(IrcLine::Ping(trailing.or_else(|| params.next()).unwrap_or("").to_string())),
        "RECONNECT" => Ok(IrcLine::Reconnect),
        "JOIN" => {
            let channel = params.next().or(trailing).unwrap_or("");
            Ok(IrcLine::Joined(channel.trim_start_matches('#').to_string()))
        }
        "PRIVMSG" => {
            let channel = params
                .next()
                .ok_or_else(|| ChatError::Malformed(line.to_string()))?
                .trim_start_matches('#')
                .to_string();
            let text = trailing.unwrap_or("");
            if nick.is_empty() {
                return Err(ChatError::Malformed(line.to_string()));
            }

            let sent_at = tags
                .get("tmi-sent-ts")
                .and_then(|ts| ts.parse().ok())
                .map(Timestamp::from_millis)
                .unwrap_or(now);

            let mut message = ChatMessage::new(nick, text, sent_at);
            message.moderator = tags.get("mod").is_some_and(|m| *m == "1");
            message.broadcaster = tags
                .get("badges")
                .is_some_and(|badges| badges.split(',').any(|b| b == "broadcaster/1"));

            Ok(IrcLine::Privmsg { channel, message })
        }
        _ => Ok(IrcLine::Other),
    }
}

/// Registration lines sent right after connecting.
pub fn handshake(auth: &AuthConfig, channel: &str) -> Vec<String> {
    vec![
        "CAP REQ :twitch.tv/tags twitch.tv/commands".to_string(),
        format!("PASS {}", auth.oauth),
        format!("NICK {}", auth.username.to_lowercase()),
        format!("JOIN #{}", channel.to_lowercase()),
    ]
}

pub fn privmsg(channel: &str, text: &str) -> String {
    format!("PRIVMSG #{} :{}", channel.to_lowercase(), text)
}

/// Keeps a connection to `channel` alive until the runtime hangs up.
/// Server `RECONNECT`s and dropped sockets are redialed after
/// `RECONNECT_DELAY`; anything else ends the transport.
pub async fn run(
    auth: AuthConfig,
    channel: String,
    inbound: mpsc::Sender<ChatMessage>,
    mut outbound: mpsc::Receiver<String>,
) -> Result<(), ChatError> {
    loop {
        match session(&auth, &channel, &inbound, &mut outbound).await {
            Ok(()) => return Ok(()),
            Err(e) if e.is_transient() => {
                warn!("{}; reconnecting in {}s", e, RECONNECT_DELAY.as_secs());
                tokio::select! {
                    _ = sleep(RECONNECT_DELAY) => {}
                    _ = inbound.closed() => return Ok(()),
                }
            }
            Err(e) => return Err(e),
        }
    }
}

/// One connection: handshake, then pump messages until either side hangs up.
async fn session(
    auth: &AuthConfig,
    channel: &str,
    inbound: &mpsc::Sender<ChatMessage>,
    outbound: &mut mpsc::Receiver<String>,
) -> Result<(), ChatError> {
    let stream = TcpStream::connect(TWITCH_IRC_ADDR).await?;
    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();

    for line in handshake(auth, channel) {
        writer.write_all(format!("{}\r\n", line).as_bytes()).await?;
    }
    writer.flush().await?;
    info!("Connected to {} as {}", TWITCH_IRC_ADDR, auth.username);

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    return Err(ChatError::Disconnected);
                };
                match parse_line(&line, Timestamp::now()) {
                    Ok(IrcLine::Ping(token)) => {
                        writer.write_all(format!("PONG :{}\r\n", token).as_bytes()).await?;
                    }
                    Ok(IrcLine::Joined(joined)) => info!("Joined channel: {}", joined),
                    Ok(IrcLine::Privmsg { message, .. }) => {
                        inbound.send(message).await.map_err(|_| ChatError::ChannelClosed)?;
                    }
                    Ok(IrcLine::Reconnect) => return Err(ChatError::Disconnected),
                    Ok(IrcLine::Other) => debug!("< {}", line),
                    Err(e) => warn!("{}", e),
                }
            }
            reply = outbound.recv() => {
                let Some(reply) = reply else { return Ok(()) };
                writer.write_all(format!("{}\r\n", privmsg(channel, &reply)).as_bytes()).await?;
            }
        }
    }
}
