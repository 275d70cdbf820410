use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use votebot::chat::ChatMessage;
use votebot::config::{Config, TransportKind};
use votebot::kernel::time::Timestamp;
use votebot::runtime;

fn console_config() -> Config {
    let mut config = Config::default();
    config.chat.transport = TransportKind::Console;
    config.voting.channel = "somechannel".to_string();
    config.voting.admin = "boss".to_string();
    config.voting.start_count = 2;
    config.voting.end_count = 1;
    config
}

async fn next_line(outbound: &mut mpsc::Receiver<String>) -> String {
    timeout(Duration::from_secs(2), outbound.recv())
        .await
        .expect("Runtime should answer within the timeout")
        .expect("Outbound channel should stay open")
}

#[tokio::test]
async fn test_runtime_opens_session_and_kills_on_shutdown() {
    let (in_tx, in_rx) = mpsc::channel(16);
    let (out_tx, mut out_rx) = mpsc::channel(16);
    let shutdown = CancellationToken::new();

    let handle = tokio::spawn(runtime::run(console_config(), in_rx, out_tx, shutdown.clone()));

    in_tx
        .send(ChatMessage::new("boss", "!vote init", Timestamp::now()))
        .await
        .unwrap();
    let reply = next_line(&mut out_rx).await;
    assert!(reply.starts_with("@boss The vote bot is now activated"), "Got: {}", reply);

    in_tx.send(ChatMessage::new("alice", "1", Timestamp::now())).await.unwrap();
    in_tx.send(ChatMessage::new("bob", "2", Timestamp::now())).await.unwrap();

    let started = next_line(&mut out_rx).await;
    assert_eq!(started, "Vote started: ① 1 ② 1");

    shutdown.cancel();
    let snapshot = handle.await.unwrap().expect("Runtime should exit cleanly");

    assert_eq!(snapshot.sessions.opened, 1);
    assert_eq!(snapshot.sessions.killed, 1, "Shutdown kills the open session");
    assert_eq!(snapshot.closes.total(), 0);
}

#[tokio::test]
async fn test_runtime_ignores_votes_before_activation() {
    let (in_tx, in_rx) = mpsc::channel(16);
    let (out_tx, mut out_rx) = mpsc::channel(16);
    let shutdown = CancellationToken::new();

    let handle = tokio::spawn(runtime::run(console_config(), in_rx, out_tx, shutdown.clone()));

    in_tx.send(ChatMessage::new("alice", "1", Timestamp::now())).await.unwrap();
    in_tx.send(ChatMessage::new("bob", "2", Timestamp::now())).await.unwrap();

    // Closing the transport side ends the loop.
    drop(in_tx);
    let snapshot = handle.await.unwrap().expect("Runtime should exit cleanly");

    assert!(out_rx.try_recv().is_err(), "No replies while deactivated");
    assert_eq!(snapshot.sessions.opened, 0);
    assert_eq!(snapshot.sessions.killed, 0);
}

#[tokio::test]
async fn test_debug_mode_suppresses_sending() {
    let mut config = console_config();
    config.debug = true;

    let (in_tx, in_rx) = mpsc::channel(16);
    let (out_tx, mut out_rx) = mpsc::channel(16);
    let shutdown = CancellationToken::new();

    let handle = tokio::spawn(runtime::run(config, in_rx, out_tx, shutdown.clone()));

    in_tx
        .send(ChatMessage::new("boss", "!vote init", Timestamp::now()))
        .await
        .unwrap();
    drop(in_tx);
    handle.await.unwrap().expect("Runtime should exit cleanly");

    assert!(out_rx.try_recv().is_err(), "Debug mode only logs replies");
}
