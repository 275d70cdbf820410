use std::path::PathBuf;

use anyhow::Context;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use votebot::chat::{console, irc};
use votebot::config::{Config, TransportKind};
use votebot::runtime;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("setting default subscriber failed")?;

    let path = std::env::args().nth(1).map(PathBuf::from);
    let config = Config::load(path.as_deref()).context("invalid configuration")?;

    if config.debug {
        warn!("Debug mode enabled! Replies are logged, not sent.");
    }
    info!("Vote bot {} booting for #{}", env!("CARGO_PKG_VERSION"), config.voting.channel);

    let (inbound_tx, inbound_rx) = mpsc::channel(100);
    let (outbound_tx, outbound_rx) = mpsc::channel(100);

    let transport = match config.chat.transport {
        TransportKind::Irc => tokio::spawn(irc::run(
            config.auth.clone(),
            config.voting.channel.clone(),
            inbound_tx,
            outbound_rx,
        )),
        TransportKind::Console => tokio::spawn(console::run(inbound_tx, outbound_rx)),
    };

    let shutdown = CancellationToken::new();
    let signal = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            signal.cancel();
        }
    });

    let snapshot = runtime::run(config, inbound_rx, outbound_tx, shutdown).await?;
    info!("Session telemetry: {}", serde_json::to_string(&snapshot)?);

    match transport.await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => {
            error!("Chat transport failed: {}", e);
            Err(e.into())
        }
        Err(e) => Err::<(), _>(e).context("chat transport task panicked"),
    }
}
