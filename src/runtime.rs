use anyhow::Result;
use tokio::sync::mpsc;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::bot::controller::Controller;
use crate::chat::ChatMessage;
use crate::config::Config;
use crate::kernel::event::{Event, SessionEvent};
use crate::kernel::reactor::Reactor;
use crate::kernel::telemetry::metrics::TelemetrySnapshot;
use crate::kernel::time::{Timestamp, TICK_MS};

/// Drives controller and kernel on one task until `shutdown` fires or the
/// transport hangs up. Returns the session telemetry gathered on the way.
pub async fn run(
    config: Config,
    mut inbound: mpsc::Receiver<ChatMessage>,
    outbound: mpsc::Sender<String>,
    shutdown: CancellationToken,
) -> Result<TelemetrySnapshot> {
    let mut reactor = Reactor::new(config.session());
    let mut controller = Controller::new(&config);
    let debug = config.debug;

    let mut cadence = interval(Duration::from_millis(TICK_MS));
    cadence.set_missed_tick_behavior(MissedTickBehavior::Skip);

    info!("Vote runtime started. Tick: {}ms", TICK_MS);

    loop {
        let mut replies = Vec::new();

        tokio::select! {
            _ = shutdown.cancelled() => {
                info!("Shutdown requested");
                break;
            }
            message = inbound.recv() => {
                let Some(message) = message else {
                    info!("Chat transport closed");
                    break;
                };
                let now = Timestamp::now();
                debug!("< {}: {}", message.username, message.text);

                let outcome = controller.handle_message(&message, now);
                replies.extend(outcome.replies);
                if let Some(event) = outcome.event {
                    // Timers already due fire before the message is applied.
                    let emitted = reactor.tick_step(vec![event], now);
                    replies.extend(relay(&mut controller, emitted, now));
                }
            }
            _ = cadence.tick() => {
                let now = Timestamp::now();
                let emitted = reactor.poll_timers(now);
                replies.extend(relay(&mut controller, emitted, now));
            }
        }

        for line in replies {
            info!("> {}", line);
            if !debug && outbound.send(line).await.is_err() {
                info!("Outbound channel closed");
                return Ok(reactor.telemetry.snapshot());
            }
        }
    }

    reactor.dispatch(Event::Kill, Timestamp::now());
    Ok(reactor.telemetry.snapshot())
}

fn relay<I>(controller: &mut Controller, events: I, now: Timestamp) -> Vec<String>
where
    I: IntoIterator<Item = SessionEvent>,
{
    events
        .into_iter()
        .flat_map(|event| controller.on_session_event(&event, now))
        .collect()
}
