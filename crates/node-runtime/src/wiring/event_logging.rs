//! Structured log line per committed governance event.

use bg_governance::GovernanceEvent;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Consume `events` until the bus closes or `shutdown` flips to `true`.
///
/// Returns the number of events logged.
pub fn spawn_event_logger(
    mut events: broadcast::Receiver<GovernanceEvent>,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<u64> {
    tokio::spawn(async move {
        let mut logged = 0u64;
        loop {
            tokio::select! {
                received = events.recv() => match received {
                    Ok(event) => {
                        log_event(&event);
                        logged += 1;
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Event logger lagged behind the bus");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
                _ = shutdown.changed() => {
                    info!("[events] Shutdown signal received");
                    break;
                }
            }
        }
        logged
    })
}

fn log_event(event: &GovernanceEvent) {
    match serde_json::to_string(event) {
        Ok(payload) => info!(event = event.name(), %payload, "Governance event"),
        Err(e) => warn!(event = event.name(), error = %e, "Governance event not serializable"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bg_governance::{BroadcastEventBus, GovernanceEventSink, ProgramName, WalletAddress};
    use chrono::Utc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_logger_counts_events_and_stops_on_shutdown() {
        let bus = BroadcastEventBus::new(16);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = spawn_event_logger(bus.subscribe(), shutdown_rx);

        for reviewer in ["0xa", "0xb"] {
            bus.publish(GovernanceEvent::ReviewerAdded {
                program: ProgramName::parse("Acme").unwrap(),
                address: WalletAddress::parse(reviewer).unwrap(),
                reset_submissions: 0,
                at: Utc::now(),
            })
            .unwrap();
        }

        // Let the logger drain before signalling.
        tokio::time::sleep(Duration::from_millis(50)).await;
        shutdown_tx.send(true).unwrap();

        let logged = tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(logged, 2);
    }
}
