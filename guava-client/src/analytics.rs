//! Background analytics poller.
//!
//! Polls the four analytics endpoints on a fixed cadence and publishes
//! complete snapshots over a watch channel. A failed poll keeps the last
//! published snapshot; consumers always see the latest complete one.

use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::HttpClient;
use shared::models::AnalyticsSnapshot;

const POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Handle to the running poller.
#[derive(Debug)]
pub struct AnalyticsPoller {
    snapshot_rx: watch::Receiver<AnalyticsSnapshot>,
    refresh_tx: mpsc::Sender<()>,
    cancel: CancellationToken,
    task: tokio::task::JoinHandle<()>,
}

impl AnalyticsPoller {
    /// Start polling at the default cadence.
    pub fn spawn(http: HttpClient) -> Self {
        Self::spawn_with_interval(http, POLL_INTERVAL)
    }

    pub fn spawn_with_interval(http: HttpClient, interval: Duration) -> Self {
        let (snapshot_tx, snapshot_rx) = watch::channel(AnalyticsSnapshot::default());
        // Capacity 1: collapse bursts of manual refresh requests.
        let (refresh_tx, mut refresh_rx) = mpsc::channel::<()>(1);
        let cancel = CancellationToken::new();

        let loop_cancel = cancel.clone();
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = loop_cancel.cancelled() => break,
                    _ = ticker.tick() => {}
                    Some(()) = refresh_rx.recv() => {
                        // Manual refresh also resets the cadence.
                        ticker.reset();
                    }
                }

                match http.analytics_snapshot().await {
                    Ok(snapshot) => {
                        // A poll that raced shutdown must not publish.
                        if loop_cancel.is_cancelled() {
                            break;
                        }
                        if snapshot_tx.send(snapshot).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Analytics poll failed, keeping last snapshot");
                    }
                }
            }
            tracing::debug!("Analytics poller stopped");
        });

        Self {
            snapshot_rx,
            refresh_tx,
            cancel,
            task,
        }
    }

    /// Watch for published snapshots. The initial value is the zeroed
    /// default until the first successful poll.
    pub fn snapshots(&self) -> watch::Receiver<AnalyticsSnapshot> {
        self.snapshot_rx.clone()
    }

    /// Latest complete snapshot.
    pub fn latest(&self) -> AnalyticsSnapshot {
        *self.snapshot_rx.borrow()
    }

    /// Request an immediate poll. Collapses with any refresh already
    /// queued.
    pub fn refresh(&self) {
        let _ = self.refresh_tx.try_send(());
    }

    /// Stop the poller and wait for the loop to finish.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        if let Err(e) = self.task.await {
            tracing::warn!(error = %e, "Analytics poller task panicked");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ClientConfig;

    #[tokio::test]
    async fn shutdown_stops_the_loop() {
        let http = HttpClient::new(&ClientConfig::new("http://localhost:1"));
        let poller = AnalyticsPoller::spawn_with_interval(http, Duration::from_secs(3600));
        assert_eq!(poller.latest(), AnalyticsSnapshot::default());
        poller.shutdown().await;
    }

    #[tokio::test]
    async fn failed_polls_keep_the_default_snapshot() {
        // Unroutable backend: every poll fails, so the watch keeps its
        // initial value.
        let http = HttpClient::new(
            &ClientConfig::new("http://127.0.0.1:1").with_timeout(1),
        );
        let poller = AnalyticsPoller::spawn_with_interval(http, Duration::from_millis(10));
        let mut rx = poller.snapshots();

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!rx.has_changed().unwrap());
        assert_eq!(poller.latest().fetched_at, 0);

        poller.shutdown().await;
    }
}
