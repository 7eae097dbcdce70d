//! Periodic reconciliation driver.
//!
//! [`run_reconciler`] calls [`Homestead::reconcile`] on a fixed interval
//! until told to stop. It is a convenience only: growth, processing and
//! water are derived from timestamps, so skipped or delayed passes change
//! nothing.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

use crate::clock::Clock;
use crate::session::Homestead;
use crate::store::Store;

/// Counters from one run of the reconciler.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Passes that completed.
    pub passes: u64,
    /// Passes that failed and were retried on the next tick.
    pub failures: u64,
    /// Self-healing corrections applied across all passes.
    pub corrections: u64,
}

/// Reconcile every `interval` until `shutdown` turns `true` or its sender
/// is dropped.
///
/// A failed pass is logged and the loop keeps going.
pub async fn run_reconciler<S, C>(
    session: Arc<Homestead<S, C>>,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> RunSummary
where
    S: Store,
    C: Clock,
{
    let mut summary = RunSummary::default();
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    tracing::info!(interval_ms = interval.as_millis(), "reconciler started");
    loop {
        if *shutdown.borrow() {
            break;
        }
        tokio::select! {
            _ = ticker.tick() => {
                match session.reconcile().await {
                    Ok(report) => {
                        summary.passes = summary.passes.saturating_add(1);
                        let fixed = u64::try_from(report.corrections.len()).unwrap_or(u64::MAX);
                        summary.corrections = summary.corrections.saturating_add(fixed);
                        if report.plots_ready > 0 || report.machines_ready > 0 {
                            tracing::debug!(
                                plots_ready = report.plots_ready,
                                machines_ready = report.machines_ready,
                                "work waiting"
                            );
                        }
                    }
                    Err(err) => {
                        summary.failures = summary.failures.saturating_add(1);
                        tracing::warn!(error = %err, "reconcile pass failed");
                    }
                }
            }
            changed = shutdown.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
    }
    tracing::info!(
        passes = summary.passes,
        failures = summary.failures,
        corrections = summary.corrections,
        "reconciler stopped"
    );
    summary
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Utc};

    use super::*;
    use crate::clock::ManualClock;
    use crate::config::HomesteadConfig;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn stops_on_shutdown_signal() {
        let clock = ManualClock::new(DateTime::<Utc>::UNIX_EPOCH);
        let session = Homestead::open(MemoryStore::new(), clock, &HomesteadConfig::default()).await;
        let Ok(session) = session else {
            panic!("open failed");
        };
        let session = Arc::new(session);
        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(run_reconciler(
            Arc::clone(&session),
            Duration::from_millis(5),
            rx,
        ));
        tokio::time::sleep(Duration::from_millis(30)).await;
        let _ = tx.send(true);
        let summary = handle.await.unwrap_or_default();
        assert!(summary.passes >= 1);
        assert_eq!(summary.failures, 0);
    }

    #[tokio::test]
    async fn failed_passes_are_counted_and_survived() {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(DateTime::<Utc>::UNIX_EPOCH));
        let session = Homestead::open(
            Arc::clone(&store),
            Arc::clone(&clock),
            &HomesteadConfig::default(),
        )
        .await;
        let Ok(session) = session else {
            panic!("open failed");
        };
        // The observation instant moves, so the first pass has a write to fail.
        clock.advance(chrono::Duration::seconds(1));
        store.fail_next_writes(1).await;
        let session = Arc::new(session);
        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(run_reconciler(
            Arc::clone(&session),
            Duration::from_millis(5),
            rx,
        ));
        tokio::time::sleep(Duration::from_millis(40)).await;
        drop(tx);
        let summary = handle.await.unwrap_or_default();
        assert_eq!(summary.failures, 1);
        assert!(summary.passes >= 1);
    }
}
