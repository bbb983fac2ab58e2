//! Interval scheduler
//!
//! The first tick fires immediately. Ticks missed while a run is in progress
//! are skipped, never bursted. A shutdown abandons the run in flight; the
//! write is its last call, so nothing is left half-applied.

use crate::runner::{Runner, Trigger};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::IntervalStream;
use tracing::info;

/// Run the job every `every` until `shutdown` flips or its sender is dropped
pub async fn run(runner: Arc<Runner>, every: Duration, mut shutdown: watch::Receiver<bool>) {
    let mut interval = tokio::time::interval(every);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut ticks = IntervalStream::new(interval);

    info!("Scheduler started (every {:?})", every);

    loop {
        tokio::select! {
            Some(_) = ticks.next() => {
                tokio::select! {
                    _ = runner.run(Trigger::Scheduled) => {}

                    _ = shutdown.changed() => {
                        info!("Shutdown signal received, abandoning the scheduled run");
                        break;
                    }
                }
            }

            _ = shutdown.changed() => {
                info!("Shutdown signal received, scheduler stopping");
                break;
            }
        }
    }
}
