use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};

use super::widget::Outcome;

/// The widget's one recurring timer.
///
/// Each period it posts [`Outcome::PollTick`]; the owner of the widget state
/// starts the actual fetch. Ticks are never coalesced with fetches still in
/// flight. Stopping consumes the handle, so it happens at most once.
pub struct PollHandle {
    task: JoinHandle<()>,
}

impl PollHandle {
    /// The first tick comes one full period after the call.
    pub fn spawn(interval: Duration, tx: UnboundedSender<Outcome>) -> Self {
        let task = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + interval, interval);
            loop {
                ticker.tick().await;
                if tx.send(Outcome::PollTick).is_err() {
                    break;
                }
            }
        });
        tracing::debug!(interval_ms = interval.as_millis() as u64, "polling started");
        Self { task }
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    pub fn stop(self) {
        self.task.abort();
        tracing::debug!("polling stopped");
    }
}
