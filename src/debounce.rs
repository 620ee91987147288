use std::{future::Future, time::Duration};

use tokio::{task::AbortHandle, time::sleep};

pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_millis(300);

/// Runs a task once `quiet_period` has passed without another [`Debouncer::schedule`].
///
/// Cancelling only stops the timer. A task that already started keeps running.
pub struct Debouncer {
    quiet_period: Duration,
    pending: Option<AbortHandle>,
}

impl Debouncer {
    pub fn new(quiet_period: Duration) -> Self {
        Self {
            quiet_period,
            pending: None,
        }
    }

    pub fn schedule<F>(&mut self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.cancel();

        let quiet_period = self.quiet_period;
        let timer = tokio::spawn(async move {
            sleep(quiet_period).await;
            tokio::spawn(task);
        });

        self.pending = Some(timer.abort_handle());
    }

    pub fn cancel(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.abort();
        }
    }
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(DEFAULT_QUIET_PERIOD)
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}
