//! One-shot delay timers.
//!
//! Each deferred task owns exactly one timer: a Tokio task that sleeps for the
//! requested delay and then runs its fire callback. Disarming aborts the Tokio
//! task; disarming a timer that already fired is a no-op.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Stand-in deadline for delays too large to represent.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// Handle to an armed one-shot timer.
#[derive(Debug)]
pub struct TimerHandle {
    handle: JoinHandle<()>,
}

impl TimerHandle {
    /// Arm a timer that calls `on_fire` once `delay` has elapsed.
    ///
    /// The deadline is fixed at the time of this call, not when the runtime
    /// first polls the timer task. A zero delay fires on the next scheduler
    /// tick. Must be called from within a Tokio runtime.
    pub fn arm<F>(delay: Duration, on_fire: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        let now = Instant::now();
        let deadline = now
            .checked_add(delay)
            .unwrap_or_else(|| now + FAR_FUTURE);
        let handle = tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            on_fire();
        });
        Self { handle }
    }

    /// Cancel the timer. Has no effect if it already fired.
    pub fn disarm(self) {
        self.handle.abort();
    }

    #[cfg(test)]
    fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}
