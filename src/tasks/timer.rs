//! Timer Tasks
//!
//! One-shot and periodic background tasks backing entry expiration and
//! auto-refresh, each owned through a cancellable [`TimerHandle`].

use std::ops::ControlFlow;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::trace;

/// Longest delay a timer is armed with; longer durations are clamped to it.
/// Matches the horizon tokio uses for its own far-future deadlines.
pub const MAX_DELAY: Duration = Duration::from_secs(86_400 * 365 * 30);

/// Returns the instant `delay` from now, clamped to [`MAX_DELAY`].
pub fn deadline_after(delay: Duration) -> Instant {
    Instant::now() + delay.min(MAX_DELAY)
}

// == Timer Handle ==
/// Owning handle to a scheduled timer task.
///
/// Cancelling is idempotent: it is a no-op on a timer that already fired or
/// was already cancelled. Dropping the handle cancels the timer.
#[derive(Debug)]
pub struct TimerHandle {
    task: Option<JoinHandle<()>>,
}

impl TimerHandle {
    fn new(task: JoinHandle<()>) -> Self {
        Self { task: Some(task) }
    }

    /// Stops the timer if it is still pending.
    pub fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    /// Releases the handle without cancelling the task.
    ///
    /// Used by a timer task that is removing the entry holding its own handle.
    pub fn detach(mut self) {
        self.task.take();
    }

    /// Returns true while the task has neither finished nor been cancelled.
    pub fn is_active(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

// == Spawn Once ==
/// Runs `fire` once at `deadline` on the given runtime.
///
/// The deadline is fixed by the caller so the schedule does not depend on when
/// the task is first polled.
pub fn spawn_once<F>(runtime: &Handle, deadline: Instant, fire: F) -> TimerHandle
where
    F: FnOnce() + Send + 'static,
{
    TimerHandle::new(runtime.spawn(async move {
        tokio::time::sleep_until(deadline).await;
        fire();
    }))
}

// == Spawn Periodic ==
/// Runs `tick` every `period`, starting at `start`, until it returns
/// `ControlFlow::Break` or the handle is cancelled.
///
/// `period` must be non-zero; periods above [`MAX_DELAY`] are clamped.
pub fn spawn_periodic<F>(runtime: &Handle, start: Instant, period: Duration, mut tick: F) -> TimerHandle
where
    F: FnMut() -> ControlFlow<()> + Send + 'static,
{
    let period = period.min(MAX_DELAY);
    TimerHandle::new(runtime.spawn(async move {
        let mut interval = tokio::time::interval_at(start, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Burst);

        loop {
            interval.tick().await;
            if tick().is_break() {
                trace!("Periodic timer stopped by its task");
                break;
            }
        }
    }))
}
