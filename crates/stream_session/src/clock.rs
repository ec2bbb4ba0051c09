use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;

use tokio::sync::Notify;
use tokio::time::Instant;
use tracing::Instrument;

const ARMED: u8 = 0;
const FIRED: u8 = 1;
const CANCELLED: u8 = 2;

/// Where a [`Deadline`] is in its one-shot lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeadlineState {
    Armed,
    Fired,
    Cancelled,
}

struct Shared {
    state: AtomicU8,
    cancelled: Notify,
}

impl Shared {
    fn transition(&self, to: u8) -> bool {
        self.state
            .compare_exchange(ARMED, to, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

/// A one-shot session clock.
///
/// The callback runs at most once, on a timer task, and only if the deadline
/// was still armed when the timer elapsed. Firing and cancelling race through
/// a single compare-and-swap, so a cancel after fire and a fire after cancel
/// are both inert.
///
/// Dropping the deadline cancels it.
pub struct Deadline {
    shared: Arc<Shared>,
}

impl Deadline {
    /// Arm a deadline that calls `on_fire` after `delay`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn arm<F>(delay: Duration, on_fire: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        let shared = Arc::new(Shared {
            state: AtomicU8::new(ARMED),
            cancelled: Notify::new(),
        });
        let fire_at = Instant::now() + delay;

        let timer = Arc::clone(&shared);
        tokio::spawn(
            async move {
                tokio::select! {
                    _ = tokio::time::sleep_until(fire_at) => {
                        if timer.transition(FIRED) {
                            on_fire();
                        }
                    }
                    _ = timer.cancelled.notified() => {}
                }
            }
            .in_current_span(),
        );

        Self { shared }
    }

    /// Cancel the deadline. Returns `true` if this call disarmed it, `false`
    /// if it had already fired or been cancelled.
    pub fn cancel(&self) -> bool {
        let disarmed = self.shared.transition(CANCELLED);
        if disarmed {
            // notify_one stores a permit, so the timer task sees it even if it
            // has not reached the select yet.
            self.shared.cancelled.notify_one();
        }
        disarmed
    }

    pub fn state(&self) -> DeadlineState {
        match self.shared.state.load(Ordering::Acquire) {
            ARMED => DeadlineState::Armed,
            FIRED => DeadlineState::Fired,
            _ => DeadlineState::Cancelled,
        }
    }
}

impl Drop for Deadline {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl fmt::Debug for Deadline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deadline")
            .field("state", &self.state())
            .finish()
    }
}
