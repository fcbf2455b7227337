use std::time::Duration;

use tokio::time::Instant;

/// Idle sleep when nothing is pending.
const IDLE: Duration = Duration::from_secs(86400);

/// Pure debouncer: keeps only the latest item and fires once the window has
/// passed without a newer one.
///
/// Every `push` restarts the window (true debounce, not throttling).
pub(super) struct Debouncer<T> {
    window: Duration,
    pub(super) pending: Option<T>,
    pub(super) last_event: Option<Instant>,
    /// Items collapsed into the pending one
    pub(super) burst: usize,
}

impl<T> Debouncer<T> {
    pub(super) fn new(window: Duration) -> Self {
        Self {
            window,
            pending: None,
            last_event: None,
            burst: 0,
        }
    }

    /// Replace the pending item and restart the window.
    pub(super) fn push(&mut self, item: T) {
        self.pending = Some(item);
        self.last_event = Some(Instant::now());
        self.burst += 1;
    }

    pub(super) fn is_ready(&self) -> bool {
        let Some(last_event) = self.last_event else {
            return false;
        };
        last_event.elapsed() >= self.window && self.pending.is_some()
    }

    /// Take the pending item if the window has elapsed.
    ///
    /// Returns the item and how many pushes it stands for.
    pub(super) fn take_if_ready(&mut self) -> Option<(T, usize)> {
        if !self.is_ready() {
            return None;
        }

        self.last_event = None;
        let burst = std::mem::take(&mut self.burst);
        self.pending.take().map(|item| (item, burst))
    }

    /// Precise sleep duration until next possible ready time.
    pub(super) fn sleep_duration(&self) -> Duration {
        let Some(last_event) = self.last_event else {
            return IDLE;
        };

        self.window
            .saturating_sub(last_event.elapsed())
            .max(Duration::from_millis(1))
    }
}
