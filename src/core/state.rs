//! Process-wide shutdown state.
//!
//! - `SHUTDOWN`: has shutdown been requested? (Ctrl+C / SIGTERM received)
//! - `SHELL_TX`: where the signal handler delivers [`ShellEvent::BeforeQuit`]
//!
//! [`ShutdownLatch`] makes the stop-all procedure run once no matter how many
//! shell events ask for it.

use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};

use crossbeam::channel::Sender;

use super::ShellEvent;

/// Shutdown has been requested (Ctrl+C received)
static SHUTDOWN: AtomicBool = AtomicBool::new(false);

/// Shell event sender for the running supervisor
static SHELL_TX: OnceLock<Sender<ShellEvent>> = OnceLock::new();

// =============================================================================
// SHUTDOWN state
// =============================================================================

/// Setup the global Ctrl+C / SIGTERM handler. Call once at program start
///
/// - Before `register_shell_events()`: exit immediately, nothing to clean up
/// - After: deliver `BeforeQuit` so running features are stopped first
pub fn setup_shutdown_handler() -> anyhow::Result<()> {
    ctrlc::set_handler(|| {
        SHUTDOWN.store(true, Ordering::SeqCst);

        if let Some(tx) = SHELL_TX.get() {
            let _ = tx.send(ShellEvent::BeforeQuit);
        } else {
            std::process::exit(0);
        }
    })
    .map_err(|e| anyhow::anyhow!("failed to set Ctrl+C handler: {}", e))
}

/// Route signal-driven shell events to the running supervisor
pub fn register_shell_events(tx: Sender<ShellEvent>) {
    let _ = SHELL_TX.set(tx);
}

/// Check if shutdown has been requested
pub fn is_shutdown() -> bool {
    SHUTDOWN.load(Ordering::Relaxed)
}

// =============================================================================
// ShutdownLatch
// =============================================================================

/// One-shot gate for the stop-all procedure.
#[derive(Debug, Default)]
pub struct ShutdownLatch(AtomicBool);

impl ShutdownLatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// `true` for exactly one caller; every later call gets `false`.
    pub fn try_begin(&self) -> bool {
        !self.0.swap(true, Ordering::AcqRel)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_latch_fires_once() {
        let latch = ShutdownLatch::new();
        assert!(latch.try_begin());
        assert!(!latch.try_begin());
        assert!(!latch.try_begin());
    }

    #[test]
    fn test_latch_across_threads() {
        let latch = Arc::new(ShutdownLatch::new());
        let winners: usize = (0..8)
            .map(|_| {
                let latch = Arc::clone(&latch);
                std::thread::spawn(move || latch.try_begin())
            })
            .collect::<Vec<_>>()
            .into_iter()
            .map(|h| usize::from(h.join().unwrap()))
            .sum();
        assert_eq!(winners, 1);
    }
}
