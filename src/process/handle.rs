//! One live feature process.
//!
//! Each handle pairs with a monitor task that owns the `Child`:
//!
//! ```text
//! ProcessHandle ──StopSignal──▶ monitor task ──wait()──▶ exited (watch) + ExitNotice
//! ```
//!
//! Signals are delivered by the monitor, which owns the `Child`, and only
//! while the child is unreaped, so a recycled pid is never signalled.
//! Dropping the handle closes the signal channel, which makes the monitor
//! kill the child. A handle can therefore never leak its process.

use std::fmt;
use std::time::Duration;

use tokio::process::Child;
use tokio::sync::{mpsc, watch};

use super::{ExitNotice, ExitSender, output};
use crate::{debug, log};

/// How long to wait for the OS to reap a force-killed process.
const KILL_WAIT: Duration = Duration::from_secs(1);

// ============================================================================
// Lifecycle
// ============================================================================

/// Lifecycle of a feature process.
///
/// ```text
/// Starting ──▶ Running ──▶ Stopping ──▶ Exited
///     │           │                       ▲
///     └───────────┴───────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    Starting,
    Running,
    Stopping,
    Exited,
}

impl ProcessState {
    pub fn can_transition_to(self, next: Self) -> bool {
        use ProcessState::*;
        matches!(
            (self, next),
            (Starting, Running)
                | (Starting, Exited)
                | (Running, Stopping)
                | (Running, Exited)
                | (Stopping, Exited)
        )
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Starting => "starting",
            Self::Running => "running",
            Self::Stopping => "stopping",
            Self::Exited => "exited",
        }
    }
}

/// How a process ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExitReport {
    pub code: Option<i32>,
    /// Terminating signal (Unix only).
    pub signal: Option<i32>,
}

impl ExitReport {
    pub fn from_status(status: std::process::ExitStatus) -> Self {
        #[cfg(unix)]
        let signal = {
            use std::os::unix::process::ExitStatusExt;
            status.signal()
        };
        #[cfg(not(unix))]
        let signal = None;

        Self {
            code: status.code(),
            signal,
        }
    }

    /// The exit happened but its status could not be collected.
    pub fn unknown() -> Self {
        Self {
            code: None,
            signal: None,
        }
    }

}

impl fmt::Display for ExitReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.code, self.signal) {
            (Some(code), _) => write!(f, "exit code {code}"),
            (None, Some(signal)) => write!(f, "signal {signal}"),
            (None, None) => f.write_str("unknown status"),
        }
    }
}

/// Result of [`ProcessHandle::terminate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StopOutcome {
    /// `None` if the exit could not be confirmed even after killing.
    pub report: Option<ExitReport>,
    /// The graceful request timed out and the process was force killed.
    pub forced: bool,
}

// ============================================================================
// Handle
// ============================================================================

/// Requests from a handle to its monitor task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StopSignal {
    /// SIGTERM on Unix; a kill elsewhere.
    Terminate,
    Kill,
}

pub struct ProcessHandle {
    feature: &'static str,
    generation: u64,
    pid: Option<u32>,
    state: ProcessState,
    exited: watch::Receiver<Option<ExitReport>>,
    signals: Option<mpsc::UnboundedSender<StopSignal>>,
}

impl ProcessHandle {
    /// Take ownership of a freshly spawned child.
    ///
    /// Starts the output forwarders and the monitor task, then marks the
    /// handle running.
    pub fn spawn(
        feature: &'static str,
        generation: u64,
        mut child: Child,
        exit_tx: ExitSender,
    ) -> Self {
        let pid = child.id();

        if let Some(stdout) = child.stdout.take() {
            output::forward(feature, stdout, false);
        }
        if let Some(stderr) = child.stderr.take() {
            output::forward(feature, stderr, true);
        }

        let (exited_tx, exited) = watch::channel(None);
        let (signals, mut signal_rx) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            let status = loop {
                tokio::select! {
                    status = child.wait() => break status,
                    signal = signal_rx.recv() => match signal {
                        #[cfg(unix)]
                        Some(StopSignal::Terminate) => {
                            if let Err(e) = send_sigterm(&mut child) {
                                debug!("stop"; "SIGTERM to {} failed: {}", feature, e);
                            }
                        }
                        // Kill request, or the handle was dropped
                        _ => {
                            if let Err(e) = child.start_kill() {
                                debug!("stop"; "kill {} failed: {}", feature, e);
                            }
                            break child.wait().await;
                        }
                    },
                }
            };

            let report = match status {
                Ok(status) => ExitReport::from_status(status),
                Err(e) => {
                    log!("error"; "waiting for {} failed: {}", feature, e);
                    ExitReport::unknown()
                }
            };

            let _ = exited_tx.send(Some(report.clone()));
            let _ = exit_tx.send(ExitNotice {
                feature,
                generation,
                report,
            });
        });

        let mut handle = Self {
            feature,
            generation,
            pid,
            state: ProcessState::Starting,
            exited,
            signals: Some(signals),
        };
        handle.transition(ProcessState::Running);
        handle
    }

    /// Handle with no process behind it, already exited.
    #[cfg(test)]
    pub(crate) fn detached(feature: &'static str, generation: u64) -> Self {
        let (_, exited) = watch::channel(Some(ExitReport::unknown()));
        Self {
            feature,
            generation,
            pid: None,
            state: ProcessState::Running,
            exited,
            signals: None,
        }
    }

    pub fn feature(&self) -> &'static str {
        self.feature
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    #[cfg(test)]
    pub fn state(&self) -> ProcessState {
        self.state
    }

    /// The monitor has observed the exit.
    pub fn has_exited(&self) -> bool {
        self.exited.borrow().is_some()
    }

    pub fn exit_report(&self) -> Option<ExitReport> {
        self.exited.borrow().clone()
    }

    /// Subscribe to the exit report (`None` until the process exits).
    #[cfg(test)]
    pub fn exit_watch(&self) -> watch::Receiver<Option<ExitReport>> {
        self.exited.clone()
    }

    fn transition(&mut self, next: ProcessState) -> bool {
        if self.state == next {
            return true;
        }
        if !self.state.can_transition_to(next) {
            debug!("stop"; "{}: ignoring {} -> {}", self.feature, self.state.label(), next.label());
            return false;
        }
        self.state = next;
        true
    }

    /// Ask the process to terminate gracefully. Returns immediately.
    ///
    /// On Unix this sends SIGTERM; elsewhere there is no graceful signal and
    /// the process is killed.
    pub fn request_stop(&mut self) {
        if self.has_exited() {
            self.transition(ProcessState::Exited);
            return;
        }
        if !self.transition(ProcessState::Stopping) {
            return;
        }
        if let Some(tx) = &self.signals {
            let _ = tx.send(StopSignal::Terminate);
        }
    }

    /// Kill the process without waiting for it.
    pub fn force_kill(&mut self) {
        if let Some(tx) = self.signals.take() {
            let _ = tx.send(StopSignal::Kill);
        }
    }

    /// Wait up to `timeout` for the exit to be observed.
    pub async fn wait_exit(&mut self, timeout: Duration) -> Option<ExitReport> {
        let mut exited = self.exited.clone();
        let report = match tokio::time::timeout(timeout, exited.wait_for(Option::is_some)).await {
            Ok(Ok(report)) => (*report).clone(),
            // Monitor gone without a report, or still running
            Ok(Err(_)) | Err(_) => None,
        };

        if report.is_some() {
            self.transition(ProcessState::Exited);
        }
        report
    }

    /// Graceful stop with a bounded wait, then force kill.
    pub async fn terminate(mut self, timeout: Duration) -> StopOutcome {
        if let Some(report) = self.exit_report() {
            self.transition(ProcessState::Exited);
            return StopOutcome {
                report: Some(report),
                forced: false,
            };
        }

        self.request_stop();
        if let Some(report) = self.wait_exit(timeout).await {
            return StopOutcome {
                report: Some(report),
                forced: false,
            };
        }

        log!("stop"; "{} did not exit within {}ms, killing", self.feature, timeout.as_millis());
        self.force_kill();
        StopOutcome {
            report: self.wait_exit(KILL_WAIT).await,
            forced: true,
        }
    }
}

impl fmt::Debug for ProcessHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessHandle")
            .field("feature", &self.feature)
            .field("generation", &self.generation)
            .field("pid", &self.pid)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

/// SIGTERM `child` unless it has already been reaped.
///
/// Returns whether a signal was sent. An unreaped child keeps its pid, so the
/// signal cannot reach an unrelated process.
#[cfg(unix)]
fn send_sigterm(child: &mut Child) -> std::io::Result<bool> {
    if child.try_wait()?.is_some() {
        return Ok(false);
    }
    let Some(pid) = child.id() else {
        return Ok(false);
    };
    let pid = libc::pid_t::try_from(pid)
        .map_err(|_| std::io::Error::new(std::io::ErrorKind::InvalidInput, "pid out of range"))?;
    // SAFETY: kill(2) takes plain integers and has no memory preconditions.
    let rc = unsafe { libc::kill(pid, libc::SIGTERM) };
    if rc == 0 {
        Ok(true)
    } else {
        Err(std::io::Error::last_os_error())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_transitions() {
        use ProcessState::*;
        assert!(Starting.can_transition_to(Running));
        assert!(Starting.can_transition_to(Exited));
        assert!(Running.can_transition_to(Stopping));
        assert!(Running.can_transition_to(Exited));
        assert!(Stopping.can_transition_to(Exited));

        assert!(!Exited.can_transition_to(Running));
        assert!(!Stopping.can_transition_to(Running));
        assert!(!Starting.can_transition_to(Stopping));
    }

    #[test]
    fn test_exit_report_display() {
        let code = ExitReport {
            code: Some(3),
            signal: None,
        };
        assert_eq!(code.to_string(), "exit code 3");

        let signal = ExitReport {
            code: None,
            signal: Some(15),
        };
        assert_eq!(signal.to_string(), "signal 15");
        assert_eq!(ExitReport::unknown().to_string(), "unknown status");
    }

    #[tokio::test]
    async fn test_detached_handle_terminates_immediately() {
        let handle = ProcessHandle::detached("night_limit", 7);
        assert!(handle.has_exited());
        assert_eq!(handle.generation(), 7);

        let outcome = handle.terminate(Duration::from_millis(10)).await;
        assert!(!outcome.forced);
        assert_eq!(outcome.report, Some(ExitReport::unknown()));
    }

    #[cfg(unix)]
    mod unix {
        use super::*;
        use std::process::Stdio;
        use tokio::process::Command;
        use tokio::sync::mpsc;

        fn sh(script: &str) -> Child {
            Command::new("sh")
                .args(["-c", script])
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .kill_on_drop(true)
                .spawn()
                .unwrap()
        }

        #[tokio::test]
        async fn test_sigterm_stops_cooperative_process() {
            let (exit_tx, mut exit_rx) = mpsc::unbounded_channel();
            let handle = ProcessHandle::spawn("break_reminders", 1, sh("exec sleep 30"), exit_tx);
            assert_eq!(handle.state(), ProcessState::Running);
            assert!(handle.pid().is_some());

            let outcome = handle.terminate(Duration::from_secs(5)).await;
            assert!(!outcome.forced);
            assert_eq!(outcome.report.unwrap().signal, Some(libc::SIGTERM));

            let notice = exit_rx.recv().await.unwrap();
            assert_eq!(notice.feature, "break_reminders");
            assert_eq!(notice.generation, 1);
        }

        #[tokio::test]
        async fn test_ignored_sigterm_escalates_to_kill() {
            let (exit_tx, _exit_rx) = mpsc::unbounded_channel();
            let handle =
                ProcessHandle::spawn("night_limit", 1, sh("trap '' TERM; exec sleep 30"), exit_tx);
            // Let the shell install the trap before signalling
            tokio::time::sleep(Duration::from_millis(300)).await;

            let outcome = handle.terminate(Duration::from_millis(200)).await;
            assert!(outcome.forced);
            assert_eq!(outcome.report.unwrap().signal, Some(libc::SIGKILL));
        }

        #[tokio::test]
        async fn test_unsolicited_exit_is_reported() {
            let (exit_tx, mut exit_rx) = mpsc::unbounded_channel();
            let mut handle = ProcessHandle::spawn("daily_limit", 4, sh("exit 3"), exit_tx);

            let notice = exit_rx.recv().await.unwrap();
            assert_eq!(notice.generation, 4);
            assert_eq!(notice.report.code, Some(3));

            assert_eq!(handle.wait_exit(Duration::from_secs(1)).await.unwrap().code, Some(3));
            assert_eq!(handle.state(), ProcessState::Exited);
        }

        #[tokio::test]
        async fn test_sigterm_skips_reaped_child() {
            let mut child = sh("exit 5");
            assert_eq!(child.wait().await.unwrap().code(), Some(5));
            assert!(!send_sigterm(&mut child).unwrap());

            let mut child = sh("exec sleep 30");
            assert!(send_sigterm(&mut child).unwrap());
            let status = child.wait().await.unwrap();
            assert_eq!(
                std::os::unix::process::ExitStatusExt::signal(&status),
                Some(libc::SIGTERM)
            );
        }

        #[tokio::test]
        async fn test_stop_request_after_exit_is_harmless() {
            let (exit_tx, mut exit_rx) = mpsc::unbounded_channel();
            let mut handle = ProcessHandle::spawn("night_limit", 3, sh("exit 0"), exit_tx);
            exit_rx.recv().await.unwrap();

            handle.request_stop();
            assert_eq!(handle.state(), ProcessState::Exited);
            let outcome = handle.terminate(Duration::from_millis(100)).await;
            assert!(!outcome.forced);
            assert_eq!(outcome.report.unwrap().code, Some(0));
        }

        #[tokio::test]
        async fn test_drop_kills_process() {
            let (exit_tx, mut exit_rx) = mpsc::unbounded_channel();
            let handle = ProcessHandle::spawn("distance_check", 2, sh("exec sleep 30"), exit_tx);
            drop(handle);

            let notice = tokio::time::timeout(Duration::from_secs(5), exit_rx.recv())
                .await
                .unwrap()
                .unwrap();
            assert_eq!(notice.report.signal, Some(libc::SIGKILL));
        }
    }
}
