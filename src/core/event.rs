//! Lifecycle events from the hosting shell.

/// Both variants trigger the same stop-all procedure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellEvent {
    /// The application is about to quit (Ctrl+C, SIGTERM).
    BeforeQuit,
    /// The last window closed (host pipe reached end-of-input).
    WindowAllClosed,
}

impl ShellEvent {
    pub fn label(self) -> &'static str {
        match self {
            Self::BeforeQuit => "before-quit",
            Self::WindowAllClosed => "window-all-closed",
        }
    }
}
