//! Logging utilities with colored output.
//!
//! This module provides:
//! - `log!` macro for formatted terminal output with colored prefixes
//! - `debug!` macro gated behind `--verbose`
//! - `feature_line` for tagging captured feature program output
//!
//! # Example
//!
//! ```ignore
//! log!("supervisor"; "starting {} feature(s)", count);
//! debug!("watch"; "raw notify: {:?}", event.kind);
//! ```

use owo_colors::{OwoColorize, Stream, Style};
use parking_lot::{Mutex, const_mutex};
use std::{
    io::{Write, stdout},
    sync::atomic::{AtomicBool, Ordering},
};

/// Global verbose flag (set by --verbose CLI argument)
static VERBOSE: AtomicBool = AtomicBool::new(false);

/// Serializes writers so lines from concurrent feature streams never interleave.
static OUTPUT: Mutex<()> = const_mutex(());

/// Set verbose mode globally
pub fn set_verbose(v: bool) {
    VERBOSE.store(v, Ordering::SeqCst);
}

/// Check if verbose mode is enabled
pub fn is_verbose() -> bool {
    VERBOSE.load(Ordering::SeqCst)
}

// ============================================================================
// Log Macro
// ============================================================================

/// Log a message with a colored module prefix
///
/// # Usage
/// ```ignore
/// log!("module"; "message with {} formatting", args);
/// ```
#[macro_export]
macro_rules! log {
    ($module:expr; $($arg:tt)*) => {{
        $crate::logger::log($module, &format!($($arg)*))
    }};
}

/// Log a debug message (only shown when --verbose is enabled)
///
/// # Usage
/// ```ignore
/// debug!("module"; "debug info: {}", value);
/// ```
#[macro_export]
macro_rules! debug {
    ($module:expr; $($arg:tt)*) => {{
        if $crate::logger::is_verbose() {
            $crate::logger::log($module, &format!($($arg)*))
        }
    }};
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Log a message with a colored module prefix
#[inline]
pub fn log(module: &str, message: &str) {
    let module_lower = module.to_ascii_lowercase();
    let prefix = colorize_prefix(module, &module_lower);
    write_line(&prefix, message);
}

/// Log one line of captured feature output.
///
/// `stderr` lines are tagged in the error color so crashes stand out.
pub fn feature_line(feature: &str, line: &str, stderr: bool) {
    let style = if stderr {
        Style::new().bright_red()
    } else {
        Style::new().bright_magenta()
    };
    write_line(&paint(&format!("[{feature}]"), style), line);
}

/// Style `text` for stdout, honoring `--color` and TTY detection.
fn paint(text: &str, style: Style) -> String {
    text.if_supports_color(Stream::Stdout, |t| t.style(style))
        .to_string()
}

fn write_line(prefix: &str, message: &str) {
    let _guard = OUTPUT.lock();
    let mut stdout = stdout().lock();
    writeln!(stdout, "{prefix} {message}").ok();
    stdout.flush().ok();
}

/// Apply color to a module prefix based on module type
#[inline]
fn colorize_prefix(module: &str, module_lower: &str) -> String {
    let style = match module_lower {
        "supervisor" | "shutdown" => Style::new().bright_blue(),
        "watch" | "settings" => Style::new().bright_green(),
        "error" => Style::new().bright_red(),
        "warning" => Style::new().bright_yellow(),
        _ => Style::new().bright_cyan(),
    };
    paint(&format!("[{module}]"), style.bold())
}
