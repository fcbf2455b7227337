//! Core types shared across the supervisor: shell events and shutdown state.

mod event;
mod state;

pub use event::ShellEvent;
pub use state::{ShutdownLatch, is_shutdown, register_shell_events, setup_shutdown_handler};
