//! `eyeward run`: supervise feature processes until the host shuts down.
//!
//! ```text
//! Ctrl+C / SIGTERM ──BeforeQuit──────┐
//! stdin EOF (--host-pipe) ──WindowAllClosed──┴─> Coordinator ─> ShutdownReport
//! ```

use std::io::Read;
use std::sync::Arc;

use anyhow::{Context, Result};
use crossbeam::channel::{self, Sender};

use crate::actor::Coordinator;
use crate::actor::messages::ShutdownReport;
use crate::config::AppConfig;
use crate::core::{ShellEvent, register_shell_events};
use crate::process::Launcher;
use crate::{debug, log};

/// Run the supervisor on a fresh tokio runtime, blocking until shutdown.
pub fn run_supervisor(config: AppConfig, host_pipe: bool) -> Result<()> {
    let launcher = Launcher::new(config.root(), config.settings_path(), &config.launcher);
    if which::which(launcher.program()).is_err() {
        log!("warning"; "`{}` not found in PATH, features will fail to start", launcher.program());
    }

    let (shell_tx, shell_rx) = channel::unbounded();
    register_shell_events(shell_tx.clone());
    if host_pipe {
        watch_host_pipe(shell_tx)?;
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("eyeward-rt")
        .build()
        .context("failed to start async runtime")?;

    log!("run"; "supervising features from {}", config.root().display());
    let coordinator = Coordinator::new(Arc::new(config), Arc::new(launcher), shell_rx);
    let report = runtime.block_on(coordinator.run())?;

    print_report(&report);
    Ok(())
}

/// Treat end of stdin as the host closing its last window.
fn watch_host_pipe(tx: Sender<ShellEvent>) -> Result<()> {
    std::thread::Builder::new()
        .name("eyeward-host-pipe".into())
        .spawn(move || {
            let mut stdin = std::io::stdin().lock();
            let mut buf = [0u8; 256];
            loop {
                match stdin.read(&mut buf) {
                    Ok(0) => break,
                    Ok(_) => continue,
                    Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                    Err(e) => {
                        debug!("run"; "host pipe: {}", e);
                        break;
                    }
                }
            }
            let _ = tx.send(ShellEvent::WindowAllClosed);
        })
        .context("failed to spawn host pipe thread")?;
    Ok(())
}

fn print_report(report: &ShutdownReport) {
    if !report.killed.is_empty() {
        log!("shutdown"; "force killed: {}", report.killed.join(", "));
    }
    if !report.registry_empty {
        log!("shutdown"; "some features were still registered at exit");
    }
    if !report.watch_released {
        log!("shutdown"; "settings watch was not released");
    }
    debug!("shutdown"; "{:?}", report);
}
