//! Eyeward - keeps background wellbeing features in step with a settings file.

mod actor;
mod cli;
mod config;
mod core;
mod feature;
mod logger;
mod process;
mod settings;
mod utils;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};
use config::AppConfig;

fn main() -> Result<()> {
    // Setup global Ctrl+C handler (before any blocking operations)
    core::setup_shutdown_handler()?;

    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }
    logger::set_verbose(cli.verbose);

    let config = AppConfig::load(&cli)?;

    match cli.command() {
        Commands::Run { host_pipe } => cli::run::run_supervisor(config, host_pipe),
        Commands::Init => cli::init::init_settings(&config),
        Commands::Features => cli::features::list_features(&config),
        Commands::Enable { feature } => cli::features::set_feature(&config, &feature, true),
        Commands::Disable { feature } => cli::features::set_feature(&config, &feature, false),
    }
}
