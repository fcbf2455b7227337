//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

/// Eyeward feature process supervisor CLI
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Print debug output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Application root; feature programs run here (default: current directory)
    #[arg(short, long, global = true, value_hint = clap::ValueHint::DirPath)]
    pub root: Option<PathBuf>,

    /// Settings file path (relative to root)
    #[arg(short, long, global = true, value_hint = clap::ValueHint::FilePath)]
    pub settings: Option<PathBuf>,

    /// Config file path (default: eyeward.toml)
    #[arg(short = 'C', long, global = true, default_value = "eyeward.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// subcommands (default: run)
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Supervise feature processes until shutdown
    #[command(visible_alias = "r")]
    Run {
        /// Treat end of stdin as "all windows closed"
        #[arg(long)]
        host_pipe: bool,
    },

    /// Create the settings file with defaults if it is missing
    #[command(visible_alias = "i")]
    Init,

    /// List known features and whether the settings enable them
    #[command(visible_alias = "f")]
    Features,

    /// Turn a feature on in the settings file
    Enable {
        /// Feature name (see `eyeward features`)
        feature: String,
    },

    /// Turn a feature off in the settings file
    Disable {
        /// Feature name (see `eyeward features`)
        feature: String,
    },
}

impl Cli {
    /// Subcommand to run; `run` when none was given.
    pub fn command(&self) -> Commands {
        self.command
            .clone()
            .unwrap_or(Commands::Run { host_pipe: false })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_command_is_run() {
        let cli = Cli::parse_from(["eyeward"]);
        assert!(matches!(cli.command(), Commands::Run { host_pipe: false }));
    }

    #[test]
    fn test_run_with_host_pipe() {
        let cli = Cli::parse_from(["eyeward", "run", "--host-pipe", "-v"]);
        assert!(matches!(cli.command(), Commands::Run { host_pipe: true }));
        assert!(cli.verbose);
    }

    #[test]
    fn test_global_paths() {
        let cli = Cli::parse_from(["eyeward", "features", "--root", "/app", "-C", "alt.toml"]);
        assert!(matches!(cli.command(), Commands::Features));
        assert_eq!(cli.root, Some(PathBuf::from("/app")));
        assert_eq!(cli.config, PathBuf::from("alt.toml"));
        assert_eq!(cli.settings, None);
    }

    #[test]
    fn test_toggle_commands() {
        let cli = Cli::parse_from(["eyeward", "enable", "night_limit"]);
        assert!(matches!(cli.command(), Commands::Enable { feature } if feature == "night_limit"));

        let cli = Cli::parse_from(["eyeward", "disable", "daily_limit"]);
        assert!(matches!(cli.command(), Commands::Disable { feature } if feature == "daily_limit"));
    }
}
