//! Command-line interface module.

mod args;
pub mod features;
pub mod init;
pub mod run;

pub use args::{Cli, Commands};
