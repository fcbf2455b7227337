//! Utility modules for the supervisor.

pub mod exec;
