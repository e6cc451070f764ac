//! CLI for the log ingestor binary.

pub mod commands;
pub mod runner;

pub use commands::{Cli, Command};
