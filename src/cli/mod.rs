//! CLI module - argument parsing and command dispatch

mod args;
pub mod commands;

pub use args::{Cli, Commands, CorrelationArgs, CorrelationCommand};
