//! CLI module for paperboy - launch flags for the dashboard.

pub mod commands;

pub use commands::Cli;
