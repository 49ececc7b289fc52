//! CLI subcommand implementations.

pub mod config;
pub mod serve;
pub mod stats;
pub mod suggest;
