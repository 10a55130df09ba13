//! CLI type definitions
//!
//! This module contains clap command structures that define the CLI interface.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use super::commands::config::ConfigArgs;
use super::commands::serve::ServeArgs;

#[derive(Parser, Debug)]
#[command(name = "deferred-action")]
#[command(about = "Deferred Action - delayed effect scheduling engine", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Load configuration from this file instead of .deferred-action/
    #[arg(short, long, global = true, env = "DEFERRED_ACTION_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the engine, reading JSON-lines requests from stdin
    Serve(ServeArgs),

    /// Inspect the effective configuration
    Config(ConfigArgs),
}
