//! Command-line interface.

pub mod commands;
pub mod output;
pub mod types;

pub use types::{Cli, Commands};

use anyhow::Result;
use std::path::Path;

use crate::domain::models::Config;
use crate::infrastructure::config::ConfigLoader;

/// Load configuration from `path` when given, otherwise from the project directory.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    path.map_or_else(ConfigLoader::load, ConfigLoader::load_from_file)
}

/// Report a command failure and exit with status 1.
pub fn handle_error(err: anyhow::Error, json_mode: bool) -> ! {
    if json_mode {
        let value = serde_json::json!({
            "success": false,
            "error": format!("{err:#}"),
        });
        eprintln!("{value}");
    } else {
        eprintln!("Error: {err:#}");
    }
    std::process::exit(1);
}
