//! Configuration inspection commands.

use anyhow::Result;
use clap::{Args, Subcommand};
use std::path::Path;

use crate::cli::load_config;
use crate::cli::output::{output, CommandOutput};
use crate::domain::models::Config;

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Print the merged configuration
    Show,
    /// Load and validate the configuration without printing it
    Validate,
}

#[derive(Debug, serde::Serialize)]
pub struct ConfigShowOutput {
    pub config: Config,
}

impl CommandOutput for ConfigShowOutput {
    fn to_human(&self) -> String {
        serde_yaml::to_string(&self.config).unwrap_or_else(|err| format!("<unprintable: {err}>"))
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(&self.config).unwrap_or_default()
    }
}

#[derive(Debug, serde::Serialize)]
pub struct ConfigValidateOutput {
    pub valid: bool,
    pub message: String,
}

impl CommandOutput for ConfigValidateOutput {
    fn to_human(&self) -> String {
        self.message.clone()
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub async fn execute(args: ConfigArgs, config_path: Option<&Path>, json_mode: bool) -> Result<()> {
    match args.command {
        ConfigCommands::Show => {
            let config = load_config(config_path)?;
            output(&ConfigShowOutput { config }, json_mode);
        }
        ConfigCommands::Validate => {
            let out = match load_config(config_path) {
                Ok(_) => ConfigValidateOutput {
                    valid: true,
                    message: "Configuration is valid.".to_string(),
                },
                Err(err) => ConfigValidateOutput {
                    valid: false,
                    message: format!("Configuration is invalid: {err:#}"),
                },
            };
            output(&out, json_mode);
        }
    }
    Ok(())
}
