//! Deferred Action CLI entry point.

use clap::Parser;

use deferred_action::cli::{Cli, Commands};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config_path = cli.config.as_deref();

    // Logging is installed by the commands themselves, from the loaded configuration.
    let result = match cli.command {
        Commands::Serve(args) => {
            deferred_action::cli::commands::serve::execute(args, config_path, cli.json).await
        }
        Commands::Config(args) => {
            deferred_action::cli::commands::config::execute(args, config_path, cli.json).await
        }
    };

    if let Err(err) = result {
        deferred_action::cli::handle_error(err, cli.json);
    }
}
