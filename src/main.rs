// adwatch: Google Ads Account Anomaly Watcher
use clap::Parser;

use adwatch::cli::args::{Cli, Commands};
use adwatch::commands::config::handle_config_action;
use adwatch::commands::{handle_account_command, handle_run_command};
use adwatch::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    match cli.command {
        Some(Commands::Account { customer_id }) => {
            handle_account_command(&config, &customer_id, cli.json).await?;
        }
        Some(Commands::Config { action }) => {
            handle_config_action(action, cli.json);
        }
        Some(Commands::Run) | None => {
            // Default behavior: process every configured account
            handle_run_command(&config, cli.json, cli.verbose).await?;
        }
    }
    Ok(())
}
