// Command handlers module
pub mod account;
pub mod config;
pub mod run;

// Re-export command handlers for easy access
pub use account::handle_account_command;
pub use config::handle_config_action;
pub use run::{handle_run_command, run_accounts};
