use crate::cli::ConfigAction;
use crate::config::Config;

fn fail(message: &str, json_output: bool) -> ! {
    if json_output {
        println!(r#"{{"status": "error", "message": "{message}"}}"#);
    } else {
        eprintln!("Error: {message}");
    }
    std::process::exit(1);
}

pub fn handle_config_action(action: ConfigAction, json_output: bool) {
    match action {
        ConfigAction::Init => match Config::default().save() {
            Ok(()) => {
                if json_output {
                    println!(
                        r#"{{"status": "success", "message": "Configuration initialized successfully"}}"#
                    );
                } else if let Ok(config_path) = Config::default_path() {
                    println!("Configuration initialized at: {}", config_path.display());
                } else {
                    println!("Configuration initialized successfully");
                }
            }
            Err(e) => fail(&format!("Failed to initialize config: {e}"), json_output),
        },
        ConfigAction::Show => {
            let config = match Config::load() {
                Ok(config) => config,
                Err(e) => fail(&format!("Failed to load config: {e}"), json_output),
            };
            if json_output {
                match serde_json::to_string_pretty(&config) {
                    Ok(json) => println!("{json}"),
                    Err(e) => fail(&format!("Failed to serialize config to JSON: {e}"), json_output),
                }
            } else {
                match toml::to_string_pretty(&config) {
                    Ok(toml_str) => {
                        if let Ok(config_path) = Config::default_path() {
                            println!("Configuration ({})", config_path.display());
                        } else {
                            println!("Configuration:");
                        }
                        println!("{toml_str}");
                    }
                    Err(e) => fail(&format!("Failed to serialize config: {e}"), json_output),
                }
            }
        }
        ConfigAction::Set { key, value } => {
            let mut config = match Config::load() {
                Ok(config) => config,
                Err(e) => fail(&format!("Failed to load config: {e}"), json_output),
            };
            if let Err(e) = config.set_value(&key, &value) {
                fail(&format!("Invalid configuration: {e}"), json_output);
            }
            match config.save() {
                Ok(()) => {
                    if json_output {
                        println!(
                            r#"{{"status": "success", "message": "Configuration updated: {key} = {value}"}}"#
                        );
                    } else {
                        println!("Configuration updated: {key} = {value}");
                    }
                }
                Err(e) => fail(&format!("Failed to save config: {e}"), json_output),
            }
        }
    }
}
