use anyhow::Result;
use std::io;
use tracing::info;

use crate::cli::ConfigCommand;
use crate::meal_config::{ConfigKey, MealConfig, CONFIG_KEYS};
use crate::settings::Settings;

pub fn run(cmd: ConfigCommand, settings: &Settings) -> Result<()> {
    let path = settings.config_path();
    let env_zip = settings.kroger_zip.as_deref();

    match cmd {
        ConfigCommand::Setup => {
            let current = MealConfig::load(&path, env_zip)?;
            let stdin = io::stdin();
            let updated = current.prompt_all(stdin.lock(), io::stdout())?;
            updated.save(&path)?;
            println!("\nConfig saved to {}", path.display());
        }
        ConfigCommand::Show => {
            let config = MealConfig::load(&path, env_zip)?;
            if path.exists() {
                println!("Config ({}):", path.display());
            } else {
                println!("No config.json found. Run 'meal_cart config setup' to create one.");
                println!("\nCurrent defaults:");
            }
            for line in show_lines(&config) {
                println!("{}", line);
            }
        }
        ConfigCommand::Set { key, value } => {
            let key = ConfigKey::parse(&key)?;
            let mut config = MealConfig::load(&path, env_zip)?;
            config.set(key, &value)?;
            config.save(&path)?;
            println!("Updated {}: {}", key.label(), value);
        }
        ConfigCommand::Reset => {
            if MealConfig::reset(&path)? {
                info!("config reset");
                println!("Deleted {}", path.display());
            } else {
                println!("No config.json to delete.");
            }
        }
    }
    Ok(())
}

fn show_lines(config: &MealConfig) -> Vec<String> {
    CONFIG_KEYS
        .iter()
        .map(|&key| {
            let display = config
                .display_value(key)
                .unwrap_or_else(|| "(not set)".to_string());
            format!("  {}: {}", key.label(), display)
        })
        .collect()
}
