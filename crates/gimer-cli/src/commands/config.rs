//! `gimer config`: inspect and edit `config.toml` by dot-path key.

use clap::{Args, Subcommand};
use gimer_core::{Config, ConfigError};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print one setting (e.g. "alarm.max_duration_secs")
    Get { key: String },
    /// Change one setting; an empty value unsets optional keys like "alarm.command"
    Set { key: String, value: String },
    /// Print every setting
    List(ListArgs),
    /// Restore the defaults
    Reset,
}

#[derive(Args)]
pub struct ListArgs {
    /// Print the whole configuration as JSON
    #[arg(long)]
    json: bool,
}

pub fn run(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ConfigAction::Get { key } => {
            let value = Config::load()?
                .get(&key)
                .ok_or(ConfigError::UnknownKey(key))?;
            println!("{value}");
        }
        ConfigAction::Set { key, value } => {
            Config::load()?.set(&key, &value)?;
            if value.is_empty() {
                println!("{key} unset");
            } else {
                println!("{key} = {value}");
            }
        }
        ConfigAction::List(args) => list(&Config::load()?, args.json)?,
        ConfigAction::Reset => {
            Config::default().save()?;
            println!("Configuration reset to defaults");
        }
    }
    Ok(())
}

fn list(config: &Config, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    if json {
        println!("{}", serde_json::to_string_pretty(config)?);
        return Ok(());
    }
    for (key, value) in config.entries() {
        println!("{key} = {value}");
    }
    Ok(())
}
