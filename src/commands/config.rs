use std::path::Path;

use crate::cli::ConfigCmd;
use anyhow::Result;
use colored::Colorize;
use pulsefit::config::{Config, KEY_DB_PATH, KEY_LOG, KEY_VOICE};

const KNOWN_KEYS: [&str; 3] = [KEY_DB_PATH, KEY_VOICE, KEY_LOG];

pub fn handle(cmd: ConfigCmd, config_path: &Path, mut cfg: Config) -> Result<()> {
    match cmd {
        ConfigCmd::List => {
            if cfg.map.is_empty() {
                println!("{}", "(no config set)".dimmed());
            } else {
                println!("{}", "Config:".cyan().bold());
                for (k, v) in &cfg.map {
                    println!("  {} = {}", k.green(), v);
                }
            }
        }

        ConfigCmd::Get { key } => match cfg.map.get(&key) {
            Some(val) => println!("{}", val),
            None => println!("{} key `{}` not found", "warning:".yellow().bold(), key),
        },

        ConfigCmd::Set { key, val } => {
            if !KNOWN_KEYS.contains(&key.as_str()) {
                println!(
                    "{} `{}` is not a key pulsefit reads (known: {})",
                    "warning:".yellow().bold(),
                    key,
                    KNOWN_KEYS.join(", ")
                );
            }
            cfg.map.insert(key.clone(), val.clone());
            cfg.save(config_path)?;
            println!("{} set `{}` = `{}`", "info:".blue().bold(), key.green(), val);
        }

        ConfigCmd::Unset { key } => {
            if cfg.map.remove(&key).is_some() {
                cfg.save(config_path)?;
                println!("{} removed `{}`", "info:".blue().bold(), key.green());
            } else {
                println!("{} key `{}` not found", "warning:".yellow().bold(), key);
            }
        }
    }

    Ok(())
}
