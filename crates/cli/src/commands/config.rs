//! `evaljobs config`

use anyhow::Result;

use crate::config::{Config, KEYS};
use crate::output::{colors, JsonFormatter, OutputFormat, PlainFormatter, TableFormatter};

/// Print the effective configuration
pub fn show(config: &Config, format: OutputFormat) -> Result<()> {
    let items: Vec<(&str, String)> = KEYS
        .iter()
        .map(|key| (*key, config.get(key).unwrap_or_default()))
        .collect();
    let token = if std::env::var("HF_TOKEN").map(|t| !t.trim().is_empty()).unwrap_or(false) {
        "*** (from HF_TOKEN)".to_string()
    } else {
        "(not set)".to_string()
    };

    let out = match format {
        OutputFormat::Json => JsonFormatter::format(config)?,
        OutputFormat::Table => {
            let mut items = items;
            items.push(("token", token));
            TableFormatter::key_value(&items)
        }
        OutputFormat::Plain => {
            let mut items = items;
            items.push(("token", token));
            PlainFormatter::key_value(&items)
        }
    };
    println!("{}", out);
    Ok(())
}

/// Print one value
pub fn get(config: &Config, key: &str) -> Result<()> {
    match config.get(key) {
        Some(value) => {
            println!("{}", value);
            Ok(())
        }
        None => anyhow::bail!("Unknown configuration key: {} (known: {})", key, KEYS.join(", ")),
    }
}

/// Set one value in the config file
pub fn set(key: &str, value: &str) -> Result<()> {
    let path = Config::config_file()?;
    let mut config = Config::load_from(&path)?;
    config.set(key, value)?;
    println!("{}", colors::success(&format!("Set {} = {}", key, value)));
    Ok(())
}

/// Restore the defaults in the config file
pub fn reset() -> Result<()> {
    let mut config = Config::default();
    config.reset()?;
    println!("{}", colors::success("Configuration reset to defaults"));
    Ok(())
}

/// Print the config file location
pub fn path() -> Result<()> {
    println!("{}", Config::config_file()?.display());
    Ok(())
}
