//! Configuration commands.
//!
//! - `config show`: Display current configuration
//! - `config get`: Print one value (secrets masked)
//! - `config set`: Set and save one value

use owo_colors::OwoColorize;
use serde_json::json;

use super::CommandOutput;
use crate::config::{CONFIG_KEYS, Config};
use crate::error::{DeskError, Result};

const SECRET_KEYS: &[&str] = &["api_key"];

/// Convert dot or dash notation to the underscore form the keys use.
fn normalize_config_key(key: &str) -> Result<String> {
    let normalized = key.trim().replace(['.', '-'], "_");
    if CONFIG_KEYS.contains(&normalized.as_str()) {
        Ok(normalized)
    } else {
        Err(DeskError::Config(format!(
            "unknown config key '{key}'. Valid keys: {}",
            CONFIG_KEYS.join(", ")
        )))
    }
}

/// Mask a sensitive value by showing only the first 2 and last 2 characters
fn mask_sensitive_value(value: &str) -> String {
    let char_count = value.chars().count();
    if char_count > 4 {
        let first: String = value.chars().take(2).collect();
        let last: String = value.chars().skip(char_count - 2).collect();
        format!("{first}...{last}")
    } else {
        "****".to_string()
    }
}

fn configured(value: Option<&str>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => "not configured".dimmed().to_string(),
    }
}

/// Show current configuration
pub fn cmd_config_show(output_json: bool) -> Result<()> {
    let config = Config::load()?;
    let config_path = Config::config_path()?;
    let api_key_configured = config.api_key().is_some();

    let json_output = json!({
        "identity_url": config.identity_url,
        "service_url": config.service_url,
        "auth": {
            "api_key_configured": api_key_configured,
        },
        "timezone": config.timezone,
        "user_type": config.user_type.to_string(),
        "request_timeout": config.request_timeout,
        "config_file": config_path.to_string_lossy(),
    });

    let mut text_output = String::new();
    text_output.push_str(&format!("{}\n\n", "Configuration:".cyan().bold()));

    text_output.push_str(&format!("{}:\n", "hosts".cyan()));
    text_output.push_str(&format!(
        "  identity_url: {}\n",
        configured(config.identity_url.as_deref())
    ));
    text_output.push_str(&format!(
        "  service_url: {}\n",
        configured(config.service_url.as_deref())
    ));
    text_output.push('\n');

    // Never print the key itself
    let api_key_status = if api_key_configured {
        "configured".green().to_string()
    } else {
        "not configured".dimmed().to_string()
    };
    text_output.push_str(&format!("{}:\n", "auth".cyan()));
    text_output.push_str(&format!("  api_key: {api_key_status}\n"));
    text_output.push('\n');

    text_output.push_str(&format!("{}:\n", "client".cyan()));
    text_output.push_str(&format!("  timezone: {}\n", config.timezone));
    text_output.push_str(&format!("  user_type: {}\n", config.user_type));
    text_output.push_str(&format!("  request_timeout: {}s\n", config.request_timeout));
    text_output.push('\n');

    text_output.push_str(&format!(
        "{}",
        format!("Config file: {}", config_path.display()).dimmed()
    ));

    CommandOutput::new(json_output)
        .with_text(text_output)
        .print(output_json)
}

/// Set a configuration value
pub fn cmd_config_set(key: &str, value: &str, output_json: bool) -> Result<()> {
    let key = normalize_config_key(key)?;

    let mut config = Config::load()?;
    config.set(&key, value)?;
    config.save()?;

    let secret = SECRET_KEYS.contains(&key.as_str());
    let mut json_output = json!({
        "action": "config_set",
        "key": key,
        "success": true,
    });
    let text_output = if secret {
        format!("Set {}", key.cyan())
    } else {
        json_output["value"] = json!(value);
        format!("Set {} to {value}", key.cyan())
    };

    CommandOutput::new(json_output)
        .with_text(text_output)
        .print(output_json)
}

/// Get a specific configuration value
pub fn cmd_config_get(key: &str, output_json: bool) -> Result<()> {
    let key = normalize_config_key(key)?;

    let config = Config::load()?;
    let Some(value) = config.get(&key)? else {
        return Err(DeskError::Config(format!("{key} not set")));
    };

    let (json_output, text_output) = if SECRET_KEYS.contains(&key.as_str()) {
        let masked = mask_sensitive_value(&value);
        let json = json!({
            "key": key,
            "value": masked,
            "configured": true,
            "masked": true,
        });
        let text = format!("{masked} (masked - showing first 2 and last 2 characters)");
        (json, text)
    } else {
        let json = json!({
            "key": key,
            "value": value,
            "configured": true,
        });
        (json, value)
    };

    CommandOutput::new(json_output)
        .with_text(text_output)
        .print(output_json)
}
