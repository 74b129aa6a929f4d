use std::time::Duration;

use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    // Unset or zero means "no limit".
    let parse_optional_secs = |var: &str| -> Result<Option<Duration>, ConfigError> {
        let secs = parse_u64(var, "0")?;
        Ok((secs > 0).then(|| Duration::from_secs(secs)))
    };

    let discovery_url = require("LOCUS_DISCOVERY_URL")?;
    if !(discovery_url.starts_with("http://") || discovery_url.starts_with("https://")) {
        return Err(ConfigError::InvalidEnvVar {
            var: "LOCUS_DISCOVERY_URL".to_string(),
            reason: format!("expected an http(s) URL, got \"{discovery_url}\""),
        });
    }

    let env = parse_environment(&or_default("LOCUS_ENV", "development"))?;
    let log_level = or_default("LOCUS_LOG_LEVEL", "info");
    let profile_id = lookup("LOCUS_PROFILE_ID").ok().filter(|v| !v.is_empty());
    let user_agent = or_default("LOCUS_USER_AGENT", "locus/0.1 (discovery-stream)");
    let connect_timeout_secs = parse_u64("LOCUS_CONNECT_TIMEOUT_SECS", "10")?;
    let read_timeout = parse_optional_secs("LOCUS_READ_TIMEOUT_SECS")?;
    let cache_ttl = parse_optional_secs("LOCUS_CACHE_TTL_SECS")?;

    Ok(AppConfig {
        env,
        discovery_url,
        log_level,
        profile_id,
        user_agent,
        connect_timeout_secs,
        read_timeout,
        cache_ttl,
    })
}

/// Parse a string into an `Environment` variant.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidEnvVar`] for anything other than
/// `development`, `test`, or `production`.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "LOCUS_ENV".to_string(),
            reason: format!("unknown environment \"{other}\""),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
