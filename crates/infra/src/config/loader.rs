//! Configuration loader
//!
//! ## Loading Strategy
//! 1. `SLOTWISE_CONFIG` names an explicit file: load it
//! 2. Otherwise try environment variables
//! 3. If a required variable is missing, probe for a config file
//!
//! ## Environment Variables
//! Required:
//! - `SECRET_KEY`: token signing secret
//!
//! Optional (defaults from [`AppConfig`]):
//! - `SLOTWISE_HOST`, `SLOTWISE_PORT`, `SLOTWISE_BASE_URL`
//! - `SLOTWISE_DB_PATH`, `SLOTWISE_DB_POOL_SIZE`
//! - `SLOTWISE_TOKEN_EXPIRE_MINUTES`
//! - `GOOGLE_CLIENT_ID`, `GOOGLE_CLIENT_SECRET`, `GOOGLE_REDIRECT_URI`,
//!   `GOOGLE_CALENDAR_REDIRECT_URI`
//! - `OPENAI_API_KEY`, `OPENAI_MODEL`
//! - `SLOTWISE_EMAIL_ENABLED`, `SLOTWISE_EMAIL_FROM_NAME`
//! - `SLOTWISE_SYNC_ENABLED`, `SLOTWISE_SYNC_INTERVAL`,
//!   `SLOTWISE_SYNC_RETRY_ATTEMPTS`, `SLOTWISE_SYNC_WINDOW_DAYS`,
//!   `SLOTWISE_CONFLICT_RESOLUTION`
//! - `SLOTWISE_KNOWLEDGE_PATH`
//!
//! ## File Locations
//! `slotwise.toml`, `slotwise.json` or `config/slotwise.toml`, looked up in
//! the working directory, its two parents and next to the executable.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use slotwise_domain::{AppConfig, ConflictResolution, Result, SlotwiseError};

const CONFIG_FILE_NAMES: [&str; 3] = ["slotwise.toml", "slotwise.json", "config/slotwise.toml"];

/// Load configuration with the fallback strategy described above.
pub fn load() -> Result<AppConfig> {
    if let Some(explicit) = optional_var("SLOTWISE_CONFIG") {
        return load_from_file(Some(PathBuf::from(explicit)));
    }

    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = ?e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables.
///
/// # Errors
/// Returns `SlotwiseError::Config` when `SECRET_KEY` is missing or a set
/// variable cannot be parsed.
pub fn load_from_env() -> Result<AppConfig> {
    let mut config = AppConfig::default();
    config.auth.secret_key = env_var("SECRET_KEY")?;

    if let Some(host) = optional_var("SLOTWISE_HOST") {
        config.server.host = host;
    }
    config.server.port = env_parse("SLOTWISE_PORT", config.server.port)?;
    if let Some(base_url) = optional_var("SLOTWISE_BASE_URL") {
        config.server.base_url = base_url;
    }

    if let Some(path) = optional_var("SLOTWISE_DB_PATH") {
        config.database.path = path;
    }
    config.database.pool_size = env_parse("SLOTWISE_DB_POOL_SIZE", config.database.pool_size)?;
    config.auth.access_token_expire_minutes =
        env_parse("SLOTWISE_TOKEN_EXPIRE_MINUTES", config.auth.access_token_expire_minutes)?;

    config.google.client_id = optional_var("GOOGLE_CLIENT_ID").unwrap_or_default();
    config.google.client_secret = optional_var("GOOGLE_CLIENT_SECRET").unwrap_or_default();
    config.google.redirect_uri = optional_var("GOOGLE_REDIRECT_URI").unwrap_or_default();
    config.google.calendar_redirect_uri =
        optional_var("GOOGLE_CALENDAR_REDIRECT_URI").unwrap_or_default();

    config.openai.api_key = optional_var("OPENAI_API_KEY");
    if let Some(model) = optional_var("OPENAI_MODEL") {
        config.openai.model = model;
    }

    config.email.enabled = env_bool("SLOTWISE_EMAIL_ENABLED", config.email.enabled);
    if let Some(from_name) = optional_var("SLOTWISE_EMAIL_FROM_NAME") {
        config.email.from_name = from_name;
    }

    config.sync.enabled = env_bool("SLOTWISE_SYNC_ENABLED", config.sync.enabled);
    config.sync.interval_seconds =
        env_parse("SLOTWISE_SYNC_INTERVAL", config.sync.interval_seconds)?;
    config.sync.retry_attempts =
        env_parse("SLOTWISE_SYNC_RETRY_ATTEMPTS", config.sync.retry_attempts)?;
    config.sync.window_days = env_parse("SLOTWISE_SYNC_WINDOW_DAYS", config.sync.window_days)?;
    if let Some(mode) = optional_var("SLOTWISE_CONFLICT_RESOLUTION") {
        config.sync.conflict_resolution = ConflictResolution::from_str(&mode).map_err(|e| {
            SlotwiseError::Config(format!("Invalid SLOTWISE_CONFLICT_RESOLUTION: {e}"))
        })?;
    }

    config.agent.knowledge_path = optional_var("SLOTWISE_KNOWLEDGE_PATH");

    Ok(config)
}

/// Load configuration from a file.
///
/// With `None` the standard locations are probed via [`probe_config_paths`].
pub fn load_from_file(path: Option<PathBuf>) -> Result<AppConfig> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                let message = format!("Config file not found: {}", p.display());
                return Err(SlotwiseError::Config(message));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            SlotwiseError::Config("No config file found in any standard location".to_string())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| SlotwiseError::Config(format!("Failed to read config file: {e}")))?;

    parse_config(&contents, &config_path)
}

/// Parse configuration text, choosing the format from the file extension.
pub fn parse_config(contents: &str, path: &Path) -> Result<AppConfig> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| SlotwiseError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| SlotwiseError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(SlotwiseError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// First existing config file among the standard locations.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut roots = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        roots.push(cwd.clone());
        roots.extend(cwd.ancestors().skip(1).take(2).map(Path::to_path_buf));
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            roots.push(exe_dir.to_path_buf());
        }
    }

    roots
        .iter()
        .flat_map(|root| CONFIG_FILE_NAMES.iter().map(move |name| root.join(name)))
        .find(|candidate| candidate.exists())
}

fn env_var(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| {
        SlotwiseError::Config(format!("Missing required environment variable: {key}"))
    })
}

/// Set and non-empty
fn optional_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match optional_var(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| SlotwiseError::Config(format!("Invalid {key}: {e}"))),
        None => Ok(default),
    }
}

/// Accepts `1`/`true`/`yes`/`on` (case-insensitive); anything else is false.
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}
