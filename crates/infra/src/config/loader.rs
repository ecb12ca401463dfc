//! Configuration loader
//!
//! Loads session configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If the required variables are absent, falls back to a file
//! 3. Probes the working directory and the executable directory
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! Required:
//! - `GRANTFLOW_APP_KEY`: Registered application key
//! - `GRANTFLOW_AUTH_BASE_URL`: Authorization server base URL
//!
//! Optional:
//! - `GRANTFLOW_REDIRECT_URI`, `GRANTFLOW_CLIENT_INTEGRITY_HASH`
//! - `GRANTFLOW_COMPANION_ENABLED` (true/false),
//!   `GRANTFLOW_COMPANION_MIN_VERSION`, `GRANTFLOW_COMPANION_FINGERPRINTS`
//!   (comma separated)
//! - `GRANTFLOW_CACHE_BACKEND` (keychain/file/memory), `GRANTFLOW_CACHE_DIR`,
//!   `GRANTFLOW_CACHE_SERVICE`
//! - `GRANTFLOW_HTTP_TIMEOUT_SECS`, `GRANTFLOW_HTTP_MAX_ATTEMPTS`
//! - `GRANTFLOW_LOG_LEVEL`, `GRANTFLOW_LOG_FORMAT` (pretty/json)
//!
//! ## File Locations
//! The loader probes, in order, `grantflow.toml`, `grantflow.json`,
//! `config.toml` and `config.json` in the current working directory, then the
//! same names next to the executable.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use grantflow_domain::{CacheBackend, Config, GrantflowError, LogFormat, Result};

const CONFIG_FILE_NAMES: [&str; 4] =
    ["grantflow.toml", "grantflow.json", "config.toml", "config.json"];

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables. If a required variable
/// is missing or invalid, falls back to loading from a config file.
///
/// # Errors
/// Returns `GrantflowError::MissConfiguration` if neither source yields a
/// valid configuration
pub fn load() -> Result<Config> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = %e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables
///
/// # Errors
/// Returns `GrantflowError::MissConfiguration` if a required variable is
/// missing or any variable has an invalid value
pub fn load_from_env() -> Result<Config> {
    let mut config =
        Config::new(env_var("GRANTFLOW_APP_KEY")?, env_var("GRANTFLOW_AUTH_BASE_URL")?);

    config.app.redirect_uri = optional_env("GRANTFLOW_REDIRECT_URI");
    config.app.client_integrity_hash = optional_env("GRANTFLOW_CLIENT_INTEGRITY_HASH");

    config.companion.enabled = env_bool("GRANTFLOW_COMPANION_ENABLED", config.companion.enabled);
    if let Some(version) = env_parse::<u32>("GRANTFLOW_COMPANION_MIN_VERSION")? {
        config.companion.min_version_code = version;
    }
    if let Some(fingerprints) = optional_env("GRANTFLOW_COMPANION_FINGERPRINTS") {
        config.companion.trusted_fingerprints = fingerprints
            .split(',')
            .map(|f| f.trim().to_ascii_lowercase())
            .filter(|f| !f.is_empty())
            .collect();
    }

    if let Some(backend) = optional_env("GRANTFLOW_CACHE_BACKEND") {
        config.cache.backend = parse_backend(&backend)?;
    }
    config.cache.directory = optional_env("GRANTFLOW_CACHE_DIR").map(PathBuf::from);
    if let Some(service) = optional_env("GRANTFLOW_CACHE_SERVICE") {
        config.cache.service_name = service;
    }

    if let Some(timeout) = env_parse::<u64>("GRANTFLOW_HTTP_TIMEOUT_SECS")? {
        config.http.timeout_secs = timeout;
    }
    if let Some(attempts) = env_parse::<usize>("GRANTFLOW_HTTP_MAX_ATTEMPTS")? {
        config.http.max_attempts = attempts;
    }

    if let Some(level) = optional_env("GRANTFLOW_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Some(format) = optional_env("GRANTFLOW_LOG_FORMAT") {
        config.logging.format = parse_log_format(&format)?;
    }

    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes the standard locations via
/// [`probe_config_paths`]. The format is detected by file extension.
///
/// # Errors
/// Returns `GrantflowError::MissConfiguration` if the file is missing,
/// unreadable or malformed
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(GrantflowError::MissConfiguration(format!(
                    "config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            GrantflowError::MissConfiguration(
                "no config file found in any of the standard locations".into(),
            )
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path).map_err(|e| {
        GrantflowError::MissConfiguration(format!("failed to read config file: {e}"))
    })?;

    parse_config(&contents, &config_path)
}

fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| GrantflowError::MissConfiguration(format!("invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| GrantflowError::MissConfiguration(format!("invalid JSON format: {e}"))),
        _ => Err(GrantflowError::MissConfiguration(format!(
            "unsupported config format: {extension}"
        ))),
    }
}

/// Probe the standard locations for a configuration file
///
/// Returns the first existing candidate, or `None`.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut dirs = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        dirs.push(cwd);
    }
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            dirs.push(exe_dir.to_path_buf());
        }
    }

    probe_in(&dirs)
}

fn probe_in(dirs: &[PathBuf]) -> Option<PathBuf> {
    dirs.iter()
        .flat_map(|dir| CONFIG_FILE_NAMES.iter().map(move |name| dir.join(name)))
        .find(|path| path.exists())
}

fn env_var(key: &str) -> Result<String> {
    optional_env(key).ok_or_else(|| {
        GrantflowError::MissConfiguration(format!("missing required environment variable: {key}"))
    })
}

/// Non-empty value of an environment variable
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    optional_env(key)
        .map(|raw| {
            raw.parse::<T>().map_err(|e| {
                GrantflowError::MissConfiguration(format!("invalid value for {key}: {e}"))
            })
        })
        .transpose()
}

/// Parse boolean from environment variable
///
/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
fn env_bool(key: &str, default: bool) -> bool {
    optional_env(key)
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}

fn parse_backend(raw: &str) -> Result<CacheBackend> {
    match raw.to_ascii_lowercase().as_str() {
        "keychain" => Ok(CacheBackend::Keychain),
        "file" => Ok(CacheBackend::File),
        "memory" => Ok(CacheBackend::Memory),
        other => Err(GrantflowError::MissConfiguration(format!("unknown cache backend: {other}"))),
    }
}

fn parse_log_format(raw: &str) -> Result<LogFormat> {
    match raw.to_ascii_lowercase().as_str() {
        "pretty" => Ok(LogFormat::Pretty),
        "json" => Ok(LogFormat::Json),
        other => Err(GrantflowError::MissConfiguration(format!("unknown log format: {other}"))),
    }
}
