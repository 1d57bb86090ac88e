//! Environment-and-file configuration loading for [`GatewayConfig`]'s
//! scalar fields.
//!
//! The route table (`lambdas`) carries per-route closures (`cache.enabled`,
//! `auth.secret`, …) that cannot be fully expressed as flat config, so it is
//! supplied programmatically via [`GatewayConfig::with_lambda`]. Everything
//! else — `port`, `redisUrl`, `logGroup`, `cachePrefix`, cache tuning,
//! `invokerUrl`, `logSinkUrl` — is environment-overridable per spec §6,
//! loaded here the way `GatewayConfig::load_with_env` would in a generic
//! config loader.

use config::{Config as Cfg, Environment, File, FileFormat};
use regex::Regex;
use serde::Deserialize;
use std::path::Path;

/// Errors surfaced while loading scalar settings from env/file sources.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config parsing error: {0}")]
    Parse(String),

    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("deserialization error: {0}")]
    Deserialize(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// The subset of [`GatewayConfig`](crate::validation::GatewayConfig) that
/// can be expressed as flat scalars, with serde defaults matching spec §6.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EnvSettings {
    pub port: u16,
    pub redis_url: Option<String>,
    pub log_group: String,
    pub cache_prefix: String,
    pub cache_ttl: u64,
    pub cache_ttr: u64,
    pub cache_timeout: u64,
    pub invoker_url: String,
    pub log_sink_url: Option<String>,
}

impl Default for EnvSettings {
    fn default() -> Self {
        Self {
            port: 8080,
            redis_url: None,
            log_group: String::new(),
            cache_prefix: String::new(),
            cache_ttl: 30 * 24 * 3600,
            cache_ttr: 7200,
            cache_timeout: 1000,
            invoker_url: String::new(),
            log_sink_url: None,
        }
    }
}

/// Detect a config file's format from its extension. Supports the two
/// formats the lambda route table realistically ships in: YAML and JSON.
fn detect_format(path: &str) -> ConfigResult<FileFormat> {
    let ext = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .ok_or_else(|| ConfigError::UnsupportedFormat("no file extension".to_string()))?;
    match ext.to_lowercase().as_str() {
        "yaml" | "yml" => Ok(FileFormat::Yaml),
        "json" => Ok(FileFormat::Json),
        other => Err(ConfigError::UnsupportedFormat(other.to_string())),
    }
}

/// Substitute `${VAR_NAME}` references with environment variable values.
/// Unresolved references are left as-is. Used when loading a static
/// lambdas file so that secrets (`auth.secret`, `invokerUrl` credentials)
/// don't need to be checked into the file verbatim.
pub fn substitute_env_vars(content: &str) -> String {
    let re = Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("static regex is valid");
    re.replace_all(content, |caps: &regex::Captures| {
        let name = &caps[1];
        std::env::var(name).unwrap_or_else(|_| caps[0].to_string())
    })
    .into_owned()
}

/// Load [`EnvSettings`] from an optional base file layered under
/// environment variables prefixed `GATEWAY__`, double-underscore nested
/// (e.g. `GATEWAY__PORT`, `GATEWAY__CACHE_TTL`).
pub fn load_env_settings(base_file: Option<&str>) -> ConfigResult<EnvSettings> {
    let mut builder = Cfg::builder();

    if let Some(path) = base_file {
        let format = detect_format(path)?;
        let content = std::fs::read_to_string(path)?;
        let substituted = substitute_env_vars(&content);
        builder = builder.add_source(File::from_str(&substituted, format));
    }

    builder = builder.add_source(Environment::with_prefix("GATEWAY").separator("__"));

    let built = builder.build().map_err(|e| ConfigError::Parse(e.to_string()))?;
    built
        .try_deserialize()
        .map_err(|e| ConfigError::Deserialize(e.to_string()))
}

#[cfg(test)]
mod tests;
