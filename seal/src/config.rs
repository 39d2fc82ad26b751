//! Configuration loader. Settings live in a small JSON file; every field is
//! optional so an absent file or an empty object yields the defaults.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::crypto::keys::{DEFAULT_MODULUS_BITS, MAX_MODULUS_BITS, MIN_MODULUS_BITS};

/// Environment variable consulted when no `--config` path is given.
pub const CONFIG_ENV: &str = "SECTION_SEAL_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file unreadable: {0}")]
    Io(String),
    #[error("config parse failed: {0}")]
    Parse(String),
    #[error("invalid config value: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct SealConfig {
    /// Modulus size used by `generateKeys` when the request does not name one.
    pub default_modulus_bits: usize,
    /// Whether a new store starts with the signed demo section.
    pub bootstrap: bool,
    /// Fallback `tracing` filter used when `RUST_LOG` is unset.
    pub log_level: String,
}

impl Default for SealConfig {
    fn default() -> Self {
        Self {
            default_modulus_bits: DEFAULT_MODULUS_BITS,
            bootstrap: true,
            log_level: "info".to_string(),
        }
    }
}

impl SealConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        let bits = self.default_modulus_bits;
        if !(MIN_MODULUS_BITS..=MAX_MODULUS_BITS).contains(&bits) || bits % 8 != 0 {
            return Err(ConfigError::Invalid(format!(
                "defaultModulusBits {bits} must be a multiple of 8 between {MIN_MODULUS_BITS} and {MAX_MODULUS_BITS}"
            )));
        }
        if self.log_level.trim().is_empty() {
            return Err(ConfigError::Invalid("logLevel must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Reads and validates the JSON configuration at `path`.
pub fn load_config(path: impl AsRef<Path>) -> Result<SealConfig, ConfigError> {
    let raw_json = fs::read_to_string(&path).map_err(|e| ConfigError::Io(format!("{e}")))?;
    let config: SealConfig =
        serde_json::from_str(&raw_json).map_err(|e| ConfigError::Parse(format!("{e}")))?;
    config.validate()?;
    Ok(config)
}

/// Resolves the config from an explicit path, then `SECTION_SEAL_CONFIG`,
/// and falls back to the defaults when neither is set.
pub fn resolve_config(explicit: Option<PathBuf>) -> Result<SealConfig, ConfigError> {
    let path = explicit.or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from));
    match path {
        Some(path) => load_config(path),
        None => Ok(SealConfig::default()),
    }
}
