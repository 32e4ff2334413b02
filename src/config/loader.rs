//! Configuration loading from files (std only).

use std::fs;
use std::path::Path;

use crate::error::{ConfigError, Error, Result};

use super::validation::sanitize_config;
use super::RouterConfig;

/// Load configuration from a TOML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed. Out-of-range
/// values are clamped and logged, never reported as errors.
///
/// # Example
///
/// ```rust,ignore
/// use filament_router::load_config;
///
/// let config = load_config("router.toml")?;
/// ```
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<RouterConfig> {
    let content = fs::read_to_string(path.as_ref()).map_err(|e| {
        let msg = heapless::String::try_from(e.to_string().as_str()).unwrap_or_default();
        Error::Config(ConfigError::IoError(msg))
    })?;

    parse_config(&content)
}

/// Parse configuration from a TOML string.
///
/// # Errors
///
/// Returns an error if the TOML is invalid.
pub fn parse_config(content: &str) -> Result<RouterConfig> {
    let mut config: RouterConfig = toml::from_str(content).map_err(|e| {
        let msg = heapless::String::try_from(e.message()).unwrap_or_default();
        Error::Config(ConfigError::ParseError(msg))
    })?;

    for replaced in sanitize_config(&mut config) {
        if let ConfigError::OutOfRange {
            field,
            value,
            replaced_with,
        } = replaced
        {
            warn!("config {} = {} out of range, using {}", field, value, replaced_with);
        }
    }

    Ok(config)
}
