//! Runtime configuration: the API credential, unit system, endpoints and the
//! location of the history file.
//!
//! Nothing here is global. A [`Config`] is built once, either explicitly with
//! [`Config::builder`] or from the process environment with
//! [`Config::from_env`], and handed to [`crate::WeatherHistory`].

use crate::types::units::Units;
use crate::utils::default_history_path;
use bon::bon;
use std::path::PathBuf;
use thiserror::Error;

/// Environment variable holding the OpenWeatherMap API key.
pub const API_KEY_ENV: &str = "OPENWEATHERMAP_KEY1";
/// Optional override of the history file location.
pub const HISTORY_FILE_ENV: &str = "WEATHER_HISTORY_FILE";
/// Optional unit system (`imperial`, `metric` or `standard`).
pub const UNITS_ENV: &str = "WEATHER_UNITS";

pub const DEFAULT_GEOCODING_URL: &str = "https://api.openweathermap.org/geo/1.0/direct";
pub const DEFAULT_ONECALL_URL: &str = "https://api.openweathermap.org/data/3.0/onecall";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("API key not found: environment variable {0} is not set")]
    MissingApiKey(String),

    #[error("Unsupported unit system '{0}', expected imperial, metric or standard")]
    InvalidUnits(String),

    #[error("Failed to determine the user data directory")]
    DataDirResolution,
}

/// Settings shared by the fetch client and the history store.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub api_key: String,
    pub units: Units,
    pub geocoding_url: String,
    pub onecall_url: String,
    pub timeout_secs: u64,
    pub history_path: PathBuf,
}

#[bon]
impl Config {
    /// Builds a configuration; everything except the key and the history path
    /// has a default.
    ///
    /// # Examples
    ///
    /// ```
    /// use weather_history::{Config, Units};
    ///
    /// let config = Config::builder()
    ///     .api_key("secret".to_string())
    ///     .history_path("weather_export.csv".into())
    ///     .units(Units::Metric)
    ///     .build();
    /// assert_eq!(config.timeout_secs, 30);
    /// ```
    #[builder]
    pub fn new(
        api_key: String,
        history_path: PathBuf,
        units: Option<Units>,
        geocoding_url: Option<String>,
        onecall_url: Option<String>,
        timeout_secs: Option<u64>,
    ) -> Self {
        Self {
            api_key,
            units: units.unwrap_or_default(),
            geocoding_url: geocoding_url.unwrap_or_else(|| DEFAULT_GEOCODING_URL.to_string()),
            onecall_url: onecall_url.unwrap_or_else(|| DEFAULT_ONECALL_URL.to_string()),
            timeout_secs: timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
            history_path,
        }
    }

    /// Reads the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingApiKey`] when `OPENWEATHERMAP_KEY1` is unset
    /// or empty. This is checked before any request is made.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`Config::from_env`] with a custom variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_key = lookup(API_KEY_ENV)
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingApiKey(API_KEY_ENV.to_string()))?;

        let units = match lookup(UNITS_ENV) {
            Some(value) => Some(value.parse::<Units>().map_err(ConfigError::InvalidUnits)?),
            None => None,
        };

        let history_path = match lookup(HISTORY_FILE_ENV).filter(|p| !p.is_empty()) {
            Some(path) => PathBuf::from(path),
            None => default_history_path()?,
        };

        Ok(Config::builder()
            .api_key(api_key)
            .history_path(history_path)
            .maybe_units(units)
            .build())
    }

    pub(crate) fn timemachine_url(&self) -> String {
        format!("{}/timemachine", self.onecall_url.trim_end_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_missing_key_is_fatal() {
        let result = Config::from_lookup(lookup_from(&[(HISTORY_FILE_ENV, "h.csv")]));
        assert_eq!(result, Err(ConfigError::MissingApiKey(API_KEY_ENV.to_string())));

        let blank = Config::from_lookup(lookup_from(&[(API_KEY_ENV, "  "), (HISTORY_FILE_ENV, "h.csv")]));
        assert!(matches!(blank, Err(ConfigError::MissingApiKey(_))));
    }

    #[test]
    fn test_env_values_are_applied() -> Result<(), ConfigError> {
        let config = Config::from_lookup(lookup_from(&[
            (API_KEY_ENV, "abc"),
            (HISTORY_FILE_ENV, "/tmp/history.csv"),
            (UNITS_ENV, "metric"),
        ]))?;
        assert_eq!(config.api_key, "abc");
        assert_eq!(config.units, Units::Metric);
        assert_eq!(config.history_path, PathBuf::from("/tmp/history.csv"));
        assert_eq!(config.onecall_url, DEFAULT_ONECALL_URL);
        Ok(())
    }

    #[test]
    fn test_invalid_units() {
        let result = Config::from_lookup(lookup_from(&[
            (API_KEY_ENV, "abc"),
            (HISTORY_FILE_ENV, "h.csv"),
            (UNITS_ENV, "kelvin"),
        ]));
        assert_eq!(result, Err(ConfigError::InvalidUnits("kelvin".to_string())));
    }

    #[test]
    fn test_timemachine_url() {
        let config = Config::builder()
            .api_key("k".to_string())
            .history_path("h.csv".into())
            .onecall_url("http://localhost:1234/data/3.0/onecall/".to_string())
            .build();
        assert_eq!(
            config.timemachine_url(),
            "http://localhost:1234/data/3.0/onecall/timemachine"
        );
    }
}
