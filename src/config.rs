//! Configuration for the split-ledger front ends.
//!
//! Configuration can be set via environment variables:
//! - `SPLIT_LEDGER_DB` - Optional. SQLite file holding the ledger. Defaults to `split-ledger.db`.
//! - `SPLIT_LEDGER_VIEWER` - Optional. The member whose balances are shown. Defaults to `User`.
//! - `SPLIT_LEDGER_CURRENCY` - Optional. Currency glyph for display. Defaults to `₹`.
//! - `SPLIT_LEDGER_RESET` - Optional. `1`/`true` wipes the saved ledger on startup.

use crate::ledger::DEFAULT_VIEWER;
use crate::money::DEFAULT_CURRENCY;
use std::path::PathBuf;
use thiserror::Error;

pub const DEFAULT_DB_PATH: &str = "split-ledger.db";

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// SQLite file holding the serialized ledger and audit trail
    pub db_path: PathBuf,

    /// The distinguished "self" member
    pub viewer: String,

    /// Display glyph; amounts always render with two decimals
    pub currency_symbol: String,

    /// Clear persisted state at startup
    pub reset_on_start: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            viewer: DEFAULT_VIEWER.to_string(),
            currency_symbol: DEFAULT_CURRENCY.to_string(),
            reset_on_start: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup (the environment, a map in tests)
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let db_path = lookup("SPLIT_LEDGER_DB")
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.db_path);

        let viewer = match lookup("SPLIT_LEDGER_VIEWER") {
            Some(v) if v.trim().is_empty() => {
                return Err(ConfigError::InvalidValue(
                    "SPLIT_LEDGER_VIEWER".to_string(),
                    "viewer name cannot be blank".to_string(),
                ))
            }
            Some(v) => v.trim().to_string(),
            None => defaults.viewer,
        };

        let currency_symbol = lookup("SPLIT_LEDGER_CURRENCY")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or(defaults.currency_symbol);

        let reset_on_start = match lookup("SPLIT_LEDGER_RESET") {
            None => false,
            Some(v) => parse_flag(&v).ok_or_else(|| {
                ConfigError::InvalidValue("SPLIT_LEDGER_RESET".to_string(), v.clone())
            })?,
        };

        Ok(Config {
            db_path,
            viewer,
            currency_symbol,
            reset_on_start,
        })
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "" | "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.viewer, "User");
        assert_eq!(config.currency_symbol, "₹");
        assert!(!config.reset_on_start);
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("SPLIT_LEDGER_DB", "/tmp/ledger.db"),
            ("SPLIT_LEDGER_VIEWER", " Priya "),
            ("SPLIT_LEDGER_CURRENCY", "$"),
            ("SPLIT_LEDGER_RESET", "true"),
        ]))
        .unwrap();

        assert_eq!(config.db_path, PathBuf::from("/tmp/ledger.db"));
        assert_eq!(config.viewer, "Priya");
        assert_eq!(config.currency_symbol, "$");
        assert!(config.reset_on_start);
    }

    #[test]
    fn test_blank_viewer_rejected() {
        let err = Config::from_lookup(lookup_from(&[("SPLIT_LEDGER_VIEWER", "  ")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(key, _) if key == "SPLIT_LEDGER_VIEWER"));
    }

    #[test]
    fn test_bad_reset_flag_rejected() {
        let err = Config::from_lookup(lookup_from(&[("SPLIT_LEDGER_RESET", "maybe")])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidValue("SPLIT_LEDGER_RESET".to_string(), "maybe".to_string())
        );
    }
}
