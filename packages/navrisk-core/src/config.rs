//! Risk configuration loaded from TOML.

use crate::risk::{SnapshotParams, VarMethod, DEFAULT_LOOKBACK_DAYS, DEFAULT_VAR_PERCENTILE};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Risk computation settings.
///
/// ```toml
/// risk_free_rate = 0.02
/// lookback_days = 500
/// var_method = "historical"
/// var_percentile = 5.0
/// holdings_file = "/data/portfolio.json"
/// market_data_file = "/data/prices.json"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RiskConfig {
    /// Risk-free rate for the Sharpe ratio
    #[serde(default)]
    pub risk_free_rate: f64,

    /// Observations requested per asset
    #[serde(default = "default_lookback_days")]
    pub lookback_days: usize,

    /// VaR method
    #[serde(default)]
    pub var_method: VarMethod,

    /// VaR percentile in [0, 100]
    #[serde(default = "default_var_percentile")]
    pub var_percentile: f64,

    /// Portfolio holdings JSON file
    pub holdings_file: Option<PathBuf>,

    /// Close price histories JSON file
    pub market_data_file: Option<PathBuf>,
}

fn default_lookback_days() -> usize {
    DEFAULT_LOOKBACK_DAYS
}

fn default_var_percentile() -> f64 {
    DEFAULT_VAR_PERCENTILE
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            risk_free_rate: 0.0,
            lookback_days: default_lookback_days(),
            var_method: VarMethod::default(),
            var_percentile: default_var_percentile(),
            holdings_file: None,
            market_data_file: None,
        }
    }
}

impl RiskConfig {
    /// Get the default config file path.
    ///
    /// Default path: `~/.navrisk/config.toml`
    /// Can be overridden with `NAVRISK_CONFIG` environment variable.
    pub fn default_path() -> PathBuf {
        if let Ok(path) = env::var("NAVRISK_CONFIG") {
            return PathBuf::from(path);
        }

        directories::BaseDirs::new()
            .map(|dirs| dirs.home_dir().join(".navrisk/config.toml"))
            .unwrap_or_else(|| PathBuf::from("navrisk.toml"))
    }

    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate configuration from TOML text.
    ///
    /// An unknown `var_method` is reported as [`Error::NotSupported`].
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let table: toml::Table = toml::from_str(content)?;
        if let Some(method) = table.get("var_method").and_then(toml::Value::as_str) {
            method.parse::<VarMethod>()?;
        }

        let config: Self = toml::Value::Table(table).try_into()?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path`, or the default path when `None`.
    ///
    /// A missing file yields the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(Self::default_path);

        if !path.exists() {
            tracing::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        tracing::debug!("Loading config from {}", path.display());
        Self::from_file(&path)
    }

    /// Reject settings the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.lookback_days < 2 {
            return Err(Error::InvalidOperation(format!(
                "lookback_days must be at least 2, got {}",
                self.lookback_days
            )));
        }

        if !(0.0..=100.0).contains(&self.var_percentile) {
            return Err(Error::InvalidOperation(format!(
                "var_percentile must be within [0, 100], got {}",
                self.var_percentile
            )));
        }

        if !self.risk_free_rate.is_finite() {
            return Err(Error::InvalidOperation(
                "risk_free_rate must be finite".to_string(),
            ));
        }

        Ok(())
    }

    /// Snapshot parameters described by this configuration.
    pub fn snapshot_params(&self) -> SnapshotParams {
        SnapshotParams::new(self.risk_free_rate)
            .with_lookback(self.lookback_days)
            .with_var(self.var_method, self.var_percentile)
    }
}
