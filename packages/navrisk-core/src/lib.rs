//! Navrisk Core - Portfolio risk metrics library.
//!
//! This crate computes a risk snapshot for a multi-asset portfolio:
//!
//! - **NAV volatility**: Sample standard deviation of the NAV return history
//! - **Covariance**: Sample covariance of per-asset daily returns and portfolio variance
//! - **Sharpe ratio**: Annualized weighted return against a risk-free rate
//! - **Historical VaR**: Percentile pick over simulated portfolio value changes
//!
//! Market data and holdings are injected through the [`ReturnsProvider`],
//! [`PriceProvider`] and [`HoldingsSource`] traits.
//!
//! # Example
//!
//! ```rust,no_run
//! use navrisk_core::{HoldingsStore, MarketDataStore, RiskSnapshot};
//!
//! // Uses the default path ~/.navrisk/portfolio.json
//! let holdings = HoldingsStore::new();
//! let market = MarketDataStore::load("prices.json").unwrap();
//!
//! let snapshot = RiskSnapshot::new(0.02, &holdings, &market, &market, 500).unwrap();
//! println!("Sharpe: {:.3}", snapshot.portfolio_sharpe_ratio());
//! println!("VaR: {:.2}", snapshot.portfolio_value_at_risk());
//! ```

pub mod config;
pub mod holdings;
pub mod market_data;
pub mod risk;
pub mod types;

// Re-export commonly used types
pub use types::{ApiResponse, Holding, Portfolio, PricePoint, SortOrder};

// Re-export main functionality
pub use config::RiskConfig;
pub use holdings::{HoldingsSource, HoldingsStore};
pub use market_data::{MarketDataStore, PriceProvider, ReturnsProvider};
pub use risk::{
    annualize_mean_return, assemble_return_matrix, historical_value_at_risk, nav_volatility,
    percentile_index, sharpe_ratio, CovarianceMatrix, ReturnMatrix, RiskSnapshot,
    SnapshotParams, VarMethod, DEFAULT_LOOKBACK_DAYS, TRADING_DAYS_PER_YEAR,
};

/// Error types for navrisk-core operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Shape mismatch: {asset} has {actual} observations, expected {expected}")]
    ShapeMismatch {
        asset: String,
        expected: usize,
        actual: usize,
    },

    #[error("Not supported: {0}")]
    NotSupported(String),

    #[error("Division by zero: {0}")]
    DivisionByZero(String),

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Holding not found: {0}")]
    HoldingNotFound(String),

    #[error("No market data for asset: {0}")]
    AssetNotFound(String),
}

/// Result type for navrisk-core operations.
pub type Result<T> = std::result::Result<T, Error>;
