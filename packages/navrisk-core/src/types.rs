//! Core data types for the navrisk system.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A holding in the portfolio: an asset, its weight and the quantity held.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Holding {
    /// ISIN of the asset (uppercase)
    pub isin: String,
    /// Fraction of portfolio value held in this asset
    pub weight: f64,
    /// Number of shares held
    pub quantity: f64,
}

impl Holding {
    /// Create a new holding. The ISIN is normalized to uppercase.
    pub fn new(isin: &str, weight: f64, quantity: f64) -> Self {
        Self {
            isin: isin.trim().to_uppercase(),
            weight,
            quantity,
        }
    }
}

/// A portfolio: ordered holdings plus the NAV return history since inception.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Portfolio {
    /// Holdings in insertion order
    pub holdings: Vec<Holding>,
    /// Periodic NAV returns since inception, oldest first
    #[serde(default)]
    pub nav_returns: Vec<f64>,
    /// When the portfolio was created
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// When the portfolio was last updated
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Portfolio {
    /// Create a new empty portfolio.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sum of all holding weights.
    pub fn total_weight(&self) -> f64 {
        self.holdings.iter().map(|h| h.weight).sum()
    }

    /// Get the number of holdings.
    pub fn holding_count(&self) -> usize {
        self.holdings.len()
    }
}

/// A dated closing price.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PricePoint {
    /// Trading date
    pub date: NaiveDate,
    /// Closing price
    #[serde(alias = "close")]
    pub price: f64,
}

impl PricePoint {
    /// Create a new price point.
    pub fn new(date: NaiveDate, price: f64) -> Self {
        Self { date, price }
    }
}

/// Time ordering requested from a market data provider.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Oldest first
    Ascending,
    /// Most recent first
    Descending,
}

/// API response wrapper used by the CLI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    /// Create a successful response.
    pub fn ok(data: T) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error: None,
        }
    }

    /// Create an error response.
    pub fn err(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(error.into()),
        }
    }
}
