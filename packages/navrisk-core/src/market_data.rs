//! Market data collaborators and a file-backed implementation.
//!
//! The risk pipeline only sees the [`ReturnsProvider`] and [`PriceProvider`]
//! traits. [`MarketDataStore`] serves both from per-asset close histories.

use crate::types::{PricePoint, SortOrder};
use crate::{Error, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Supplies historical daily returns for an asset.
pub trait ReturnsProvider {
    /// Return at most `window` of the most recent daily returns, ordered per `order`.
    fn get_returns(&self, isin: &str, order: SortOrder, window: usize) -> Result<Vec<f64>>;
}

/// Supplies historical prices for an asset.
pub trait PriceProvider {
    /// Return at most `window` of the most recent dated prices, ordered per `order`.
    fn get_prices(&self, isin: &str, order: SortOrder, window: usize) -> Result<Vec<PricePoint>>;
}

/// In-memory close price histories keyed by ISIN.
///
/// File format: `{ "<ISIN>": [{ "date": "YYYY-MM-DD", "close": 101.2 }, ...] }`.
/// Histories are kept sorted by date regardless of file order.
#[derive(Debug, Clone, Default)]
pub struct MarketDataStore {
    histories: BTreeMap<String, Vec<PricePoint>>,
}

impl MarketDataStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load histories from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let raw: BTreeMap<String, Vec<PricePoint>> = serde_json::from_str(&content)?;

        let mut store = Self::new();
        for (isin, history) in raw {
            store.insert_history(&isin, history);
        }
        tracing::debug!(
            "Loaded market data for {} assets from {}",
            store.asset_count(),
            path.display()
        );
        Ok(store)
    }

    /// Insert or replace the history of an asset.
    pub fn insert_history(&mut self, isin: &str, mut history: Vec<PricePoint>) {
        history.sort_by_key(|p| p.date);
        self.histories.insert(isin.trim().to_uppercase(), history);
    }

    /// Builder-style variant of [`MarketDataStore::insert_history`].
    pub fn with_history(mut self, isin: &str, history: Vec<PricePoint>) -> Self {
        self.insert_history(isin, history);
        self
    }

    /// Number of assets with a history.
    pub fn asset_count(&self) -> usize {
        self.histories.len()
    }

    fn history(&self, isin: &str) -> Result<&[PricePoint]> {
        let isin_upper = isin.trim().to_uppercase();
        self.histories
            .get(&isin_upper)
            .map(Vec::as_slice)
            .ok_or(Error::AssetNotFound(isin_upper))
    }
}

/// Keep the last `window` items of a chronological series, then apply `order`.
fn tail_in_order<T: Clone>(chronological: &[T], order: SortOrder, window: usize) -> Vec<T> {
    let start = chronological.len().saturating_sub(window);
    let mut tail = chronological[start..].to_vec();
    if order == SortOrder::Descending {
        tail.reverse();
    }
    tail
}

impl PriceProvider for MarketDataStore {
    fn get_prices(&self, isin: &str, order: SortOrder, window: usize) -> Result<Vec<PricePoint>> {
        Ok(tail_in_order(self.history(isin)?, order, window))
    }
}

impl ReturnsProvider for MarketDataStore {
    fn get_returns(&self, isin: &str, order: SortOrder, window: usize) -> Result<Vec<f64>> {
        let history = self.history(isin)?;
        let returns: Vec<f64> = history
            .windows(2)
            .map(|pair| pair[1].price / pair[0].price - 1.0)
            .collect();
        Ok(tail_in_order(&returns, order, window))
    }
}
