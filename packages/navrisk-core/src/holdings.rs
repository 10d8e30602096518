//! Portfolio holdings source and JSON persistence.

use crate::types::{Holding, Portfolio};
use crate::{Error, Result};
use chrono::Utc;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Source of portfolio holdings and NAV history consumed by the risk pipeline.
///
/// Holdings must be yielded in a stable order: it defines the row order of
/// the return matrix and the order of the weight vector.
pub trait HoldingsSource {
    /// Holdings in portfolio order.
    fn holdings(&self) -> &[Holding];

    /// Periodic NAV returns since inception.
    fn nav_returns(&self) -> &[f64];
}

impl HoldingsSource for Portfolio {
    fn holdings(&self) -> &[Holding] {
        &self.holdings
    }

    fn nav_returns(&self) -> &[f64] {
        &self.nav_returns
    }
}

/// Holdings store that manages a portfolio and persists it to JSON.
#[derive(Debug)]
pub struct HoldingsStore {
    /// Path to the portfolio JSON file
    path: PathBuf,
    /// In-memory portfolio state
    portfolio: Portfolio,
}

impl HoldingsStore {
    /// Create a store with the default path.
    ///
    /// Default path: `~/.navrisk/portfolio.json`
    /// Can be overridden with `NAVRISK_PORTFOLIO_FILE` environment variable.
    /// An unreadable file yields an empty portfolio; use [`HoldingsStore::load`]
    /// to surface the error instead.
    pub fn new() -> Self {
        Self::with_path(Self::default_path())
    }

    /// Create a store with a custom path.
    pub fn with_path(path: PathBuf) -> Self {
        let portfolio = Self::load_from_path(&path).unwrap_or_else(|e| {
            tracing::warn!("Failed to load holdings from {}: {}", path.display(), e);
            Portfolio::default()
        });
        Self { path, portfolio }
    }

    /// Open a store, propagating read and parse errors.
    ///
    /// `None` resolves to [`HoldingsStore::default_path`].
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(Self::default_path);
        let portfolio = Self::load_from_path(&path)?;
        tracing::debug!(
            "Loaded {} holdings from {}",
            portfolio.holding_count(),
            path.display()
        );
        Ok(Self { path, portfolio })
    }

    /// Create an in-memory store (no persistence).
    pub fn in_memory() -> Self {
        Self {
            path: PathBuf::new(),
            portfolio: Portfolio::default(),
        }
    }

    /// Get the default portfolio file path.
    pub fn default_path() -> PathBuf {
        if let Ok(path) = env::var("NAVRISK_PORTFOLIO_FILE") {
            return PathBuf::from(path);
        }

        directories::BaseDirs::new()
            .map(|dirs| dirs.home_dir().join(".navrisk/portfolio.json"))
            .unwrap_or_else(|| PathBuf::from("portfolio.json"))
    }

    /// Get the current path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load_from_path(path: &Path) -> Result<Portfolio> {
        if !path.exists() {
            return Ok(Portfolio::default());
        }

        let content = fs::read_to_string(path)?;
        let data: serde_json::Value = serde_json::from_str(&content)?;

        // A bare list is a holdings-only file
        let mut portfolio = if data.is_array() {
            Portfolio {
                holdings: serde_json::from_value(data)?,
                ..Default::default()
            }
        } else {
            serde_json::from_value(data)?
        };

        for holding in &mut portfolio.holdings {
            holding.isin = holding.isin.trim().to_uppercase();
        }
        Ok(portfolio)
    }

    /// Save the current portfolio to disk.
    pub fn save(&mut self) -> Result<()> {
        if self.path.as_os_str().is_empty() {
            return Ok(());
        }

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        if self.portfolio.created_at.is_none() {
            self.portfolio.created_at = Some(Utc::now());
        }
        self.portfolio.updated_at = Some(Utc::now());

        let content = serde_json::to_string_pretty(&self.portfolio)?;
        fs::write(&self.path, content)?;
        Ok(())
    }

    /// Reload the portfolio from disk.
    pub fn reload(&mut self) -> Result<()> {
        self.portfolio = Self::load_from_path(&self.path)?;
        Ok(())
    }

    /// Get a reference to the current portfolio.
    pub fn get(&self) -> &Portfolio {
        &self.portfolio
    }

    /// Find a holding by ISIN (case insensitive).
    pub fn find_holding(&self, isin: &str) -> Option<&Holding> {
        let isin_upper = isin.trim().to_uppercase();
        self.portfolio.holdings.iter().find(|h| h.isin == isin_upper)
    }

    /// Add or replace a holding.
    ///
    /// An existing holding keeps its position in the portfolio order.
    /// Returns the stored holding and whether it replaced an existing one.
    pub fn add_holding(&mut self, isin: &str, weight: f64, quantity: f64) -> (Holding, bool) {
        let holding = Holding::new(isin, weight, quantity);

        if let Some(existing) = self
            .portfolio
            .holdings
            .iter_mut()
            .find(|h| h.isin == holding.isin)
        {
            *existing = holding.clone();
            (holding, true)
        } else {
            self.portfolio.holdings.push(holding.clone());
            (holding, false)
        }
    }

    /// Remove a holding from the portfolio.
    pub fn remove_holding(&mut self, isin: &str) -> Result<Holding> {
        let isin_upper = isin.trim().to_uppercase();

        match self
            .portfolio
            .holdings
            .iter()
            .position(|h| h.isin == isin_upper)
        {
            Some(idx) => Ok(self.portfolio.holdings.remove(idx)),
            None => Err(Error::HoldingNotFound(isin_upper)),
        }
    }

    /// Replace the NAV return history.
    pub fn set_nav_returns(&mut self, nav_returns: Vec<f64>) {
        self.portfolio.nav_returns = nav_returns;
    }

    /// ISIN and weight pairs in portfolio order.
    pub fn weights(&self) -> Vec<(String, f64)> {
        self.portfolio
            .holdings
            .iter()
            .map(|h| (h.isin.clone(), h.weight))
            .collect()
    }

    /// ISIN and quantity pairs in portfolio order.
    pub fn quantities(&self) -> Vec<(String, f64)> {
        self.portfolio
            .holdings
            .iter()
            .map(|h| (h.isin.clone(), h.quantity))
            .collect()
    }

    /// Sum of all holding weights.
    pub fn total_weight(&self) -> f64 {
        self.portfolio.total_weight()
    }
}

impl Default for HoldingsStore {
    fn default() -> Self {
        Self::new()
    }
}

impl HoldingsSource for HoldingsStore {
    fn holdings(&self) -> &[Holding] {
        &self.portfolio.holdings
    }

    fn nav_returns(&self) -> &[f64] {
        &self.portfolio.nav_returns
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_add_new_holding() {
        let mut store = HoldingsStore::in_memory();
        let (holding, was_update) = store.add_holding("fr0000120271", 0.5, 100.0);

        assert!(!was_update);
        assert_eq!(holding.isin, "FR0000120271");
        assert_eq!(store.holdings().len(), 1);
    }

    #[test]
    fn test_add_holding_replaces_in_place() {
        let mut store = HoldingsStore::in_memory();
        store.add_holding("FR0000120271", 0.5, 100.0);
        store.add_holding("FR0000131104", 0.5, 40.0);

        let (holding, was_update) = store.add_holding("fr0000120271", 0.3, 60.0);

        assert!(was_update);
        assert_eq!(holding.quantity, 60.0);
        assert_eq!(store.holdings().len(), 2);
        // Order is preserved
        assert_eq!(store.holdings()[0].isin, "FR0000120271");
        assert_eq!(store.holdings()[0].weight, 0.3);
        assert_eq!(store.holdings()[1].isin, "FR0000131104");
    }

    #[test]
    fn test_remove_holding() {
        let mut store = HoldingsStore::in_memory();
        store.add_holding("FR0000120271", 0.5, 100.0);
        store.add_holding("FR0000131104", 0.5, 40.0);

        let removed = store.remove_holding("FR0000120271").unwrap();
        assert_eq!(removed.isin, "FR0000120271");
        assert_eq!(store.holdings().len(), 1);
        assert_eq!(store.holdings()[0].isin, "FR0000131104");
    }

    #[test]
    fn test_remove_holding_not_found() {
        let mut store = HoldingsStore::in_memory();
        let result = store.remove_holding("FR0000120271");
        assert!(matches!(result, Err(Error::HoldingNotFound(_))));
    }

    #[test]
    fn test_weights_and_quantities_follow_insertion_order() {
        let mut store = HoldingsStore::in_memory();
        store.add_holding("ZZ0000000001", 0.2, 1.0);
        store.add_holding("AA0000000002", 0.8, 2.0);

        let weights = store.weights();
        assert_eq!(weights[0], ("ZZ0000000001".to_string(), 0.2));
        assert_eq!(weights[1], ("AA0000000002".to_string(), 0.8));

        let quantities = store.quantities();
        assert_eq!(quantities[1], ("AA0000000002".to_string(), 2.0));
        assert!((store.total_weight() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_persistence() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/portfolio.json");

        {
            let mut store = HoldingsStore::with_path(path.clone());
            store.add_holding("FR0000120271", 0.5, 100.0);
            store.set_nav_returns(vec![0.01, -0.02, 0.005]);
            store.save().unwrap();
        }

        {
            let store = HoldingsStore::load(Some(path.as_path())).unwrap();
            assert_eq!(store.holdings().len(), 1);
            assert_eq!(store.nav_returns(), &[0.01, -0.02, 0.005]);
            assert!(store.get().created_at.is_some());
            assert!(store.get().updated_at.is_some());
        }
    }

    #[test]
    fn test_load_holdings_only_list() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("portfolio.json");
        fs::write(
            &path,
            r#"[{"isin": "FR0000120271", "weight": 1.0, "quantity": 3.0}]"#,
        )
        .unwrap();

        let store = HoldingsStore::load(Some(path.as_path())).unwrap();
        assert_eq!(store.holdings().len(), 1);
        assert!(store.nav_returns().is_empty());
    }

    #[test]
    fn test_load_uppercases_isins() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("portfolio.json");
        fs::write(
            &path,
            r#"{"holdings": [{"isin": " fr0000120271", "weight": 1.0, "quantity": 3.0}]}"#,
        )
        .unwrap();

        let mut store = HoldingsStore::load(Some(path.as_path())).unwrap();
        assert_eq!(store.holdings()[0].isin, "FR0000120271");

        let found = store.find_holding("fr0000120271").unwrap();
        assert_eq!(found.quantity, 3.0);

        let (_, was_update) = store.add_holding("fr0000120271", 0.5, 1.0);
        assert!(was_update);
        assert_eq!(store.holdings().len(), 1);
    }

    #[test]
    fn test_find_holding() {
        let mut store = HoldingsStore::in_memory();
        store.add_holding("FR0000120271", 0.5, 100.0);

        assert_eq!(store.find_holding(" fr0000120271 ").unwrap().weight, 0.5);
        assert!(store.find_holding("FR0000131104").is_none());
    }

    #[test]
    fn test_reload_discards_unsaved_changes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("portfolio.json");

        let mut store = HoldingsStore::with_path(path.clone());
        assert_eq!(store.path(), path.as_path());
        store.add_holding("FR0000120271", 1.0, 10.0);
        store.save().unwrap();

        store.add_holding("FR0000131104", 0.5, 4.0);
        store.set_nav_returns(vec![0.01, 0.02]);
        assert_eq!(store.holdings().len(), 2);

        store.reload().unwrap();
        assert_eq!(store.holdings().len(), 1);
        assert_eq!(store.holdings()[0].isin, "FR0000120271");
        assert!(store.nav_returns().is_empty());
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = tempdir().unwrap();
        let store = HoldingsStore::load(Some(dir.path().join("absent.json").as_path())).unwrap();
        assert!(store.holdings().is_empty());
    }

    #[test]
    fn test_load_malformed_file_errors() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("portfolio.json");
        fs::write(&path, "{ not json").unwrap();

        assert!(matches!(HoldingsStore::load(Some(path.as_path())), Err(Error::Json(_))));
        // The lenient constructor falls back to an empty portfolio
        assert!(HoldingsStore::with_path(path).holdings().is_empty());
    }

    #[test]
    fn test_in_memory_save_is_noop() {
        let mut store = HoldingsStore::in_memory();
        store.add_holding("FR0000120271", 1.0, 1.0);
        store.save().unwrap();
        assert!(store.get().updated_at.is_none());
    }
}
