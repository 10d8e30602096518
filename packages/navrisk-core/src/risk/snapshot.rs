//! Risk snapshot orchestration.

use super::covariance::{sample_std, CovarianceMatrix};
use super::returns::{assemble_return_matrix, ReturnMatrix};
use super::sharpe::{annualized_portfolio_return, sharpe_ratio};
use super::var::{historical_value_at_risk, VarMethod};
use crate::holdings::{HoldingsSource, HoldingsStore};
use crate::market_data::{PriceProvider, ReturnsProvider};
use crate::types::Holding;
use crate::{Error, Result};
use serde::Serialize;
use std::path::Path;

/// Default number of daily observations used by the pipeline.
pub const DEFAULT_LOOKBACK_DAYS: usize = 500;

/// Default VaR percentile.
pub const DEFAULT_VAR_PERCENTILE: f64 = 5.0;

/// Parameters of a snapshot computation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapshotParams {
    /// Risk-free rate the Sharpe ratio is measured against
    pub risk_free_rate: f64,
    /// Number of most recent observations requested per asset
    pub lookback_days: usize,
    /// VaR method
    pub var_method: VarMethod,
    /// VaR percentile in `[0, 100]`
    pub var_percentile: f64,
}

impl SnapshotParams {
    /// Parameters with the given risk-free rate and defaults elsewhere.
    pub fn new(risk_free_rate: f64) -> Self {
        Self {
            risk_free_rate,
            lookback_days: DEFAULT_LOOKBACK_DAYS,
            var_method: VarMethod::Historical,
            var_percentile: DEFAULT_VAR_PERCENTILE,
        }
    }

    pub fn with_lookback(mut self, lookback_days: usize) -> Self {
        self.lookback_days = lookback_days;
        self
    }

    pub fn with_var(mut self, method: VarMethod, percentile: f64) -> Self {
        self.var_method = method;
        self.var_percentile = percentile;
        self
    }
}

impl Default for SnapshotParams {
    fn default() -> Self {
        Self::new(0.0)
    }
}

/// Sample standard deviation of the NAV return history.
///
/// `None` when fewer than two returns are available.
pub fn nav_volatility(nav_returns: &[f64]) -> Option<f64> {
    sample_std(nav_returns)
}

/// Immutable set of portfolio risk metrics.
///
/// Every field is computed once in the constructor, in order: NAV volatility,
/// return matrix, covariance and portfolio volatility, Sharpe ratio, VaR.
/// Any failing stage aborts construction.
#[derive(Debug, Clone, Serialize)]
pub struct RiskSnapshot {
    #[serde(skip)]
    holdings: Vec<Holding>,
    lookback_days: usize,
    risk_free_rate: f64,
    nav_volatility: Option<f64>,
    #[serde(skip)]
    returns: ReturnMatrix,
    #[serde(skip)]
    covariance: CovarianceMatrix,
    weights: Vec<f64>,
    asset_variances: Vec<(String, f64)>,
    mean_returns: Vec<f64>,
    annualized_portfolio_volatility: f64,
    annualized_portfolio_return: f64,
    portfolio_sharpe_ratio: f64,
    var_method: VarMethod,
    var_percentile: f64,
    portfolio_value_at_risk: f64,
}

impl RiskSnapshot {
    /// Compute a snapshot with the default VaR settings.
    ///
    /// # Arguments
    ///
    /// * `risk_free_rate` - Rate the Sharpe ratio is measured against
    /// * `holdings` - Holdings and NAV history, copied into the snapshot
    /// * `returns` - Daily return source
    /// * `prices` - Price source for the VaR simulation
    /// * `lookback_days` - Observations requested per asset
    pub fn new<H, R, P>(
        risk_free_rate: f64,
        holdings: &H,
        returns: &R,
        prices: &P,
        lookback_days: usize,
    ) -> Result<Self>
    where
        H: HoldingsSource + ?Sized,
        R: ReturnsProvider + ?Sized,
        P: PriceProvider + ?Sized,
    {
        let params = SnapshotParams::new(risk_free_rate).with_lookback(lookback_days);
        Self::with_params(&params, holdings, returns, prices)
    }

    /// Load holdings from `holdings_path` (default store path when `None`) and compute.
    pub fn from_path<R, P>(
        risk_free_rate: f64,
        holdings_path: Option<&Path>,
        returns: &R,
        prices: &P,
        lookback_days: usize,
    ) -> Result<Self>
    where
        R: ReturnsProvider + ?Sized,
        P: PriceProvider + ?Sized,
    {
        let store = HoldingsStore::load(holdings_path)?;
        Self::new(risk_free_rate, &store, returns, prices, lookback_days)
    }

    /// Compute a snapshot with explicit parameters.
    pub fn with_params<H, R, P>(
        params: &SnapshotParams,
        source: &H,
        returns: &R,
        prices: &P,
    ) -> Result<Self>
    where
        H: HoldingsSource + ?Sized,
        R: ReturnsProvider + ?Sized,
        P: PriceProvider + ?Sized,
    {
        let holdings = source.holdings().to_vec();
        if holdings.is_empty() {
            return Err(Error::InsufficientData("Portfolio has no holdings".to_string()));
        }

        let total_weight: f64 = holdings.iter().map(|h| h.weight).sum();
        if (total_weight - 1.0).abs() > 1e-6 {
            tracing::warn!("Holding weights sum to {:.6}, not 1", total_weight);
        }

        let nav_volatility = nav_volatility(source.nav_returns());
        if nav_volatility.is_none() {
            tracing::warn!(
                "NAV history has {} returns, volatility needs at least 2",
                source.nav_returns().len()
            );
        }
        tracing::debug!("NAV volatility: {:?}", nav_volatility);

        let returns = assemble_return_matrix(&holdings, returns, params.lookback_days)?;
        tracing::debug!(
            "Assembled return matrix: {} assets x {} observations",
            returns.asset_count(),
            returns.observation_count()
        );

        let weights: Vec<f64> = holdings.iter().map(|h| h.weight).collect();
        let covariance = CovarianceMatrix::from_returns(&returns)?;
        let annualized_portfolio_volatility = covariance.portfolio_volatility(&weights)?;
        let asset_variances = covariance.asset_variances();
        tracing::debug!("Portfolio volatility: {:.6}", annualized_portfolio_volatility);

        let mean_returns = returns.mean_returns();
        let annualized_portfolio_return = annualized_portfolio_return(&mean_returns, &weights)?;
        let portfolio_sharpe_ratio = sharpe_ratio(
            annualized_portfolio_return,
            annualized_portfolio_volatility,
            params.risk_free_rate,
        )?;
        tracing::debug!("Sharpe ratio: {:.4}", portfolio_sharpe_ratio);

        let portfolio_value_at_risk = historical_value_at_risk(
            &holdings,
            prices,
            params.lookback_days,
            params.var_method,
            params.var_percentile,
        )?;

        tracing::info!(
            "Risk snapshot computed for {} holdings over {} days",
            holdings.len(),
            params.lookback_days
        );

        Ok(Self {
            holdings,
            lookback_days: params.lookback_days,
            risk_free_rate: params.risk_free_rate,
            nav_volatility,
            returns,
            covariance,
            weights,
            asset_variances,
            mean_returns,
            annualized_portfolio_volatility,
            annualized_portfolio_return,
            portfolio_sharpe_ratio,
            var_method: params.var_method,
            var_percentile: params.var_percentile,
            portfolio_value_at_risk,
        })
    }

    /// Recompute VaR for the snapshot's holdings and lookback with another method or percentile.
    ///
    /// The snapshot itself is left untouched whatever the outcome.
    pub fn value_at_risk<P>(&self, prices: &P, method: VarMethod, percentile: f64) -> Result<f64>
    where
        P: PriceProvider + ?Sized,
    {
        historical_value_at_risk(
            &self.holdings,
            prices,
            self.lookback_days,
            method,
            percentile,
        )
    }

    pub fn holdings(&self) -> &[Holding] {
        &self.holdings
    }

    pub fn lookback_days(&self) -> usize {
        self.lookback_days
    }

    pub fn risk_free_rate(&self) -> f64 {
        self.risk_free_rate
    }

    /// Sample standard deviation of NAV returns, if at least two exist.
    pub fn nav_volatility(&self) -> Option<f64> {
        self.nav_volatility
    }

    pub fn return_matrix(&self) -> &ReturnMatrix {
        &self.returns
    }

    pub fn covariance_matrix(&self) -> &CovarianceMatrix {
        &self.covariance
    }

    /// Weights in holding order.
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Per-asset return variance, in holding order.
    pub fn asset_variances(&self) -> &[(String, f64)] {
        &self.asset_variances
    }

    /// Variance of a single asset.
    pub fn asset_variance(&self, isin: &str) -> Option<f64> {
        let isin_upper = isin.trim().to_uppercase();
        self.asset_variances
            .iter()
            .find(|(asset, _)| *asset == isin_upper)
            .map(|(_, variance)| *variance)
    }

    /// Mean daily return per asset, in holding order.
    pub fn mean_returns(&self) -> &[f64] {
        &self.mean_returns
    }

    /// Square root of the portfolio variance, at the periodicity of the return series.
    pub fn annualized_portfolio_volatility(&self) -> f64 {
        self.annualized_portfolio_volatility
    }

    pub fn annualized_portfolio_return(&self) -> f64 {
        self.annualized_portfolio_return
    }

    pub fn portfolio_sharpe_ratio(&self) -> f64 {
        self.portfolio_sharpe_ratio
    }

    pub fn var_method(&self) -> VarMethod {
        self.var_method
    }

    pub fn var_percentile(&self) -> f64 {
        self.var_percentile
    }

    /// VaR in monetary units.
    pub fn portfolio_value_at_risk(&self) -> f64 {
        self.portfolio_value_at_risk
    }
}
