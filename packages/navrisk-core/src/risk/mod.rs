//! Portfolio risk metrics.
//!
//! The pipeline runs in a fixed order, each stage feeding the next:
//!
//! 1. NAV volatility from the holdings' NAV history
//! 2. Return matrix assembly from the returns provider
//! 3. Covariance matrix, portfolio variance and volatility
//! 4. Annualized portfolio return and Sharpe ratio
//! 5. Historical VaR from simulated portfolio values
//!
//! [`RiskSnapshot`] runs the whole pipeline; the stages are also usable on their own.

mod covariance;
mod returns;
mod sharpe;
mod snapshot;
mod var;

pub use covariance::{sample_std, CovarianceMatrix};
pub use returns::{assemble_return_matrix, ReturnMatrix};
pub use sharpe::{
    annualize_mean_return, annualized_portfolio_return, sharpe_ratio, TRADING_DAYS_PER_YEAR,
};
pub use snapshot::{
    nav_volatility, RiskSnapshot, SnapshotParams, DEFAULT_LOOKBACK_DAYS, DEFAULT_VAR_PERCENTILE,
};
pub use var::{
    historical_value_at_risk, monetary_changes, percentile_index, portfolio_market_values,
    VarMethod,
};
