//! Annualized portfolio return and Sharpe ratio.

use crate::{Error, Result};

/// Trading days used to compound a daily mean return into a yearly one.
pub const TRADING_DAYS_PER_YEAR: i32 = 252;

/// Compound a mean daily return over a trading year: `(1 + mean)^252 - 1`.
pub fn annualize_mean_return(mean_daily_return: f64) -> f64 {
    (1.0 + mean_daily_return).powi(TRADING_DAYS_PER_YEAR) - 1.0
}

/// Weighted sum of the annualized per-asset mean returns.
pub fn annualized_portfolio_return(mean_returns: &[f64], weights: &[f64]) -> Result<f64> {
    if mean_returns.len() != weights.len() {
        return Err(Error::InvalidOperation(format!(
            "Expected {} weights, got {}",
            mean_returns.len(),
            weights.len()
        )));
    }

    Ok(mean_returns
        .iter()
        .zip(weights)
        .map(|(mean, weight)| weight * annualize_mean_return(*mean))
        .sum())
}

/// Sharpe ratio of an annualized portfolio return against a risk-free rate.
///
/// # Arguments
///
/// * `annualized_return` - Annualized portfolio return
/// * `volatility` - Portfolio volatility
/// * `risk_free_rate` - Risk-free rate over the same horizon as the return
///
/// # Errors
///
/// [`Error::DivisionByZero`] when `volatility` is zero.
pub fn sharpe_ratio(annualized_return: f64, volatility: f64, risk_free_rate: f64) -> Result<f64> {
    if volatility == 0.0 {
        return Err(Error::DivisionByZero(
            "Sharpe ratio is undefined for zero portfolio volatility".to_string(),
        ));
    }

    Ok((annualized_return - risk_free_rate) / volatility)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_annualize_zero_mean() {
        assert_eq!(annualize_mean_return(0.0), 0.0);
    }

    #[test]
    fn test_annualize_compounds() {
        // 0.1% a day compounds to roughly 28.6% a year
        assert_relative_eq!(
            annualize_mean_return(0.001),
            1.001_f64.powi(252) - 1.0,
            epsilon = 1e-12
        );
        assert!(annualize_mean_return(0.001) > 0.252);
        assert!(annualize_mean_return(-0.001) < 0.0);
    }

    #[test]
    fn test_annualized_portfolio_return_weights() {
        let means = [0.001, -0.0005];
        let weights = [0.7, 0.3];

        let expected = 0.7 * annualize_mean_return(0.001) + 0.3 * annualize_mean_return(-0.0005);
        assert_relative_eq!(
            annualized_portfolio_return(&means, &weights).unwrap(),
            expected,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_annualized_portfolio_return_length_mismatch() {
        let result = annualized_portfolio_return(&[0.001, 0.002], &[1.0]);
        assert!(matches!(result, Err(Error::InvalidOperation(_))));
    }

    #[test]
    fn test_sharpe_zero_excess_return() {
        let sharpe = sharpe_ratio(0.0, 0.0008_f64.sqrt(), 0.0).unwrap();
        assert_eq!(sharpe, 0.0);
    }

    #[test]
    fn test_sharpe_sign() {
        assert!(sharpe_ratio(0.10, 0.2, 0.03).unwrap() > 0.0);
        assert!(sharpe_ratio(0.01, 0.2, 0.03).unwrap() < 0.0);
        assert_relative_eq!(sharpe_ratio(0.10, 0.2, 0.02).unwrap(), 0.4, epsilon = 1e-12);
    }

    #[test]
    fn test_sharpe_is_deterministic() {
        let first = sharpe_ratio(0.1234, 0.0567, 0.015).unwrap();
        let second = sharpe_ratio(0.1234, 0.0567, 0.015).unwrap();
        assert_eq!(first.to_bits(), second.to_bits());
    }

    #[test]
    fn test_sharpe_zero_volatility() {
        let result = sharpe_ratio(0.05, 0.0, 0.02);
        assert!(matches!(result, Err(Error::DivisionByZero(_))));
    }
}
