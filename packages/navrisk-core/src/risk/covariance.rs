//! Sample covariance and portfolio variance.

use super::returns::ReturnMatrix;
use crate::{Error, Result};

/// Largest negative variance treated as floating-point noise.
const VARIANCE_TOLERANCE: f64 = 1e-15;

/// Square, symmetric covariance matrix indexed in return-matrix row order.
#[derive(Debug, Clone, PartialEq)]
pub struct CovarianceMatrix {
    assets: Vec<String>,
    values: Vec<Vec<f64>>,
}

impl CovarianceMatrix {
    /// Unbiased sample covariance (denominator N-1) of the matrix rows.
    ///
    /// Requires at least two observations per asset.
    pub fn from_returns(returns: &ReturnMatrix) -> Result<Self> {
        let n = returns.asset_count();
        let observations = returns.observation_count();

        if n == 0 {
            return Err(Error::InsufficientData(
                "Covariance needs at least one asset".to_string(),
            ));
        }
        if observations < 2 {
            return Err(Error::InsufficientData(format!(
                "Covariance needs at least 2 observations per asset, got {}",
                observations
            )));
        }

        let rows = returns.rows();
        let means = returns.mean_returns();
        let denominator = observations as f64 - 1.0;

        let mut values = vec![vec![0.0; n]; n];
        for i in 0..n {
            for j in i..n {
                let sum: f64 = rows[i]
                    .iter()
                    .zip(&rows[j])
                    .map(|(a, b)| (a - means[i]) * (b - means[j]))
                    .sum();
                let covariance = sum / denominator;
                values[i][j] = covariance;
                values[j][i] = covariance;
            }
        }

        Ok(Self {
            assets: returns.assets().to_vec(),
            values,
        })
    }

    /// Asset identifiers in matrix order.
    pub fn assets(&self) -> &[String] {
        &self.assets
    }

    /// Raw matrix values.
    pub fn values(&self) -> &[Vec<f64>] {
        &self.values
    }

    /// Matrix dimension.
    pub fn dim(&self) -> usize {
        self.values.len()
    }

    /// Entry at row `i`, column `j`.
    pub fn get(&self, i: usize, j: usize) -> Option<f64> {
        self.values.get(i).and_then(|row| row.get(j)).copied()
    }

    /// Diagonal as (asset, variance) pairs in matrix order.
    pub fn asset_variances(&self) -> Vec<(String, f64)> {
        self.assets
            .iter()
            .enumerate()
            .map(|(i, asset)| (asset.clone(), self.values[i][i]))
            .collect()
    }

    /// Portfolio variance `w · C · wᵀ`.
    pub fn portfolio_variance(&self, weights: &[f64]) -> Result<f64> {
        if weights.len() != self.dim() {
            return Err(Error::InvalidOperation(format!(
                "Expected {} weights, got {}",
                self.dim(),
                weights.len()
            )));
        }

        let mut variance = 0.0;
        for (i, wi) in weights.iter().enumerate() {
            for (j, wj) in weights.iter().enumerate() {
                variance += wi * wj * self.values[i][j];
            }
        }

        Ok(variance)
    }

    /// Square root of the portfolio variance.
    ///
    /// No frequency scaling is applied: the volatility has the periodicity of
    /// the supplied return series. A variance within rounding noise of zero
    /// (down to `-1e-15`) yields zero; anything more negative is an error.
    pub fn portfolio_volatility(&self, weights: &[f64]) -> Result<f64> {
        let variance = self.portfolio_variance(weights)?;
        if variance < -VARIANCE_TOLERANCE {
            return Err(Error::InvalidOperation(format!(
                "Negative portfolio variance {}",
                variance
            )));
        }
        Ok(variance.max(0.0).sqrt())
    }
}

/// Sample standard deviation (denominator N-1).
///
/// Returns `None` for fewer than two observations.
pub fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }

    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    Some(variance.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn matrix(rows: Vec<(&str, Vec<f64>)>) -> ReturnMatrix {
        ReturnMatrix::from_rows(
            rows.into_iter()
                .map(|(isin, r)| (isin.to_string(), r))
                .collect(),
        )
        .unwrap()
    }

    fn mixed_matrix() -> ReturnMatrix {
        matrix(vec![
            ("AAA", vec![0.012, -0.004, 0.007, -0.011, 0.003, 0.009]),
            ("BBB", vec![-0.006, 0.010, 0.002, 0.004, -0.008, 0.001]),
            ("CCC", vec![0.020, -0.015, 0.011, -0.019, 0.006, 0.014]),
        ])
    }

    #[test]
    fn test_two_identical_assets() {
        let returns = matrix(vec![("AAA", vec![0.02, -0.02]), ("BBB", vec![0.02, -0.02])]);
        let cov = CovarianceMatrix::from_returns(&returns).unwrap();

        assert_relative_eq!(cov.values()[0][0], 0.0008, epsilon = 1e-15);
        assert_relative_eq!(cov.values()[1][1], 0.0008, epsilon = 1e-15);
        assert_relative_eq!(cov.values()[0][1], 0.0008, epsilon = 1e-15);

        let variance = cov.portfolio_variance(&[0.5, 0.5]).unwrap();
        assert_relative_eq!(variance, 0.0008, epsilon = 1e-15);

        let volatility = cov.portfolio_volatility(&[0.5, 0.5]).unwrap();
        assert_relative_eq!(volatility, 0.0008_f64.sqrt(), epsilon = 1e-12);
        assert_relative_eq!(volatility, 0.02828, epsilon = 1e-5);
    }

    #[test]
    fn test_symmetry() {
        let cov = CovarianceMatrix::from_returns(&mixed_matrix()).unwrap();

        for i in 0..cov.dim() {
            for j in 0..cov.dim() {
                assert_relative_eq!(cov.values()[i][j], cov.values()[j][i], epsilon = 1e-15);
            }
        }
    }

    #[test]
    fn test_asset_variances_match_diagonal() {
        let returns = mixed_matrix();
        let cov = CovarianceMatrix::from_returns(&returns).unwrap();
        let variances = cov.asset_variances();

        assert_eq!(variances.len(), 3);
        for (i, (asset, variance)) in variances.iter().enumerate() {
            assert_eq!(asset, &returns.assets()[i]);
            assert_eq!(*variance, cov.values()[i][i]);
            let std = sample_std(&returns.rows()[i]).unwrap();
            assert_relative_eq!(*variance, std * std, epsilon = 1e-15);
        }
    }

    #[test]
    fn test_portfolio_variance_non_negative() {
        let cov = CovarianceMatrix::from_returns(&mixed_matrix()).unwrap();

        let weight_sets: [[f64; 3]; 5] = [
            [1.0, 0.0, 0.0],
            [0.3, 0.3, 0.4],
            [1.5, -0.5, 0.0],
            [-1.0, 2.0, -0.7],
            [0.0, 0.0, 0.0],
        ];
        for weights in weight_sets {
            let variance = cov.portfolio_variance(&weights).unwrap();
            assert!(variance >= -1e-18, "variance {} for {:?}", variance, weights);
        }
    }

    #[test]
    fn test_weight_length_mismatch() {
        let cov = CovarianceMatrix::from_returns(&mixed_matrix()).unwrap();
        let result = cov.portfolio_variance(&[0.5, 0.5]);
        assert!(matches!(result, Err(Error::InvalidOperation(_))));
    }

    #[test]
    fn test_single_observation_is_insufficient() {
        let returns = matrix(vec![("AAA", vec![0.01]), ("BBB", vec![0.02])]);
        let result = CovarianceMatrix::from_returns(&returns);
        assert!(matches!(result, Err(Error::InsufficientData(_))));
    }

    #[test]
    fn test_no_assets_is_insufficient() {
        let returns = ReturnMatrix::from_rows(Vec::new()).unwrap();
        let result = CovarianceMatrix::from_returns(&returns);
        assert!(matches!(result, Err(Error::InsufficientData(_))));
    }

    #[test]
    fn test_volatility_of_zero_variance() {
        let returns = matrix(vec![("AAA", vec![0.0, 0.0, 0.0])]);
        let cov = CovarianceMatrix::from_returns(&returns).unwrap();
        assert_eq!(cov.portfolio_volatility(&[1.0]).unwrap(), 0.0);
    }

    #[test]
    fn test_volatility_rejects_negative_variance() {
        // Not positive semi-definite
        let cov = CovarianceMatrix {
            assets: vec!["AAA".to_string(), "BBB".to_string()],
            values: vec![vec![0.01, 0.02], vec![0.02, 0.01]],
        };
        assert_relative_eq!(cov.portfolio_variance(&[1.0, -1.0]).unwrap(), -0.02, epsilon = 1e-15);
        assert!(matches!(
            cov.portfolio_volatility(&[1.0, -1.0]),
            Err(Error::InvalidOperation(_))
        ));
    }

    #[test]
    fn test_get() {
        let cov = CovarianceMatrix::from_returns(&mixed_matrix()).unwrap();
        assert_eq!(cov.get(0, 2), Some(cov.values()[0][2]));
        assert_eq!(cov.get(3, 0), None);
    }

    #[test]
    fn test_sample_std() {
        // Sample std of [2, 4, 4, 4, 5, 5, 7, 9] with N-1
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_relative_eq!(
            sample_std(&values).unwrap(),
            (32.0_f64 / 7.0).sqrt(),
            epsilon = 1e-12
        );

        assert!(sample_std(&[0.01]).is_none());
        assert!(sample_std(&[]).is_none());
    }
}
