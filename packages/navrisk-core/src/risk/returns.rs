//! Per-asset return matrix assembly.

use crate::market_data::ReturnsProvider;
use crate::types::{Holding, SortOrder};
use crate::{Error, Result};

/// Rectangular matrix of daily returns.
///
/// Rows are assets in holding order, columns are time steps as delivered by
/// the provider (most recent first).
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnMatrix {
    assets: Vec<String>,
    rows: Vec<Vec<f64>>,
}

impl ReturnMatrix {
    /// Stack per-asset return series into a matrix.
    ///
    /// Every series must have the length of the first one.
    pub fn from_rows(series: Vec<(String, Vec<f64>)>) -> Result<Self> {
        let expected = series.first().map(|(_, row)| row.len()).unwrap_or(0);

        if let Some((asset, row)) = series.iter().find(|(_, row)| row.len() != expected) {
            return Err(Error::ShapeMismatch {
                asset: asset.clone(),
                expected,
                actual: row.len(),
            });
        }

        let (assets, rows) = series.into_iter().unzip();
        Ok(Self { assets, rows })
    }

    /// Asset identifiers in row order.
    pub fn assets(&self) -> &[String] {
        &self.assets
    }

    /// Return rows, one per asset.
    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    /// Number of assets.
    pub fn asset_count(&self) -> usize {
        self.rows.len()
    }

    /// Number of observations per asset.
    pub fn observation_count(&self) -> usize {
        self.rows.first().map(Vec::len).unwrap_or(0)
    }

    /// Arithmetic mean of each row.
    pub fn mean_returns(&self) -> Vec<f64> {
        self.rows
            .iter()
            .map(|row| {
                if row.is_empty() {
                    0.0
                } else {
                    row.iter().sum::<f64>() / row.len() as f64
                }
            })
            .collect()
    }
}

/// Fetch one return series per holding and stack them in holding order.
///
/// Each series is requested most-recent-first and truncated to `lookback_days`
/// by the provider. Series are not re-sorted. A provider returning a shorter
/// history for one asset fails the whole assembly with [`Error::ShapeMismatch`].
pub fn assemble_return_matrix<R>(
    holdings: &[Holding],
    provider: &R,
    lookback_days: usize,
) -> Result<ReturnMatrix>
where
    R: ReturnsProvider + ?Sized,
{
    let mut series = Vec::with_capacity(holdings.len());
    for holding in holdings {
        let returns = provider.get_returns(&holding.isin, SortOrder::Descending, lookback_days)?;
        tracing::trace!("Fetched {} returns for {}", returns.len(), holding.isin);
        series.push((holding.isin.clone(), returns));
    }

    ReturnMatrix::from_rows(series)
}
