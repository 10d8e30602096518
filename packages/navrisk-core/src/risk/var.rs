//! Historical Value at Risk from a simulated portfolio value series.

use crate::market_data::PriceProvider;
use crate::types::{Holding, SortOrder};
use crate::{Error, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Value at Risk estimation method.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum VarMethod {
    /// Historical simulation over past price moves
    #[default]
    Historical,
    /// Parametric (variance-covariance). Recognized but not implemented.
    Normal,
}

impl VarMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            VarMethod::Historical => "historical",
            VarMethod::Normal => "normal",
        }
    }
}

impl fmt::Display for VarMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VarMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "historical" => Ok(VarMethod::Historical),
            "normal" => Ok(VarMethod::Normal),
            other => Err(Error::NotSupported(format!("VaR method '{}'", other))),
        }
    }
}

impl TryFrom<String> for VarMethod {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

/// Index selected for a percentile over `count` observations.
///
/// `round(percentile / 100 * count)` with ties rounded to even, so
/// 0.5 maps to 0, 1.5 to 2 and 2.5 to 2.
pub fn percentile_index(percentile: f64, count: usize) -> usize {
    let position = (percentile / 100.0 * count as f64).round_ties_even();
    if position <= 0.0 {
        0
    } else {
        position as usize
    }
}

/// Simulated portfolio market value per date, ascending by date.
///
/// Each holding's prices are multiplied by its quantity. The first holding's
/// price dates form the time axis; another holding's price on a date outside
/// that axis is ignored, and a missing price contributes nothing.
pub fn portfolio_market_values<P>(
    holdings: &[Holding],
    provider: &P,
    lookback_days: usize,
) -> Result<Vec<(NaiveDate, f64)>>
where
    P: PriceProvider + ?Sized,
{
    let mut values: BTreeMap<NaiveDate, f64> = BTreeMap::new();

    for (idx, holding) in holdings.iter().enumerate() {
        let prices = provider.get_prices(&holding.isin, SortOrder::Descending, lookback_days)?;
        tracing::trace!("Fetched {} prices for {}", prices.len(), holding.isin);

        for point in prices {
            let market_value = point.price * holding.quantity;
            if idx == 0 {
                *values.entry(point.date).or_insert(0.0) += market_value;
            } else if let Some(total) = values.get_mut(&point.date) {
                *total += market_value;
            }
        }
    }

    Ok(values.into_iter().collect())
}

/// Monetary change series `value_t * pct_change_t`, without the leading undefined entry.
pub fn monetary_changes(values: &[f64]) -> Vec<f64> {
    values
        .windows(2)
        .map(|pair| pair[1] * (pair[1] / pair[0] - 1.0))
        .collect()
}

/// Portfolio Value at Risk over `lookback_days` of prices.
///
/// The change series is indexed in chronological order at
/// [`percentile_index`]; it is not sorted by magnitude first, so the result
/// is the change observed at that position in time and may be positive.
///
/// # Errors
///
/// * [`Error::NotSupported`] for any method other than [`VarMethod::Historical`]
/// * [`Error::InvalidOperation`] for a percentile outside `[0, 100]`
/// * [`Error::InsufficientData`] when the index falls outside the change series
pub fn historical_value_at_risk<P>(
    holdings: &[Holding],
    provider: &P,
    lookback_days: usize,
    method: VarMethod,
    percentile: f64,
) -> Result<f64>
where
    P: PriceProvider + ?Sized,
{
    match method {
        VarMethod::Historical => {}
        VarMethod::Normal => {
            return Err(Error::NotSupported(
                "parametric (normal) VaR is not implemented".to_string(),
            ))
        }
    }

    if !(0.0..=100.0).contains(&percentile) {
        return Err(Error::InvalidOperation(format!(
            "Percentile must be within [0, 100], got {}",
            percentile
        )));
    }

    let series = portfolio_market_values(holdings, provider, lookback_days)?;
    let values: Vec<f64> = series.iter().map(|(_, value)| *value).collect();
    let changes = monetary_changes(&values);

    let loc = percentile_index(percentile, changes.len());
    changes.get(loc).copied().ok_or_else(|| {
        Error::InsufficientData(format!(
            "Percentile {} selects index {} of {} value changes",
            percentile,
            loc,
            changes.len()
        ))
    })
}
