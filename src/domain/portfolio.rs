// ============================================================================
// Portfolio Series and Metrics
// Aligned return series and the risk metrics derived from them
// ============================================================================

use crate::numeric::{ensure_finite, CalculationError, CalculationResult};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Minimum observations for a sample (n - 1) statistic.
pub const MIN_OBSERVATIONS: usize = 2;

/// Portfolio returns paired with benchmark market returns.
///
/// Both series hold periodic returns as decimal fractions, are of equal
/// length and contain at least two observations.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(try_from = "RawSeries")
)]
pub struct PortfolioSeries {
    returns: Vec<f64>,
    market_returns: Vec<f64>,
}

/// Unvalidated wire form; deserialization goes through [`PortfolioSeries::new`].
#[cfg(feature = "serde")]
#[derive(Deserialize)]
struct RawSeries {
    returns: Vec<f64>,
    market_returns: Vec<f64>,
}

#[cfg(feature = "serde")]
impl TryFrom<RawSeries> for PortfolioSeries {
    type Error = CalculationError;

    fn try_from(raw: RawSeries) -> CalculationResult<Self> {
        Self::new(raw.returns, raw.market_returns)
    }
}

impl PortfolioSeries {
    /// Validate and build a series pair.
    ///
    /// # Errors
    /// - `SeriesLengthMismatch` when the lengths differ
    /// - `InsufficientObservations` when fewer than two returns are given
    /// - `NonFiniteInput` when any return is NaN or infinite
    pub fn new(returns: Vec<f64>, market_returns: Vec<f64>) -> CalculationResult<Self> {
        if returns.len() != market_returns.len() {
            return Err(CalculationError::SeriesLengthMismatch {
                portfolio: returns.len(),
                market: market_returns.len(),
            });
        }
        if returns.len() < MIN_OBSERVATIONS {
            return Err(CalculationError::InsufficientObservations {
                required: MIN_OBSERVATIONS,
                actual: returns.len(),
            });
        }
        for &r in &returns {
            ensure_finite("returns", r)?;
        }
        for &r in &market_returns {
            ensure_finite("market_returns", r)?;
        }

        Ok(Self {
            returns,
            market_returns,
        })
    }

    /// Build from borrowed slices.
    pub fn from_slices(returns: &[f64], market_returns: &[f64]) -> CalculationResult<Self> {
        Self::new(returns.to_vec(), market_returns.to_vec())
    }

    #[inline]
    pub fn returns(&self) -> &[f64] {
        &self.returns
    }

    #[inline]
    pub fn market_returns(&self) -> &[f64] {
        &self.market_returns
    }

    /// Number of observations in each series.
    #[inline]
    pub fn len(&self) -> usize {
        self.returns.len()
    }

    /// Always false for a validated series; present for API symmetry.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.returns.is_empty()
    }
}

/// Risk metrics for a portfolio against its benchmark.
///
/// `sharpe_ratio` is `None` when volatility is zero and `beta` is `None`
/// when market variance is zero: the ratio is undefined, which is distinct
/// from a ratio of zero.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PortfolioMetrics {
    /// Arithmetic mean of the portfolio returns
    pub average_return: f64,
    /// Sample standard deviation (n - 1) of the portfolio returns
    pub volatility: f64,
    /// Excess return per unit of volatility
    pub sharpe_ratio: Option<f64>,
    /// Sensitivity of portfolio returns to market returns
    pub beta: Option<f64>,
    /// Sample covariance (n - 1) between portfolio and market returns
    pub covariance: f64,
    /// Sample variance (n - 1) of the market returns
    pub market_variance: f64,
}
