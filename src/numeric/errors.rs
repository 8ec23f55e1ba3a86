// ============================================================================
// Calculation Errors
// Error types for invalid financial calculation inputs
// ============================================================================

use thiserror::Error;

/// Errors that can occur when a calculation receives ill-formed input.
///
/// Well-formed numeric input never produces an error. Degenerate ratios
/// (zero volatility, zero market variance) are not errors either: they are
/// reported as `None` by the ratio functions.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum CalculationError {
    /// A period count was zero, overflowed when converted to months or
    /// exceeded a schedule limit
    #[error("invalid periods: {name} must be a positive period count within range")]
    InvalidPeriods { name: &'static str },

    /// A compounding frequency of zero was supplied
    #[error("invalid compounding frequency: compounds per period must be at least 1")]
    InvalidCompounding,

    /// A periodic rate at or below -100% makes the growth factor non-positive
    #[error("invalid rate {rate}: periodic rate must be greater than -1")]
    InvalidRate { rate: f64 },

    /// NaN or infinite argument
    #[error("non-finite input: {name} must be a finite number")]
    NonFiniteInput { name: &'static str },

    /// Portfolio and market series differ in length
    #[error("series length mismatch: portfolio has {portfolio} returns, market has {market}")]
    SeriesLengthMismatch { portfolio: usize, market: usize },

    /// The result grows beyond the range of f64
    #[error("result overflow: {name} is too large to represent")]
    Overflow { name: &'static str },

    /// Too few observations for a sample statistic
    #[error("insufficient observations: need at least {required}, got {actual}")]
    InsufficientObservations { required: usize, actual: usize },
}

/// Result type alias for calculation operations
pub type CalculationResult<T> = Result<T, CalculationError>;

/// Reject NaN and infinities for a named argument.
#[inline]
pub(crate) fn ensure_finite(name: &'static str, value: f64) -> CalculationResult<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(CalculationError::NonFiniteInput { name })
    }
}

/// Reject a zero period count for a named argument.
#[inline]
pub(crate) fn ensure_periods(name: &'static str, periods: u32) -> CalculationResult<u32> {
    if periods == 0 {
        Err(CalculationError::InvalidPeriods { name })
    } else {
        Ok(periods)
    }
}

/// Reject rates that make `1 + rate` zero or negative.
#[inline]
pub(crate) fn ensure_rate(name: &'static str, rate: f64) -> CalculationResult<f64> {
    ensure_finite(name, rate)?;
    if rate <= -1.0 {
        Err(CalculationError::InvalidRate { rate })
    } else {
        Ok(rate)
    }
}
