// ============================================================================
// Numeric Module
// Error taxonomy and input guards for financial calculations
// ============================================================================
//
// This module provides:
// - CalculationError: explicit failure modes for ill-formed input
// - CalculationResult: result alias used by every kernel operation
//
// Design principles:
// - Well-formed input never fails
// - Ill-formed input fails loudly instead of producing NaN
// - Degenerate ratios are reported as `None`, not as errors

mod errors;

pub use errors::{CalculationError, CalculationResult};

pub(crate) use errors::{ensure_finite, ensure_periods, ensure_rate};
