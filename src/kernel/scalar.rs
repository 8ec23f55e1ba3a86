// ============================================================================
// Scalar (Non-SIMD) Implementation
// Portable fallback kernel using standard scalar operations
// ============================================================================

use super::{fold_lanes, LANES};
use crate::interfaces::FinancialKernel;

/// Scalar implementation of the financial kernel.
///
/// This is the fallback implementation that works on all platforms.
/// It keeps four independent accumulators so that its results match the
/// vectorized kernels bit for bit.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScalarKernel;

impl ScalarKernel {
    /// Create a new scalar kernel.
    pub fn new() -> Self {
        Self
    }
}

impl FinancialKernel for ScalarKernel {
    fn sum(&self, values: &[f64]) -> f64 {
        let chunks = values.chunks_exact(LANES);
        let remainder = chunks.remainder();

        let mut acc = [0.0f64; LANES];
        for chunk in chunks {
            for lane in 0..LANES {
                acc[lane] += chunk[lane];
            }
        }

        remainder
            .iter()
            .fold(fold_lanes(acc), |total, &value| total + value)
    }

    fn sum_squared_deviations(&self, values: &[f64], mean: f64) -> f64 {
        let chunks = values.chunks_exact(LANES);
        let remainder = chunks.remainder();

        let mut acc = [0.0f64; LANES];
        for chunk in chunks {
            for lane in 0..LANES {
                let d = chunk[lane] - mean;
                acc[lane] += d * d;
            }
        }

        remainder.iter().fold(fold_lanes(acc), |total, &value| {
            let d = value - mean;
            total + d * d
        })
    }

    fn sum_cross_deviations(&self, xs: &[f64], x_mean: f64, ys: &[f64], y_mean: f64) -> f64 {
        debug_assert_eq!(xs.len(), ys.len());
        let len = xs.len().min(ys.len());
        let (xs, ys) = (&xs[..len], &ys[..len]);

        let x_chunks = xs.chunks_exact(LANES);
        let y_chunks = ys.chunks_exact(LANES);
        let x_rem = x_chunks.remainder();
        let y_rem = y_chunks.remainder();

        let mut acc = [0.0f64; LANES];
        for (x, y) in x_chunks.zip(y_chunks) {
            for lane in 0..LANES {
                let dx = x[lane] - x_mean;
                let dy = y[lane] - y_mean;
                acc[lane] += dx * dy;
            }
        }

        x_rem
            .iter()
            .zip(y_rem)
            .fold(fold_lanes(acc), |total, (&x, &y)| {
                let dx = x - x_mean;
                let dy = y - y_mean;
                total + dx * dy
            })
    }

    fn name(&self) -> &'static str {
        "Scalar"
    }
}
