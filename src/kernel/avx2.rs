// ============================================================================
// x86_64 AVX2 Implementation
// SIMD acceleration using AVX2 instructions (256-bit, 4x f64)
// ============================================================================

use super::{fold_lanes, LANES};
use crate::interfaces::FinancialKernel;

/// AVX2 implementation of the financial kernel.
///
/// Uses 256-bit registers to reduce 4 f64 values per iteration.
/// Requires runtime detection of AVX2 support.
#[derive(Debug, Clone, Copy)]
pub struct Avx2Kernel {
    _detected: (),
}

impl Avx2Kernel {
    /// Create an AVX2 kernel if this CPU supports AVX2.
    pub fn detect() -> Option<Self> {
        if Self::is_available() {
            Some(Self { _detected: () })
        } else {
            None
        }
    }

    /// Check if AVX2 is available on this CPU.
    #[inline]
    pub fn is_available() -> bool {
        is_x86_feature_detected!("avx2")
    }
}

impl FinancialKernel for Avx2Kernel {
    fn sum(&self, values: &[f64]) -> f64 {
        // Safety: construction is gated on AVX2 detection
        unsafe { avx2_sum(values) }
    }

    fn sum_squared_deviations(&self, values: &[f64], mean: f64) -> f64 {
        unsafe { avx2_sum_squared_deviations(values, mean) }
    }

    fn sum_cross_deviations(&self, xs: &[f64], x_mean: f64, ys: &[f64], y_mean: f64) -> f64 {
        debug_assert_eq!(xs.len(), ys.len());
        let len = xs.len().min(ys.len());
        unsafe { avx2_sum_cross_deviations(&xs[..len], x_mean, &ys[..len], y_mean) }
    }

    fn name(&self) -> &'static str {
        "AVX2"
    }
}

/// AVX2-accelerated sum.
///
/// # Safety
/// Caller must ensure AVX2 is available.
#[target_feature(enable = "avx2")]
unsafe fn avx2_sum(values: &[f64]) -> f64 {
    use std::arch::x86_64::*;

    let chunks = values.chunks_exact(LANES);
    let remainder = chunks.remainder();

    let mut acc = _mm256_setzero_pd();
    for chunk in chunks {
        let v = _mm256_loadu_pd(chunk.as_ptr());
        acc = _mm256_add_pd(acc, v);
    }

    let mut lanes = [0.0f64; LANES];
    _mm256_storeu_pd(lanes.as_mut_ptr(), acc);

    // Handle remainder with scalar code
    remainder
        .iter()
        .fold(fold_lanes(lanes), |total, &value| total + value)
}

/// AVX2-accelerated sum of squared deviations from `mean`.
///
/// # Safety
/// Caller must ensure AVX2 is available.
#[target_feature(enable = "avx2")]
unsafe fn avx2_sum_squared_deviations(values: &[f64], mean: f64) -> f64 {
    use std::arch::x86_64::*;

    let chunks = values.chunks_exact(LANES);
    let remainder = chunks.remainder();

    // Broadcast mean to all 4 lanes
    let mean_vec = _mm256_set1_pd(mean);
    let mut acc = _mm256_setzero_pd();
    for chunk in chunks {
        let d = _mm256_sub_pd(_mm256_loadu_pd(chunk.as_ptr()), mean_vec);
        // Separate mul and add, never FMA
        acc = _mm256_add_pd(acc, _mm256_mul_pd(d, d));
    }

    let mut lanes = [0.0f64; LANES];
    _mm256_storeu_pd(lanes.as_mut_ptr(), acc);

    remainder.iter().fold(fold_lanes(lanes), |total, &value| {
        let d = value - mean;
        total + d * d
    })
}

/// AVX2-accelerated sum of cross deviations.
///
/// # Safety
/// Caller must ensure AVX2 is available and `xs.len() == ys.len()`.
#[target_feature(enable = "avx2")]
unsafe fn avx2_sum_cross_deviations(xs: &[f64], x_mean: f64, ys: &[f64], y_mean: f64) -> f64 {
    use std::arch::x86_64::*;

    let x_chunks = xs.chunks_exact(LANES);
    let y_chunks = ys.chunks_exact(LANES);
    let x_rem = x_chunks.remainder();
    let y_rem = y_chunks.remainder();

    let x_mean_vec = _mm256_set1_pd(x_mean);
    let y_mean_vec = _mm256_set1_pd(y_mean);
    let mut acc = _mm256_setzero_pd();
    for (x, y) in x_chunks.zip(y_chunks) {
        let dx = _mm256_sub_pd(_mm256_loadu_pd(x.as_ptr()), x_mean_vec);
        let dy = _mm256_sub_pd(_mm256_loadu_pd(y.as_ptr()), y_mean_vec);
        acc = _mm256_add_pd(acc, _mm256_mul_pd(dx, dy));
    }

    let mut lanes = [0.0f64; LANES];
    _mm256_storeu_pd(lanes.as_mut_ptr(), acc);

    x_rem
        .iter()
        .zip(y_rem)
        .fold(fold_lanes(lanes), |total, (&x, &y)| {
            let dx = x - x_mean;
            let dy = y - y_mean;
            total + dx * dy
        })
}
