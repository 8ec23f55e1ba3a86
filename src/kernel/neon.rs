// ============================================================================
// ARM NEON Implementation
// SIMD acceleration using ARM NEON instructions (128-bit, 2x f64)
// ============================================================================

#![cfg(target_arch = "aarch64")]

use super::{fold_lanes, LANES};
use crate::interfaces::FinancialKernel;

/// ARM NEON implementation of the financial kernel.
///
/// Uses two 128-bit registers per iteration (lanes 0-1 and 2-3) so the
/// accumulation order matches the four-lane scalar and AVX2 kernels.
/// NEON is always available on aarch64 (ARMv8-A baseline).
#[derive(Debug, Clone, Copy, Default)]
pub struct NeonKernel;

impl NeonKernel {
    /// Create a new NEON kernel.
    pub fn new() -> Self {
        Self
    }
}

impl FinancialKernel for NeonKernel {
    fn sum(&self, values: &[f64]) -> f64 {
        // NEON is always available on aarch64
        unsafe { neon_sum(values) }
    }

    fn sum_squared_deviations(&self, values: &[f64], mean: f64) -> f64 {
        unsafe { neon_sum_squared_deviations(values, mean) }
    }

    fn sum_cross_deviations(&self, xs: &[f64], x_mean: f64, ys: &[f64], y_mean: f64) -> f64 {
        debug_assert_eq!(xs.len(), ys.len());
        let len = xs.len().min(ys.len());
        unsafe { neon_sum_cross_deviations(&xs[..len], x_mean, &ys[..len], y_mean) }
    }

    fn name(&self) -> &'static str {
        "NEON"
    }
}

/// NEON-accelerated sum.
///
/// # Safety
/// This function uses NEON intrinsics which are always available on aarch64.
#[inline]
unsafe fn neon_sum(values: &[f64]) -> f64 {
    use std::arch::aarch64::*;

    let chunks = values.chunks_exact(LANES);
    let remainder = chunks.remainder();

    let mut acc_lo = vdupq_n_f64(0.0);
    let mut acc_hi = vdupq_n_f64(0.0);
    for chunk in chunks {
        acc_lo = vaddq_f64(acc_lo, vld1q_f64(chunk.as_ptr()));
        acc_hi = vaddq_f64(acc_hi, vld1q_f64(chunk.as_ptr().add(2)));
    }

    let mut lanes = [0.0f64; LANES];
    vst1q_f64(lanes.as_mut_ptr(), acc_lo);
    vst1q_f64(lanes.as_mut_ptr().add(2), acc_hi);

    // Handle remainder with scalar code
    remainder
        .iter()
        .fold(fold_lanes(lanes), |total, &value| total + value)
}

/// NEON-accelerated sum of squared deviations from `mean`.
///
/// # Safety
/// This function uses NEON intrinsics which are always available on aarch64.
#[inline]
unsafe fn neon_sum_squared_deviations(values: &[f64], mean: f64) -> f64 {
    use std::arch::aarch64::*;

    let chunks = values.chunks_exact(LANES);
    let remainder = chunks.remainder();

    let mean_vec = vdupq_n_f64(mean);
    let mut acc_lo = vdupq_n_f64(0.0);
    let mut acc_hi = vdupq_n_f64(0.0);
    for chunk in chunks {
        let d_lo = vsubq_f64(vld1q_f64(chunk.as_ptr()), mean_vec);
        let d_hi = vsubq_f64(vld1q_f64(chunk.as_ptr().add(2)), mean_vec);
        // vmulq + vaddq rather than vfmaq
        acc_lo = vaddq_f64(acc_lo, vmulq_f64(d_lo, d_lo));
        acc_hi = vaddq_f64(acc_hi, vmulq_f64(d_hi, d_hi));
    }

    let mut lanes = [0.0f64; LANES];
    vst1q_f64(lanes.as_mut_ptr(), acc_lo);
    vst1q_f64(lanes.as_mut_ptr().add(2), acc_hi);

    remainder.iter().fold(fold_lanes(lanes), |total, &value| {
        let d = value - mean;
        total + d * d
    })
}

/// NEON-accelerated sum of cross deviations.
///
/// # Safety
/// Caller must ensure `xs.len() == ys.len()`.
#[inline]
unsafe fn neon_sum_cross_deviations(xs: &[f64], x_mean: f64, ys: &[f64], y_mean: f64) -> f64 {
    use std::arch::aarch64::*;

    let x_chunks = xs.chunks_exact(LANES);
    let y_chunks = ys.chunks_exact(LANES);
    let x_rem = x_chunks.remainder();
    let y_rem = y_chunks.remainder();

    let x_mean_vec = vdupq_n_f64(x_mean);
    let y_mean_vec = vdupq_n_f64(y_mean);
    let mut acc_lo = vdupq_n_f64(0.0);
    let mut acc_hi = vdupq_n_f64(0.0);
    for (x, y) in x_chunks.zip(y_chunks) {
        let dx_lo = vsubq_f64(vld1q_f64(x.as_ptr()), x_mean_vec);
        let dx_hi = vsubq_f64(vld1q_f64(x.as_ptr().add(2)), x_mean_vec);
        let dy_lo = vsubq_f64(vld1q_f64(y.as_ptr()), y_mean_vec);
        let dy_hi = vsubq_f64(vld1q_f64(y.as_ptr().add(2)), y_mean_vec);
        acc_lo = vaddq_f64(acc_lo, vmulq_f64(dx_lo, dy_lo));
        acc_hi = vaddq_f64(acc_hi, vmulq_f64(dx_hi, dy_hi));
    }

    let mut lanes = [0.0f64; LANES];
    vst1q_f64(lanes.as_mut_ptr(), acc_lo);
    vst1q_f64(lanes.as_mut_ptr().add(2), acc_hi);

    x_rem
        .iter()
        .zip(y_rem)
        .fold(fold_lanes(lanes), |total, (&x, &y)| {
            let dx = x - x_mean;
            let dy = y - y_mean;
            total + dx * dy
        })
}
