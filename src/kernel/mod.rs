// ============================================================================
// Calculation Kernels Module
// Platform-specific SIMD kernels and the portable scalar fallback
//
// Supported architectures:
// - x86_64: AVX2 (256-bit registers, 4x f64 parallel)
// - aarch64: NEON (128-bit registers, 2x f64 parallel)
// - Other: Scalar fallback
// ============================================================================

pub mod detector;
pub mod loader;
pub mod scalar;

#[cfg(target_arch = "x86_64")]
pub mod avx2;

#[cfg(target_arch = "aarch64")]
pub mod neon;

pub use detector::{
    create_accelerated_kernel, create_scalar_kernel, CpuCapabilities, SimdLevel,
};
pub use loader::{verify_kernel, NativeKernelLoader};
pub use scalar::ScalarKernel;

#[cfg(target_arch = "x86_64")]
pub use avx2::Avx2Kernel;

#[cfg(target_arch = "aarch64")]
pub use neon::NeonKernel;

/// Number of independent accumulators every kernel keeps.
pub(crate) const LANES: usize = 4;

/// Combine the four lane accumulators in the fixed order shared by all kernels.
#[inline(always)]
pub(crate) fn fold_lanes(acc: [f64; LANES]) -> f64 {
    (acc[0] + acc[1]) + (acc[2] + acc[3])
}

/// Deterministic pair of return series used for load-time verification,
/// benchmarking and tests.
///
/// Values stay within a few percent and are not exactly representable, so
/// any deviation from the shared reduction order shows up in the low bits.
pub(crate) fn synthetic_returns(len: usize) -> (Vec<f64>, Vec<f64>) {
    let returns: Vec<f64> = (0..len)
        .map(|i| {
            let step = i as f64;
            0.0125 * (step * 0.7).sin() + 0.0031 * (step * 1.3).cos() + 0.0007
        })
        .collect();
    let market = returns
        .iter()
        .enumerate()
        .map(|(i, r)| 0.8 * r + 0.0042 * (i as f64 * 0.37).sin() - 0.0003)
        .collect();
    (returns, market)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fold_lanes_order() {
        // Pairwise combination absorbs both small lanes; a left fold keeps one
        assert_eq!(fold_lanes([1e17, 1.0, -1e17, 1.0]), 0.0);
        assert_eq!(fold_lanes([1.0, 2.0, 3.0, 4.0]), 10.0);
    }

    #[test]
    fn test_synthetic_returns_deterministic() {
        let (a, b) = synthetic_returns(64);
        let (c, d) = synthetic_returns(64);
        assert_eq!(a, c);
        assert_eq!(b, d);
        assert_eq!(a.len(), 64);
        assert!(a.iter().chain(&b).all(|v| v.is_finite() && v.abs() < 0.05));
    }
}
