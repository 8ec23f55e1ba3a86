// ============================================================================
// Native Kernel Loader
// Brings up the SIMD kernel for this CPU and cross-checks it before use
// ============================================================================

use super::detector::{create_accelerated_kernel, CpuCapabilities};
use super::scalar::ScalarKernel;
use super::synthetic_returns;
use crate::domain::EngineConfig;
use crate::interfaces::{FinancialKernel, KernelLoader, LoadError};
use async_trait::async_trait;
use std::sync::Arc;

/// Series length used by the load-time cross-check.
///
/// Not a multiple of four, so the remainder path is exercised too.
const VERIFICATION_LEN: usize = 37;

/// Loader for the vectorized kernel compiled into this crate.
///
/// Detects the CPU, builds the kernel for it and, unless disabled,
/// compares its reductions against the scalar kernel on a synthetic series.
#[derive(Debug, Clone, Copy)]
pub struct NativeKernelLoader {
    verify: bool,
    tolerance: f64,
}

impl NativeKernelLoader {
    pub fn new(verify: bool, tolerance: f64) -> Self {
        Self { verify, tolerance }
    }

    /// Take the verification settings from an engine configuration.
    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.verify_on_load, config.verification_tolerance)
    }
}

impl Default for NativeKernelLoader {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

#[async_trait]
impl KernelLoader for NativeKernelLoader {
    async fn load(&self) -> Result<Arc<dyn FinancialKernel>, LoadError> {
        let caps = CpuCapabilities::detect();
        tracing::debug!("Detected {}", caps);

        let kernel = create_accelerated_kernel(caps)
            .ok_or_else(|| LoadError::Unsupported(caps.to_string()))?;

        if self.verify {
            verify_kernel(kernel.as_ref(), &ScalarKernel::new(), self.tolerance)?;
            tracing::debug!("Kernel {} passed verification", kernel.name());
        }

        Ok(kernel)
    }

    fn name(&self) -> &str {
        "native-simd"
    }
}

/// Compare the three reductions of `candidate` against `reference`.
///
/// Fails on the first result whose relative difference exceeds `tolerance`
/// or that is not finite.
pub fn verify_kernel(
    candidate: &dyn FinancialKernel,
    reference: &dyn FinancialKernel,
    tolerance: f64,
) -> Result<(), LoadError> {
    let (xs, ys) = synthetic_returns(VERIFICATION_LEN);
    let n = VERIFICATION_LEN as f64;
    let x_mean = reference.sum(&xs) / n;
    let y_mean = reference.sum(&ys) / n;

    check("sum", reference.sum(&xs), candidate.sum(&xs), tolerance)?;
    check(
        "sum_squared_deviations",
        reference.sum_squared_deviations(&xs, x_mean),
        candidate.sum_squared_deviations(&xs, x_mean),
        tolerance,
    )?;
    check(
        "sum_cross_deviations",
        reference.sum_cross_deviations(&xs, x_mean, &ys, y_mean),
        candidate.sum_cross_deviations(&xs, x_mean, &ys, y_mean),
        tolerance,
    )
}

#[inline]
fn check(operation: &'static str, expected: f64, actual: f64, tolerance: f64) -> Result<(), LoadError> {
    let diff = (actual - expected).abs();
    let scale = expected.abs().max(actual.abs());
    if diff == 0.0 || diff <= tolerance * scale {
        Ok(())
    } else {
        Err(LoadError::VerificationFailed {
            operation,
            expected,
            actual,
        })
    }
}
