// ============================================================================
// Host Detection
// Picks the vectorized kernel the running CPU can execute, if any
// ============================================================================

use super::scalar::ScalarKernel;
use crate::interfaces::FinancialKernel;
use std::fmt;
use std::sync::Arc;

/// Vector instruction set a kernel can be built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SimdLevel {
    None,
    Neon,
    Avx2,
}

impl SimdLevel {
    fn detect() -> Self {
        // Baseline on every aarch64 target
        if cfg!(target_arch = "aarch64") {
            return SimdLevel::Neon;
        }

        #[cfg(target_arch = "x86_64")]
        if is_x86_feature_detected!("avx2") {
            return SimdLevel::Avx2;
        }

        SimdLevel::None
    }
}

/// What the loader needs to know about the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CpuCapabilities {
    /// Target architecture name, as in `std::env::consts::ARCH`
    pub arch: &'static str,
    pub simd_level: SimdLevel,
}

impl CpuCapabilities {
    pub fn detect() -> Self {
        Self {
            arch: std::env::consts::ARCH,
            simd_level: SimdLevel::detect(),
        }
    }
}

impl fmt::Display for CpuCapabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.simd_level {
            SimdLevel::None => write!(f, "{} without a supported vector unit", self.arch),
            SimdLevel::Neon => write!(f, "{} with NEON", self.arch),
            SimdLevel::Avx2 => write!(f, "{} with AVX2", self.arch),
        }
    }
}

/// Build the vectorized kernel matching `caps`.
///
/// Returns `None` when the host has no supported vector unit.
///
/// # Example
/// ```
/// use finance_engine::kernel::{create_accelerated_kernel, CpuCapabilities};
///
/// if let Some(kernel) = create_accelerated_kernel(CpuCapabilities::detect()) {
///     println!("accelerated kernel: {}", kernel.name());
/// }
/// ```
pub fn create_accelerated_kernel(caps: CpuCapabilities) -> Option<Arc<dyn FinancialKernel>> {
    match caps.simd_level {
        #[cfg(target_arch = "x86_64")]
        SimdLevel::Avx2 => super::avx2::Avx2Kernel::detect()
            .map(|kernel| Arc::new(kernel) as Arc<dyn FinancialKernel>),

        #[cfg(target_arch = "aarch64")]
        SimdLevel::Neon => Some(Arc::new(super::neon::NeonKernel::new())),

        _ => None,
    }
}

/// The portable fallback kernel.
pub fn create_scalar_kernel() -> Arc<dyn FinancialKernel> {
    Arc::new(ScalarKernel::new())
}
