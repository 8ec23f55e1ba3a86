// ============================================================================
// Financial Engine Library
// Financial calculations on SIMD-accelerated kernels with a scalar fallback
// ============================================================================

//! # Financial Engine
//!
//! Time-value-of-money, loan, mortgage and portfolio-risk calculations behind
//! an async facade that picks its execution backend at runtime.
//!
//! ## Features
//!
//! - **SIMD kernels** for series reductions (AVX2 on x86_64, NEON on aarch64)
//! - **Portable scalar fallback** producing bit-identical results
//! - **Single-flight backend loading** with timeout, verification and
//!   transparent fallback on any failure
//! - **Typed errors** for invalid input and `None` for undefined ratios
//!
//! ## Example
//!
//! ```rust
//! use finance_engine::prelude::*;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), CalculationError> {
//! let engine = FinancialEngine::default();
//!
//! // Monthly payment of a 30-year loan at 6.5%
//! let payment = engine.loan_payment(300_000.0, 0.065, 30).await?;
//! assert!((payment - 1_896.20).abs() < 0.01);
//!
//! // Risk metrics against a market series, default 2% risk-free rate
//! let metrics = engine
//!     .portfolio_metrics(
//!         &[0.01, 0.02, -0.01, 0.03, 0.015],
//!         &[0.008, 0.015, -0.012, 0.025, 0.01],
//!         None,
//!     )
//!     .await?;
//! println!("Volatility: {:.4}", metrics.volatility);
//! println!("Beta: {:?}", metrics.beta);
//!
//! println!("Backend: {}", engine.backend_state());
//! # Ok(())
//! # }
//! ```

pub mod domain;
pub mod engine;
pub mod interfaces;
pub mod kernel;
pub mod numeric;
pub mod utils;

// Re-exports for convenience
pub mod prelude {
    pub use crate::domain::{
        AmortizationEntry, BackendPreference, CalculationDefaults, ConfigError, EngineConfig,
        MortgageBreakdown, MortgageOptions, PortfolioMetrics, PortfolioSeries,
    };
    pub use crate::engine::{
        create_from_config, BackendKind, BackendState, BackendStatus, BenchmarkReport,
        FinancialEngine, FinancialEngineBuilder,
    };
    pub use crate::interfaces::{FinancialKernel, KernelLoader, LoadError};
    pub use crate::kernel::{NativeKernelLoader, ScalarKernel};
    pub use crate::numeric::{CalculationError, CalculationResult};
}
