// ============================================================================
// Backend Benchmark
// Diagnostic timing of the accelerated kernel against the scalar kernel
// ============================================================================

use crate::domain::PortfolioSeries;
use crate::engine::selector::BackendHandle;
use crate::interfaces::FinancialKernel;
use crate::kernel::{synthetic_returns, ScalarKernel};
use crate::numeric::CalculationResult;
use std::hint::black_box;
use std::time::{Duration, Instant};

#[cfg(feature = "serde")]
use serde::Serialize;

/// Elapsed time of one kernel over the whole workload.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct BackendTiming {
    pub kernel: &'static str,
    pub elapsed: Duration,
}

impl BackendTiming {
    /// Mean time per iteration.
    pub fn per_iteration(&self, iterations: u32) -> Duration {
        self.elapsed / iterations.max(1)
    }
}

/// Result of [`FinancialEngine::benchmark`](crate::engine::FinancialEngine::benchmark).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct BenchmarkReport {
    pub iterations: u32,
    pub series_len: usize,
    /// Present only when the engine resolved to the accelerated kernel
    pub accelerated: Option<BackendTiming>,
    pub fallback: BackendTiming,
}

impl BenchmarkReport {
    /// Fallback time divided by accelerated time.
    pub fn speedup(&self) -> Option<f64> {
        let accelerated = self.accelerated?.elapsed.as_secs_f64();
        if accelerated == 0.0 {
            return None;
        }
        Some(self.fallback.elapsed.as_secs_f64() / accelerated)
    }
}

/// Time the portfolio-metrics workload on the resolved backend and on a
/// private scalar kernel.
///
/// At least one iteration always runs. Results of the workload are
/// discarded.
pub(crate) fn run(
    handle: &BackendHandle,
    iterations: u32,
    series_len: usize,
    risk_free_rate: f64,
) -> CalculationResult<BenchmarkReport> {
    let (returns, market) = synthetic_returns(series_len);
    let series = PortfolioSeries::new(returns, market)?;
    let iterations = iterations.max(1);

    let accelerated = if handle.is_accelerated() {
        Some(time_kernel(handle.kernel(), &series, iterations, risk_free_rate)?)
    } else {
        None
    };
    let fallback = time_kernel(&ScalarKernel::new(), &series, iterations, risk_free_rate)?;

    tracing::debug!(
        "Benchmark over {} iterations of {} observations: accelerated {:?}, fallback {:?}",
        iterations,
        series_len,
        accelerated.map(|t| t.elapsed),
        fallback.elapsed
    );

    Ok(BenchmarkReport {
        iterations,
        series_len,
        accelerated,
        fallback,
    })
}

fn time_kernel(
    kernel: &dyn FinancialKernel,
    series: &PortfolioSeries,
    iterations: u32,
    risk_free_rate: f64,
) -> CalculationResult<BackendTiming> {
    let started = Instant::now();
    for _ in 0..iterations {
        black_box(kernel.portfolio_metrics(black_box(series), risk_free_rate)?);
    }
    Ok(BackendTiming {
        kernel: kernel.name(),
        elapsed: started.elapsed(),
    })
}
