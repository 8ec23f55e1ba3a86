// ============================================================================
// Financial Kernel Benchmarks
// ============================================================================
//
// Benchmark Categories:
// 1. Raw Reductions - Series reductions on the accelerated and scalar kernels
// 2. Portfolio Metrics - Full risk metrics per kernel
// 3. Closed Forms - Loan and amortization calculations
// 4. Engine Facade - End-to-end calls through the async engine
//
// Architecture Notes:
// - x86_64: Uses AVX2 (256-bit, 4x f64 parallel)
// - aarch64: Uses NEON (128-bit, 2x f64 parallel)
// - Other: Scalar only
// ============================================================================

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use finance_engine::kernel::{create_accelerated_kernel, CpuCapabilities};
use finance_engine::prelude::*;
use std::hint::black_box;
use std::sync::Arc;

fn returns(len: usize) -> (Vec<f64>, Vec<f64>) {
    let portfolio: Vec<f64> = (0..len)
        .map(|i| 0.012 * (i as f64 * 0.61).sin() + 0.0005)
        .collect();
    let market = portfolio
        .iter()
        .enumerate()
        .map(|(i, r)| 0.9 * r + 0.003 * (i as f64 * 0.29).cos())
        .collect();
    (portfolio, market)
}

fn kernels() -> Vec<Arc<dyn FinancialKernel>> {
    let mut kernels: Vec<Arc<dyn FinancialKernel>> = vec![Arc::new(ScalarKernel::new())];
    if let Some(accelerated) = create_accelerated_kernel(CpuCapabilities::detect()) {
        kernels.push(accelerated);
    }
    kernels
}

// ============================================================================
// Raw Reduction Benchmarks
// ============================================================================

fn benchmark_reductions(c: &mut Criterion) {
    let mut group = c.benchmark_group("reductions");

    for len in [16usize, 256, 4096] {
        let (xs, ys) = returns(len);
        let x_mean = xs.iter().sum::<f64>() / len as f64;
        let y_mean = ys.iter().sum::<f64>() / len as f64;

        for kernel in kernels() {
            group.bench_with_input(
                BenchmarkId::new(format!("{}/sum_squared_deviations", kernel.name()), len),
                &xs,
                |b, xs| b.iter(|| black_box(kernel.sum_squared_deviations(black_box(xs), x_mean))),
            );

            group.bench_with_input(
                BenchmarkId::new(format!("{}/sum_cross_deviations", kernel.name()), len),
                &(&xs, &ys),
                |b, (xs, ys)| {
                    b.iter(|| {
                        black_box(kernel.sum_cross_deviations(
                            black_box(xs),
                            x_mean,
                            black_box(ys),
                            y_mean,
                        ))
                    })
                },
            );
        }
    }

    group.finish();
}

// ============================================================================
// Portfolio Metrics Benchmarks
// ============================================================================

fn benchmark_portfolio_metrics(c: &mut Criterion) {
    let mut group = c.benchmark_group("portfolio_metrics");

    for len in [252usize, 2520] {
        let (portfolio, market) = returns(len);
        let series = PortfolioSeries::new(portfolio, market).unwrap();

        for kernel in kernels() {
            group.bench_with_input(BenchmarkId::new(kernel.name(), len), &series, |b, series| {
                b.iter(|| black_box(kernel.portfolio_metrics(black_box(series), 0.02).unwrap()))
            });
        }
    }

    group.finish();
}

// ============================================================================
// Closed-Form Benchmarks
// ============================================================================

fn benchmark_closed_forms(c: &mut Criterion) {
    let kernel = ScalarKernel::new();

    c.bench_function("loan_payment_30y", |b| {
        b.iter(|| {
            black_box(
                kernel
                    .loan_payment(black_box(300_000.0), 0.065 / 12.0, 360)
                    .unwrap(),
            )
        })
    });

    c.bench_function("amortization_schedule_30y", |b| {
        b.iter(|| {
            black_box(
                kernel
                    .amortization_schedule(black_box(300_000.0), 0.065 / 12.0, 360)
                    .unwrap(),
            )
        })
    });
}

// ============================================================================
// Engine Facade Benchmarks
// ============================================================================

fn benchmark_engine_facade(c: &mut Criterion) {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();
    let engine = FinancialEngine::default();
    let status = runtime.block_on(engine.initialize());
    let (portfolio, market) = returns(252);

    c.bench_function(&format!("engine_portfolio_metrics_{}", status.kernel), |b| {
        b.iter(|| {
            runtime
                .block_on(engine.portfolio_metrics(black_box(&portfolio), &market, None))
                .unwrap()
        })
    });
}

criterion_group!(
    benches,
    benchmark_reductions,
    benchmark_portfolio_metrics,
    benchmark_closed_forms,
    benchmark_engine_facade
);
criterion_main!(benches);
