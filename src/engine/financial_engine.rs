// ============================================================================
// Financial Engine
// Async public facade over the resolved calculation kernel
// ============================================================================

use crate::domain::{
    AmortizationEntry, CalculationDefaults, EngineConfig, MortgageBreakdown, MortgageOptions,
    PortfolioMetrics, PortfolioSeries,
};
use crate::engine::benchmark::{self, BenchmarkReport};
use crate::engine::selector::{BackendSelector, BackendState, BackendStatus};
use crate::interfaces::{months_in, FinancialKernel, KernelLoader, MONTHS_PER_YEAR};
use crate::kernel::NativeKernelLoader;
use crate::numeric::{ensure_finite, CalculationResult};
use std::sync::Arc;

/// Financial calculation engine.
///
/// Every calculation first resolves the execution backend (loading the
/// accelerated kernel on first use, falling back to the scalar kernel on any
/// failure) and then runs synchronously on that kernel. Clones share the
/// same backend, so the loader runs at most once per engine.
#[derive(Debug, Clone)]
pub struct FinancialEngine {
    /// Backend lifecycle shared by all clones
    selector: Arc<BackendSelector>,

    /// Defaults for omitted optional parameters
    defaults: CalculationDefaults,
}

impl FinancialEngine {
    /// Create an engine that loads the native SIMD kernel.
    ///
    /// The configuration is taken as is; use
    /// [`create_from_config`](crate::engine::create_from_config) to validate it first.
    pub fn new(config: &EngineConfig) -> Self {
        Self::with_loader(config, Arc::new(NativeKernelLoader::from_config(config)))
    }

    /// Create an engine with a custom accelerated kernel loader.
    pub fn with_loader(config: &EngineConfig, loader: Arc<dyn KernelLoader>) -> Self {
        Self {
            selector: Arc::new(BackendSelector::new(
                config.backend,
                config.load_timeout,
                loader,
            )),
            defaults: config.defaults,
        }
    }

    /// Defaults applied to omitted parameters.
    pub fn defaults(&self) -> &CalculationDefaults {
        &self.defaults
    }

    #[inline]
    async fn kernel(&self) -> &dyn FinancialKernel {
        self.selector.resolve().await.kernel()
    }

    // ========================================================================
    // Time Value of Money
    // ========================================================================

    /// Amount after compounding `compounds_per_year` times a year for `years`.
    pub async fn compound_interest(
        &self,
        principal: f64,
        annual_rate: f64,
        compounds_per_year: u32,
        years: u32,
    ) -> CalculationResult<f64> {
        self.kernel()
            .await
            .compound_interest(principal, annual_rate, compounds_per_year, years)
    }

    pub async fn present_value(
        &self,
        future_value: f64,
        rate: f64,
        periods: u32,
    ) -> CalculationResult<f64> {
        self.kernel().await.present_value(future_value, rate, periods)
    }

    pub async fn future_value(
        &self,
        present_value: f64,
        rate: f64,
        periods: u32,
    ) -> CalculationResult<f64> {
        self.kernel().await.future_value(present_value, rate, periods)
    }

    /// Level payment per period that amortizes `present_value`.
    pub async fn annuity_payment(
        &self,
        present_value: f64,
        rate: f64,
        periods: u32,
    ) -> CalculationResult<f64> {
        self.kernel()
            .await
            .annuity_payment(present_value, rate, periods)
    }

    /// Monthly payment of a fixed-rate loan.
    pub async fn loan_payment(
        &self,
        principal: f64,
        annual_rate: f64,
        years: u32,
    ) -> CalculationResult<f64> {
        let annual_rate = ensure_finite("annual_rate", annual_rate)?;
        let months = months_in(years)?;
        self.kernel().await.loan_payment(
            principal,
            annual_rate / f64::from(MONTHS_PER_YEAR),
            months,
        )
    }

    /// Future value of an initial amount plus monthly contributions.
    pub async fn investment_growth(
        &self,
        initial: f64,
        monthly_contribution: f64,
        annual_rate: f64,
        years: u32,
    ) -> CalculationResult<f64> {
        self.kernel()
            .await
            .investment_growth(initial, monthly_contribution, annual_rate, years)
    }

    // ========================================================================
    // Mortgages
    // ========================================================================

    /// Total monthly mortgage cost.
    pub async fn mortgage_payment(
        &self,
        principal: f64,
        annual_rate: f64,
        years: u32,
        options: MortgageOptions,
    ) -> CalculationResult<f64> {
        self.mortgage_breakdown(principal, annual_rate, years, options)
            .await
            .map(|breakdown| breakdown.total)
    }

    /// Monthly mortgage cost split into its components.
    ///
    /// Omitted options default to the engine's PMI and property tax rates,
    /// and to a home value of `principal * home_value_multiplier`.
    pub async fn mortgage_breakdown(
        &self,
        principal: f64,
        annual_rate: f64,
        years: u32,
        options: MortgageOptions,
    ) -> CalculationResult<MortgageBreakdown> {
        let principal = ensure_finite("principal", principal)?;
        let pmi_rate = options.pmi_rate.unwrap_or(self.defaults.pmi_rate);
        let property_tax_rate = options
            .property_tax_rate
            .unwrap_or(self.defaults.property_tax_rate);
        let home_value = options
            .home_value
            .unwrap_or(principal * self.defaults.home_value_multiplier);

        self.kernel().await.mortgage_breakdown(
            principal,
            annual_rate,
            years,
            pmi_rate,
            property_tax_rate,
            home_value,
        )
    }

    /// Month-by-month repayment schedule of a fixed-rate loan.
    pub async fn amortization_schedule(
        &self,
        principal: f64,
        annual_rate: f64,
        years: u32,
    ) -> CalculationResult<Vec<AmortizationEntry>> {
        let annual_rate = ensure_finite("annual_rate", annual_rate)?;
        let months = months_in(years)?;
        self.kernel().await.amortization_schedule(
            principal,
            annual_rate / f64::from(MONTHS_PER_YEAR),
            months,
        )
    }

    // ========================================================================
    // Portfolio Analytics
    // ========================================================================

    /// Sample standard deviation of a return series.
    pub async fn portfolio_volatility(&self, returns: &[f64]) -> CalculationResult<f64> {
        self.kernel().await.portfolio_volatility(returns)
    }

    /// `None` when `volatility` is zero.
    pub async fn sharpe_ratio(
        &self,
        portfolio_return: f64,
        risk_free_rate: f64,
        volatility: f64,
    ) -> CalculationResult<Option<f64>> {
        self.kernel()
            .await
            .sharpe_ratio(portfolio_return, risk_free_rate, volatility)
    }

    /// `None` when `market_variance` is zero.
    pub async fn beta(&self, covariance: f64, market_variance: f64) -> CalculationResult<Option<f64>> {
        self.kernel().await.beta(covariance, market_variance)
    }

    /// Average return, volatility, Sharpe ratio and beta of a portfolio
    /// against its market.
    ///
    /// `risk_free_rate` defaults to the engine's configured rate (2%).
    pub async fn portfolio_metrics(
        &self,
        returns: &[f64],
        market_returns: &[f64],
        risk_free_rate: Option<f64>,
    ) -> CalculationResult<PortfolioMetrics> {
        let series = PortfolioSeries::from_slices(returns, market_returns)?;
        let risk_free_rate = risk_free_rate.unwrap_or(self.defaults.risk_free_rate);
        self.kernel().await.portfolio_metrics(&series, risk_free_rate)
    }

    // ========================================================================
    // Backend Lifecycle
    // ========================================================================

    /// Resolve the backend eagerly instead of on the first calculation.
    pub async fn initialize(&self) -> BackendStatus {
        self.selector.resolve().await.status().clone()
    }

    /// Current backend lifecycle state; never blocks or triggers loading.
    pub fn backend_state(&self) -> BackendState {
        self.selector.state()
    }

    /// Resolution outcome, once the backend is ready.
    pub fn backend_status(&self) -> Option<BackendStatus> {
        self.selector.get().map(|handle| handle.status().clone())
    }

    /// Time the portfolio-metrics workload on the resolved backend and on the
    /// scalar kernel.
    ///
    /// Diagnostic only: runs on synthetic data and does not affect
    /// calculations.
    pub async fn benchmark(
        &self,
        iterations: u32,
        series_len: usize,
    ) -> CalculationResult<BenchmarkReport> {
        let handle = self.selector.resolve().await;
        benchmark::run(handle, iterations, series_len, self.defaults.risk_free_rate)
    }
}

impl Default for FinancialEngine {
    fn default() -> Self {
        Self::new(&EngineConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interfaces::LoadError;
    use crate::numeric::CalculationError;
    use approx::assert_relative_eq;
    use async_trait::async_trait;

    struct UnavailableLoader;

    #[async_trait]
    impl KernelLoader for UnavailableLoader {
        async fn load(&self) -> Result<Arc<dyn FinancialKernel>, LoadError> {
            Err(LoadError::Unsupported("unavailable".to_string()))
        }

        fn name(&self) -> &str {
            "unavailable"
        }
    }

    fn fallback_engine() -> FinancialEngine {
        FinancialEngine::with_loader(&EngineConfig::default(), Arc::new(UnavailableLoader))
    }

    #[tokio::test]
    async fn test_lazy_resolution() {
        let engine = FinancialEngine::new(&EngineConfig::fallback_only());
        assert_eq!(engine.backend_state(), BackendState::Uninitialized);
        assert!(engine.backend_status().is_none());

        engine.present_value(1_000.0, 0.05, 10).await.unwrap();
        assert_eq!(engine.backend_state(), BackendState::ReadyFallback);
        assert!(engine.backend_status().is_some());
    }

    #[tokio::test]
    async fn test_clones_share_backend() {
        let engine = fallback_engine();
        let clone = engine.clone();

        let status = clone.initialize().await;
        assert_eq!(engine.backend_state(), BackendState::ReadyFallback);
        assert_eq!(engine.backend_status(), Some(status));
    }

    #[tokio::test]
    async fn test_loan_payment_converts_to_monthly() {
        let engine = fallback_engine();
        let payment = engine.loan_payment(300_000.0, 0.065, 30).await.unwrap();
        assert_relative_eq!(payment, 1_896.20, epsilon = 0.01);

        assert_eq!(
            engine.loan_payment(300_000.0, f64::INFINITY, 30).await,
            Err(CalculationError::NonFiniteInput { name: "annual_rate" })
        );
        assert_eq!(
            engine.loan_payment(300_000.0, 0.065, 0).await,
            Err(CalculationError::InvalidPeriods { name: "years" })
        );
    }

    #[tokio::test]
    async fn test_mortgage_defaults() {
        let engine = fallback_engine();
        let breakdown = engine
            .mortgage_breakdown(400_000.0, 0.065, 30, MortgageOptions::new())
            .await
            .unwrap();

        // Home value defaults to 120% of the principal
        assert_relative_eq!(breakdown.property_tax, 480_000.0 * 0.012 / 12.0);
        assert_relative_eq!(breakdown.pmi, 400_000.0 * 0.005 / 12.0);
        assert_relative_eq!(breakdown.total, 3_174.94, epsilon = 0.01);

        let total = engine
            .mortgage_payment(400_000.0, 0.065, 30, MortgageOptions::new())
            .await
            .unwrap();
        assert_eq!(total, breakdown.total);
    }

    #[tokio::test]
    async fn test_mortgage_explicit_options() {
        let engine = fallback_engine();
        let options = MortgageOptions::new()
            .with_pmi_rate(0.0)
            .with_property_tax_rate(0.0);
        let breakdown = engine
            .mortgage_breakdown(300_000.0, 0.065, 30, options)
            .await
            .unwrap();

        assert_eq!(breakdown.pmi, 0.0);
        assert_eq!(breakdown.property_tax, 0.0);
        assert_eq!(
            breakdown.total,
            engine.loan_payment(300_000.0, 0.065, 30).await.unwrap()
        );
    }

    #[tokio::test]
    async fn test_amortization_schedule_by_years() {
        let engine = fallback_engine();
        let schedule = engine
            .amortization_schedule(200_000.0, 0.06, 15)
            .await
            .unwrap();

        assert_eq!(schedule.len(), 180);
        assert_relative_eq!(schedule[0].payment, 1_687.71, epsilon = 0.01);
        assert_eq!(schedule.last().map(|e| e.balance), Some(0.0));

        // 101 years is past the 1,200 month schedule limit
        assert_eq!(
            engine.amortization_schedule(200_000.0, 0.06, 101).await,
            Err(CalculationError::InvalidPeriods { name: "months" })
        );
    }

    #[tokio::test]
    async fn test_portfolio_metrics_default_risk_free_rate() {
        let engine = fallback_engine();
        let returns = [0.01, 0.02, -0.01, 0.03, 0.015];
        let market = [0.008, 0.015, -0.012, 0.025, 0.01];

        let implicit = engine
            .portfolio_metrics(&returns, &market, None)
            .await
            .unwrap();
        let explicit = engine
            .portfolio_metrics(&returns, &market, Some(0.02))
            .await
            .unwrap();
        assert_eq!(implicit, explicit);
        assert_relative_eq!(
            implicit.sharpe_ratio.unwrap(),
            -0.471_939_903_724_269_5,
            max_relative = 1e-9
        );
    }

    #[tokio::test]
    async fn test_portfolio_metrics_rejects_mismatch() {
        let engine = fallback_engine();
        assert_eq!(
            engine
                .portfolio_metrics(&[0.01, 0.02, 0.03], &[0.01, 0.02], None)
                .await,
            Err(CalculationError::SeriesLengthMismatch {
                portfolio: 3,
                market: 2
            })
        );
    }

    #[tokio::test]
    async fn test_benchmark_on_fallback() {
        let engine = fallback_engine();
        let report = engine.benchmark(3, 64).await.unwrap();

        assert_eq!(report.iterations, 3);
        assert_eq!(report.series_len, 64);
        assert!(report.accelerated.is_none());
        assert_eq!(report.fallback.kernel, "Scalar");
        assert_eq!(report.speedup(), None);
    }

    #[tokio::test]
    async fn test_benchmark_rejects_short_series() {
        let engine = fallback_engine();
        assert!(matches!(
            engine.benchmark(1, 1).await,
            Err(CalculationError::InsufficientObservations { .. })
        ));
    }
}
