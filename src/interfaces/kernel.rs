// ============================================================================
// Financial Kernel Interface
// Contract shared by the accelerated and the scalar calculation kernels
// ============================================================================

use crate::domain::{
    AmortizationEntry, MortgageBreakdown, PortfolioMetrics, PortfolioSeries, MIN_OBSERVATIONS,
};
use crate::numeric::{ensure_finite, ensure_periods, ensure_rate, CalculationError, CalculationResult};

/// Months in a year, used to derive monthly rates and period counts.
pub const MONTHS_PER_YEAR: u32 = 12;

/// Longest amortization schedule produced, in months (100 years).
pub const MAX_SCHEDULE_MONTHS: u32 = 1_200;

/// Trait implemented by every calculation backend.
///
/// Backends only differ in the three series reductions (`sum`,
/// `sum_squared_deviations`, `sum_cross_deviations`). Every closed-form
/// formula and every derived statistic is a provided method, so the choice
/// of backend is invisible to callers.
///
/// # Reduction Order
/// Implementations accumulate in four lanes (`values[i]` goes to lane
/// `i % 4`), combine the lanes as `(l0 + l1) + (l2 + l3)` and then add the
/// trailing remainder in order. Multiplication and addition are separate
/// operations (no fused multiply-add). Keeping that order makes backends
/// bit-identical rather than merely close.
///
/// # Thread Safety
/// All implementations must be `Send + Sync` so a single kernel can serve
/// every concurrent caller of the engine.
pub trait FinancialKernel: Send + Sync {
    /// Sum of all values.
    fn sum(&self, values: &[f64]) -> f64;

    /// Sum of `(v - mean)^2` over all values.
    fn sum_squared_deviations(&self, values: &[f64], mean: f64) -> f64;

    /// Sum of `(x - x_mean) * (y - y_mean)` over aligned pairs.
    ///
    /// Callers guarantee `xs.len() == ys.len()`.
    fn sum_cross_deviations(&self, xs: &[f64], x_mean: f64, ys: &[f64], y_mean: f64) -> f64;

    /// Get the name of this kernel implementation.
    ///
    /// Used for logging, diagnostics and benchmarking.
    fn name(&self) -> &'static str;

    // ========================================================================
    // Time Value of Money
    // ========================================================================

    /// `principal * (1 + annual_rate / n)^(n * periods)` with
    /// `n = compounds_per_period`.
    fn compound_interest(
        &self,
        principal: f64,
        annual_rate: f64,
        compounds_per_period: u32,
        periods: u32,
    ) -> CalculationResult<f64> {
        ensure_finite("principal", principal)?;
        ensure_finite("annual_rate", annual_rate)?;
        if compounds_per_period == 0 {
            return Err(CalculationError::InvalidCompounding);
        }
        ensure_periods("periods", periods)?;

        let n = f64::from(compounds_per_period);
        let periodic_rate = ensure_rate("annual_rate", annual_rate / n)?;
        let factor = growth_factor(periodic_rate, n * f64::from(periods));
        ensure_bounded("amount", scale(principal, factor))
    }

    /// `future_value / (1 + rate)^periods`
    fn present_value(&self, future_value: f64, rate: f64, periods: u32) -> CalculationResult<f64> {
        ensure_finite("future_value", future_value)?;
        ensure_rate("rate", rate)?;
        ensure_periods("periods", periods)?;

        let factor = growth_factor(rate, f64::from(periods));
        let value = if future_value == 0.0 {
            0.0
        } else {
            future_value / factor
        };
        ensure_bounded("present_value", value)
    }

    /// `present_value * (1 + rate)^periods`
    fn future_value(&self, present_value: f64, rate: f64, periods: u32) -> CalculationResult<f64> {
        ensure_finite("present_value", present_value)?;
        ensure_rate("rate", rate)?;
        ensure_periods("periods", periods)?;

        let factor = growth_factor(rate, f64::from(periods));
        ensure_bounded("future_value", scale(present_value, factor))
    }

    /// Level payment that amortizes `present_value` over `periods`.
    ///
    /// `pv * r * (1 + r)^n / ((1 + r)^n - 1)`, and exactly `pv / n` when
    /// the rate is zero.
    fn annuity_payment(&self, present_value: f64, rate: f64, periods: u32) -> CalculationResult<f64> {
        ensure_finite("present_value", present_value)?;
        ensure_rate("rate", rate)?;
        ensure_periods("periods", periods)?;

        let n = f64::from(periods);
        let factor = growth_factor(rate, n);
        // 1 + rate rounds to 1 for |rate| below machine epsilon
        if rate == 0.0 || factor == 1.0 {
            return Ok(present_value / n);
        }
        // Long horizons overflow the growth factor; the payment tends to pv * r
        if factor.is_infinite() {
            return Ok(present_value * rate);
        }
        Ok(present_value * rate * factor / (factor - 1.0))
    }

    /// Monthly loan payment; identical to [`annuity_payment`] on the same
    /// schedule.
    ///
    /// [`annuity_payment`]: FinancialKernel::annuity_payment
    fn loan_payment(&self, principal: f64, monthly_rate: f64, months: u32) -> CalculationResult<f64> {
        self.annuity_payment(principal, monthly_rate, months)
    }

    /// Future value of a lump sum plus monthly contributions.
    ///
    /// Contributions form an ordinary annuity (paid at the end of each
    /// month) compounding at `annual_rate / 12` for `years * 12` months.
    fn investment_growth(
        &self,
        initial: f64,
        monthly_contribution: f64,
        annual_rate: f64,
        years: u32,
    ) -> CalculationResult<f64> {
        ensure_finite("initial", initial)?;
        ensure_finite("monthly_contribution", monthly_contribution)?;
        ensure_finite("annual_rate", annual_rate)?;
        let months = months_in(years)?;

        let monthly_rate = ensure_rate("annual_rate", annual_rate / f64::from(MONTHS_PER_YEAR))?;
        let n = f64::from(months);
        let factor = growth_factor(monthly_rate, n);

        let annuity_factor = if monthly_rate == 0.0 || factor == 1.0 {
            n
        } else {
            (factor - 1.0) / monthly_rate
        };

        let total = scale(initial, factor) + scale(monthly_contribution, annuity_factor);
        ensure_bounded("total", total)
    }

    // ========================================================================
    // Mortgages and Loans
    // ========================================================================

    /// Monthly mortgage cost split into principal and interest, PMI and
    /// property tax.
    fn mortgage_breakdown(
        &self,
        principal: f64,
        annual_rate: f64,
        years: u32,
        pmi_rate: f64,
        property_tax_rate: f64,
        home_value: f64,
    ) -> CalculationResult<MortgageBreakdown> {
        ensure_finite("annual_rate", annual_rate)?;
        ensure_finite("pmi_rate", pmi_rate)?;
        ensure_finite("property_tax_rate", property_tax_rate)?;
        ensure_finite("home_value", home_value)?;
        let months = months_in(years)?;

        let months_per_year = f64::from(MONTHS_PER_YEAR);
        let base = self.loan_payment(principal, annual_rate / months_per_year, months)?;
        let pmi = principal * pmi_rate / months_per_year;
        let property_tax = home_value * property_tax_rate / months_per_year;

        Ok(MortgageBreakdown::new(base, pmi, property_tax))
    }

    /// Total monthly mortgage cost: the sum of the breakdown components.
    fn mortgage_payment(
        &self,
        principal: f64,
        annual_rate: f64,
        years: u32,
        pmi_rate: f64,
        property_tax_rate: f64,
        home_value: f64,
    ) -> CalculationResult<f64> {
        self.mortgage_breakdown(
            principal,
            annual_rate,
            years,
            pmi_rate,
            property_tax_rate,
            home_value,
        )
        .map(|breakdown| breakdown.total)
    }

    /// Month-by-month repayment schedule of a level-payment loan.
    ///
    /// The reported balance after the final payment is zero; the residual
    /// left by floating-point accumulation is absorbed there. Schedules
    /// longer than [`MAX_SCHEDULE_MONTHS`] are rejected.
    fn amortization_schedule(
        &self,
        principal: f64,
        monthly_rate: f64,
        months: u32,
    ) -> CalculationResult<Vec<AmortizationEntry>> {
        if months > MAX_SCHEDULE_MONTHS {
            return Err(CalculationError::InvalidPeriods { name: "months" });
        }
        let payment = self.loan_payment(principal, monthly_rate, months)?;

        let mut schedule = Vec::with_capacity(months as usize);
        let mut balance = principal;
        for period in 1..=months {
            let interest = balance * monthly_rate;
            let principal_part = payment - interest;
            balance = if period == months {
                0.0
            } else {
                balance - principal_part
            };
            schedule.push(AmortizationEntry {
                period,
                payment,
                interest,
                principal: principal_part,
                balance,
            });
        }

        Ok(schedule)
    }

    // ========================================================================
    // Return Series Statistics
    // ========================================================================

    /// Arithmetic mean.
    fn mean(&self, values: &[f64]) -> CalculationResult<f64> {
        if values.is_empty() {
            return Err(CalculationError::InsufficientObservations {
                required: 1,
                actual: 0,
            });
        }
        ensure_series("values", values)?;
        Ok(self.sum(values) / values.len() as f64)
    }

    /// Sample variance with the n - 1 (Bessel-corrected) denominator.
    ///
    /// A constant series has variance exactly zero.
    fn sample_variance(&self, values: &[f64]) -> CalculationResult<f64> {
        ensure_observations(values.len())?;
        ensure_series("values", values)?;
        if is_constant(values) {
            return Ok(0.0);
        }

        let mean = self.sum(values) / values.len() as f64;
        Ok(self.sum_squared_deviations(values, mean) / (values.len() - 1) as f64)
    }

    /// Sample covariance with the n - 1 denominator.
    ///
    /// Uses the same mean-centered summation as [`sample_variance`], so the
    /// covariance of a series with itself equals its variance exactly.
    ///
    /// [`sample_variance`]: FinancialKernel::sample_variance
    fn sample_covariance(&self, xs: &[f64], ys: &[f64]) -> CalculationResult<f64> {
        if xs.len() != ys.len() {
            return Err(CalculationError::SeriesLengthMismatch {
                portfolio: xs.len(),
                market: ys.len(),
            });
        }
        ensure_observations(xs.len())?;
        ensure_series("returns", xs)?;
        ensure_series("market_returns", ys)?;
        if is_constant(xs) || is_constant(ys) {
            return Ok(0.0);
        }

        let n = xs.len() as f64;
        let x_mean = self.sum(xs) / n;
        let y_mean = self.sum(ys) / n;
        Ok(self.sum_cross_deviations(xs, x_mean, ys, y_mean) / (n - 1.0))
    }

    /// Sample standard deviation (n - 1) of a return series.
    fn portfolio_volatility(&self, returns: &[f64]) -> CalculationResult<f64> {
        self.sample_variance(returns).map(f64::sqrt)
    }

    /// `(portfolio_return - risk_free_rate) / volatility`.
    ///
    /// Returns `Ok(None)` when volatility is zero: the ratio is undefined.
    fn sharpe_ratio(
        &self,
        portfolio_return: f64,
        risk_free_rate: f64,
        volatility: f64,
    ) -> CalculationResult<Option<f64>> {
        ensure_finite("portfolio_return", portfolio_return)?;
        ensure_finite("risk_free_rate", risk_free_rate)?;
        ensure_finite("volatility", volatility)?;

        if volatility == 0.0 {
            return Ok(None);
        }
        Ok(Some((portfolio_return - risk_free_rate) / volatility))
    }

    /// `covariance / market_variance`.
    ///
    /// Returns `Ok(None)` when the market variance is zero.
    fn beta(&self, covariance: f64, market_variance: f64) -> CalculationResult<Option<f64>> {
        ensure_finite("covariance", covariance)?;
        ensure_finite("market_variance", market_variance)?;

        if market_variance == 0.0 {
            return Ok(None);
        }
        Ok(Some(covariance / market_variance))
    }

    /// Average return, volatility, Sharpe ratio and beta in one pass over a
    /// validated series pair.
    fn portfolio_metrics(
        &self,
        series: &PortfolioSeries,
        risk_free_rate: f64,
    ) -> CalculationResult<PortfolioMetrics> {
        ensure_finite("risk_free_rate", risk_free_rate)?;
        let returns = series.returns();
        let market = series.market_returns();

        let average_return = self.mean(returns)?;
        let volatility = self.portfolio_volatility(returns)?;
        let sharpe_ratio = self.sharpe_ratio(average_return, risk_free_rate, volatility)?;

        let covariance = self.sample_covariance(returns, market)?;
        let market_variance = self.sample_variance(market)?;
        let beta = self.beta(covariance, market_variance)?;

        Ok(PortfolioMetrics {
            average_return,
            volatility,
            sharpe_ratio,
            beta,
            covariance,
            market_variance,
        })
    }
}

// ============================================================================
// Shared Helpers
// ============================================================================

/// `(1 + rate)^periods`
#[inline]
fn growth_factor(rate: f64, periods: f64) -> f64 {
    (1.0 + rate).powf(periods)
}

/// `amount * factor`, exactly zero for a zero amount even when the factor
/// overflowed to infinity.
#[inline]
fn scale(amount: f64, factor: f64) -> f64 {
    if amount == 0.0 {
        0.0
    } else {
        amount * factor
    }
}

#[inline]
fn ensure_bounded(name: &'static str, value: f64) -> CalculationResult<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(CalculationError::Overflow { name })
    }
}

/// Convert a positive year count into months.
#[inline]
pub(crate) fn months_in(years: u32) -> CalculationResult<u32> {
    ensure_periods("years", years)?
        .checked_mul(MONTHS_PER_YEAR)
        .ok_or(CalculationError::InvalidPeriods { name: "years" })
}

#[inline]
fn ensure_observations(len: usize) -> CalculationResult<()> {
    if len < MIN_OBSERVATIONS {
        return Err(CalculationError::InsufficientObservations {
            required: MIN_OBSERVATIONS,
            actual: len,
        });
    }
    Ok(())
}

#[inline]
fn ensure_series(name: &'static str, values: &[f64]) -> CalculationResult<()> {
    values
        .iter()
        .try_for_each(|&v| ensure_finite(name, v).map(|_| ()))
}

#[inline]
fn is_constant(values: &[f64]) -> bool {
    match values.split_first() {
        Some((first, rest)) => rest.iter().all(|v| v == first),
        None => true,
    }
}
