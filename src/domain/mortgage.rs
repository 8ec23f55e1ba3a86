// ============================================================================
// Mortgage and Loan Value Objects
// Mortgage options, payment breakdown and amortization schedule rows
// ============================================================================

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Optional mortgage cost parameters.
///
/// Unset fields are resolved against
/// [`CalculationDefaults`](crate::domain::CalculationDefaults) by the engine:
/// PMI 0.5%, property tax 1.2%, home value 120% of the principal.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MortgageOptions {
    /// Annual PMI rate as a fraction of the principal
    pub pmi_rate: Option<f64>,
    /// Annual property tax rate as a fraction of the home value
    pub property_tax_rate: Option<f64>,
    /// Assessed home value
    pub home_value: Option<f64>,
}

impl MortgageOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pmi_rate(mut self, pmi_rate: f64) -> Self {
        self.pmi_rate = Some(pmi_rate);
        self
    }

    pub fn with_property_tax_rate(mut self, property_tax_rate: f64) -> Self {
        self.property_tax_rate = Some(property_tax_rate);
        self
    }

    pub fn with_home_value(mut self, home_value: f64) -> Self {
        self.home_value = Some(home_value);
        self
    }
}

/// Monthly mortgage cost split into its additive components.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MortgageBreakdown {
    /// Amortized principal and interest payment
    pub principal_and_interest: f64,
    /// Monthly private mortgage insurance
    pub pmi: f64,
    /// Monthly property tax
    pub property_tax: f64,
    /// Sum of the three components
    pub total: f64,
}

impl MortgageBreakdown {
    pub(crate) fn new(principal_and_interest: f64, pmi: f64, property_tax: f64) -> Self {
        Self {
            principal_and_interest,
            pmi,
            property_tax,
            total: principal_and_interest + pmi + property_tax,
        }
    }
}

/// One month of a loan amortization schedule.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AmortizationEntry {
    /// 1-based payment number
    pub period: u32,
    pub payment: f64,
    pub interest: f64,
    pub principal: f64,
    /// Outstanding balance after this payment
    pub balance: f64,
}
