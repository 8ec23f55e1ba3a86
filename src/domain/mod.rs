// ============================================================================
// Domain Models Module
// Value objects passed to and returned from calculations
// ============================================================================

pub mod config;
pub mod mortgage;
pub mod portfolio;

pub use config::{BackendPreference, CalculationDefaults, ConfigError, EngineConfig};
pub use mortgage::{AmortizationEntry, MortgageBreakdown, MortgageOptions};
pub use portfolio::{PortfolioMetrics, PortfolioSeries, MIN_OBSERVATIONS};
