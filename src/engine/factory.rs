// ============================================================================
// Financial Engine Factory
// Creates financial engines with validated configuration
// ============================================================================

use crate::domain::config::{BackendPreference, CalculationDefaults, ConfigError, EngineConfig};
use crate::engine::FinancialEngine;
use crate::interfaces::KernelLoader;
use std::sync::Arc;
use std::time::Duration;

// ============================================================================
// Factory Functions
// ============================================================================

/// Creates a financial engine from configuration
///
/// # Arguments
/// * `config` - Engine configuration
/// * `loader` - Accelerated kernel loader; `None` selects the native SIMD loader
///
/// # Returns
/// * `Result<FinancialEngine, ConfigError>` - Configured engine or error
///
/// # Example
/// ```
/// use finance_engine::prelude::*;
///
/// let engine = create_from_config(EngineConfig::fallback_only(), None).unwrap();
/// assert_eq!(engine.backend_state(), BackendState::Uninitialized);
/// ```
pub fn create_from_config(
    config: EngineConfig,
    loader: Option<Arc<dyn KernelLoader>>,
) -> Result<FinancialEngine, ConfigError> {
    // Validate configuration first
    config.validate()?;

    let engine = match loader {
        Some(loader) => FinancialEngine::with_loader(&config, loader),
        None => FinancialEngine::new(&config),
    };

    tracing::debug!(
        "Created financial engine (backend {:?}, load timeout {:?})",
        config.backend,
        config.load_timeout
    );

    Ok(engine)
}

// ============================================================================
// Builder Pattern for Advanced Configuration
// ============================================================================

/// Builder for creating financial engines with fluent API
///
/// # Example
/// ```
/// use finance_engine::prelude::*;
/// use std::time::Duration;
///
/// let engine = FinancialEngineBuilder::new()
///     .load_timeout(Duration::from_millis(500))
///     .risk_free_rate(0.03)
///     .build()
///     .unwrap();
///
/// assert_eq!(engine.defaults().risk_free_rate, 0.03);
/// ```
#[derive(Default)]
pub struct FinancialEngineBuilder {
    config: EngineConfig,
    loader: Option<Arc<dyn KernelLoader>>,
}

impl FinancialEngineBuilder {
    /// Create a new builder with the default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing configuration
    pub fn from_config(config: EngineConfig) -> Self {
        Self {
            config,
            loader: None,
        }
    }

    // ========================================================================
    // Backend Configuration
    // ========================================================================

    /// Try the accelerated kernel first (default)
    pub fn accelerated(mut self) -> Self {
        self.config.backend = BackendPreference::Auto;
        self
    }

    /// Never load the accelerated kernel
    pub fn fallback_only(mut self) -> Self {
        self.config.backend = BackendPreference::FallbackOnly;
        self
    }

    /// Set the accelerated kernel load timeout
    pub fn load_timeout(mut self, timeout: Duration) -> Self {
        self.config.load_timeout = timeout;
        self
    }

    /// Enable or disable load-time verification against the scalar kernel
    pub fn verify_on_load(mut self, verify: bool) -> Self {
        self.config.verify_on_load = verify;
        self
    }

    /// Set the load-time verification tolerance
    pub fn verification_tolerance(mut self, tolerance: f64) -> Self {
        self.config.verification_tolerance = tolerance;
        self
    }

    /// Use a custom accelerated kernel loader
    pub fn with_loader(mut self, loader: Arc<dyn KernelLoader>) -> Self {
        self.loader = Some(loader);
        self
    }

    // ========================================================================
    // Calculation Defaults
    // ========================================================================

    /// Replace all calculation defaults
    pub fn with_defaults(mut self, defaults: CalculationDefaults) -> Self {
        self.config.defaults = defaults;
        self
    }

    /// Set the default annual PMI rate
    pub fn pmi_rate(mut self, rate: f64) -> Self {
        self.config.defaults.pmi_rate = rate;
        self
    }

    /// Set the default annual property tax rate
    pub fn property_tax_rate(mut self, rate: f64) -> Self {
        self.config.defaults.property_tax_rate = rate;
        self
    }

    /// Set the default home value as a multiple of the principal
    pub fn home_value_multiplier(mut self, multiplier: f64) -> Self {
        self.config.defaults.home_value_multiplier = multiplier;
        self
    }

    /// Set the default risk-free rate
    pub fn risk_free_rate(mut self, rate: f64) -> Self {
        self.config.defaults.risk_free_rate = rate;
        self
    }

    // ========================================================================
    // Build
    // ========================================================================

    /// Build the financial engine
    pub fn build(self) -> Result<FinancialEngine, ConfigError> {
        create_from_config(self.config, self.loader)
    }

    /// Get the configuration without building (for inspection)
    pub fn get_config(&self) -> &EngineConfig {
        &self.config
    }
}
