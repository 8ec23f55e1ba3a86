// ============================================================================
// Engine Configuration
// Backend selection policy and calculation defaults
// ============================================================================

use std::time::Duration;
use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Configuration validation failure.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("invalid engine configuration: {0}")]
    Invalid(String),
}

// ============================================================================
// Backend Preference
// ============================================================================

/// Which kernel the engine should try to run on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum BackendPreference {
    /// Try the accelerated kernel, fall back to scalar on any failure
    #[default]
    Auto,

    /// Never attempt the accelerated kernel
    /// Use case: reproducing fallback behaviour, constrained embeddings
    FallbackOnly,
}

// ============================================================================
// Calculation Defaults
// ============================================================================

/// Defaults applied when a caller omits optional parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CalculationDefaults {
    /// Annual PMI rate (fraction of principal)
    pub pmi_rate: f64,

    /// Annual property tax rate (fraction of home value)
    pub property_tax_rate: f64,

    /// Home value as a multiple of the loan principal
    pub home_value_multiplier: f64,

    /// Risk-free rate used for the Sharpe ratio
    pub risk_free_rate: f64,
}

impl Default for CalculationDefaults {
    fn default() -> Self {
        Self {
            pmi_rate: 0.005,
            property_tax_rate: 0.012,
            home_value_multiplier: 1.2,
            risk_free_rate: 0.02,
        }
    }
}

// ============================================================================
// Complete Engine Configuration
// ============================================================================

/// Configuration for creating a financial engine
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EngineConfig {
    /// Kernel selection policy
    pub backend: BackendPreference,

    /// Upper bound on accelerated kernel loading; expiry falls back to scalar
    pub load_timeout: Duration,

    /// Cross-check the accelerated kernel against the scalar kernel on load
    pub verify_on_load: bool,

    /// Maximum relative difference tolerated by the load-time cross-check
    pub verification_tolerance: f64,

    /// Defaults for optional calculation parameters
    pub defaults: CalculationDefaults,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            backend: BackendPreference::Auto,
            load_timeout: Duration::from_secs(5),
            verify_on_load: true,
            verification_tolerance: 1e-12,
            defaults: CalculationDefaults::default(),
        }
    }
}

impl EngineConfig {
    pub fn new(backend: BackendPreference) -> Self {
        Self {
            backend,
            ..Self::default()
        }
    }

    /// Builder method: Set the accelerated kernel load timeout
    pub fn with_load_timeout(mut self, timeout: Duration) -> Self {
        self.load_timeout = timeout;
        self
    }

    /// Builder method: Enable or disable load-time verification
    pub fn with_verify_on_load(mut self, verify: bool) -> Self {
        self.verify_on_load = verify;
        self
    }

    /// Builder method: Set the verification tolerance
    pub fn with_verification_tolerance(mut self, tolerance: f64) -> Self {
        self.verification_tolerance = tolerance;
        self
    }

    /// Builder method: Replace the calculation defaults
    pub fn with_defaults(mut self, defaults: CalculationDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.load_timeout.is_zero() {
            return Err(ConfigError::Invalid(
                "load timeout must be greater than zero".to_string(),
            ));
        }

        if !self.verification_tolerance.is_finite() || self.verification_tolerance < 0.0 {
            return Err(ConfigError::Invalid(
                "verification tolerance must be a non-negative finite number".to_string(),
            ));
        }

        let defaults = &self.defaults;
        for (name, value) in [
            ("pmi rate", defaults.pmi_rate),
            ("property tax rate", defaults.property_tax_rate),
            ("home value multiplier", defaults.home_value_multiplier),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "default {} must be a non-negative finite number",
                    name
                )));
            }
        }

        if !defaults.risk_free_rate.is_finite() {
            return Err(ConfigError::Invalid(
                "default risk-free rate must be finite".to_string(),
            ));
        }

        Ok(())
    }
}

// ============================================================================
// Preset Configurations (Factory Methods)
// ============================================================================

impl EngineConfig {
    /// Portable configuration
    /// - Scalar kernel only, loader never runs
    pub fn fallback_only() -> Self {
        Self::new(BackendPreference::FallbackOnly)
    }

    /// Latency-sensitive configuration
    /// - Accelerated kernel preferred
    /// - Short load budget, no verification pass
    pub fn low_latency() -> Self {
        Self::new(BackendPreference::Auto)
            .with_load_timeout(Duration::from_millis(250))
            .with_verify_on_load(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();

        assert_eq!(config.backend, BackendPreference::Auto);
        assert!(config.verify_on_load);
        assert_eq!(config.defaults.pmi_rate, 0.005);
        assert_eq!(config.defaults.property_tax_rate, 0.012);
        assert_eq!(config.defaults.home_value_multiplier, 1.2);
        assert_eq!(config.defaults.risk_free_rate, 0.02);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_pattern() {
        let config = EngineConfig::new(BackendPreference::Auto)
            .with_load_timeout(Duration::from_millis(100))
            .with_verify_on_load(false)
            .with_verification_tolerance(1e-9);

        assert_eq!(config.load_timeout, Duration::from_millis(100));
        assert!(!config.verify_on_load);
        assert_eq!(config.verification_tolerance, 1e-9);
    }

    #[test]
    fn test_validation() {
        let zero_timeout = EngineConfig::default().with_load_timeout(Duration::ZERO);
        assert!(zero_timeout.validate().is_err());

        let bad_tolerance = EngineConfig::default().with_verification_tolerance(f64::NAN);
        assert!(bad_tolerance.validate().is_err());

        let bad_defaults = EngineConfig::default().with_defaults(CalculationDefaults {
            pmi_rate: -0.01,
            ..CalculationDefaults::default()
        });
        assert_eq!(
            bad_defaults.validate(),
            Err(ConfigError::Invalid(
                "default pmi rate must be a non-negative finite number".to_string()
            ))
        );
    }

    #[test]
    fn test_preset_configs() {
        let portable = EngineConfig::fallback_only();
        assert_eq!(portable.backend, BackendPreference::FallbackOnly);

        let fast = EngineConfig::low_latency();
        assert_eq!(fast.backend, BackendPreference::Auto);
        assert!(!fast.verify_on_load);
        assert!(fast.validate().is_ok());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_config_serde() {
        let config = EngineConfig::low_latency();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: EngineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
    }
}
