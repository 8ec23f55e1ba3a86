// ============================================================================
// Kernel Loader Interface
// Defines the contract for bringing up an accelerated kernel
// ============================================================================

use crate::interfaces::FinancialKernel;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Reasons an accelerated kernel could not be brought up.
///
/// Every variant is recovered by the backend selector, which substitutes
/// the scalar kernel; none of them reaches a calculation caller.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LoadError {
    /// The host cannot run the accelerated kernel
    #[error("accelerated kernel unsupported: {0}")]
    Unsupported(String),

    /// The accelerated kernel disagreed with the scalar reference
    #[error("accelerated kernel failed verification on {operation}: expected {expected}, got {actual}")]
    VerificationFailed {
        operation: &'static str,
        expected: f64,
        actual: f64,
    },

    /// Loading did not finish within the configured budget
    #[error("accelerated kernel load timed out after {0:?}")]
    TimedOut(Duration),

    /// The loader panicked
    #[error("accelerated kernel loader panicked")]
    Panicked,

    /// Loading was skipped by configuration
    #[error("accelerated kernel disabled by configuration")]
    Disabled,

    /// Any other loader failure
    #[error("accelerated kernel load failed: {0}")]
    Failed(String),
}

/// Strategy interface for producing the accelerated kernel.
///
/// The selector calls [`load`](KernelLoader::load) at most once per engine,
/// on a spawned task bounded by the configured timeout.
#[async_trait]
pub trait KernelLoader: Send + Sync + 'static {
    /// Bring up the accelerated kernel.
    async fn load(&self) -> Result<Arc<dyn FinancialKernel>, LoadError>;

    /// Get the loader name for logging
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            LoadError::TimedOut(Duration::from_millis(250)).to_string(),
            "accelerated kernel load timed out after 250ms"
        );
        assert_eq!(
            LoadError::Unsupported("no SIMD".to_string()).to_string(),
            "accelerated kernel unsupported: no SIMD"
        );
        assert_eq!(
            LoadError::VerificationFailed {
                operation: "sum",
                expected: 1.0,
                actual: 2.0
            }
            .to_string(),
            "accelerated kernel failed verification on sum: expected 1, got 2"
        );
    }

    #[test]
    fn test_loader_is_object_safe() {
        fn assert_send_sync<T: Send + Sync + ?Sized>() {}
        assert_send_sync::<dyn KernelLoader>();
    }
}
