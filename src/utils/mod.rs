// ============================================================================
// Utilities Module
// Process-level helpers for applications embedding the engine
// ============================================================================

#[cfg(feature = "logging")]
mod logging;

#[cfg(feature = "logging")]
pub use logging::init_logging;
