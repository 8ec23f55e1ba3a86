// ============================================================================
// Logging Bootstrap
// Installs a tracing subscriber for binaries, demos and benchmarks
// ============================================================================

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{fmt, EnvFilter};

/// Install a global `fmt` subscriber.
///
/// `RUST_LOG` takes precedence; otherwise `default_directive` (for example
/// `"finance_engine=debug"`) is used. Fails if a global subscriber is
/// already set.
pub fn init_logging(default_directive: &str) -> Result<(), TryInitError> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive)))
        .with(fmt::layer())
        .try_init()
}
