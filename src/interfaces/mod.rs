// ============================================================================
// Interfaces Module
// Contains all trait definitions and contracts
// ============================================================================

mod kernel;
mod kernel_loader;

pub use kernel::{FinancialKernel, MAX_SCHEDULE_MONTHS, MONTHS_PER_YEAR};
pub(crate) use kernel::months_in;
pub use kernel_loader::{KernelLoader, LoadError};
