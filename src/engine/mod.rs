// ============================================================================
// Engine Module
// Backend selection and the async financial engine facade
// ============================================================================

mod benchmark;
mod financial_engine;
mod selector;

pub mod factory;

pub use benchmark::{BackendTiming, BenchmarkReport};
pub use factory::{create_from_config, FinancialEngineBuilder};
pub use financial_engine::FinancialEngine;
pub use selector::{BackendHandle, BackendKind, BackendSelector, BackendState, BackendStatus};
