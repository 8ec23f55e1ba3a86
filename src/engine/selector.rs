// ============================================================================
// Execution Backend Selector
// Single-flight, memoized and time-bounded resolution of the kernel backend
// ============================================================================

use crate::domain::BackendPreference;
use crate::interfaces::{FinancialKernel, KernelLoader, LoadError};
use crate::kernel::create_scalar_kernel;
use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};
use tokio::sync::{watch, OnceCell};

#[cfg(feature = "serde")]
use serde::Serialize;

/// Which kind of kernel a resolved engine runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub enum BackendKind {
    /// Vectorized kernel brought up by the loader
    Accelerated,
    /// Portable scalar kernel
    Fallback,
}

/// Lifecycle of backend resolution.
///
/// `Uninitialized -> Loading -> ReadyAccelerated | ReadyFallback`; both
/// ready states are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[repr(u8)]
pub enum BackendState {
    Uninitialized = 0,
    Loading = 1,
    ReadyAccelerated = 2,
    ReadyFallback = 3,
}

impl BackendState {
    #[inline]
    fn from_u8(value: u8) -> Self {
        match value {
            1 => BackendState::Loading,
            2 => BackendState::ReadyAccelerated,
            3 => BackendState::ReadyFallback,
            _ => BackendState::Uninitialized,
        }
    }

    /// Whether resolution has finished.
    pub fn is_ready(self) -> bool {
        matches!(
            self,
            BackendState::ReadyAccelerated | BackendState::ReadyFallback
        )
    }
}

impl fmt::Display for BackendState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendState::Uninitialized => write!(f, "uninitialized"),
            BackendState::Loading => write!(f, "loading"),
            BackendState::ReadyAccelerated => write!(f, "ready (accelerated)"),
            BackendState::ReadyFallback => write!(f, "ready (fallback)"),
        }
    }
}

/// Outcome of backend resolution.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct BackendStatus {
    pub kind: BackendKind,
    /// Name of the resolved kernel
    pub kernel: &'static str,
    /// Why the accelerated kernel is not in use, if it is not
    pub fallback_reason: Option<String>,
    /// Time spent resolving
    pub load_time: Duration,
    pub resolved_at: DateTime<Utc>,
}

/// Resolved kernel together with how it was obtained.
#[derive(Clone)]
pub struct BackendHandle {
    kernel: Arc<dyn FinancialKernel>,
    status: BackendStatus,
}

impl BackendHandle {
    /// The kernel every calculation runs on.
    #[inline]
    pub fn kernel(&self) -> &dyn FinancialKernel {
        self.kernel.as_ref()
    }

    pub fn status(&self) -> &BackendStatus {
        &self.status
    }

    pub fn is_accelerated(&self) -> bool {
        self.status.kind == BackendKind::Accelerated
    }
}

impl fmt::Debug for BackendHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendHandle")
            .field("kernel", &self.kernel.name())
            .field("status", &self.status)
            .finish()
    }
}

// ============================================================================
// Backend Selector
// ============================================================================

/// Owns the backend lifecycle of one engine.
///
/// The first caller of [`resolve`](BackendSelector::resolve) spawns the
/// resolution task; every caller, concurrent or later, awaits that one task.
/// Dropping a `resolve` future never restarts the loader. Any loader failure,
/// timeout or panic resolves to the scalar kernel instead of surfacing an
/// error.
pub struct BackendSelector {
    preference: BackendPreference,
    load_timeout: Duration,
    loader: Arc<dyn KernelLoader>,
    handle: OnceCell<BackendHandle>,
    resolution: OnceLock<watch::Receiver<Option<BackendHandle>>>,
    state: Arc<AtomicU8>,
    load_attempts: Arc<AtomicUsize>,
}

impl BackendSelector {
    pub fn new(
        preference: BackendPreference,
        load_timeout: Duration,
        loader: Arc<dyn KernelLoader>,
    ) -> Self {
        Self {
            preference,
            load_timeout,
            loader,
            handle: OnceCell::new(),
            resolution: OnceLock::new(),
            state: Arc::new(AtomicU8::new(BackendState::Uninitialized as u8)),
            load_attempts: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Resolve the backend, loading it on first use.
    ///
    /// Must be called from within a tokio runtime.
    pub async fn resolve(&self) -> &BackendHandle {
        self.handle.get_or_init(|| self.await_resolution()).await
    }

    /// The resolved backend, if resolution has completed.
    pub fn get(&self) -> Option<&BackendHandle> {
        if let Some(handle) = self.handle.get() {
            return Some(handle);
        }
        let published = (*self.resolution.get()?.borrow()).clone()?;
        // Fails only while a resolve call is storing the same handle
        let _ = self.handle.set(published);
        self.handle.get()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> BackendState {
        BackendState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Number of times the loader has been invoked (0 or 1).
    pub fn load_attempts(&self) -> usize {
        self.load_attempts.load(Ordering::Relaxed)
    }

    pub fn preference(&self) -> BackendPreference {
        self.preference
    }

    /// Receiver for the outcome of the resolution task, spawning it once.
    fn start_resolution(&self) -> watch::Receiver<Option<BackendHandle>> {
        self.resolution
            .get_or_init(|| {
                let (tx, rx) = watch::channel(None);
                let resolution = Resolution {
                    preference: self.preference,
                    load_timeout: self.load_timeout,
                    loader: Arc::clone(&self.loader),
                    state: Arc::clone(&self.state),
                    load_attempts: Arc::clone(&self.load_attempts),
                };
                tokio::spawn(async move {
                    tx.send_replace(Some(resolution.run().await));
                });
                rx
            })
            .clone()
    }

    async fn await_resolution(&self) -> BackendHandle {
        let mut rx = self.start_resolution();
        let published = match rx.wait_for(Option::is_some).await {
            Ok(published) => (*published).clone(),
            Err(_) => None,
        };

        match published {
            Some(handle) => handle,
            None => {
                // The task was dropped before publishing (runtime shutdown)
                let reason = LoadError::Failed("backend resolution task ended".to_string());
                tracing::warn!("Falling back to scalar kernel: {}", reason);
                self.state
                    .store(BackendState::ReadyFallback as u8, Ordering::Release);
                fallback_handle(reason, Duration::ZERO)
            }
        }
    }
}

impl fmt::Debug for BackendSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendSelector")
            .field("preference", &self.preference)
            .field("load_timeout", &self.load_timeout)
            .field("loader", &self.loader.name())
            .field("state", &self.state())
            .finish()
    }
}

fn fallback_handle(reason: LoadError, load_time: Duration) -> BackendHandle {
    let kernel = create_scalar_kernel();
    BackendHandle {
        status: BackendStatus {
            kind: BackendKind::Fallback,
            kernel: kernel.name(),
            fallback_reason: Some(reason.to_string()),
            load_time,
            resolved_at: Utc::now(),
        },
        kernel,
    }
}

/// One backend resolution, owned by its spawned task.
struct Resolution {
    preference: BackendPreference,
    load_timeout: Duration,
    loader: Arc<dyn KernelLoader>,
    state: Arc<AtomicU8>,
    load_attempts: Arc<AtomicUsize>,
}

impl Resolution {
    async fn run(self) -> BackendHandle {
        self.state
            .store(BackendState::Loading as u8, Ordering::Release);
        let started = Instant::now();

        let outcome = match self.preference {
            BackendPreference::FallbackOnly => Err(LoadError::Disabled),
            BackendPreference::Auto => self.load_accelerated().await,
        };
        let load_time = started.elapsed();

        let handle = match outcome {
            Ok(kernel) => {
                tracing::info!(
                    "Accelerated kernel {} ready via {} in {:?}",
                    kernel.name(),
                    self.loader.name(),
                    load_time
                );
                BackendHandle {
                    status: BackendStatus {
                        kind: BackendKind::Accelerated,
                        kernel: kernel.name(),
                        fallback_reason: None,
                        load_time,
                        resolved_at: Utc::now(),
                    },
                    kernel,
                }
            }
            Err(reason) => {
                if reason == LoadError::Disabled {
                    tracing::debug!("Accelerated kernel disabled, using scalar kernel");
                } else {
                    tracing::warn!("Falling back to scalar kernel: {}", reason);
                }
                fallback_handle(reason, load_time)
            }
        };

        let state = match handle.status.kind {
            BackendKind::Accelerated => BackendState::ReadyAccelerated,
            BackendKind::Fallback => BackendState::ReadyFallback,
        };
        self.state.store(state as u8, Ordering::Release);
        handle
    }

    async fn load_accelerated(&self) -> Result<Arc<dyn FinancialKernel>, LoadError> {
        self.load_attempts.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(
            "Loading accelerated kernel via {} (timeout {:?})",
            self.loader.name(),
            self.load_timeout
        );

        let loader = Arc::clone(&self.loader);
        let mut task = tokio::spawn(async move { loader.load().await });

        match tokio::time::timeout(self.load_timeout, &mut task).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_error)) if join_error.is_panic() => Err(LoadError::Panicked),
            Ok(Err(join_error)) => Err(LoadError::Failed(join_error.to_string())),
            Err(_) => {
                task.abort();
                Err(LoadError::TimedOut(self.load_timeout))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::ScalarKernel;
    use async_trait::async_trait;

    // Loader that counts invocations and yields a scalar kernel after a delay
    struct CountingLoader {
        calls: AtomicUsize,
        delay: Duration,
    }

    impl CountingLoader {
        fn new(delay: Duration) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                delay,
            }
        }
    }

    #[async_trait]
    impl KernelLoader for CountingLoader {
        async fn load(&self) -> Result<Arc<dyn FinancialKernel>, LoadError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            Ok(Arc::new(ScalarKernel::new()))
        }

        fn name(&self) -> &str {
            "counting"
        }
    }

    struct FailingLoader;

    #[async_trait]
    impl KernelLoader for FailingLoader {
        async fn load(&self) -> Result<Arc<dyn FinancialKernel>, LoadError> {
            Err(LoadError::Unsupported("test host".to_string()))
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    struct PanickingLoader;

    #[async_trait]
    impl KernelLoader for PanickingLoader {
        async fn load(&self) -> Result<Arc<dyn FinancialKernel>, LoadError> {
            panic!("loader exploded");
        }

        fn name(&self) -> &str {
            "panicking"
        }
    }

    #[tokio::test]
    async fn test_initial_state() {
        let selector = BackendSelector::new(
            BackendPreference::Auto,
            Duration::from_secs(1),
            Arc::new(FailingLoader),
        );
        assert_eq!(selector.state(), BackendState::Uninitialized);
        assert!(selector.get().is_none());
        assert_eq!(selector.load_attempts(), 0);
    }

    #[tokio::test]
    async fn test_successful_load_is_accelerated() {
        let loader = Arc::new(CountingLoader::new(Duration::ZERO));
        let selector = BackendSelector::new(
            BackendPreference::Auto,
            Duration::from_secs(1),
            loader.clone(),
        );

        let handle = selector.resolve().await;
        assert!(handle.is_accelerated());
        assert_eq!(handle.status().fallback_reason, None);
        assert_eq!(selector.state(), BackendState::ReadyAccelerated);

        // Memoized: later calls never reload
        selector.resolve().await;
        assert_eq!(loader.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_single_flight_under_concurrency() {
        let loader = Arc::new(CountingLoader::new(Duration::from_millis(50)));
        let selector = Arc::new(BackendSelector::new(
            BackendPreference::Auto,
            Duration::from_secs(5),
            loader.clone(),
        ));

        let tasks: Vec<_> = (0..16)
            .map(|_| {
                let selector = Arc::clone(&selector);
                tokio::spawn(async move { selector.resolve().await.status().kind })
            })
            .collect();

        for task in tasks {
            assert_eq!(task.await.unwrap(), BackendKind::Accelerated);
        }
        assert_eq!(loader.calls.load(Ordering::SeqCst), 1);
        assert_eq!(selector.load_attempts(), 1);
    }

    #[tokio::test]
    async fn test_loader_failure_falls_back() {
        let selector = BackendSelector::new(
            BackendPreference::Auto,
            Duration::from_secs(1),
            Arc::new(FailingLoader),
        );

        let handle = selector.resolve().await;
        assert!(!handle.is_accelerated());
        assert_eq!(handle.kernel().name(), "Scalar");
        assert_eq!(
            handle.status().fallback_reason.as_deref(),
            Some("accelerated kernel unsupported: test host")
        );
        assert_eq!(selector.state(), BackendState::ReadyFallback);
    }

    #[tokio::test]
    async fn test_timeout_falls_back() {
        let loader = Arc::new(CountingLoader::new(Duration::from_secs(30)));
        let selector = BackendSelector::new(
            BackendPreference::Auto,
            Duration::from_millis(20),
            loader.clone(),
        );

        let handle = selector.resolve().await;
        assert_eq!(handle.status().kind, BackendKind::Fallback);
        assert_eq!(
            handle.status().fallback_reason,
            Some(LoadError::TimedOut(Duration::from_millis(20)).to_string())
        );
        assert!(handle.status().load_time < Duration::from_secs(30));
        assert_eq!(selector.state(), BackendState::ReadyFallback);
    }

    #[tokio::test]
    async fn test_panic_falls_back() {
        let selector = BackendSelector::new(
            BackendPreference::Auto,
            Duration::from_secs(1),
            Arc::new(PanickingLoader),
        );

        let handle = selector.resolve().await;
        assert_eq!(handle.status().kind, BackendKind::Fallback);
        assert_eq!(
            handle.status().fallback_reason,
            Some(LoadError::Panicked.to_string())
        );
    }

    #[tokio::test]
    async fn test_fallback_only_skips_loader() {
        let loader = Arc::new(CountingLoader::new(Duration::ZERO));
        let selector = BackendSelector::new(
            BackendPreference::FallbackOnly,
            Duration::from_secs(1),
            loader.clone(),
        );

        let handle = selector.resolve().await;
        assert_eq!(handle.status().kind, BackendKind::Fallback);
        assert_eq!(
            handle.status().fallback_reason,
            Some(LoadError::Disabled.to_string())
        );
        assert_eq!(loader.calls.load(Ordering::SeqCst), 0);
        assert_eq!(selector.load_attempts(), 0);
    }

    #[tokio::test]
    async fn test_cancelled_resolve_keeps_single_load() {
        let loader = Arc::new(CountingLoader::new(Duration::from_millis(200)));
        let selector = BackendSelector::new(
            BackendPreference::Auto,
            Duration::from_secs(5),
            loader.clone(),
        );

        // The first caller gives up while the loader is still running
        let first = tokio::time::timeout(Duration::from_millis(20), selector.resolve()).await;
        assert!(first.is_err());
        assert_eq!(selector.state(), BackendState::Loading);

        let handle = selector.resolve().await;
        assert!(handle.is_accelerated());
        assert_eq!(loader.calls.load(Ordering::SeqCst), 1);
        assert_eq!(selector.load_attempts(), 1);
    }

    #[tokio::test]
    async fn test_resolution_completes_after_caller_is_dropped() {
        let loader = Arc::new(CountingLoader::new(Duration::from_millis(50)));
        let selector = BackendSelector::new(
            BackendPreference::Auto,
            Duration::from_secs(5),
            loader.clone(),
        );

        let first = tokio::time::timeout(Duration::from_millis(5), selector.resolve()).await;
        assert!(first.is_err());

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(selector.state(), BackendState::ReadyAccelerated);
        assert!(selector.get().is_some_and(BackendHandle::is_accelerated));
        assert_eq!(loader.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_state_round_trip() {
        for state in [
            BackendState::Uninitialized,
            BackendState::Loading,
            BackendState::ReadyAccelerated,
            BackendState::ReadyFallback,
        ] {
            assert_eq!(BackendState::from_u8(state as u8), state);
        }
        assert!(BackendState::ReadyFallback.is_ready());
        assert!(!BackendState::Loading.is_ready());
    }
}
