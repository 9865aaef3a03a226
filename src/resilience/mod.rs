//! Resilience layer
//!
//! Every backend call goes through a [`ResilientBackend`]: the circuit
//! breaker decides whether the backend is called at all, the call runs under
//! panic isolation, and backends that are not thread-safe are served from a
//! [`BackendPool`].
//!
//! # Architecture
//!
//! ```text
//!   phonemize()
//!       │
//!       ├─ breaker.can_execute()? ── no ──► Err(BackendUnavailable)   (backend untouched)
//!       │
//!       ├─ Shared(Arc<dyn Backend>) ───────────┐
//!       ├─ Pooled(BackendPool) ── rent() ──────┤
//!       │                                      ▼
//!       │                            call_isolated(backend.phonemize())
//!       │                                      │
//!       └─ breaker.on_success() / on_failure(&err) ◄┘
//! ```

pub mod circuit_breaker;
pub mod isolation;
pub mod pool;

use std::sync::Arc;

use crate::core::{BackendCapabilities, PhonemeOptions, PhonemeResult, PhonemizerBackend};
use crate::errors::{PhonemizerError, PhonemizerResult};

pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
pub use isolation::{call_isolated, panic_message};
pub use pool::{BackendPool, PooledBackend};

/// How a registered backend's instances are held
pub enum BackendInstances {
    /// One instance shared by all callers
    Shared(Arc<dyn PhonemizerBackend>),
    /// Exclusive instances rented per call
    Pooled(BackendPool),
}

/// A backend registration guarded by its own circuit breaker
pub struct ResilientBackend {
    name: String,
    languages: Vec<String>,
    capabilities: BackendCapabilities,
    memory_usage: usize,
    breaker: CircuitBreaker,
    instances: BackendInstances,
}

impl ResilientBackend {
    /// Register initialized instances of one backend
    ///
    /// A thread-safe backend keeps only the first instance; otherwise all of
    /// them are pooled.
    pub fn new(
        instances: Vec<Box<dyn PhonemizerBackend>>,
        config: CircuitBreakerConfig,
    ) -> PhonemizerResult<Self> {
        let Some(first) = instances.first() else {
            return Err(PhonemizerError::Configuration(
                "backend registration needs at least one instance".to_string(),
            ));
        };
        let name = first.name().to_string();
        let languages = first.supported_languages().to_vec();
        let capabilities = first.capabilities();
        let memory_usage = instances.iter().map(|b| b.memory_usage()).sum();

        let instances = if capabilities.is_thread_safe {
            let shared = instances.into_iter().next().map(Arc::<dyn PhonemizerBackend>::from);
            match shared {
                Some(backend) => BackendInstances::Shared(backend),
                None => return Err(PhonemizerError::init_error(&name, "no instance")),
            }
        } else {
            BackendInstances::Pooled(BackendPool::new(instances)?)
        };

        Ok(Self {
            breaker: CircuitBreaker::new(name.clone(), config),
            name,
            languages,
            capabilities,
            memory_usage,
            instances,
        })
    }

    /// Register a single thread-safe instance
    pub fn shared(
        backend: Box<dyn PhonemizerBackend>,
        config: CircuitBreakerConfig,
    ) -> PhonemizerResult<Self> {
        Self::new(vec![backend], config)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn supported_languages(&self) -> &[String] {
        &self.languages
    }

    pub fn supports_language(&self, language: &str) -> bool {
        self.languages
            .iter()
            .any(|l| l.eq_ignore_ascii_case(language))
    }

    pub fn capabilities(&self) -> BackendCapabilities {
        self.capabilities
    }

    /// Live usage of a shared instance; pooled instances report their registration size
    pub fn memory_usage(&self) -> usize {
        match &self.instances {
            BackendInstances::Shared(backend) => backend.memory_usage(),
            BackendInstances::Pooled(_) => self.memory_usage,
        }
    }

    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    pub fn circuit_state(&self) -> CircuitState {
        self.breaker.state()
    }

    pub fn is_pooled(&self) -> bool {
        matches!(self.instances, BackendInstances::Pooled(_))
    }

    /// Call the backend if its circuit allows it
    ///
    /// An open circuit fails with `BackendUnavailable` without touching the
    /// backend. The outcome of every admitted call is recorded on the breaker.
    pub async fn phonemize(
        &self,
        text: &str,
        language: &str,
        options: &PhonemeOptions,
    ) -> PhonemizerResult<PhonemeResult> {
        if !self.breaker.can_execute() {
            tracing::debug!(backend = %self.name, "Circuit open, skipping backend");
            return Err(PhonemizerError::BackendUnavailable(format!(
                "circuit open for backend '{}'",
                self.name
            )));
        }

        let outcome = match &self.instances {
            BackendInstances::Shared(backend) => {
                call_isolated(&self.name, backend.phonemize(text, language, options)).await
            }
            BackendInstances::Pooled(pool) => {
                let rented = tokio::select! {
                    rented = pool.rent() => rented,
                    _ = options.cancellation.cancelled() => Err(PhonemizerError::Cancelled),
                };
                match rented {
                    Ok(backend) => {
                        call_isolated(&self.name, backend.phonemize(text, language, options)).await
                    }
                    Err(e) => Err(e),
                }
            }
        };

        match &outcome {
            Ok(_) => self.breaker.on_success(),
            Err(e) => {
                tracing::debug!(
                    backend = %self.name,
                    category = e.category(),
                    error = %e,
                    "Backend call failed"
                );
                self.breaker.on_failure(e);
            }
        }
        outcome.map(|result| result.with_backend(self.name.clone()))
    }
}
