//! Resilience integration tests
//!
//! Drives a controllable backend through the service to check that circuit
//! breaking, panic isolation and fallback routing behave end to end.
//!
//! Run with: cargo test --test resilience_tests

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use waav_phonemizer::backends::{ExternalBackend, ExternalPhonemizer};
use waav_phonemizer::{
    BackendCapabilities, CircuitBreakerConfig, CircuitState, FallbackReason, PhonemeOptions,
    PhonemeResult, PhonemeResultBuilder, PhonemizationService, PhonemizerBackend, PhonemizerConfig,
    PhonemizerError, PhonemizerResult, ResilientBackend,
};

// ============================================================================
// Test backend
// ============================================================================

#[derive(Clone, Default)]
struct Switches {
    calls: Arc<AtomicUsize>,
    failing: Arc<AtomicBool>,
    panicking: Arc<AtomicBool>,
}

/// Backend for `zz-ZZ` whose behavior is flipped from the test
struct ControlledBackend {
    languages: Vec<String>,
    switches: Switches,
}

#[async_trait]
impl PhonemizerBackend for ControlledBackend {
    fn name(&self) -> &str {
        "controlled"
    }

    fn supported_languages(&self) -> &[String] {
        &self.languages
    }

    fn capabilities(&self) -> BackendCapabilities {
        BackendCapabilities {
            supports_ipa: true,
            is_thread_safe: true,
            ..Default::default()
        }
    }

    async fn initialize(&mut self, _data_path: Option<&Path>) -> PhonemizerResult<bool> {
        Ok(false)
    }

    async fn phonemize(
        &self,
        text: &str,
        language: &str,
        options: &PhonemeOptions,
    ) -> PhonemizerResult<PhonemeResult> {
        self.switches.calls.fetch_add(1, Ordering::SeqCst);
        if self.switches.panicking.load(Ordering::SeqCst) {
            panic!("controlled backend crashed");
        }
        if self.switches.failing.load(Ordering::SeqCst) {
            return Err(PhonemizerError::backend_error("controlled", "engine offline"));
        }
        let mut builder = PhonemeResultBuilder::new();
        for word in text.split_whitespace() {
            builder.push_unstressed_word(word.chars().map(|c| c.to_string()).collect());
        }
        Ok(builder.build(language, options))
    }

    fn memory_usage(&self) -> usize {
        0
    }
}

const RESET_TIMEOUT: Duration = Duration::from_millis(100);

/// Service with the controlled backend registered for `zz-ZZ`, falling back to es-ES
async fn service_with_controlled() -> (PhonemizationService, Switches) {
    let service = PhonemizationService::new(PhonemizerConfig::default())
        .await
        .unwrap();
    let switches = Switches::default();
    let backend = ControlledBackend {
        languages: vec!["zz-ZZ".to_string()],
        switches: switches.clone(),
    };
    let config = CircuitBreakerConfig {
        failure_threshold: 2,
        reset_timeout: RESET_TIMEOUT,
        half_open_max_calls: 1,
    };
    service.register_backend(ResilientBackend::shared(Box::new(backend), config).unwrap());
    service.router().set_fallback_chain("zz-ZZ", ["es-ES"]);
    (service, switches)
}

// ============================================================================
// Circuit breaking
// ============================================================================

#[tokio::test]
async fn test_healthy_backend_serves_directly() {
    let (service, switches) = service_with_controlled().await;
    let result = service.phonemize("ab cd", Some("zz-ZZ")).await;
    assert!(result.success);
    assert_eq!(result.phonemes, vec!["a", "b", "c", "d"]);
    assert_eq!(result.word_boundaries, vec![0, 2]);
    assert_eq!(result.backend.as_deref(), Some("controlled"));
    assert!(!result.used_fallback());
    assert_eq!(switches.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_failure_falls_back_with_reason() {
    let (service, switches) = service_with_controlled().await;
    switches.failing.store(true, Ordering::SeqCst);

    let result = service.phonemize("casa", Some("zz-ZZ")).await;
    assert!(result.success);
    assert_eq!(result.backend.as_deref(), Some("spanish"));
    let fallback = result.fallback.unwrap();
    assert_eq!(fallback.used_language, "es-ES");
    assert!(matches!(fallback.reason, FallbackReason::BackendFailed(ref e) if e.contains("engine offline")));
}

#[tokio::test]
async fn test_open_circuit_skips_backend_until_timeout() {
    let (service, switches) = service_with_controlled().await;
    switches.failing.store(true, Ordering::SeqCst);

    // Distinct texts so nothing is served from the cache
    service.phonemize("uno", Some("zz-ZZ")).await;
    service.phonemize("dos", Some("zz-ZZ")).await;
    assert_eq!(service.circuit_state("controlled"), Some(CircuitState::Open));
    assert_eq!(switches.calls.load(Ordering::SeqCst), 2);

    let started = Instant::now();
    let result = service.phonemize("tres", Some("zz-ZZ")).await;
    assert!(started.elapsed() < RESET_TIMEOUT);
    assert!(result.success);
    assert_eq!(result.fallback.unwrap().reason, FallbackReason::CircuitOpen);
    assert_eq!(switches.calls.load(Ordering::SeqCst), 2);

    // Backend recovers; after the timeout one trial call closes the circuit
    switches.failing.store(false, Ordering::SeqCst);
    tokio::time::sleep(RESET_TIMEOUT + Duration::from_millis(50)).await;

    let result = service.phonemize("cuatro", Some("zz-ZZ")).await;
    assert!(result.success);
    assert!(!result.used_fallback());
    assert_eq!(switches.calls.load(Ordering::SeqCst), 3);
    assert_eq!(service.circuit_state("controlled"), Some(CircuitState::Closed));
}

#[tokio::test]
async fn test_failed_trial_reopens_circuit() {
    let (service, switches) = service_with_controlled().await;
    switches.failing.store(true, Ordering::SeqCst);

    service.phonemize("uno", Some("zz-ZZ")).await;
    service.phonemize("dos", Some("zz-ZZ")).await;
    tokio::time::sleep(RESET_TIMEOUT + Duration::from_millis(50)).await;

    let result = service.phonemize("tres", Some("zz-ZZ")).await;
    assert!(result.success);
    assert_eq!(switches.calls.load(Ordering::SeqCst), 3);
    assert_eq!(service.circuit_state("controlled"), Some(CircuitState::Open));

    // Clock restarted: the next call does not reach the backend
    service.phonemize("cuatro", Some("zz-ZZ")).await;
    assert_eq!(switches.calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_reset_circuit_readmits_backend() {
    let (service, switches) = service_with_controlled().await;
    switches.failing.store(true, Ordering::SeqCst);
    service.phonemize("uno", Some("zz-ZZ")).await;
    service.phonemize("dos", Some("zz-ZZ")).await;
    assert_eq!(service.circuit_state("controlled"), Some(CircuitState::Open));

    switches.failing.store(false, Ordering::SeqCst);
    assert!(service.reset_circuit("controlled"));
    let result = service.phonemize("tres", Some("zz-ZZ")).await;
    assert_eq!(result.backend.as_deref(), Some("controlled"));
}

// ============================================================================
// Panic isolation
// ============================================================================

#[tokio::test]
async fn test_panic_is_isolated_and_falls_back() {
    let (service, switches) = service_with_controlled().await;
    switches.panicking.store(true, Ordering::SeqCst);

    let result = service.phonemize("casa", Some("zz-ZZ")).await;
    assert!(result.success);
    assert_eq!(result.backend.as_deref(), Some("spanish"));
    match result.fallback.unwrap().reason {
        FallbackReason::BackendFailed(error) => assert!(error.contains("panicked")),
        other => panic!("Expected BackendFailed, got {other:?}"),
    }

    service.phonemize("perro", Some("zz-ZZ")).await;
    assert_eq!(service.circuit_state("controlled"), Some(CircuitState::Open));
}

#[tokio::test]
async fn test_exhausted_fallbacks_return_failure() {
    let (service, switches) = service_with_controlled().await;
    switches.failing.store(true, Ordering::SeqCst);
    service.router().set_fallback_chain("zz-ZZ", std::iter::empty());

    let result = service.phonemize("casa", Some("zz-ZZ")).await;
    assert!(!result.success);
    assert!(result.error.unwrap().contains("engine offline"));
    assert!(service.cache_stats().count == 0);
}

// ============================================================================
// External adapter
// ============================================================================

struct FakeJapanese;

impl ExternalPhonemizer for FakeJapanese {
    fn name(&self) -> &str {
        "fake-japanese"
    }

    fn languages(&self) -> Vec<String> {
        vec!["ja-JP".to_string()]
    }

    fn phonemize(&self, _text: &str, _language: &str) -> anyhow::Result<Vec<String>> {
        Ok(["pau", "\u{E006}", "o", "u", "pau", "t", "o", "\u{E010}", "i", "sil"]
            .iter()
            .map(|s| s.to_string())
            .collect())
    }
}

#[tokio::test]
async fn test_external_backend_through_service() {
    let service = PhonemizationService::new(PhonemizerConfig::default())
        .await
        .unwrap();
    let mut backend = ExternalBackend::new(FakeJapanese);
    backend.initialize(None).await.unwrap();
    service.register_backend(
        ResilientBackend::shared(Box::new(backend), CircuitBreakerConfig::default()).unwrap(),
    );

    let result = service.phonemize("京都と東京", Some("ja")).await;
    assert!(result.success, "error: {:?}", result.error);
    assert_eq!(result.backend.as_deref(), Some("fake-japanese"));
    assert!(result.phonemes.contains(&"ky".to_string()));
    assert!(result.phonemes.contains(&"sh".to_string()));
    assert!(
        result
            .phonemes
            .iter()
            .all(|p| !p.chars().any(|c| ('\u{E000}'..='\u{F8FF}').contains(&c)))
    );
}
