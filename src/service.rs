//! Phonemization Service
//!
//! The single async entry point. Owns the detector, router, result cache and
//! shared dictionary; callers construct one and pass it around.
//!
//! # Request Flow
//!
//! ```text
//!   phonemize(text, hint)
//!       │
//!       ├─ empty text ───────────────────────────────► empty success
//!       ├─ hint None/"auto" ─► detect() ─┬─ mixed ──► segment_mixed() ─► per-segment ─► concat
//!       ├─ hint "mixed" ─────────────────┘
//!       ▼
//!   cache.get(key) ── hit ──────────────────────────► result (from_cache = true)
//!       │ miss
//!       ▼
//!   router.candidates(lang) ─► ResilientBackend::phonemize() per candidate
//!       │                        (first success wins; fallback metadata attached)
//!       ▼
//!   cache.insert() ─► result
//! ```
//!
//! Nothing here returns `Err` to the caller: every failure becomes a
//! `PhonemeResult` with `success == false` and a descriptive `error`.

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use crate::cache::{CacheStats, ResultCache, cache_key};
use crate::config::PhonemizerConfig;
use crate::core::timing::estimate_durations;
use crate::core::{
    AUTO_LANGUAGE, FallbackInfo, FallbackReason, MIXED_LANGUAGE, PhonemeOptions, PhonemeResult,
    canonicalize, primary_subtag,
};
use crate::detect::{Detection, LanguageDetector};
use crate::dictionary::PronunciationDictionary;
use crate::errors::{PhonemizerError, PhonemizerResult};
use crate::resilience::{CircuitState, ResilientBackend};
use crate::router::{BackendRouter, LanguageCapabilities};

// =============================================================================
// Metrics
// =============================================================================

/// Request counters, updated lock-free
#[derive(Debug, Default)]
pub struct ServiceMetrics {
    requests: AtomicU64,
    successes: AtomicU64,
    failures: AtomicU64,
    fallbacks: AtomicU64,
    cancellations: AtomicU64,
}

/// Point-in-time copy of [`ServiceMetrics`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub requests: u64,
    pub successes: u64,
    pub failures: u64,
    pub fallbacks: u64,
    pub cancellations: u64,
}

impl ServiceMetrics {
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            requests: self.requests.load(Ordering::Relaxed),
            successes: self.successes.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            fallbacks: self.fallbacks.load(Ordering::Relaxed),
            cancellations: self.cancellations.load(Ordering::Relaxed),
        }
    }

    fn record(&self, result: &PhonemeResult) {
        if result.success {
            self.successes.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failures.fetch_add(1, Ordering::Relaxed);
        }
    }
}

// =============================================================================
// Service
// =============================================================================

/// Multilingual phonemization engine
pub struct PhonemizationService {
    config: PhonemizerConfig,
    detector: LanguageDetector,
    router: BackendRouter,
    cache: ResultCache,
    dictionary: Arc<PronunciationDictionary>,
    metrics: ServiceMetrics,
}

impl PhonemizationService {
    /// Build a service with every built-in backend initialized
    pub async fn new(config: PhonemizerConfig) -> PhonemizerResult<Self> {
        config.validate()?;
        let dictionary = Arc::new(PronunciationDictionary::new());
        let router = BackendRouter::with_builtin_backends(&config, dictionary.clone()).await?;
        Ok(Self::from_parts(config, router, dictionary))
    }

    /// Assemble a service around an existing router
    ///
    /// `dictionary` should be the one the router's backends were built with,
    /// so reloads and runtime words reach them.
    pub fn from_parts(
        config: PhonemizerConfig,
        router: BackendRouter,
        dictionary: Arc<PronunciationDictionary>,
    ) -> Self {
        let detector = LanguageDetector::new(config.detection_threshold)
            .with_default_language(config.default_language.clone());
        let cache = ResultCache::new(config.cache_max_entries, config.cache_max_bytes);

        tracing::info!(
            backends = ?router.backend_names(),
            cache_max_entries = config.cache_max_entries,
            cache_max_bytes = config.cache_max_bytes,
            "Phonemization service ready"
        );
        Self {
            config,
            detector,
            router,
            cache,
            dictionary,
            metrics: ServiceMetrics::default(),
        }
    }

    pub fn config(&self) -> &PhonemizerConfig {
        &self.config
    }

    pub fn router(&self) -> &BackendRouter {
        &self.router
    }

    pub fn dictionary(&self) -> &Arc<PronunciationDictionary> {
        &self.dictionary
    }

    /// Register an additional backend (e.g. an external adapter)
    pub fn register_backend(&self, backend: ResilientBackend) {
        self.router.register(backend);
        self.cache.clear();
    }

    /// Phonemize with the configured default options
    pub async fn phonemize(&self, text: &str, language: Option<&str>) -> PhonemeResult {
        let options = self.config.phoneme_options();
        self.phonemize_with(text, language, &options).await
    }

    /// Phonemize with per-call options
    pub async fn phonemize_with(
        &self,
        text: &str,
        language: Option<&str>,
        options: &PhonemeOptions,
    ) -> PhonemeResult {
        let start = Instant::now();
        self.metrics.requests.fetch_add(1, Ordering::Relaxed);

        let result = match self.dispatch(text, language, options).await {
            Ok(result) => result,
            Err(e) => self.failure(text, language, e),
        };
        self.metrics.record(&result);
        result.with_processing_time(start.elapsed())
    }

    /// Phonemize many requests concurrently; results keep input order
    pub async fn phonemize_batch(&self, requests: &[(&str, Option<&str>)]) -> Vec<PhonemeResult> {
        join_all(
            requests
                .iter()
                .map(|(text, language)| self.phonemize(text, *language)),
        )
        .await
    }

    async fn dispatch(
        &self,
        text: &str,
        language: Option<&str>,
        options: &PhonemeOptions,
    ) -> PhonemizerResult<PhonemeResult> {
        let hint = match language {
            Some(tag) => Some(validate_tag(tag)?),
            None => None,
        };
        if text.trim().is_empty() {
            let language = match hint.as_deref() {
                Some(tag) if tag != AUTO_LANGUAGE && tag != MIXED_LANGUAGE => tag.to_string(),
                _ => self.config.default_language.clone(),
            };
            return Ok(PhonemeResult::empty(language));
        }
        options.check_cancelled()?;

        match hint.as_deref() {
            Some(MIXED_LANGUAGE) => self.phonemize_mixed(text, options).await,
            Some(AUTO_LANGUAGE) | None => {
                let detection = self.detector.detect(text);
                if detection.is_mixed {
                    self.phonemize_mixed(text, options).await
                } else {
                    if detection.low_confidence {
                        tracing::debug!(
                            language = %detection.language,
                            confidence = detection.confidence,
                            "Low-confidence detection"
                        );
                    }
                    self.phonemize_single(text, &detection.language, options).await
                }
            }
            Some(tag) => self.phonemize_single(text, tag, options).await,
        }
    }

    /// Cache lookup, then the router's candidates in order
    async fn phonemize_single(
        &self,
        text: &str,
        language: &str,
        options: &PhonemeOptions,
    ) -> PhonemizerResult<PhonemeResult> {
        let key = cache_key(language, text, options);
        if let Some(hit) = self.cache.get(&key) {
            tracing::debug!(language = %language, "Cache hit");
            return Ok(hit);
        }

        let result = self.call_backends(text, language, options).await?;
        if let Err(e) = self.cache.insert(key, result.clone()) {
            tracing::debug!(error = %e, "Result not cached");
        }
        Ok(result)
    }

    async fn call_backends(
        &self,
        text: &str,
        language: &str,
        options: &PhonemeOptions,
    ) -> PhonemizerResult<PhonemeResult> {
        let candidates = self.router.candidates(language);
        if candidates.is_empty() {
            return Err(PhonemizerError::UnsupportedLanguage(language.to_string()));
        }

        let mut reason: Option<FallbackReason> = None;
        let mut last_error: Option<PhonemizerError> = None;

        for candidate in candidates {
            if reason.is_none() && candidate.language != language {
                reason = Some(FallbackReason::NoBackendForLanguage);
            }

            match candidate
                .backend
                .phonemize(text, &candidate.language, options)
                .await
            {
                Ok(result) => {
                    let Some(reason) = reason else {
                        return Ok(result);
                    };
                    tracing::warn!(
                        requested = %language,
                        used = %candidate.language,
                        backend = %candidate.backend.name(),
                        reason = %reason,
                        "Fallback backend used"
                    );
                    self.metrics.fallbacks.fetch_add(1, Ordering::Relaxed);
                    return Ok(result.with_fallback(FallbackInfo {
                        requested_language: language.to_string(),
                        used_language: candidate.language,
                        reason,
                    }));
                }
                Err(PhonemizerError::Cancelled) => return Err(PhonemizerError::Cancelled),
                Err(e) => {
                    if reason.is_none() {
                        reason = Some(match &e {
                            PhonemizerError::BackendUnavailable(_)
                                if candidate.backend.circuit_state() == CircuitState::Open =>
                            {
                                FallbackReason::CircuitOpen
                            }
                            other => FallbackReason::BackendFailed(other.to_string()),
                        });
                    }
                    last_error = Some(e);
                }
            }
        }

        Err(match last_error {
            Some(PhonemizerError::BackendUnavailable(detail)) => {
                PhonemizerError::BackendUnavailable(format!(
                    "all backends for '{language}' failed, last: {detail}"
                ))
            }
            Some(e) => PhonemizerError::backend_error(
                language,
                format!("all backends failed, last: {e}"),
            ),
            None => PhonemizerError::UnsupportedLanguage(language.to_string()),
        })
    }

    /// Segment, phonemize each segment in its own language, concatenate
    async fn phonemize_mixed(
        &self,
        text: &str,
        options: &PhonemeOptions,
    ) -> PhonemizerResult<PhonemeResult> {
        let segments = self.detector.segment_mixed(text);
        tracing::debug!(segments = segments.len(), "Phonemizing mixed-language text");

        let mut parts = Vec::with_capacity(segments.len());
        for segment in &segments {
            options.check_cancelled()?;
            if segment.text.trim().is_empty() {
                continue;
            }
            let part = self
                .phonemize_single(&segment.text, &segment.language, options)
                .await
                .map_err(|e| match e {
                    PhonemizerError::Cancelled => PhonemizerError::Cancelled,
                    other => PhonemizerError::backend_error(
                        MIXED_LANGUAGE,
                        format!("segment '{}' ({}) failed: {other}", segment.text, segment.language),
                    ),
                })?;
            parts.push(part);
        }
        Ok(concat_results(parts, options))
    }

    fn failure(&self, text: &str, language: Option<&str>, error: PhonemizerError) -> PhonemeResult {
        let language = language
            .map(canonicalize)
            .unwrap_or_else(|| self.config.default_language.clone());
        match &error {
            PhonemizerError::Cancelled => {
                self.metrics.cancellations.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(language = %language, "Phonemization cancelled");
            }
            _ => {
                tracing::warn!(
                    language = %language,
                    chars = text.chars().count(),
                    category = error.category(),
                    error = %error,
                    "Phonemization failed"
                );
            }
        }
        PhonemeResult::failure(language, error)
    }

    // =========================================================================
    // Introspection and maintenance
    // =========================================================================

    pub fn detect(&self, text: &str) -> Detection {
        self.detector.detect(text)
    }

    pub fn supported_languages(&self) -> Vec<String> {
        self.router.supported_languages()
    }

    pub fn language_capabilities(&self, language: &str) -> Option<LanguageCapabilities> {
        self.router.language_capabilities(language)
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
        tracing::debug!("Result cache cleared");
    }

    /// Circuit state of a registered backend
    pub fn circuit_state(&self, backend: &str) -> Option<CircuitState> {
        self.router.backend(backend).map(|b| b.circuit_state())
    }

    /// Force a backend's circuit closed
    pub fn reset_circuit(&self, backend: &str) -> bool {
        match self.router.backend(backend) {
            Some(b) => {
                b.breaker().reset();
                true
            }
            None => false,
        }
    }

    /// Replace a language's dictionary from a file and invalidate the cache
    pub fn reload_dictionary(&self, path: &Path, language: &str) -> PhonemizerResult<usize> {
        let canonical = canonicalize(language);
        let key = primary_subtag(&canonical);
        let count = self.dictionary.load(path, key)?;
        self.cache.clear();
        tracing::info!(
            language = %canonical,
            entries = count,
            path = %path.display(),
            "Dictionary reloaded"
        );
        Ok(count)
    }

    /// Add or override one pronunciation and invalidate the cache
    pub fn add_word(&self, word: &str, phonemes: Vec<String>, language: &str) {
        let canonical = canonicalize(language);
        self.dictionary
            .add_word(word, phonemes, primary_subtag(&canonical));
        self.cache.clear();
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Estimated memory of backends, dictionaries and cached results
    pub fn memory_usage(&self) -> usize {
        self.router.memory_usage() + self.dictionary.memory_usage() + self.cache.stats().memory_bytes
    }
}

/// Canonicalize a caller-supplied tag, rejecting obvious garbage
fn validate_tag(tag: &str) -> PhonemizerResult<String> {
    let trimmed = tag.trim();
    if trimmed.is_empty()
        || !trimmed
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(PhonemizerError::InvalidInput(format!(
            "invalid language tag '{tag}'"
        )));
    }
    Ok(canonicalize(trimmed))
}

/// Join per-segment results into one `mixed` result
fn concat_results(parts: Vec<PhonemeResult>, options: &PhonemeOptions) -> PhonemeResult {
    let mut combined = PhonemeResult::empty(MIXED_LANGUAGE);
    let mut stresses = Vec::new();
    let mut tones = Vec::new();
    let mut durations = Vec::new();
    let mut from_cache = !parts.is_empty();

    for part in parts {
        let offset = combined.phonemes.len();
        let len = part.phonemes.len();
        combined
            .word_boundaries
            .extend(part.word_boundaries.iter().map(|b| b + offset));
        stresses.extend(part.stresses.unwrap_or_else(|| vec![0; len]));
        durations.extend(
            part.durations
                .unwrap_or_else(|| estimate_durations(&part.phonemes, options.speech_rate)),
        );
        tones.extend(part.tones.unwrap_or_default());
        from_cache &= part.from_cache;
        if combined.fallback.is_none() {
            combined.fallback = part.fallback;
        }
        combined.phonemes.extend(part.phonemes);
    }

    combined.stresses = options.include_stress.then_some(stresses);
    combined.durations = options.include_durations.then_some(durations);
    combined.tones = (options.include_tones && !tones.is_empty()).then_some(tones);
    combined.from_cache = from_cache;
    combined
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resilience::CircuitBreakerConfig;

    async fn service() -> PhonemizationService {
        PhonemizationService::new(PhonemizerConfig::default())
            .await
            .unwrap()
    }

    #[test]
    fn test_validate_tag() {
        assert_eq!(validate_tag("en_us").unwrap(), "en-US");
        assert!(matches!(
            validate_tag("en US!"),
            Err(PhonemizerError::InvalidInput(_))
        ));
        assert!(validate_tag("  ").is_err());
    }

    #[test]
    fn test_concat_offsets_boundaries() {
        let a = PhonemeResult {
            phonemes: vec!["a".into(), "b".into()],
            word_boundaries: vec![0],
            success: true,
            ..Default::default()
        };
        let b = PhonemeResult {
            phonemes: vec!["c".into()],
            word_boundaries: vec![0],
            stresses: Some(vec![1]),
            success: true,
            ..Default::default()
        };
        let options = PhonemeOptions {
            include_stress: true,
            ..Default::default()
        };
        let combined = concat_results(vec![a, b], &options);
        assert_eq!(combined.phonemes, vec!["a", "b", "c"]);
        assert_eq!(combined.word_boundaries, vec![0, 2]);
        assert_eq!(combined.stresses, Some(vec![0, 0, 1]));
        assert_eq!(combined.language, MIXED_LANGUAGE);
        assert!(combined.success);
    }

    #[tokio::test]
    async fn test_invalid_tag_is_failure_result() {
        let service = service().await;
        let result = service.phonemize("hello", Some("??")).await;
        assert!(!result.success);
        assert!(result.error.unwrap().contains("invalid language tag"));
    }

    #[tokio::test]
    async fn test_unsupported_language_named() {
        let service = service().await;
        let result = service.phonemize("hello", Some("tlh-XX")).await;
        assert!(!result.success);
        assert!(result.error.unwrap().contains("tlh-XX"));
        assert_eq!(service.metrics().failures, 1);
    }

    #[tokio::test]
    async fn test_cache_hit_on_repeat() {
        let service = service().await;
        let first = service.phonemize("hello world", Some("en-US")).await;
        let second = service.phonemize("hello world", Some("en-US")).await;
        assert!(!first.from_cache);
        assert!(second.from_cache);
        assert_eq!(first.phonemes, second.phonemes);
        assert_eq!(service.cache_stats().hits, 1);
    }

    #[tokio::test]
    async fn test_add_word_invalidates_cache() {
        let service = service().await;
        service.phonemize("blorp", Some("en-US")).await;
        service.add_word("blorp", vec!["b".into(), "l".into(), "ao1".into(), "r".into(), "p".into()], "en");
        let result = service.phonemize("blorp", Some("en-US")).await;
        assert!(!result.from_cache);
        assert_eq!(result.phonemes, vec!["b", "l", "ao1", "r", "p"]);
    }

    #[tokio::test]
    async fn test_detection_routes_hangul() {
        let service = service().await;
        let result = service.phonemize("바다", None).await;
        assert!(result.success);
        assert_eq!(result.language, "ko-KR");
        assert_eq!(result.backend.as_deref(), Some("korean"));
    }

    #[tokio::test]
    async fn test_circuit_state_and_reset() {
        let service = service().await;
        assert_eq!(service.circuit_state("english"), Some(CircuitState::Closed));
        assert_eq!(service.circuit_state("klingon"), None);
        assert!(service.reset_circuit("english"));
        assert!(!service.reset_circuit("klingon"));
    }

    #[tokio::test]
    async fn test_register_backend_clears_cache() {
        let service = service().await;
        service.phonemize("hola", Some("es-ES")).await;
        assert_eq!(service.cache_stats().count, 1);
        service.register_backend(
            ResilientBackend::shared(
                Box::new(crate::backends::SpanishBackend::new()),
                CircuitBreakerConfig::default(),
            )
            .unwrap(),
        );
        assert_eq!(service.cache_stats().count, 0);
    }

    #[tokio::test]
    async fn test_memory_usage_counts_dictionary_once() {
        let service = service().await;
        let english = service.router().backend("english").unwrap();
        let backend_before = english.memory_usage();
        let dictionary_before = service.dictionary().memory_usage();

        service.add_word("antidisestablishment", vec!["ae1".to_string(); 40], "en-US");
        let grown = service.dictionary().memory_usage() - dictionary_before;
        assert!(grown > 0);
        assert_eq!(english.memory_usage(), backend_before);

        service.phonemize("hola", Some("es-ES")).await;
        assert_eq!(
            service.memory_usage(),
            service.router().memory_usage()
                + service.dictionary().memory_usage()
                + service.cache_stats().memory_bytes
        );
    }
}
