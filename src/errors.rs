//! Phonemizer error types
//!
//! Centralized error handling for the phonemization engine. Internal layers
//! propagate these with `?`; the public [`PhonemizationService`] boundary turns
//! them into a failed [`PhonemeResult`] instead of returning them.
//!
//! [`PhonemizationService`]: crate::service::PhonemizationService
//! [`PhonemeResult`]: crate::core::PhonemeResult

use std::fmt;
use thiserror::Error;

/// Result type for phonemizer operations
pub type PhonemizerResult<T> = Result<T, PhonemizerError>;

/// Comprehensive error type for the phonemization engine
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PhonemizerError {
    // ─────────────────────────────────────────────────────────────────────────────
    // Routing Errors
    // ─────────────────────────────────────────────────────────────────────────────
    /// No backend and no fallback chain entry can handle the language
    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    /// Circuit open for the backend and nothing left to fall back to
    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    // ─────────────────────────────────────────────────────────────────────────────
    // Backend Errors
    // ─────────────────────────────────────────────────────────────────────────────
    /// Backend failed to load its data or configure itself
    #[error("Backend '{backend}' failed to initialize: {error}")]
    BackendInitializationFailed { backend: String, error: String },

    /// Backend returned an error while phonemizing
    #[error("Backend '{backend}' failed: {error}")]
    BackendFailed { backend: String, error: String },

    /// Backend panic caught at the isolation boundary
    #[error("Backend panicked: {0}")]
    BackendPanic(String),

    // ─────────────────────────────────────────────────────────────────────────────
    // Input / Request Errors
    // ─────────────────────────────────────────────────────────────────────────────
    /// Input text is not acceptable
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The caller cancelled the request
    #[error("Phonemization cancelled")]
    Cancelled,

    // ─────────────────────────────────────────────────────────────────────────────
    // Locally Recovered Conditions
    // ─────────────────────────────────────────────────────────────────────────────
    /// Rule traversal hit the iteration bound (recovered with the default letter table)
    #[error("Rule traversal exceeded {limit} steps for letter '{letter}'")]
    RuleTraversalExceeded { letter: char, limit: usize },

    /// A single cache entry is larger than the cache allows (recovered by not caching)
    #[error("Cache entry of {size} bytes exceeds capacity of {capacity} bytes")]
    CacheCapacityExceeded { size: usize, capacity: usize },

    // ─────────────────────────────────────────────────────────────────────────────
    // Data / Configuration Errors
    // ─────────────────────────────────────────────────────────────────────────────
    /// Dictionary file could not be read or parsed
    #[error("Dictionary error: {0}")]
    Dictionary(String),

    /// Rule table failed validation
    #[error("Invalid rule table: {0}")]
    InvalidRuleTable(String),

    /// Configuration value is missing or out of range
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl PhonemizerError {
    /// Create a backend initialization error
    pub fn init_error(backend: impl Into<String>, error: impl fmt::Display) -> Self {
        Self::BackendInitializationFailed {
            backend: backend.into(),
            error: error.to_string(),
        }
    }

    /// Create a backend execution error
    pub fn backend_error(backend: impl Into<String>, error: impl fmt::Display) -> Self {
        Self::BackendFailed {
            backend: backend.into(),
            error: error.to_string(),
        }
    }

    /// Check if the request might succeed on another backend or a later attempt
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::BackendUnavailable(_)
                | Self::BackendFailed { .. }
                | Self::BackendPanic(_)
                | Self::BackendInitializationFailed { .. }
        )
    }

    /// Check if this error should count against a backend's circuit breaker
    pub fn is_backend_fault(&self) -> bool {
        matches!(
            self,
            Self::BackendFailed { .. }
                | Self::BackendPanic(_)
                | Self::BackendInitializationFailed { .. }
        )
    }

    /// Stable label for logs
    pub fn category(&self) -> &'static str {
        match self {
            Self::UnsupportedLanguage(_) => "unsupported_language",
            Self::BackendUnavailable(_) => "backend_unavailable",
            Self::BackendInitializationFailed { .. } => "backend_initialization_failed",
            Self::BackendFailed { .. } => "backend_failed",
            Self::BackendPanic(_) => "backend_panic",
            Self::InvalidInput(_) => "invalid_input",
            Self::Cancelled => "cancelled",
            Self::RuleTraversalExceeded { .. } => "rule_traversal_exceeded",
            Self::CacheCapacityExceeded { .. } => "cache_capacity_exceeded",
            Self::Dictionary(_) => "dictionary",
            Self::InvalidRuleTable(_) => "invalid_rule_table",
            Self::Configuration(_) => "configuration",
        }
    }
}

impl From<std::io::Error> for PhonemizerError {
    fn from(err: std::io::Error) -> Self {
        Self::Dictionary(err.to_string())
    }
}
