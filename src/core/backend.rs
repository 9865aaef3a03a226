//! Backend contract
//!
//! Every language module (and any adapter around an external phonemizer)
//! implements [`PhonemizerBackend`]. The router stores them as
//! `Arc<dyn PhonemizerBackend>` and never looks past this trait.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio_util::sync::CancellationToken;

use super::PhonemeResult;
use crate::errors::{PhonemizerError, PhonemizerResult};

/// Feature flags a backend advertises
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BackendCapabilities {
    pub supports_stress: bool,
    pub supports_tone: bool,
    pub supports_ipa: bool,
    /// Safe to call from many tasks at once; otherwise the service pools instances
    pub is_thread_safe: bool,
    pub requires_network: bool,
}

/// Symbol set requested from a backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhonemeFormat {
    /// Whatever the backend emits natively (ARPABET for English, IPA elsewhere)
    #[default]
    Native,
    /// IPA symbols
    Ipa,
}

/// Per-call options
///
/// The cancellation token is observed between words and does not take part in
/// the cache fingerprint.
#[derive(Debug, Clone)]
pub struct PhonemeOptions {
    pub include_stress: bool,
    pub include_tones: bool,
    pub include_durations: bool,
    pub include_word_boundaries: bool,
    /// Run the language's text normalizer before tokenizing
    pub normalize_text: bool,
    /// Use letter-to-sound rules for words missing from the dictionary
    pub use_lts_fallback: bool,
    /// 1.0 = normal, 0.5 = slow, 2.0 = fast
    pub speech_rate: f32,
    pub format: PhonemeFormat,
    pub cancellation: CancellationToken,
}

impl Default for PhonemeOptions {
    fn default() -> Self {
        Self {
            include_stress: false,
            include_tones: true,
            include_durations: false,
            include_word_boundaries: true,
            normalize_text: true,
            use_lts_fallback: true,
            speech_rate: 1.0,
            format: PhonemeFormat::Native,
            cancellation: CancellationToken::new(),
        }
    }
}

impl PhonemeOptions {
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    pub fn with_format(mut self, format: PhonemeFormat) -> Self {
        self.format = format;
        self
    }

    /// Fail with [`PhonemizerError::Cancelled`] if the caller gave up
    #[inline]
    pub fn check_cancelled(&self) -> PhonemizerResult<()> {
        if self.cancellation.is_cancelled() {
            Err(PhonemizerError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Bytes that distinguish option sets producing different output
    pub fn fingerprint(&self) -> [u8; 6] {
        let flags = (self.include_stress as u8)
            | (self.include_tones as u8) << 1
            | (self.include_durations as u8) << 2
            | (self.include_word_boundaries as u8) << 3
            | (self.normalize_text as u8) << 4
            | (self.use_lts_fallback as u8) << 5;
        let format = match self.format {
            PhonemeFormat::Native => 0u8,
            PhonemeFormat::Ipa => 1u8,
        };
        let rate = self.speech_rate.to_bits().to_le_bytes();
        [flags, format, rate[0], rate[1], rate[2], rate[3]]
    }
}

/// Phonemization backend contract
///
/// `initialize` runs once before the backend is registered; `phonemize` may
/// then be called concurrently when [`BackendCapabilities::is_thread_safe`]
/// is set.
#[async_trait]
pub trait PhonemizerBackend: Send + Sync {
    /// Stable backend identifier (e.g. `"english"`)
    fn name(&self) -> &str;

    /// Canonical language tags this backend handles natively
    fn supported_languages(&self) -> &[String];

    fn capabilities(&self) -> BackendCapabilities;

    /// Load dictionaries and tables, optionally from `data_path`
    ///
    /// Returns `Ok(true)` when external data was loaded and `Ok(false)` when
    /// the backend runs on its built-in tables.
    async fn initialize(&mut self, data_path: Option<&Path>) -> PhonemizerResult<bool>;

    /// Convert `text` (already in `language`) to phonemes
    async fn phonemize(
        &self,
        text: &str,
        language: &str,
        options: &PhonemeOptions,
    ) -> PhonemizerResult<PhonemeResult>;

    /// Approximate heap footprint in bytes
    fn memory_usage(&self) -> usize;

    fn supports_language(&self, language: &str) -> bool {
        self.supported_languages()
            .iter()
            .any(|l| l.eq_ignore_ascii_case(language))
    }
}
