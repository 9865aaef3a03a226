//! Phonemization results
//!
//! [`PhonemeResult`] is the value every backend produces and the service hands
//! back to callers. It is built once through [`PhonemeResultBuilder`] and not
//! mutated afterwards, except for the service stamping cache/fallback metadata
//! before returning it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use super::timing::estimate_durations;
use super::PhonemeOptions;

/// Why a result was produced by something other than the requested language's backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum FallbackReason {
    /// No registered backend lists the requested language
    NoBackendForLanguage,
    /// The requested backend's circuit was open, so it was never called
    CircuitOpen,
    /// The requested backend was called and failed
    BackendFailed(String),
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoBackendForLanguage => write!(f, "no backend for language"),
            Self::CircuitOpen => write!(f, "circuit open"),
            Self::BackendFailed(error) => write!(f, "backend failed: {error}"),
        }
    }
}

/// Fallback metadata attached to a result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FallbackInfo {
    /// Language the caller asked for
    pub requested_language: String,
    /// Language whose backend actually produced the phonemes
    pub used_language: String,
    pub reason: FallbackReason,
}

/// Output of a phonemization request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PhonemeResult {
    /// Phoneme symbols in order
    pub phonemes: Vec<String>,
    /// Stress per phoneme (parallel to `phonemes`)
    pub stresses: Option<Vec<u8>>,
    /// Tone per syllable, for tonal languages
    pub tones: Option<Vec<u8>>,
    /// Estimated duration per phoneme in seconds (parallel to `phonemes`)
    pub durations: Option<Vec<f32>>,
    /// Index into `phonemes` where each word starts
    pub word_boundaries: Vec<usize>,
    pub language: String,
    pub success: bool,
    pub error: Option<String>,
    pub from_cache: bool,
    pub processing_time: Duration,
    /// Backend that produced the phonemes
    pub backend: Option<String>,
    /// Set when the phonemes did not come from the requested language's backend
    pub fallback: Option<FallbackInfo>,
}

impl PhonemeResult {
    /// An empty, successful result
    pub fn empty(language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            success: true,
            ..Default::default()
        }
    }

    /// A failed result carrying a descriptive error
    pub fn failure(language: impl Into<String>, error: impl fmt::Display) -> Self {
        Self {
            language: language.into(),
            success: false,
            error: Some(error.to_string()),
            ..Default::default()
        }
    }

    /// Number of phonemes
    pub fn len(&self) -> usize {
        self.phonemes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.phonemes.is_empty()
    }

    /// True when a fallback backend produced this result
    pub fn used_fallback(&self) -> bool {
        self.fallback.is_some()
    }

    /// Space-separated phoneme string
    pub fn to_phoneme_string(&self) -> String {
        self.phonemes.join(" ")
    }

    pub fn with_backend(mut self, backend: impl Into<String>) -> Self {
        self.backend = Some(backend.into());
        self
    }

    pub fn with_fallback(mut self, fallback: FallbackInfo) -> Self {
        self.fallback = Some(fallback);
        self
    }

    pub fn with_processing_time(mut self, processing_time: Duration) -> Self {
        self.processing_time = processing_time;
        self
    }
}

/// Accumulates per-word phonemes into a [`PhonemeResult`]
///
/// Backends push one word (or punctuation mark) at a time; annotations the
/// caller did not ask for are dropped in [`PhonemeResultBuilder::build`].
#[derive(Debug, Default)]
pub struct PhonemeResultBuilder {
    phonemes: Vec<String>,
    stresses: Vec<u8>,
    tones: Vec<u8>,
    word_boundaries: Vec<usize>,
}

impl PhonemeResultBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a word's phonemes with a parallel stress list
    pub fn push_word(&mut self, phonemes: Vec<String>, stresses: Vec<u8>) {
        if phonemes.is_empty() {
            return;
        }
        debug_assert_eq!(phonemes.len(), stresses.len());
        self.word_boundaries.push(self.phonemes.len());
        self.phonemes.extend(phonemes);
        self.stresses.extend(stresses);
    }

    /// Append a word with no stress information
    pub fn push_unstressed_word(&mut self, phonemes: Vec<String>) {
        let stresses = vec![0; phonemes.len()];
        self.push_word(phonemes, stresses);
    }

    /// Append a punctuation or pause symbol (not a word start)
    pub fn push_symbol(&mut self, symbol: impl Into<String>) {
        self.phonemes.push(symbol.into());
        self.stresses.push(0);
    }

    /// Record one syllable tone
    pub fn push_tone(&mut self, tone: u8) {
        self.tones.push(tone);
    }

    pub fn phoneme_count(&self) -> usize {
        self.phonemes.len()
    }

    /// Finish the result honoring the annotation flags in `options`
    pub fn build(self, language: impl Into<String>, options: &PhonemeOptions) -> PhonemeResult {
        let durations = options
            .include_durations
            .then(|| estimate_durations(&self.phonemes, options.speech_rate));
        let tones = (options.include_tones && !self.tones.is_empty()).then_some(self.tones);

        PhonemeResult {
            stresses: options.include_stress.then_some(self.stresses),
            durations,
            tones,
            word_boundaries: if options.include_word_boundaries {
                self.word_boundaries
            } else {
                Vec::new()
            },
            phonemes: self.phonemes,
            language: language.into(),
            success: true,
            ..Default::default()
        }
    }
}
