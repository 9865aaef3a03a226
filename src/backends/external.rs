//! Adapter for third-party phonemizers
//!
//! An [`ExternalPhonemizer`] is any synchronous engine that turns text into a
//! flat list of raw symbols (a native library binding, a subprocess, a
//! lookup service). [`ExternalBackend`] runs it on the blocking pool and
//! converts its output into the shared [`PhonemeResult`] contract.
//!
//! # Symbol decoding
//!
//! Some engines pack multi-letter Japanese phonemes into single private-use
//! code points (`U+E006` for `ky`, `U+E00E` for `ch`, ...). Those are decoded
//! through [`ExternalSymbol`] so no private-use character reaches a result:
//!
//! ```text
//!   raw "\u{E006}" ─► ExternalSymbol::Compound("ky") ─► "ky"
//!   raw "pau"      ─► ExternalSymbol::Pause          ─► "_"
//!   raw "\u{E0FF}" ─► ExternalSymbol::Unknown(..)    ─► dropped
//! ```

use async_trait::async_trait;
use phf::phf_map;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use crate::core::{
    BackendCapabilities, PhonemeOptions, PhonemeResult, PhonemeResultBuilder, PhonemizerBackend,
};
use crate::errors::{PhonemizerError, PhonemizerResult};

/// Private-use code points emitted for compound phonemes
static PRIVATE_USE_PHONEMES: phf::Map<char, &'static str> = phf_map! {
    '\u{E006}' => "ky",
    '\u{E008}' => "gy",
    '\u{E00A}' => "ty",
    '\u{E00B}' => "dy",
    '\u{E00C}' => "py",
    '\u{E00D}' => "by",
    '\u{E00E}' => "ch",
    '\u{E00F}' => "ts",
    '\u{E010}' => "sh",
    '\u{E011}' => "zy",
    '\u{E012}' => "hy",
    '\u{E013}' => "ny",
    '\u{E014}' => "my",
    '\u{E015}' => "ry",
};

const PAUSE_SYMBOLS: &[&str] = &["pau", "sil", "sp", "_"];

fn is_private_use(c: char) -> bool {
    ('\u{E000}'..='\u{F8FF}').contains(&c)
}

/// One raw symbol from an external engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExternalSymbol {
    /// Ordinary phoneme string
    Plain(String),
    /// Multi-letter phoneme decoded from a private-use code point
    Compound(&'static str),
    Pause,
    /// Private-use code point with no known meaning
    Unknown(char),
}

impl ExternalSymbol {
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        let mut chars = raw.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            if is_private_use(c) {
                return match PRIVATE_USE_PHONEMES.get(&c) {
                    Some(phoneme) => ExternalSymbol::Compound(*phoneme),
                    None => ExternalSymbol::Unknown(c),
                };
            }
            // Uppercase vowels mark devoicing and keep their case
            if matches!(c, 'A' | 'I' | 'U' | 'E' | 'O') {
                return ExternalSymbol::Plain(c.to_string());
            }
        }

        let lower = raw.to_lowercase();
        if PAUSE_SYMBOLS.contains(&lower.as_str()) {
            ExternalSymbol::Pause
        } else {
            ExternalSymbol::Plain(lower)
        }
    }

    /// Private-use code point for a compound phoneme
    pub fn code_point(&self) -> Option<char> {
        match self {
            ExternalSymbol::Compound(name) => PRIVATE_USE_PHONEMES
                .entries()
                .find(|(_, phoneme)| *phoneme == name)
                .map(|(c, _)| *c),
            _ => None,
        }
    }

    /// Phoneme string for the shared result; `None` drops the symbol
    pub fn into_phoneme(self) -> Option<String> {
        match self {
            ExternalSymbol::Plain(s) if s.is_empty() => None,
            ExternalSymbol::Plain(s) => Some(s),
            ExternalSymbol::Compound(s) => Some(s.to_string()),
            ExternalSymbol::Pause => Some("_".to_string()),
            ExternalSymbol::Unknown(_) => None,
        }
    }
}

/// Synchronous third-party phonemizer
pub trait ExternalPhonemizer: Send + Sync {
    fn name(&self) -> &str;

    fn languages(&self) -> Vec<String>;

    fn capabilities(&self) -> BackendCapabilities {
        BackendCapabilities {
            is_thread_safe: true,
            ..Default::default()
        }
    }

    fn initialize(&mut self, _data_path: Option<&Path>) -> anyhow::Result<()> {
        Ok(())
    }

    /// Raw symbols for `text`; pause symbols separate words
    fn phonemize(&self, text: &str, language: &str) -> anyhow::Result<Vec<String>>;

    /// Bytes held by the engine's own data, when it can tell
    fn memory_usage(&self) -> usize {
        0
    }
}

pub struct ExternalBackend {
    name: String,
    languages: Vec<String>,
    inner: Arc<dyn ExternalPhonemizer>,
}

impl ExternalBackend {
    pub fn new(phonemizer: impl ExternalPhonemizer + 'static) -> Self {
        Self {
            name: phonemizer.name().to_string(),
            languages: phonemizer.languages(),
            inner: Arc::new(phonemizer),
        }
    }
}

#[async_trait]
impl PhonemizerBackend for ExternalBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn supported_languages(&self) -> &[String] {
        &self.languages
    }

    fn capabilities(&self) -> BackendCapabilities {
        self.inner.capabilities()
    }

    async fn initialize(&mut self, data_path: Option<&Path>) -> PhonemizerResult<bool> {
        let inner = Arc::get_mut(&mut self.inner).ok_or_else(|| {
            PhonemizerError::init_error(&self.name, "phonemizer is already in use")
        })?;
        inner
            .initialize(data_path)
            .map_err(|e| PhonemizerError::init_error(&self.name, format!("{e:#}")))?;
        tracing::info!(
            backend = %self.name,
            languages = ?self.languages,
            "External backend initialized"
        );
        Ok(true)
    }

    async fn phonemize(
        &self,
        text: &str,
        language: &str,
        options: &PhonemeOptions,
    ) -> PhonemizerResult<PhonemeResult> {
        let start = Instant::now();
        options.check_cancelled()?;

        let inner = self.inner.clone();
        let owned_text = text.to_string();
        let owned_language = language.to_string();
        let raw = tokio::task::spawn_blocking(move || {
            inner.phonemize(&owned_text, &owned_language)
        })
        .await
        .map_err(|e| {
            if e.is_panic() {
                PhonemizerError::BackendPanic(format!("{}: external phonemizer panicked", self.name))
            } else {
                PhonemizerError::backend_error(&self.name, e)
            }
        })?
        .map_err(|e| PhonemizerError::backend_error(&self.name, format!("{e:#}")))?;

        options.check_cancelled()?;

        let mut builder = PhonemeResultBuilder::new();
        let mut word = Vec::new();
        for symbol in raw.iter().map(|s| ExternalSymbol::parse(s)) {
            match symbol {
                ExternalSymbol::Pause => {
                    builder.push_unstressed_word(std::mem::take(&mut word));
                    builder.push_symbol("_");
                }
                ExternalSymbol::Unknown(c) => {
                    tracing::warn!(
                        backend = %self.name,
                        code_point = %format!("U+{:04X}", c as u32),
                        "Dropping unknown private-use symbol"
                    );
                }
                other => word.extend(other.into_phoneme()),
            }
        }
        builder.push_unstressed_word(word);

        Ok(builder
            .build(language, options)
            .with_processing_time(start.elapsed()))
    }

    fn memory_usage(&self) -> usize {
        self.inner.memory_usage()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct FixedPhonemizer {
        output: Vec<&'static str>,
        initialized: AtomicBool,
    }

    impl FixedPhonemizer {
        fn new(output: Vec<&'static str>) -> Self {
            Self {
                output,
                initialized: AtomicBool::new(false),
            }
        }
    }

    impl ExternalPhonemizer for FixedPhonemizer {
        fn name(&self) -> &str {
            "fixed"
        }

        fn languages(&self) -> Vec<String> {
            vec!["ja-JP".into()]
        }

        fn initialize(&mut self, _data_path: Option<&Path>) -> anyhow::Result<()> {
            self.initialized.store(true, Ordering::SeqCst);
            Ok(())
        }

        fn phonemize(&self, _text: &str, _language: &str) -> anyhow::Result<Vec<String>> {
            if !self.initialized.load(Ordering::SeqCst) {
                anyhow::bail!("not initialized");
            }
            Ok(self.output.iter().map(|s| s.to_string()).collect())
        }

        fn memory_usage(&self) -> usize {
            self.output.iter().map(|s| s.len()).sum()
        }
    }

    struct PanickingPhonemizer;

    impl ExternalPhonemizer for PanickingPhonemizer {
        fn name(&self) -> &str {
            "panicking"
        }

        fn languages(&self) -> Vec<String> {
            vec!["ja-JP".into()]
        }

        fn phonemize(&self, _text: &str, _language: &str) -> anyhow::Result<Vec<String>> {
            panic!("native crash");
        }
    }

    #[test]
    fn test_parse_private_use() {
        assert_eq!(
            ExternalSymbol::parse("\u{E006}"),
            ExternalSymbol::Compound("ky")
        );
        assert_eq!(
            ExternalSymbol::parse("\u{E00E}"),
            ExternalSymbol::Compound("ch")
        );
        assert_eq!(
            ExternalSymbol::parse("\u{E0FF}"),
            ExternalSymbol::Unknown('\u{E0FF}')
        );
        assert_eq!(
            ExternalSymbol::Compound("ts").code_point(),
            Some('\u{E00F}')
        );
    }

    #[test]
    fn test_parse_plain_and_pause() {
        assert_eq!(ExternalSymbol::parse("pau"), ExternalSymbol::Pause);
        assert_eq!(ExternalSymbol::parse("SIL"), ExternalSymbol::Pause);
        assert_eq!(ExternalSymbol::parse("K"), ExternalSymbol::Plain("k".into()));
        assert_eq!(ExternalSymbol::parse("U"), ExternalSymbol::Plain("U".into()));
    }

    #[tokio::test]
    async fn test_external_backend_decodes_symbols() {
        let mut backend = ExternalBackend::new(FixedPhonemizer::new(vec![
            "sil", "\u{E006}", "o", "u", "pau", "w", "a", "\u{E0FF}", "sil",
        ]));
        assert!(backend.initialize(None).await.unwrap());

        let result = backend
            .phonemize("今日は", "ja-JP", &PhonemeOptions::default())
            .await
            .unwrap();
        assert!(result.success);
        assert_eq!(result.phonemes, vec!["_", "ky", "o", "u", "_", "w", "a", "_"]);
        assert_eq!(result.word_boundaries, vec![1, 5]);
        assert!(
            result
                .phonemes
                .iter()
                .all(|p| !p.chars().any(is_private_use))
        );
    }

    #[test]
    fn test_external_memory_usage_delegates() {
        let backend = ExternalBackend::new(FixedPhonemizer::new(vec!["ky", "o"]));
        assert_eq!(backend.memory_usage(), 3);
        assert_eq!(ExternalBackend::new(PanickingPhonemizer).memory_usage(), 0);
    }

    #[tokio::test]
    async fn test_external_error_is_backend_failure() {
        let backend = ExternalBackend::new(FixedPhonemizer::new(vec!["a"]));
        let err = backend
            .phonemize("x", "ja-JP", &PhonemeOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, PhonemizerError::BackendFailed { .. }));
    }

    #[tokio::test]
    async fn test_external_panic_is_isolated() {
        let backend = ExternalBackend::new(PanickingPhonemizer);
        let err = backend
            .phonemize("x", "ja-JP", &PhonemeOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, PhonemizerError::BackendPanic(_)));
    }
}
