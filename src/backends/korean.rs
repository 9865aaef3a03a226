//! Korean backend
//!
//! Precomposed Hangul syllables decompose arithmetically:
//!
//! ```text
//!   code = 0xAC00 + (initial × 21 + medial) × 28 + final
//! ```
//!
//! Pronunciation rules applied per word:
//! - lenis plosives and ㅈ are voiceless word-initially, voiced elsewhere
//! - a final consonant followed by a silent ㅇ initial moves into that syllable
//! - remaining finals neutralize to unreleased stops (`k̚ t̚ p̚`) or sonorants
//!
//! This backend reports `is_thread_safe: false`, so the router keeps a pool
//! of instances for it.

use async_trait::async_trait;
use std::path::Path;
use std::time::Instant;

use crate::core::{
    BackendCapabilities, PhonemeOptions, PhonemeResult, PhonemeResultBuilder, PhonemizerBackend,
};
use crate::errors::PhonemizerResult;
use crate::text::{PAUSE_PUNCTUATION, TextNormalizer};

const HANGUL_BASE: u32 = 0xAC00;
const HANGUL_LAST: u32 = 0xD7A3;
const MEDIAL_COUNT: u32 = 21;
const FINAL_COUNT: u32 = 28;

/// Index of the silent ㅇ initial
const SILENT_INITIAL: usize = 11;
/// Index of the ㅇ final (ŋ), which never moves
const NG_FINAL: usize = 21;

/// (word-initial, medial) realization of each initial
const INITIALS: [(&str, &str); 19] = [
    ("k", "g"),     // ㄱ
    ("k͈", "k͈"),     // ㄲ
    ("n", "n"),     // ㄴ
    ("t", "d"),     // ㄷ
    ("t͈", "t͈"),     // ㄸ
    ("ɾ", "ɾ"),     // ㄹ
    ("m", "m"),     // ㅁ
    ("p", "b"),     // ㅂ
    ("p͈", "p͈"),     // ㅃ
    ("s", "s"),     // ㅅ
    ("s͈", "s͈"),     // ㅆ
    ("", ""),       // ㅇ
    ("tɕ", "dʑ"),   // ㅈ
    ("t͈ɕ", "t͈ɕ"),   // ㅉ
    ("tɕʰ", "tɕʰ"), // ㅊ
    ("kʰ", "kʰ"),   // ㅋ
    ("tʰ", "tʰ"),   // ㅌ
    ("pʰ", "pʰ"),   // ㅍ
    ("h", "h"),     // ㅎ
];

const MEDIALS: [&[&str]; 21] = [
    &["a"],      // ㅏ
    &["ɛ"],      // ㅐ
    &["j", "a"], // ㅑ
    &["j", "ɛ"], // ㅒ
    &["ʌ"],      // ㅓ
    &["e"],      // ㅔ
    &["j", "ʌ"], // ㅕ
    &["j", "e"], // ㅖ
    &["o"],      // ㅗ
    &["w", "a"], // ㅘ
    &["w", "ɛ"], // ㅙ
    &["w", "e"], // ㅚ
    &["j", "o"], // ㅛ
    &["u"],      // ㅜ
    &["w", "ʌ"], // ㅝ
    &["w", "e"], // ㅞ
    &["w", "i"], // ㅟ
    &["j", "u"], // ㅠ
    &["ɯ"],      // ㅡ
    &["ɰ", "i"], // ㅢ
    &["i"],      // ㅣ
];

/// (neutralized coda, onset after liaison) per final; index 0 is "no final"
const FINALS: [(&str, &str); 28] = [
    ("", ""),      // none
    ("k̚", "g"),    // ㄱ
    ("k̚", "k͈"),    // ㄲ
    ("k̚", "g"),    // ㄳ
    ("n", "n"),    // ㄴ
    ("n", "n"),    // ㄵ
    ("n", "n"),    // ㄶ
    ("t̚", "d"),    // ㄷ
    ("l", "ɾ"),    // ㄹ
    ("k̚", "g"),    // ㄺ
    ("m", "m"),    // ㄻ
    ("l", "b"),    // ㄼ
    ("l", "s"),    // ㄽ
    ("l", "tʰ"),   // ㄾ
    ("p̚", "pʰ"),   // ㄿ
    ("l", "ɾ"),    // ㅀ
    ("m", "m"),    // ㅁ
    ("p̚", "b"),    // ㅂ
    ("p̚", "s"),    // ㅄ
    ("t̚", "s"),    // ㅅ
    ("t̚", "s͈"),    // ㅆ
    ("ŋ", "ŋ"),    // ㅇ
    ("t̚", "dʑ"),   // ㅈ
    ("t̚", "tɕʰ"),  // ㅊ
    ("k̚", "kʰ"),   // ㅋ
    ("t̚", "tʰ"),   // ㅌ
    ("p̚", "pʰ"),   // ㅍ
    ("t̚", ""),     // ㅎ
];

/// Jamo indices of one precomposed syllable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Jamo {
    pub initial: usize,
    pub medial: usize,
    pub final_: usize,
}

/// Decompose a precomposed Hangul syllable
pub fn decompose(c: char) -> Option<Jamo> {
    let code = c as u32;
    if !(HANGUL_BASE..=HANGUL_LAST).contains(&code) {
        return None;
    }
    let index = code - HANGUL_BASE;
    Some(Jamo {
        initial: (index / (MEDIAL_COUNT * FINAL_COUNT)) as usize,
        medial: ((index % (MEDIAL_COUNT * FINAL_COUNT)) / FINAL_COUNT) as usize,
        final_: (index % FINAL_COUNT) as usize,
    })
}

/// Phonemes for one word of Hangul syllables
pub fn word_to_phonemes(syllables: &[Jamo]) -> Vec<String> {
    let mut phonemes = Vec::with_capacity(syllables.len() * 3);
    let mut carried: Option<&str> = None;

    for (i, jamo) in syllables.iter().enumerate() {
        let (initial_form, medial_form) = INITIALS[jamo.initial];
        let onset = match carried.take() {
            Some(onset) => onset,
            None if i == 0 => initial_form,
            None => medial_form,
        };
        if !onset.is_empty() {
            phonemes.push(onset.to_string());
        }
        phonemes.extend(MEDIALS[jamo.medial].iter().map(|p| p.to_string()));

        if jamo.final_ == 0 {
            continue;
        }
        let (coda, liaison) = FINALS[jamo.final_];
        let next_is_silent = syllables
            .get(i + 1)
            .is_some_and(|next| next.initial == SILENT_INITIAL);
        if next_is_silent && jamo.final_ != NG_FINAL {
            carried = Some(liaison);
        } else {
            phonemes.push(coda.to_string());
        }
    }
    phonemes
}

pub struct KoreanBackend {
    languages: Vec<String>,
    normalizer: TextNormalizer,
}

impl Default for KoreanBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl KoreanBackend {
    pub fn new() -> Self {
        Self {
            languages: vec!["ko-KR".into()],
            normalizer: TextNormalizer::new(),
        }
    }
}

#[async_trait]
impl PhonemizerBackend for KoreanBackend {
    fn name(&self) -> &str {
        "korean"
    }

    fn supported_languages(&self) -> &[String] {
        &self.languages
    }

    fn capabilities(&self) -> BackendCapabilities {
        BackendCapabilities {
            supports_stress: false,
            supports_tone: false,
            supports_ipa: true,
            is_thread_safe: false,
            requires_network: false,
        }
    }

    async fn initialize(&mut self, _data_path: Option<&Path>) -> PhonemizerResult<bool> {
        tracing::info!(backend = "korean", "Backend initialized");
        Ok(false)
    }

    async fn phonemize(
        &self,
        text: &str,
        language: &str,
        options: &PhonemeOptions,
    ) -> PhonemizerResult<PhonemeResult> {
        let start = Instant::now();
        let text = if options.normalize_text {
            self.normalizer.normalize(text, language)
        } else {
            text.to_string()
        };

        let mut builder = PhonemeResultBuilder::new();
        let mut word: Vec<Jamo> = Vec::new();
        for c in text.chars().chain(std::iter::once(' ')) {
            if let Some(jamo) = decompose(c) {
                word.push(jamo);
                continue;
            }
            if !word.is_empty() {
                options.check_cancelled()?;
                builder.push_unstressed_word(word_to_phonemes(&word));
                word.clear();
            }
            if PAUSE_PUNCTUATION.contains(&c) {
                builder.push_symbol("_");
            }
        }

        Ok(builder
            .build(language, options)
            .with_processing_time(start.elapsed()))
    }

    fn memory_usage(&self) -> usize {
        std::mem::size_of::<Self>()
    }
}
