//! Spanish backend
//!
//! Rule-based grapheme-to-phoneme conversion with dialect variants:
//!
//! | Dialect | `c`/`z` before front vowels | `ll` | consonantal `y` |
//! |---------|-----------------------------|------|-----------------|
//! | es-ES   | θ (distinción)              | ʎ    | j               |
//! | es-MX, es-CO | s (seseo)              | j    | j               |
//! | es-AR   | s (seseo)                   | ʃ    | ʃ               |
//!
//! The stressed vowel of each word is marked with 1 in `stresses`: a written
//! accent wins, otherwise words ending in a vowel, `n` or `s` stress the
//! penultimate syllable and all others the last.

use async_trait::async_trait;
use std::path::Path;
use std::time::Instant;

use crate::core::{
    BackendCapabilities, PhonemeOptions, PhonemeResult, PhonemeResultBuilder, PhonemizerBackend,
};
use crate::errors::PhonemizerResult;
use crate::text::{TextNormalizer, Token, tokenize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Castilian,
    Mexican,
    Colombian,
    Rioplatense,
}

impl Dialect {
    pub fn from_language(language: &str) -> Self {
        match language.to_ascii_lowercase().as_str() {
            "es-mx" => Dialect::Mexican,
            "es-co" => Dialect::Colombian,
            "es-ar" => Dialect::Rioplatense,
            _ => Dialect::Castilian,
        }
    }

    fn sibilant(self) -> &'static str {
        match self {
            Dialect::Castilian => "θ",
            _ => "s",
        }
    }

    fn ll(self) -> &'static str {
        match self {
            Dialect::Castilian => "ʎ",
            Dialect::Rioplatense => "ʃ",
            _ => "j",
        }
    }

    fn consonantal_y(self) -> &'static str {
        match self {
            Dialect::Rioplatense => "ʃ",
            _ => "j",
        }
    }
}

fn is_vowel(c: char) -> bool {
    matches!(
        c,
        'a' | 'e' | 'i' | 'o' | 'u' | 'á' | 'é' | 'í' | 'ó' | 'ú' | 'ü'
    )
}

fn is_front_vowel(c: Option<&char>) -> bool {
    matches!(c, Some('e' | 'i' | 'é' | 'í'))
}

fn is_accented(c: char) -> bool {
    matches!(c, 'á' | 'é' | 'í' | 'ó' | 'ú')
}

fn is_strong(c: char) -> bool {
    matches!(c, 'a' | 'e' | 'o' | 'á' | 'é' | 'ó')
}

fn plain_vowel(c: char) -> &'static str {
    match c {
        'a' | 'á' => "a",
        'e' | 'é' => "e",
        'i' | 'í' => "i",
        'o' | 'ó' => "o",
        _ => "u",
    }
}

/// A vowel phoneme together with the letter it came from
#[derive(Debug, Clone, Copy)]
struct VowelSlot {
    phoneme: usize,
    letter: usize,
    ch: char,
}

/// Converted word: phonemes plus a parallel stress list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpanishWord {
    pub phonemes: Vec<String>,
    pub stresses: Vec<u8>,
}

/// Convert one lowercase word to phonemes
pub fn word_to_phonemes(word: &str, dialect: Dialect) -> SpanishWord {
    let letters: Vec<char> = word.chars().filter(|c| c.is_alphabetic()).collect();
    let mut phonemes: Vec<String> = Vec::with_capacity(letters.len());
    let mut vowels: Vec<VowelSlot> = Vec::new();

    let intervocalic = |i: usize| {
        i > 0 && is_vowel(letters[i - 1]) && letters.get(i + 1).is_some_and(|c| is_vowel(*c))
    };

    let mut i = 0;
    while i < letters.len() {
        let c = letters[i];
        let next = letters.get(i + 1);
        let mut step = 1;

        match c {
            c if is_vowel(c) => {
                vowels.push(VowelSlot {
                    phoneme: phonemes.len(),
                    letter: i,
                    ch: c,
                });
                phonemes.push(plain_vowel(c).to_string());
            }
            'c' if next == Some(&'h') => {
                phonemes.push("tʃ".into());
                step = 2;
            }
            'c' if is_front_vowel(next) => phonemes.push(dialect.sibilant().into()),
            'c' | 'k' => phonemes.push("k".into()),
            'z' => phonemes.push(dialect.sibilant().into()),
            'q' => {
                phonemes.push("k".into());
                if next == Some(&'u') {
                    step = 2;
                }
            }
            'g' if next == Some(&'ü') => {
                phonemes.push("g".into());
                phonemes.push("w".into());
                step = 2;
            }
            'g' if next == Some(&'u') && is_front_vowel(letters.get(i + 2)) => {
                phonemes.push("g".into());
                step = 2;
            }
            'g' if is_front_vowel(next) => phonemes.push("x".into()),
            'g' if intervocalic(i) => phonemes.push("ɣ".into()),
            'g' => phonemes.push("g".into()),
            'l' if next == Some(&'l') => {
                phonemes.push(dialect.ll().into());
                step = 2;
            }
            'r' if next == Some(&'r') => {
                phonemes.push("r".into());
                step = 2;
            }
            'r' if i == 0 || matches!(letters[i - 1], 'l' | 'n' | 's') => {
                phonemes.push("r".into())
            }
            'r' => phonemes.push("ɾ".into()),
            'b' | 'v' if intervocalic(i) => phonemes.push("β".into()),
            'b' | 'v' => phonemes.push("b".into()),
            'd' if intervocalic(i) => phonemes.push("ð".into()),
            'd' => phonemes.push("d".into()),
            'y' if next.is_some_and(|c| is_vowel(*c)) => {
                phonemes.push(dialect.consonantal_y().into())
            }
            // Word-final or preconsonantal y is a vowel, never stressed
            'y' => phonemes.push("i".into()),
            'h' => {}
            'j' => phonemes.push("x".into()),
            'ñ' => phonemes.push("ɲ".into()),
            'x' => phonemes.push("ks".into()),
            'f' | 'l' | 'm' | 'n' | 'p' | 's' | 't' | 'w' => phonemes.push(c.to_string()),
            _ => tracing::debug!(letter = %c, "Skipping unknown letter"),
        }
        i += step;
    }

    let mut stresses = vec![0; phonemes.len()];
    if let Some(index) = stressed_vowel(&letters, &vowels) {
        stresses[index] = 1;
    }
    SpanishWord { phonemes, stresses }
}

/// Phoneme index of the stressed vowel
fn stressed_vowel(letters: &[char], vowels: &[VowelSlot]) -> Option<usize> {
    if let Some(accented) = vowels.iter().find(|v| is_accented(v.ch)) {
        return Some(accented.phoneme);
    }

    // Adjacent vowel letters share a nucleus unless both are strong
    let mut nuclei: Vec<Vec<VowelSlot>> = Vec::new();
    for slot in vowels {
        let joins = nuclei
            .last()
            .and_then(|nucleus| nucleus.last())
            .is_some_and(|prev| {
                prev.letter + 1 == slot.letter && !(is_strong(prev.ch) && is_strong(slot.ch))
            });
        if joins {
            if let Some(nucleus) = nuclei.last_mut() {
                nucleus.push(*slot);
            }
        } else {
            nuclei.push(vec![*slot]);
        }
    }

    let last = letters.last()?;
    let target = if nuclei.len() >= 2 && (is_vowel(*last) || matches!(last, 'n' | 's')) {
        nuclei.len() - 2
    } else {
        nuclei.len().checked_sub(1)?
    };

    let nucleus = &nuclei[target];
    nucleus
        .iter()
        .find(|v| is_strong(v.ch))
        .or(nucleus.last())
        .map(|v| v.phoneme)
}

pub struct SpanishBackend {
    languages: Vec<String>,
    normalizer: TextNormalizer,
}

impl Default for SpanishBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl SpanishBackend {
    pub fn new() -> Self {
        Self {
            languages: ["es-ES", "es-MX", "es-AR", "es-CO"]
                .into_iter()
                .map(String::from)
                .collect(),
            normalizer: TextNormalizer::new(),
        }
    }
}

#[async_trait]
impl PhonemizerBackend for SpanishBackend {
    fn name(&self) -> &str {
        "spanish"
    }

    fn supported_languages(&self) -> &[String] {
        &self.languages
    }

    fn capabilities(&self) -> BackendCapabilities {
        BackendCapabilities {
            supports_stress: true,
            supports_tone: false,
            supports_ipa: true,
            is_thread_safe: true,
            requires_network: false,
        }
    }

    async fn initialize(&mut self, _data_path: Option<&Path>) -> PhonemizerResult<bool> {
        tracing::info!(backend = "spanish", languages = ?self.languages, "Backend initialized");
        Ok(false)
    }

    async fn phonemize(
        &self,
        text: &str,
        language: &str,
        options: &PhonemeOptions,
    ) -> PhonemizerResult<PhonemeResult> {
        let start = Instant::now();
        let dialect = Dialect::from_language(language);
        let text = if options.normalize_text {
            self.normalizer.normalize(text, language)
        } else {
            text.to_lowercase()
        };

        let mut builder = PhonemeResultBuilder::new();
        for token in tokenize(&text) {
            options.check_cancelled()?;
            match token {
                Token::Word(word) => {
                    let converted = word_to_phonemes(&word, dialect);
                    builder.push_word(converted.phonemes, converted.stresses);
                }
                token if token.is_pause() => builder.push_symbol("_"),
                Token::Punctuation(_) => {}
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
