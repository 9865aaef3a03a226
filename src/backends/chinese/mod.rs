//! Mandarin Chinese backend
//!
//! # Pipeline
//!
//! ```text
//!   text ─► normalize (full-width fold, numbers → 汉字)
//!        ─► Han runs ─► PinyinTable::convert ─► apply_sandhi ─► syllable_to_ipa + tone mark
//!        ─► Latin runs ─► spelled letter by letter
//!        ─► sentence punctuation ─► pause
//! ```
//!
//! Each syllable is one word in the result. Tones are reported after
//! sandhi, one per syllable.

pub mod ipa;
pub mod pinyin;

use async_trait::async_trait;
use phf::phf_map;
use std::path::Path;
use std::time::Instant;

use crate::core::{
    BackendCapabilities, PhonemeOptions, PhonemeResult, PhonemeResultBuilder, PhonemizerBackend,
    Script,
};
use crate::detect::script_of;
use crate::errors::{PhonemizerError, PhonemizerResult};
use crate::text::{PAUSE_PUNCTUATION, TextNormalizer};

use self::ipa::{syllable_to_ipa, tone_mark};
use self::pinyin::{PinyinTable, apply_sandhi};

pub use self::pinyin::{NEUTRAL_TONE, Syllable};

pub const PINYIN_DICTIONARY_FILE: &str = "pinyin_dict.txt";

/// Letter names used when Latin letters appear inside Chinese text
static LETTER_NAMES: phf::Map<char, &'static [&'static str]> = phf_map! {
    'a' => &["eɪ"], 'b' => &["b", "i"], 'c' => &["s", "i"], 'd' => &["d", "i"],
    'e' => &["i"], 'f' => &["ɛ", "f"], 'g' => &["dʒ", "i"], 'h' => &["eɪ", "tʃ"],
    'i' => &["aɪ"], 'j' => &["dʒ", "eɪ"], 'k' => &["k", "eɪ"], 'l' => &["ɛ", "l"],
    'm' => &["ɛ", "m"], 'n' => &["ɛ", "n"], 'o' => &["oʊ"], 'p' => &["p", "i"],
    'q' => &["k", "j", "u"], 'r' => &["ɑ", "ɹ"], 's' => &["ɛ", "s"], 't' => &["t", "i"],
    'u' => &["j", "u"], 'v' => &["v", "i"], 'w' => &["d", "ʌ", "b", "ə", "l", "j", "u"],
    'x' => &["ɛ", "k", "s"], 'y' => &["w", "aɪ"], 'z' => &["z", "i"],
};

pub struct ChineseBackend {
    languages: Vec<String>,
    table: PinyinTable,
    normalizer: TextNormalizer,
}

impl Default for ChineseBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl ChineseBackend {
    pub fn new() -> Self {
        Self {
            languages: vec!["zh-CN".into(), "zh-TW".into()],
            table: PinyinTable::builtin(),
            normalizer: TextNormalizer::new(),
        }
    }

    pub fn table(&self) -> &PinyinTable {
        &self.table
    }

    fn push_han_run(&self, run: &[char], builder: &mut PhonemeResultBuilder) {
        let mut syllables = self.table.convert(run);
        apply_sandhi(&mut syllables);
        for syllable in syllables {
            let mut phonemes =
                syllable_to_ipa(&syllable.base).unwrap_or_else(|| vec![syllable.base.clone()]);
            if let Some(mark) = tone_mark(syllable.tone) {
                phonemes.push(mark.to_string());
            }
            builder.push_unstressed_word(phonemes);
            builder.push_tone(syllable.tone);
        }
    }

    fn push_spelled(word: &str, builder: &mut PhonemeResultBuilder) {
        let phonemes: Vec<String> = word
            .chars()
            .filter_map(|c| LETTER_NAMES.get(&c.to_ascii_lowercase()))
            .flat_map(|names| names.iter().map(|s| s.to_string()))
            .collect();
        builder.push_unstressed_word(phonemes);
    }
}

/// Unit of Chinese text processed at once
enum Chunk {
    Han(Vec<char>),
    Latin(String),
    Pause,
}

fn chunk(text: &str) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    // Whitespace and other symbols close the current run
    let mut open = false;
    for c in text.chars() {
        match script_of(c) {
            Script::Cjk => match chunks.last_mut() {
                Some(Chunk::Han(run)) if open => run.push(c),
                _ => chunks.push(Chunk::Han(vec![c])),
            },
            Script::Latin => match chunks.last_mut() {
                Some(Chunk::Latin(word)) if open => word.push(c),
                _ => chunks.push(Chunk::Latin(c.to_string())),
            },
            _ if PAUSE_PUNCTUATION.contains(&c) => chunks.push(Chunk::Pause),
            _ => {
                open = false;
                continue;
            }
        }
        open = true;
    }
    chunks
}

#[async_trait]
impl PhonemizerBackend for ChineseBackend {
    fn name(&self) -> &str {
        "chinese"
    }

    fn supported_languages(&self) -> &[String] {
        &self.languages
    }

    fn capabilities(&self) -> BackendCapabilities {
        BackendCapabilities {
            supports_stress: false,
            supports_tone: true,
            supports_ipa: true,
            is_thread_safe: true,
            requires_network: false,
        }
    }

    async fn initialize(&mut self, data_path: Option<&Path>) -> PhonemizerResult<bool> {
        let mut loaded = false;
        if let Some(path) = data_path.map(|p| p.join(PINYIN_DICTIONARY_FILE)) {
            if path.is_file() {
                let added = self
                    .table
                    .load(&path)
                    .map_err(|e| PhonemizerError::init_error("chinese", e))?;
                tracing::info!(entries = added, path = %path.display(), "Loaded pinyin dictionary");
                loaded = true;
            }
        }
        tracing::info!(
            backend = "chinese",
            characters = self.table.char_count(),
            phrases = self.table.phrase_count(),
            "Backend initialized"
        );
        Ok(loaded)
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
        for chunk in chunk(&text) {
            options.check_cancelled()?;
            match chunk {
                Chunk::Han(run) => self.push_han_run(&run, &mut builder),
                Chunk::Latin(word) => Self::push_spelled(&word, &mut builder),
                Chunk::Pause => builder.push_symbol("_"),
            }
        }

        Ok(builder
            .build(language, options)
            .with_processing_time(start.elapsed()))
    }

    fn memory_usage(&self) -> usize {
        (self.table.char_count() + self.table.phrase_count()) * 48
    }
}
