//! English backend
//!
//! Dictionary lookup against a CMU-style ARPABET lexicon, with the
//! letter-to-sound engine covering out-of-vocabulary words.
//!
//! Phones carry CMU stress digits (`ae1`). Without `include_stress` the
//! digits stay in the phoneme strings; with it they move into
//! `PhonemeResult::stresses`. `PhonemeFormat::Ipa` maps every phone to IPA.

use async_trait::async_trait;
use phf::phf_map;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use crate::core::{
    BackendCapabilities, PhonemeFormat, PhonemeOptions, PhonemeResult, PhonemeResultBuilder,
    PhonemizerBackend, primary_subtag,
};
use crate::dictionary::PronunciationDictionary;
use crate::errors::{PhonemizerError, PhonemizerResult};
use crate::lts::{LetterToSoundEngine, LtsRuleSet, english_rule_set};
use crate::text::{PAUSE_PUNCTUATION, TextNormalizer, Token, tokenize};

pub const DICTIONARY_FILE: &str = "cmudict.txt";
pub const RULES_FILE: &str = "lts_rules.txt";

/// Pause symbol emitted for sentence punctuation
pub const PAUSE_SYMBOL: &str = "_";

/// Lexicon used when no dictionary file is available
const SEED_LEXICON: &str = "\
# word  phonemes
A  AH0
ABOUT  AH0 B AW1 T
ALL  AO1 L
AND  AH0 N D
ARE  AA1 R
BE  B IY1
BUT  B AH1 T
BY  B AY1
CAN  K AE1 N
CAT  K AE1 T
COME  K AH1 M
DAY  D EY1
DO  D UW1
DOG  D AO1 G
FOR  F AO1 R
FROM  F R AH1 M
GOOD  G UH1 D
HAVE  HH AE1 V
HE  HH IY1
HELLO  HH AH0 L OW1
HER  HH ER1
HOW  HH AW1
I  AY1
IN  IH0 N
IS  IH1 Z
IT  IH1 T
KNOW  N OW1
LIKE  L AY1 K
MORNING  M AO1 R N IH0 NG
MY  M AY1
NAME  N EY1 M
NO  N OW1
NOT  N AA1 T
OF  AH1 V
ON  AA1 N
ONE  W AH1 N
ONLY  OW1 N L IY0
PEOPLE  P IY1 P AH0 L
SAID  S EH1 D
SHE  SH IY1
SPEECH  S P IY1 CH
TEST  T EH1 S T
THANK  TH AE1 NG K
THAT  DH AE1 T
THE  DH AH0
THEY  DH EY1
THIS  DH IH1 S
TIME  T AY1 M
TO  T UW1
TWO  T UW1
VOICE  V OY1 S
WAS  W AA1 Z
WE  W IY1
WHAT  W AH1 T
WITH  W IH1 DH
WORLD  W ER1 L D
WOULD  W UH1 D
YES  Y EH1 S
YOU  Y UW1
YOUR  Y AO1 R
";

static ARPABET_TO_IPA: phf::Map<&'static str, &'static str> = phf_map! {
    "aa" => "ɑ", "ae" => "æ", "ah" => "ʌ", "ao" => "ɔ", "aw" => "aʊ", "ay" => "aɪ",
    "b" => "b", "ch" => "tʃ", "d" => "d", "dh" => "ð", "eh" => "ɛ", "er" => "ɝ",
    "ey" => "eɪ", "f" => "f", "g" => "ɡ", "hh" => "h", "ih" => "ɪ", "iy" => "i",
    "jh" => "dʒ", "k" => "k", "l" => "l", "m" => "m", "n" => "n", "ng" => "ŋ",
    "ow" => "oʊ", "oy" => "ɔɪ", "p" => "p", "r" => "ɹ", "s" => "s", "sh" => "ʃ",
    "t" => "t", "th" => "θ", "uh" => "ʊ", "uw" => "u", "v" => "v", "w" => "w",
    "y" => "j", "z" => "z", "zh" => "ʒ",
};

/// Split a trailing CMU stress digit off a phone (`ae1` → `("ae", Some(1))`)
pub fn split_stress(phone: &str) -> (&str, Option<u8>) {
    match phone.as_bytes().last() {
        Some(&d @ b'0'..=b'2') => (&phone[..phone.len() - 1], Some(d - b'0')),
        _ => (phone, None),
    }
}

/// IPA for an ARPABET phone; unstressed `ah`/`er` reduce to `ə`/`ɚ`
pub fn arpabet_to_ipa(phone: &str) -> String {
    let (base, stress) = split_stress(phone);
    let base = base.to_ascii_lowercase();
    match (base.as_str(), stress) {
        ("ah", Some(0)) => "ə".to_string(),
        ("er", Some(0)) => "ɚ".to_string(),
        (other, _) => ARPABET_TO_IPA
            .get(other)
            .map(|ipa| ipa.to_string())
            .unwrap_or_else(|| other.to_string()),
    }
}

/// English phonemizer over a shared pronunciation dictionary
pub struct EnglishBackend {
    languages: Vec<String>,
    dictionary: Arc<PronunciationDictionary>,
    lts: Option<LetterToSoundEngine>,
    lts_capacity: usize,
    normalizer: TextNormalizer,
}

impl EnglishBackend {
    pub fn new(dictionary: Arc<PronunciationDictionary>, lts_capacity: usize) -> Self {
        Self {
            languages: vec!["en-US".into(), "en-GB".into(), "en-IN".into()],
            dictionary,
            lts: None,
            lts_capacity,
            normalizer: TextNormalizer::new(),
        }
    }

    pub fn lts(&self) -> Option<&LetterToSoundEngine> {
        self.lts.as_ref()
    }

    /// Raw ARPABET phones for one word, or `None` if nothing applies
    fn pronounce(&self, word: &str, language: &str, options: &PhonemeOptions) -> Option<Vec<String>> {
        let key = primary_subtag(language);
        if let Some(phonemes) = self.dictionary.lookup(word, key) {
            return Some(phonemes);
        }
        let bare: String = word.chars().filter(|c| *c != '\'' && *c != '\u{2019}').collect();
        if bare != word {
            if let Some(phonemes) = self.dictionary.lookup(&bare, key) {
                return Some(phonemes);
            }
        }
        if !options.use_lts_fallback {
            return None;
        }
        let lts = self.lts.as_ref()?;
        let phonemes = lts.apply(&bare);
        tracing::debug!(word = %word, phonemes = ?phonemes, "Letter-to-sound fallback");
        (!phonemes.is_empty()).then_some(phonemes)
    }
}

/// Render raw phones per the requested format and stress handling
fn render(raw: Vec<String>, options: &PhonemeOptions) -> (Vec<String>, Vec<u8>) {
    let mut phonemes = Vec::with_capacity(raw.len());
    let mut stresses = Vec::with_capacity(raw.len());
    for phone in raw {
        let (base, stress) = split_stress(&phone);
        stresses.push(stress.unwrap_or(0));
        let rendered = match options.format {
            PhonemeFormat::Ipa => arpabet_to_ipa(&phone),
            PhonemeFormat::Native if options.include_stress => base.to_string(),
            PhonemeFormat::Native => phone.clone(),
        };
        phonemes.push(rendered);
    }
    (phonemes, stresses)
}

#[async_trait]
impl PhonemizerBackend for EnglishBackend {
    fn name(&self) -> &str {
        "english"
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

    async fn initialize(&mut self, data_path: Option<&Path>) -> PhonemizerResult<bool> {
        let dictionary_file = data_path.map(|p| p.join(DICTIONARY_FILE));
        let loaded = match dictionary_file {
            Some(path) if path.is_file() => {
                self.dictionary
                    .load(&path, "en")
                    .map_err(|e| PhonemizerError::init_error(self.name(), e))?;
                true
            }
            _ if self.dictionary.word_count("en") == 0 => {
                let count = self.dictionary.load_from_str(SEED_LEXICON, "en");
                tracing::info!(entries = count, "Loaded built-in English seed lexicon");
                false
            }
            _ => false,
        };

        let rules = match data_path.map(|p| p.join(RULES_FILE)) {
            Some(path) if path.is_file() => LtsRuleSet::from_pattern_file(&path),
            _ => english_rule_set(),
        }
        .map_err(|e| PhonemizerError::init_error(self.name(), e))?;

        self.lts = Some(LetterToSoundEngine::with_capacity(
            Arc::new(rules),
            self.lts_capacity,
        ));
        tracing::info!(
            backend = "english",
            words = self.dictionary.word_count("en"),
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
        if self.lts.is_none() {
            return Err(PhonemizerError::BackendUnavailable(
                "english backend not initialized".to_string(),
            ));
        }
        let start = Instant::now();
        let text = if options.normalize_text {
            self.normalizer.normalize(text, language)
        } else {
            text.to_string()
        };

        let mut builder = PhonemeResultBuilder::new();
        for token in tokenize(&text) {
            options.check_cancelled()?;
            match token {
                Token::Word(word) => match self.pronounce(&word, language, options) {
                    Some(raw) => {
                        let (phonemes, stresses) = render(raw, options);
                        builder.push_word(phonemes, stresses);
                    }
                    None => tracing::debug!(word = %word, "No pronunciation, skipping word"),
                },
                Token::Punctuation(c) if PAUSE_PUNCTUATION.contains(&c) => {
                    builder.push_symbol(PAUSE_SYMBOL);
                }
                Token::Punctuation(_) => {}
            }
        }

        Ok(builder
            .build(language, options)
            .with_processing_time(start.elapsed()))
    }

    /// Letter-to-sound rules and memo; the shared dictionary is counted by its owner
    fn memory_usage(&self) -> usize {
        self.lts.as_ref().map_or(0, |l| l.memory_usage())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    async fn backend() -> EnglishBackend {
        let mut backend = EnglishBackend::new(Arc::new(PronunciationDictionary::new()), 100);
        backend.initialize(None).await.unwrap();
        backend
    }

    #[test]
    fn test_split_stress() {
        assert_eq!(split_stress("ae1"), ("ae", Some(1)));
        assert_eq!(split_stress("k"), ("k", None));
        assert_eq!(split_stress("ah0"), ("ah", Some(0)));
    }

    #[test]
    fn test_arpabet_to_ipa() {
        assert_eq!(arpabet_to_ipa("ae1"), "æ");
        assert_eq!(arpabet_to_ipa("ah0"), "ə");
        assert_eq!(arpabet_to_ipa("AH1"), "ʌ");
        assert_eq!(arpabet_to_ipa("ch"), "tʃ");
        assert_eq!(arpabet_to_ipa("xx"), "xx");
    }

    #[tokio::test]
    async fn test_dictionary_word() {
        let backend = backend().await;
        let result = backend
            .phonemize("cat", "en-US", &PhonemeOptions::default())
            .await
            .unwrap();
        assert!(result.success);
        assert_eq!(result.phonemes, vec!["k", "ae1", "t"]);
        assert_eq!(result.word_boundaries, vec![0]);
    }

    #[tokio::test]
    async fn test_include_stress_moves_digits() {
        let backend = backend().await;
        let options = PhonemeOptions {
            include_stress: true,
            ..Default::default()
        };
        let result = backend.phonemize("cat", "en-US", &options).await.unwrap();
        assert_eq!(result.phonemes, vec!["k", "ae", "t"]);
        assert_eq!(result.stresses, Some(vec![0, 1, 0]));
    }

    #[tokio::test]
    async fn test_ipa_format() {
        let backend = backend().await;
        let options = PhonemeOptions::default().with_format(PhonemeFormat::Ipa);
        let result = backend.phonemize("the cat", "en-US", &options).await.unwrap();
        assert_eq!(result.phonemes, vec!["ð", "ə", "k", "æ", "t"]);
        assert_eq!(result.word_boundaries, vec![0, 2]);
    }

    #[tokio::test]
    async fn test_oov_word_uses_letter_to_sound() {
        let backend = backend().await;
        let result = backend
            .phonemize("zxqvb", "en-US", &PhonemeOptions::default())
            .await
            .unwrap();
        assert!(result.success);
        assert!(!result.phonemes.is_empty());
    }

    #[tokio::test]
    async fn test_oov_word_skipped_without_lts() {
        let backend = backend().await;
        let options = PhonemeOptions {
            use_lts_fallback: false,
            ..Default::default()
        };
        let result = backend.phonemize("cat zxqvb", "en-US", &options).await.unwrap();
        assert_eq!(result.phonemes, vec!["k", "ae1", "t"]);
    }

    #[tokio::test]
    async fn test_punctuation_becomes_pause() {
        let backend = backend().await;
        let result = backend
            .phonemize("yes, no.", "en-US", &PhonemeOptions::default())
            .await
            .unwrap();
        assert_eq!(
            result.phonemes,
            vec!["y", "eh1", "s", PAUSE_SYMBOL, "n", "ow1", PAUSE_SYMBOL]
        );
        assert_eq!(result.word_boundaries, vec![0, 4]);
    }

    #[tokio::test]
    async fn test_numbers_are_normalized() {
        let backend = backend().await;
        let result = backend
            .phonemize("2", "en-US", &PhonemeOptions::default())
            .await
            .unwrap();
        assert_eq!(result.phonemes, vec!["t", "uw1"]);
    }

    #[tokio::test]
    async fn test_cancelled_before_first_word() {
        let backend = backend().await;
        let options = PhonemeOptions::default();
        options.cancellation.cancel();
        let err = backend.phonemize("cat", "en-US", &options).await.unwrap_err();
        assert_eq!(err, PhonemizerError::Cancelled);
    }

    #[tokio::test]
    async fn test_uninitialized_backend_is_unavailable() {
        let backend = EnglishBackend::new(Arc::new(PronunciationDictionary::new()), 10);
        let err = backend
            .phonemize("cat", "en-US", &PhonemeOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, PhonemizerError::BackendUnavailable(_)));
    }

    #[tokio::test]
    async fn test_initialize_from_data_path() {
        let dir = tempfile::tempdir().unwrap();
        let mut file = std::fs::File::create(dir.path().join(DICTIONARY_FILE)).unwrap();
        writeln!(file, ";;; test dictionary").unwrap();
        writeln!(file, "TOMATO  T AH0 M EY1 T OW2").unwrap();

        let dictionary = Arc::new(PronunciationDictionary::new());
        let mut backend = EnglishBackend::new(dictionary.clone(), 10);
        assert!(backend.initialize(Some(dir.path())).await.unwrap());

        assert_eq!(dictionary.word_count("en"), 1);
        let result = backend
            .phonemize("Tomato", "en-GB", &PhonemeOptions::default())
            .await
            .unwrap();
        assert_eq!(result.phonemes, vec!["t", "ah0", "m", "ey1", "t", "ow2"]);
    }

    #[tokio::test]
    async fn test_seed_lexicon_keeps_existing_entries() {
        let dictionary = Arc::new(PronunciationDictionary::new());
        dictionary.add_word("cat", vec!["k".into(), "ae1".into(), "t".into()], "en");
        let mut backend = EnglishBackend::new(dictionary.clone(), 10);
        backend.initialize(None).await.unwrap();
        assert_eq!(dictionary.word_count("en"), 1);
    }
}
