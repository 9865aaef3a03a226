//! Phoneme duration estimation
//!
//! Coarse per-class durations adjusted by position, used when a caller asks
//! for `include_durations`. Vowels lengthen at the end of the sequence and
//! consonants shorten before a vowel.

/// Base vowel duration in seconds
pub const VOWEL_DURATION: f32 = 0.080;
/// Base consonant duration in seconds
pub const CONSONANT_DURATION: f32 = 0.055;
/// Pause / punctuation duration in seconds
pub const PAUSE_DURATION: f32 = 0.200;

const FINAL_VOWEL_FACTOR: f32 = 1.2;
const PREVOCALIC_CONSONANT_FACTOR: f32 = 0.9;

/// Coarse class of a phoneme symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhonemeClass {
    Vowel,
    Consonant,
    Pause,
    /// Tone letters (˥ ˧˥ ...) carry no duration of their own
    Tone,
}

const IPA_VOWELS: &str = "aeiouyæɑɐɒɔəɚɛɜɤɨɪɯʊʌøœɵ";

/// Classify a symbol from any backend (ARPABET or IPA)
pub fn classify(phoneme: &str) -> PhonemeClass {
    let Some(first) = phoneme.chars().next() else {
        return PhonemeClass::Pause;
    };
    if phoneme.chars().all(|c| ('\u{02E5}'..='\u{02E9}').contains(&c)) {
        return PhonemeClass::Tone;
    }
    if phoneme == "_" || first.is_ascii_punctuation() || first.is_whitespace() {
        return PhonemeClass::Pause;
    }
    if IPA_VOWELS.contains(first.to_ascii_lowercase()) {
        PhonemeClass::Vowel
    } else {
        PhonemeClass::Consonant
    }
}

/// Estimate one duration per phoneme, in seconds
pub fn estimate_durations(phonemes: &[String], speech_rate: f32) -> Vec<f32> {
    let rate = if speech_rate > 0.0 { speech_rate } else { 1.0 };
    let classes: Vec<PhonemeClass> = phonemes.iter().map(|p| classify(p)).collect();
    let last = classes.len().saturating_sub(1);

    classes
        .iter()
        .enumerate()
        .map(|(i, class)| {
            let duration = match class {
                PhonemeClass::Tone => 0.0,
                PhonemeClass::Pause => PAUSE_DURATION,
                PhonemeClass::Vowel if i == last => VOWEL_DURATION * FINAL_VOWEL_FACTOR,
                PhonemeClass::Vowel => VOWEL_DURATION,
                PhonemeClass::Consonant
                    if classes.get(i + 1) == Some(&PhonemeClass::Vowel) =>
                {
                    CONSONANT_DURATION * PREVOCALIC_CONSONANT_FACTOR
                }
                PhonemeClass::Consonant => CONSONANT_DURATION,
            };
            duration / rate
        })
        .collect()
}
