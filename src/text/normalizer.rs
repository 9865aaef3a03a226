//! Per-language text normalization
//!
//! Runs before tokenization. Every language gets control-character removal,
//! whitespace collapsing and trimming; language-specific passes expand
//! numbers, abbreviations and contractions or fold full-width forms.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use super::numbers::{
    chinese_digits, chinese_number, english_cardinal, english_ordinal, korean_number,
    read_integer, spanish_cardinal,
};
use crate::core::primary_subtag;

static CONTROL_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\x00-\x1F\x7F]").expect("valid regex"));
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));
static NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([0-9]+)(?:\.([0-9]+))?").expect("valid regex"));
static ORDINAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b([0-9]+)(?:st|nd|rd|th)\b").expect("valid regex"));
static CURRENCY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$([0-9]+(?:\.[0-9]+)?)").expect("valid regex"));
static EN_ABBREVIATIONS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(mr|mrs|ms|dr|st|jr|sr|vs|etc|prof)\.").expect("valid regex")
});
static ES_ABBREVIATIONS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(sr|sra|srta|dr|dra|ud|uds)\.").expect("valid regex"));

/// Text normalizer dispatching on the language's primary subtag
#[derive(Debug, Clone, Copy, Default)]
pub struct TextNormalizer;

impl TextNormalizer {
    pub fn new() -> Self {
        Self
    }

    /// Normalize `text` for `language`
    pub fn normalize(&self, text: &str, language: &str) -> String {
        if text.trim().is_empty() {
            return String::new();
        }
        let cleaned = clean(text);
        let normalized = match primary_subtag(language) {
            "en" => normalize_english(&cleaned),
            "es" => normalize_spanish(&cleaned),
            "zh" => normalize_chinese(&cleaned),
            "ko" => normalize_korean(&cleaned),
            "ja" => to_half_width(&cleaned),
            _ => cleaned,
        };
        let normalized = collapse_whitespace(&normalized);

        tracing::trace!(language = %language, input = %text, output = %normalized, "Normalized text");
        normalized
    }

    /// Whether `normalize` would change `text`
    pub fn needs_normalization(&self, text: &str, language: &str) -> bool {
        self.normalize(text, language) != text
    }
}

/// Replace control characters with spaces, fold decimal digits to ASCII and
/// collapse whitespace
pub fn clean(text: &str) -> String {
    let text = CONTROL_CHARS.replace_all(text, " ");
    let text: String = text.chars().map(fold_digit).collect();
    collapse_whitespace(&text)
}

/// ASCII form of a decimal digit from another script
fn fold_digit(c: char) -> char {
    let zero = match c {
        '\u{0660}'..='\u{0669}' => 0x0660,
        '\u{06F0}'..='\u{06F9}' => 0x06F0,
        '\u{0966}'..='\u{096F}' => 0x0966,
        '\u{FF10}'..='\u{FF19}' => 0xFF10,
        _ => return c,
    };
    char::from_u32('0' as u32 + (c as u32 - zero)).unwrap_or(c)
}

fn collapse_whitespace(text: &str) -> String {
    WHITESPACE.replace_all(text, " ").trim().to_string()
}

/// Fold full-width ASCII forms and CJK punctuation to their half-width forms
pub fn to_half_width(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\u{3000}' => ' ',
            '\u{FF01}'..='\u{FF5E}' => char::from_u32(c as u32 - 0xFEE0).unwrap_or(c),
            '。' => '.',
            '、' => ',',
            '「' | '」' | '『' | '』' | '《' | '》' | '【' | '】' => ' ',
            other => other,
        })
        .collect()
}

fn expand_numbers<F>(text: &str, read: F) -> String
where
    F: Fn(&str, Option<&str>) -> String,
{
    NUMBER
        .replace_all(text, |caps: &Captures| {
            let integer = &caps[1];
            let fraction = caps.get(2).map(|m| m.as_str());
            format!(" {} ", read(integer, fraction))
        })
        .into_owned()
}

fn normalize_english(text: &str) -> String {
    let mut text = text.to_lowercase().replace(['\u{2019}', '\u{2018}'], "'");

    for (from, to) in [
        ("can't", "can not"),
        ("won't", "will not"),
        ("n't", " not"),
        ("'re", " are"),
        ("'ve", " have"),
        ("'ll", " will"),
        ("'d", " would"),
        ("'m", " am"),
    ] {
        text = text.replace(from, to);
    }

    let text = EN_ABBREVIATIONS.replace_all(&text, |caps: &Captures| {
        match &caps[1] {
            "mr" => "mister",
            "mrs" => "missus",
            "ms" => "miz",
            "dr" => "doctor",
            "st" => "street",
            "jr" => "junior",
            "sr" => "senior",
            "vs" => "versus",
            "etc" => "et cetera",
            _ => "professor",
        }
        .to_string()
    });
    let text = CURRENCY.replace_all(&text, "$1 dollars");
    let text = text
        .replace('&', " and ")
        .replace('%', " percent ")
        .replace('+', " plus ")
        .replace('@', " at ");
    let text = ORDINAL.replace_all(&text, |caps: &Captures| {
        read_integer(&caps[1], english_ordinal, " ")
    });
    let text = expand_numbers(&text, |integer, fraction| {
        let mut words = read_integer(integer, english_cardinal, " ");
        if let Some(fraction) = fraction {
            words.push_str(" point ");
            words.push_str(&read_integer_digits(fraction, english_cardinal));
        }
        words
    });

    text.replace('\'', "")
}

fn normalize_spanish(text: &str) -> String {
    let text = text.to_lowercase();
    let text = ES_ABBREVIATIONS.replace_all(&text, |caps: &Captures| {
        match &caps[1] {
            "sr" => "señor",
            "sra" => "señora",
            "srta" => "señorita",
            "dr" => "doctor",
            "dra" => "doctora",
            "ud" => "usted",
            _ => "ustedes",
        }
        .to_string()
    });
    let text = text.replace('%', " por ciento ").replace('&', " y ");
    expand_numbers(&text, |integer, fraction| {
        let mut words = read_integer(integer, spanish_cardinal, " ");
        if let Some(fraction) = fraction {
            words.push_str(" coma ");
            words.push_str(&read_integer_digits(fraction, spanish_cardinal));
        }
        words
    })
}

fn normalize_chinese(text: &str) -> String {
    let text = to_half_width(text);
    NUMBER
        .replace_all(&text, |caps: &Captures| {
            let integer = &caps[1];
            // Beyond 亿 scale read digit by digit
            let mut out = match integer.parse::<u64>() {
                Ok(n) if integer.len() <= 12 => chinese_number(n),
                _ => chinese_digits(integer),
            };
            if let Some(fraction) = caps.get(2) {
                out.push('点');
                out.push_str(&chinese_digits(fraction.as_str()));
            }
            out
        })
        .into_owned()
}

fn normalize_korean(text: &str) -> String {
    let text = to_half_width(text);
    NUMBER
        .replace_all(&text, |caps: &Captures| {
            let mut out = read_integer(&caps[1], korean_number, "");
            if let Some(fraction) = caps.get(2) {
                out.push_str(" 점 ");
                out.push_str(&read_integer_digits(fraction.as_str(), korean_number));
            }
            out
        })
        .into_owned()
}

/// Read every digit separately (decimal fractions)
fn read_integer_digits(digits: &str, cardinal: fn(u64) -> String) -> String {
    digits
        .chars()
        .filter_map(|c| c.to_digit(10))
        .map(|d| cardinal(d as u64))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalize(text: &str, language: &str) -> String {
        TextNormalizer::new().normalize(text, language)
    }

    #[test]
    fn test_clean_strips_control_and_whitespace() {
        assert_eq!(clean("  hello\t\n\x07world  "), "hello world");
        assert_eq!(normalize("   ", "en-US"), "");
    }

    #[test]
    fn test_english_contractions() {
        assert_eq!(normalize("I can't go", "en-US"), "i can not go");
        assert_eq!(normalize("They won't", "en-US"), "they will not");
        assert_eq!(normalize("we're here", "en-US"), "we are here");
        assert_eq!(normalize("Don\u{2019}t", "en-US"), "do not");
    }

    #[test]
    fn test_english_numbers() {
        assert_eq!(normalize("I have 3 cats", "en-US"), "i have three cats");
        assert_eq!(normalize("pi is 3.14", "en-GB"), "pi is three point one four");
        assert_eq!(normalize("the 21st century", "en-US"), "the twenty first century");
        assert_eq!(normalize("$5", "en-US"), "five dollars");
    }

    #[test]
    fn test_english_abbreviations_and_symbols() {
        assert_eq!(normalize("Dr. Smith", "en-US"), "doctor smith");
        assert_eq!(normalize("salt & pepper", "en-US"), "salt and pepper");
        assert_eq!(normalize("50%", "en-US"), "fifty percent");
    }

    #[test]
    fn test_spanish_numbers_and_abbreviations() {
        assert_eq!(normalize("Sr. García tiene 21 años", "es-ES"), "señor garcía tiene veintiuno años");
        assert_eq!(normalize("2,5", "es-MX"), "dos , cinco");
    }

    #[test]
    fn test_chinese_numbers_and_punctuation() {
        assert_eq!(normalize("我有3个苹果。", "zh-CN"), "我有三个苹果.");
        assert_eq!(normalize("１０５", "zh-CN"), "一百零五");
        assert_eq!(normalize("你好，世界！", "zh-CN"), "你好,世界!");
    }

    #[test]
    fn test_korean_numbers() {
        assert_eq!(normalize("사과 25개", "ko-KR"), "사과 이십오개");
        assert_eq!(
            normalize("1234567890123", "ko-KR"),
            "일조이천삼백사십오억육천칠백팔십구만백이십삼"
        );
    }

    #[test]
    fn test_non_ascii_digits_fold_to_numbers() {
        assert_eq!(normalize("٣٤٥", "en-US"), "three hundred forty five");
        assert_eq!(normalize("۱۲ cats", "en-US"), "twelve cats");
        assert_eq!(normalize("３個", "zh-CN"), "三個");
    }

    #[test]
    fn test_full_width_period_folds() {
        assert_eq!(to_half_width("a．b"), "a.b");
    }

    #[test]
    fn test_japanese_full_width() {
        assert_eq!(normalize("ＡＢＣ　１２３", "ja-JP"), "ABC 123");
    }

    #[test]
    fn test_unknown_language_only_cleans() {
        assert_eq!(normalize("  Bonjour\tle monde 3 ", "fr-FR"), "Bonjour le monde 3");
    }

    #[test]
    fn test_needs_normalization() {
        let normalizer = TextNormalizer::new();
        assert!(normalizer.needs_normalization("Hello", "en-US"));
        assert!(!normalizer.needs_normalization("hello", "en-US"));
    }
}
