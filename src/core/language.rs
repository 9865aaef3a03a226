//! Language tags and static language metadata
//!
//! Tags are canonicalized to `xx-YY` form before they reach the router or the
//! cache, so `EN_us`, `en-us` and `en` all resolve to the same backend.

use phf::phf_map;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Pseudo-language asking the service to detect and segment
pub const MIXED_LANGUAGE: &str = "mixed";
/// Pseudo-language asking the service to detect a single language
pub const AUTO_LANGUAGE: &str = "auto";

/// Writing system of a character or language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Script {
    Latin,
    /// Han ideographs (Chinese characters, also used in Japanese)
    Cjk,
    Hangul,
    /// Hiragana and Katakana
    Kana,
    Cyrillic,
    Arabic,
    Devanagari,
    /// Whitespace, digits and punctuation
    Common,
    Unknown,
}

impl fmt::Display for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Script::Latin => "Latin",
            Script::Cjk => "CJK",
            Script::Hangul => "Hangul",
            Script::Kana => "Kana",
            Script::Cyrillic => "Cyrillic",
            Script::Arabic => "Arabic",
            Script::Devanagari => "Devanagari",
            Script::Common => "Common",
            Script::Unknown => "Unknown",
        };
        write!(f, "{name}")
    }
}

/// Static description of a language
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LanguageInfo {
    pub code: &'static str,
    pub display_name: &'static str,
    pub script: Script,
    pub is_tonal: bool,
}

const fn info(
    code: &'static str,
    display_name: &'static str,
    script: Script,
    is_tonal: bool,
) -> LanguageInfo {
    LanguageInfo {
        code,
        display_name,
        script,
        is_tonal,
    }
}

/// Known languages, keyed by canonical tag
pub static LANGUAGE_INFO: phf::Map<&'static str, LanguageInfo> = phf_map! {
    "en-US" => info("en-US", "English (US)", Script::Latin, false),
    "en-GB" => info("en-GB", "English (UK)", Script::Latin, false),
    "en-IN" => info("en-IN", "English (India)", Script::Latin, false),
    "es-ES" => info("es-ES", "Spanish (Spain)", Script::Latin, false),
    "es-MX" => info("es-MX", "Spanish (Mexico)", Script::Latin, false),
    "es-AR" => info("es-AR", "Spanish (Argentina)", Script::Latin, false),
    "es-CO" => info("es-CO", "Spanish (Colombia)", Script::Latin, false),
    "pt-BR" => info("pt-BR", "Portuguese (Brazil)", Script::Latin, false),
    "pt-PT" => info("pt-PT", "Portuguese (Portugal)", Script::Latin, false),
    "fr-FR" => info("fr-FR", "French (France)", Script::Latin, false),
    "fr-CA" => info("fr-CA", "French (Canada)", Script::Latin, false),
    "de-DE" => info("de-DE", "German", Script::Latin, false),
    "zh-CN" => info("zh-CN", "Chinese (Simplified)", Script::Cjk, true),
    "zh-TW" => info("zh-TW", "Chinese (Traditional)", Script::Cjk, true),
    "ja-JP" => info("ja-JP", "Japanese", Script::Kana, false),
    "ko-KR" => info("ko-KR", "Korean", Script::Hangul, false),
    "ru-RU" => info("ru-RU", "Russian", Script::Cyrillic, false),
    "ar-SA" => info("ar-SA", "Arabic", Script::Arabic, false),
    "hi-IN" => info("hi-IN", "Hindi", Script::Devanagari, false),
};

/// Bare primary subtags and their default region
static DEFAULT_REGIONS: phf::Map<&'static str, &'static str> = phf_map! {
    "en" => "en-US",
    "es" => "es-ES",
    "pt" => "pt-BR",
    "fr" => "fr-FR",
    "de" => "de-DE",
    "zh" => "zh-CN",
    "ja" => "ja-JP",
    "ko" => "ko-KR",
    "ru" => "ru-RU",
    "ar" => "ar-SA",
    "hi" => "hi-IN",
};

/// Canonicalize a language tag (`EN_us` → `en-US`, `zh` → `zh-CN`)
///
/// Unknown tags keep their shape with normalized casing, so `xx-xx` becomes
/// `xx-XX` and can still be matched against configured fallback chains.
pub fn canonicalize(tag: &str) -> String {
    let tag = tag.trim().replace('_', "-");
    let lower = tag.to_ascii_lowercase();
    if lower == AUTO_LANGUAGE || lower == MIXED_LANGUAGE {
        return lower;
    }

    let mut parts = lower.splitn(2, '-');
    let primary = parts.next().unwrap_or_default();
    match parts.next() {
        Some(region) if !region.is_empty() => {
            let region = if region.len() == 4 {
                // Script subtag such as `hans`
                let mut chars = region.chars();
                chars
                    .next()
                    .map(|c| c.to_ascii_uppercase().to_string() + chars.as_str())
                    .unwrap_or_default()
            } else {
                region.to_ascii_uppercase()
            };
            format!("{primary}-{region}")
        }
        _ => DEFAULT_REGIONS
            .get(primary)
            .map(|s| s.to_string())
            .unwrap_or_else(|| primary.to_string()),
    }
}

/// Primary subtag of a tag (`pt-BR` → `pt`)
pub fn primary_subtag(tag: &str) -> &str {
    tag.split(['-', '_']).next().unwrap_or(tag)
}

/// Metadata for a canonical tag
pub fn language_info(tag: &str) -> Option<&'static LanguageInfo> {
    LANGUAGE_INFO.get(tag)
}

/// A family of mutually intelligible or closely related languages
#[derive(Debug, Clone, Copy)]
pub struct LanguageGroup {
    pub name: &'static str,
    /// Pairwise similarity scores within the group
    pub pairs: &'static [(&'static str, &'static str, f32)],
}

pub static LANGUAGE_GROUPS: &[LanguageGroup] = &[
    LanguageGroup {
        name: "Germanic",
        pairs: &[
            ("en-US", "en-GB", 0.95),
            ("en-US", "en-IN", 0.90),
            ("en-GB", "en-IN", 0.90),
        ],
    },
    LanguageGroup {
        name: "Romance",
        pairs: &[
            ("pt-BR", "pt-PT", 0.95),
            ("es-ES", "pt-BR", 0.85),
            ("es-ES", "pt-PT", 0.85),
            ("es-ES", "es-MX", 0.95),
            ("es-ES", "es-AR", 0.95),
            ("es-ES", "es-CO", 0.95),
            ("fr-FR", "fr-CA", 0.95),
        ],
    },
    LanguageGroup {
        name: "EastAsian",
        pairs: &[("zh-CN", "zh-TW", 0.90)],
    },
];

/// Similarity between two canonical tags in [0, 1]
///
/// Identical tags score 1.0, group pairs use their table score, other tags
/// sharing a primary subtag score 0.8, everything else 0.0.
pub fn similarity(a: &str, b: &str) -> f32 {
    if a == b {
        return 1.0;
    }
    for group in LANGUAGE_GROUPS {
        for &(x, y, score) in group.pairs {
            if (x == a && y == b) || (x == b && y == a) {
                return score;
            }
        }
    }
    if primary_subtag(a) == primary_subtag(b) {
        0.8
    } else {
        0.0
    }
}

/// Name of the group containing `tag`, if any
pub fn language_group(tag: &str) -> Option<&'static str> {
    LANGUAGE_GROUPS
        .iter()
        .find(|g| g.pairs.iter().any(|&(x, y, _)| x == tag || y == tag))
        .map(|g| g.name)
}

/// Fallback chains installed on every router
pub static DEFAULT_FALLBACK_CHAINS: &[(&str, &[&str])] = &[
    ("en-IN", &["en-GB", "en-US"]),
    ("en-GB", &["en-US"]),
    ("es-MX", &["es-ES"]),
    ("es-AR", &["es-ES"]),
    ("es-CO", &["es-ES"]),
    ("pt-BR", &["pt-PT", "es-ES", "en-US"]),
    ("pt-PT", &["es-ES", "en-US"]),
    ("zh-TW", &["zh-CN"]),
    ("fr-CA", &["fr-FR"]),
];
